//! REST backend client: token catalog, paginated swap history, and rewards
//! verification.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::tokens::Token;
use crate::validation::is_valid_address;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("backend request failed: {0}")]
    Network(String),
    #[error("backend returned {status}: {body}")]
    Status { status: u16, body: String },
    #[error("failed to parse backend response: {0}")]
    Parse(String),
}

/// Catalog entry as served by the backend: one logical token with its
/// per-chain deployments and market data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogToken {
    pub symbol: String,
    pub name: String,
    pub decimals: u8,
    /// Chain id (as a decimal string key) -> contract address.
    #[serde(default)]
    pub addresses: HashMap<String, String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price_usd: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub market_cap_usd: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub logo_uri: Option<String>,
}

impl CatalogToken {
    /// Expand into per-chain [`Token`]s, dropping entries with unparseable
    /// chain ids or syntactically invalid addresses.
    pub fn flatten(&self) -> Vec<Token> {
        let mut tokens = Vec::new();
        for (chain, address) in &self.addresses {
            let Ok(chain_id) = chain.parse::<u64>() else {
                log::warn!("Skipping catalog entry {} on bad chain key {:?}", self.symbol, chain);
                continue;
            };
            if !is_valid_address(address) {
                log::warn!(
                    "Skipping catalog entry {} on chain {}: bad address {:?}",
                    self.symbol,
                    chain_id,
                    address
                );
                continue;
            }
            tokens.push(Token {
                chain_id,
                address: address.clone(),
                symbol: self.symbol.clone(),
                name: self.name.clone(),
                decimals: self.decimals,
                logo_uri: self.logo_uri.clone(),
                price_usd: self.price_usd,
            });
        }
        tokens
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HistoryStatus {
    Pending,
    Completed,
    Failed,
}

/// One row of the swap history screen.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SwapRecord {
    pub tx_hash: String,
    pub chain_id: u64,
    pub from_symbol: String,
    pub to_symbol: String,
    pub from_amount: String,
    pub to_amount: String,
    pub status: HistoryStatus,
    pub executed_at: DateTime<Utc>,
}

/// Cursor-based history query. `cursor` comes from the previous page's
/// `next_cursor`; everything else narrows the result set.
#[derive(Debug, Clone, PartialEq)]
pub struct TransactionQuery {
    pub cursor: Option<String>,
    pub limit: u32,
    pub status: Option<HistoryStatus>,
    pub chain_id: Option<u64>,
    pub token: Option<String>,
    pub search: Option<String>,
}

impl Default for TransactionQuery {
    fn default() -> Self {
        Self {
            cursor: None,
            limit: 20,
            status: None,
            chain_id: None,
            token: None,
            search: None,
        }
    }
}

impl TransactionQuery {
    fn query_params(&self) -> Vec<(String, String)> {
        let mut params = vec![("limit".to_string(), self.limit.to_string())];
        if let Some(cursor) = &self.cursor {
            params.push(("cursor".to_string(), cursor.clone()));
        }
        if let Some(status) = &self.status {
            let value = match status {
                HistoryStatus::Pending => "pending",
                HistoryStatus::Completed => "completed",
                HistoryStatus::Failed => "failed",
            };
            params.push(("status".to_string(), value.to_string()));
        }
        if let Some(chain_id) = self.chain_id {
            params.push(("chainId".to_string(), chain_id.to_string()));
        }
        if let Some(token) = &self.token {
            params.push(("token".to_string(), token.clone()));
        }
        if let Some(search) = &self.search {
            if !search.is_empty() {
                params.push(("search".to_string(), search.clone()));
            }
        }
        params
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionPage {
    pub items: Vec<SwapRecord>,
    #[serde(default)]
    pub next_cursor: Option<String>,
}

/// Payload for crediting a completed swap towards rewards.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RewardsRequest {
    pub tx_hash: String,
    pub chain_id: u64,
    pub route_id: String,
    pub usd_value: f64,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RewardsResponse {
    pub points: u64,
    pub total_points: u64,
    #[serde(default)]
    pub progress: Option<f64>,
}

pub struct BackendClient {
    http: Client,
    base_url: String,
    integrator: String,
}

impl BackendClient {
    pub fn new(base_url: impl Into<String>, integrator: impl Into<String>) -> Self {
        Self {
            http: Client::new(),
            base_url: base_url.into(),
            integrator: integrator.into(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url.trim_end_matches('/'), path)
    }

    pub async fn fetch_token_catalog(&self) -> Result<Vec<CatalogToken>, ApiError> {
        log::info!("Fetching token catalog from backend...");
        let response = self
            .http
            .get(self.url("tokens"))
            .query(&[("integrator", &self.integrator)])
            .header("Accept", "application/json")
            .send()
            .await
            .map_err(|e| ApiError::Network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ApiError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let tokens: Vec<CatalogToken> = response
            .json()
            .await
            .map_err(|e| ApiError::Parse(e.to_string()))?;
        log::info!("Token catalog returned {} tokens", tokens.len());
        Ok(tokens)
    }

    pub async fn fetch_transactions(
        &self,
        query: &TransactionQuery,
    ) -> Result<TransactionPage, ApiError> {
        let response = self
            .http
            .get(self.url("transactions"))
            .query(&query.query_params())
            .query(&[("integrator", &self.integrator)])
            .header("Accept", "application/json")
            .send()
            .await
            .map_err(|e| ApiError::Network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ApiError::Status {
                status: status.as_u16(),
                body,
            });
        }

        response.json().await.map_err(|e| ApiError::Parse(e.to_string()))
    }

    pub async fn verify_rewards(
        &self,
        request: &RewardsRequest,
    ) -> Result<RewardsResponse, ApiError> {
        log::info!("Verifying rewards for tx {}", request.tx_hash);
        let response = self
            .http
            .post(self.url("rewards/verify"))
            .query(&[("integrator", &self.integrator)])
            .json(request)
            .send()
            .await
            .map_err(|e| ApiError::Network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ApiError::Status {
                status: status.as_u16(),
                body,
            });
        }

        response.json().await.map_err(|e| ApiError::Parse(e.to_string()))
    }
}
