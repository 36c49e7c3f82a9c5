//! Quote fetching: skip gates, base-unit conversion, request dedup, retry,
//! and derivation of the display-ready view of a route.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use thiserror::Error;

use crate::aggregator::types::{QuoteRequest, Route};
use crate::aggregator::{AggregatorError, QuoteProvider};
use crate::amount::{self, AmountError};
use crate::config::tokens::Token;

/// Freshness window for the request dedup cache.
pub const QUOTE_CACHE_WINDOW: Duration = Duration::from_secs(30);
/// Automatic retries on network failure before surfacing the error.
const QUOTE_FETCH_RETRIES: u32 = 2;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum QuoteError {
    #[error("{0}")]
    Validation(String),
    #[error("network error fetching quote: {0}")]
    Network(String),
    #[error("quote service is rate limiting requests")]
    RateLimited { retry_after_secs: Option<u64> },
    #[error("failed to fetch quote: {0}")]
    Unknown(String),
}

impl QuoteError {
    fn from_aggregator(error: AggregatorError) -> Self {
        match error {
            AggregatorError::Validation(msg) | AggregatorError::NoRoute(msg) => {
                QuoteError::Validation(msg)
            }
            AggregatorError::Network(msg) => QuoteError::Network(msg),
            AggregatorError::RateLimited { retry_after_secs } => {
                QuoteError::RateLimited { retry_after_secs }
            }
            other => QuoteError::Unknown(other.to_string()),
        }
    }
}

/// How the fresh quote compares to the previous one for the same pair.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct QuoteComparison {
    pub change_pct: f64,
    pub improved: bool,
}

/// A route plus everything the presentation layer shows about it.
#[derive(Debug, Clone)]
pub struct QuoteView {
    pub route: Route,
    /// Human-readable estimated output amount.
    pub to_amount_display: String,
    pub from_amount_usd: Option<f64>,
    pub to_amount_usd: Option<f64>,
    /// Output tokens per input token.
    pub rate: Option<f64>,
    pub comparison: Option<QuoteComparison>,
    pub fetched_at: Instant,
}

struct CachedRoute {
    fetched_at: Instant,
    route: Route,
}

struct ComparisonState {
    pair_key: String,
    last_to_amount: f64,
    last: Option<QuoteComparison>,
}

pub struct QuoteFetcher {
    provider: Arc<dyn QuoteProvider>,
    integrator: String,
    fee: Option<f64>,
    allow_tools: Option<Vec<String>>,
    deny_tools: Option<Vec<String>>,
    prefer_tools: Option<Vec<String>>,
    cache: Mutex<HashMap<String, CachedRoute>>,
    comparison: Mutex<Option<ComparisonState>>,
}

impl QuoteFetcher {
    pub fn new(provider: Arc<dyn QuoteProvider>, integrator: impl Into<String>) -> Self {
        Self {
            provider,
            integrator: integrator.into(),
            fee: None,
            allow_tools: None,
            deny_tools: None,
            prefer_tools: None,
            cache: Mutex::new(HashMap::new()),
            comparison: Mutex::new(None),
        }
    }

    pub fn with_fee(mut self, fee: f64) -> Self {
        self.fee = Some(fee);
        self
    }

    pub fn with_tool_preferences(
        mut self,
        allow: Option<Vec<String>>,
        deny: Option<Vec<String>>,
        prefer: Option<Vec<String>>,
    ) -> Self {
        self.allow_tools = allow;
        self.deny_tools = deny;
        self.prefer_tools = prefer;
        self
    }

    /// Fetch a quote, consulting the dedup cache first.
    ///
    /// Returns `Ok(None)` when fetching is skipped: gate disabled, identical
    /// pair, or an empty/zero amount. A malformed amount (including too many
    /// decimal places) is a validation error, not a skip.
    #[allow(clippy::too_many_arguments)]
    pub async fn fetch(
        &self,
        from: &Token,
        to: &Token,
        human_amount: &str,
        slippage_pct: f64,
        from_address: &str,
        to_address: Option<&str>,
        enabled: bool,
    ) -> Result<Option<QuoteView>, QuoteError> {
        self.fetch_inner(
            from,
            to,
            human_amount,
            slippage_pct,
            from_address,
            to_address,
            enabled,
            true,
        )
        .await
    }

    /// Fetch bypassing the cache read (refreshes still repopulate it).
    #[allow(clippy::too_many_arguments)]
    pub async fn fetch_fresh(
        &self,
        from: &Token,
        to: &Token,
        human_amount: &str,
        slippage_pct: f64,
        from_address: &str,
        to_address: Option<&str>,
        enabled: bool,
    ) -> Result<Option<QuoteView>, QuoteError> {
        self.fetch_inner(
            from,
            to,
            human_amount,
            slippage_pct,
            from_address,
            to_address,
            enabled,
            false,
        )
        .await
    }

    #[allow(clippy::too_many_arguments)]
    async fn fetch_inner(
        &self,
        from: &Token,
        to: &Token,
        human_amount: &str,
        slippage_pct: f64,
        from_address: &str,
        to_address: Option<&str>,
        enabled: bool,
        use_cache: bool,
    ) -> Result<Option<QuoteView>, QuoteError> {
        if !enabled || from.is_same(to) {
            return Ok(None);
        }

        let base_amount = match amount::to_base_units(human_amount, from.decimals) {
            Ok(0) => return Ok(None),
            Ok(value) => value,
            Err(AmountError::Empty) => return Ok(None),
            Err(e) => return Err(QuoteError::Validation(e.to_string())),
        };

        let request = QuoteRequest {
            from_chain_id: from.chain_id,
            to_chain_id: to.chain_id,
            from_token_address: from.address.clone(),
            to_token_address: to.address.clone(),
            from_amount: base_amount.to_string(),
            from_address: from_address.to_string(),
            to_address: to_address.map(str::to_string),
            slippage: slippage_pct / 100.0,
            integrator: self.integrator.clone(),
            fee: self.fee,
            allow_tools: self.allow_tools.clone(),
            deny_tools: self.deny_tools.clone(),
            prefer_tools: self.prefer_tools.clone(),
        };
        let key = request.cache_key();

        if use_cache {
            if let Some(route) = self.cached_route(&key) {
                log::debug!("Quote cache hit for {}", key);
                let comparison = self.current_comparison(&from.pair_key(to));
                return Ok(Some(self.build_view(route, from, to, comparison)));
            }
        }

        let route = self.fetch_with_retries(&request).await?;
        self.store_route(key, route.clone());

        let comparison = self.note_route(&from.pair_key(to), &route, to);
        Ok(Some(self.build_view(route, from, to, comparison)))
    }

    async fn fetch_with_retries(&self, request: &QuoteRequest) -> Result<Route, QuoteError> {
        let mut attempt = 0;
        loop {
            match self.provider.fetch_quote(request).await {
                Ok(route) => return Ok(route),
                Err(AggregatorError::Network(msg)) if attempt < QUOTE_FETCH_RETRIES => {
                    attempt += 1;
                    log::warn!(
                        "Quote fetch failed ({}), retry {}/{}",
                        msg,
                        attempt,
                        QUOTE_FETCH_RETRIES
                    );
                }
                Err(e) => return Err(QuoteError::from_aggregator(e)),
            }
        }
    }

    fn cached_route(&self, key: &str) -> Option<Route> {
        let cache = self.cache.lock().unwrap();
        cache
            .get(key)
            .filter(|entry| entry.fetched_at.elapsed() < QUOTE_CACHE_WINDOW)
            .map(|entry| entry.route.clone())
    }

    fn store_route(&self, key: String, route: Route) {
        let mut cache = self.cache.lock().unwrap();
        // Opportunistic sweep so abandoned pairs don't accumulate.
        cache.retain(|_, entry| entry.fetched_at.elapsed() < QUOTE_CACHE_WINDOW);
        cache.insert(
            key,
            CachedRoute {
                fetched_at: Instant::now(),
                route,
            },
        );
    }

    /// Record the fresh route for its pair and derive the comparison against
    /// the previous one. Comparison state resets whenever the pair changes.
    fn note_route(&self, pair_key: &str, route: &Route, to: &Token) -> Option<QuoteComparison> {
        let to_amount = amount::base_units_to_f64(&route.to_amount, to.decimals)?;
        let mut state = self.comparison.lock().unwrap();

        match state.as_mut() {
            Some(existing) if existing.pair_key == pair_key => {
                let previous = existing.last_to_amount;
                existing.last_to_amount = to_amount;
                if previous <= 0.0 {
                    existing.last = None;
                    return None;
                }
                let change_pct = (to_amount - previous) / previous * 100.0;
                let comparison = QuoteComparison {
                    change_pct,
                    improved: change_pct > 0.0,
                };
                existing.last = Some(comparison);
                Some(comparison)
            }
            _ => {
                *state = Some(ComparisonState {
                    pair_key: pair_key.to_string(),
                    last_to_amount: to_amount,
                    last: None,
                });
                None
            }
        }
    }

    fn current_comparison(&self, pair_key: &str) -> Option<QuoteComparison> {
        let state = self.comparison.lock().unwrap();
        state
            .as_ref()
            .filter(|s| s.pair_key == pair_key)
            .and_then(|s| s.last)
    }

    fn build_view(
        &self,
        route: Route,
        from: &Token,
        to: &Token,
        comparison: Option<QuoteComparison>,
    ) -> QuoteView {
        let from_f = amount::base_units_to_f64(&route.from_amount, from.decimals);
        let to_f = amount::base_units_to_f64(&route.to_amount, to.decimals);
        let rate = match (from_f, to_f) {
            (Some(f), Some(t)) if f > 0.0 => Some(t / f),
            _ => None,
        };
        let to_amount_display =
            amount::format_base_units(&route.to_amount, to.decimals).unwrap_or_default();
        let from_amount_usd = route.from_amount_usd.as_deref().and_then(|v| v.parse().ok());
        let to_amount_usd = route.to_amount_usd.as_deref().and_then(|v| v.parse().ok());

        QuoteView {
            route,
            to_amount_display,
            from_amount_usd,
            to_amount_usd,
            rate,
            comparison,
            fetched_at: Instant::now(),
        }
    }
}
