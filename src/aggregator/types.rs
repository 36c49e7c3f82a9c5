// Aggregator API type definitions.
// Routes are treated as opaque once received: the orchestration layer reads
// them and snapshots them, but never edits one in place.

use serde::{Deserialize, Serialize};

use crate::config::tokens::Token;

// ══════════════════════════════════════════════════════════════════════════════
// Quote request
// ══════════════════════════════════════════════════════════════════════════════

/// Parameters for a price/route quote.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuoteRequest {
    pub from_chain_id: u64,
    pub to_chain_id: u64,
    pub from_token_address: String,
    pub to_token_address: String,
    /// Amount in the source token's smallest unit, as a decimal string.
    pub from_amount: String,
    pub from_address: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub to_address: Option<String>,
    /// Slippage tolerance as a fraction (0.005 = 0.5%).
    pub slippage: f64,
    pub integrator: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fee: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub allow_tools: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deny_tools: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prefer_tools: Option<Vec<String>>,
}

impl QuoteRequest {
    /// Dedup key for the request cache: everything that changes the priced
    /// outcome participates.
    pub fn cache_key(&self) -> String {
        let tools = |list: &Option<Vec<String>>| list.as_deref().unwrap_or(&[]).join("+");
        format!(
            "{}:{}->{}:{}|{}|{}|{}->{}|{}|{}|{}",
            self.from_chain_id,
            self.from_token_address.to_lowercase(),
            self.to_chain_id,
            self.to_token_address.to_lowercase(),
            self.from_amount,
            self.slippage,
            self.from_address.to_lowercase(),
            self.to_address.as_deref().unwrap_or("").to_lowercase(),
            tools(&self.allow_tools),
            tools(&self.deny_tools),
            tools(&self.prefer_tools),
        )
    }
}

// ══════════════════════════════════════════════════════════════════════════════
// Routes and execution progress
// ══════════════════════════════════════════════════════════════════════════════

/// Status of one atomic on-chain action within a route step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ProcessStatus {
    Started,
    ActionRequired,
    Pending,
    Done,
    Failed,
    Cancelled,
}

impl ProcessStatus {
    /// A process that still needs work or a user action.
    pub fn is_outstanding(&self) -> bool {
        matches!(
            self,
            ProcessStatus::Started | ProcessStatus::ActionRequired | ProcessStatus::Pending
        )
    }
}

/// Kind of sub-process the executor is running.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ProcessType {
    TokenAllowance,
    SwitchChain,
    Transaction,
    CrossChain,
    ReceivingChain,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Process {
    #[serde(rename = "type")]
    pub process_type: ProcessType,
    pub status: ProcessStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tx_hash: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chain_id: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StepExecution {
    pub status: ProcessStatus,
    #[serde(default)]
    pub process: Vec<Process>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RouteStep {
    pub id: String,
    /// Identifier of the exchange/bridge the aggregator picked.
    pub tool: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_name: Option<String>,
    #[serde(default)]
    pub estimated_duration_secs: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gas_cost_usd: Option<String>,
    /// Populated by the executor while the step runs; absent on fresh quotes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub execution: Option<StepExecution>,
}

impl RouteStep {
    pub fn display_label(&self) -> String {
        self.tool_name.clone().unwrap_or_else(|| self.tool.clone())
    }

    pub fn is_done(&self) -> bool {
        self.execution
            .as_ref()
            .map(|e| e.status == ProcessStatus::Done)
            .unwrap_or(false)
    }
}

/// A priced, possibly multi-step execution plan for converting one token
/// into another. Amount fields are base-unit decimal strings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Route {
    pub id: String,
    pub from_chain_id: u64,
    pub to_chain_id: u64,
    pub from_token: Token,
    pub to_token: Token,
    pub from_amount: String,
    /// Estimated output amount.
    pub to_amount: String,
    /// Guaranteed minimum after slippage.
    pub to_amount_min: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub from_amount_usd: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub to_amount_usd: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gas_cost_usd: Option<String>,
    #[serde(default)]
    pub steps: Vec<RouteStep>,
}

impl Route {
    /// All sub-processes across all steps, in step order.
    pub fn processes(&self) -> impl Iterator<Item = &Process> {
        self.steps
            .iter()
            .filter_map(|s| s.execution.as_ref())
            .flat_map(|e| e.process.iter())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn token(chain_id: u64, address: &str, symbol: &str, decimals: u8) -> Token {
        Token {
            chain_id,
            address: address.to_string(),
            symbol: symbol.to_string(),
            name: symbol.to_string(),
            decimals,
            logo_uri: None,
            price_usd: None,
        }
    }

    fn request() -> QuoteRequest {
        QuoteRequest {
            from_chain_id: 1,
            to_chain_id: 1,
            from_token_address: "0xAAA".to_string(),
            to_token_address: "0xBBB".to_string(),
            from_amount: "1000000".to_string(),
            from_address: "0xME".to_string(),
            to_address: None,
            slippage: 0.005,
            integrator: "swapdeck".to_string(),
            fee: None,
            allow_tools: None,
            deny_tools: None,
            prefer_tools: None,
        }
    }

    #[test]
    fn test_cache_key_is_case_insensitive_on_addresses() {
        let a = request();
        let mut b = request();
        b.from_token_address = "0xaaa".to_string();
        assert_eq!(a.cache_key(), b.cache_key());
    }

    #[test]
    fn test_cache_key_changes_with_amount() {
        let a = request();
        let mut b = request();
        b.from_amount = "2000000".to_string();
        assert_ne!(a.cache_key(), b.cache_key());
    }

    #[test]
    fn test_route_serde_round_trip() {
        let route = Route {
            id: "route-1".to_string(),
            from_chain_id: 1,
            to_chain_id: 1,
            from_token: token(1, "0xAAA", "ETH", 18),
            to_token: token(1, "0xBBB", "USDC", 6),
            from_amount: "1000000000000000000".to_string(),
            to_amount: "1800000000".to_string(),
            to_amount_min: "1791000000".to_string(),
            from_amount_usd: Some("1800.00".to_string()),
            to_amount_usd: Some("1799.10".to_string()),
            gas_cost_usd: Some("4.20".to_string()),
            steps: vec![RouteStep {
                id: "step-1".to_string(),
                tool: "uniswap".to_string(),
                tool_name: Some("Uniswap V3".to_string()),
                estimated_duration_secs: 30,
                gas_cost_usd: Some("4.20".to_string()),
                execution: Some(StepExecution {
                    status: ProcessStatus::Pending,
                    process: vec![Process {
                        process_type: ProcessType::TokenAllowance,
                        status: ProcessStatus::ActionRequired,
                        tx_hash: None,
                        chain_id: Some(1),
                        message: None,
                        error: None,
                    }],
                }),
            }],
        };

        let json = serde_json::to_string(&route).unwrap();
        assert!(json.contains("\"TOKEN_ALLOWANCE\""));
        assert!(json.contains("\"ACTION_REQUIRED\""));
        let back: Route = serde_json::from_str(&json).unwrap();
        assert_eq!(back, route);
    }
}
