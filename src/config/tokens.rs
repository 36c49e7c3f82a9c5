use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};

/// A swappable token on a specific chain.
///
/// Identity is (chain id, address); the same symbol can legitimately exist
/// on several chains, and several addresses can share a symbol on one chain.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Token {
    pub chain_id: u64,
    pub address: String,
    pub symbol: String,
    pub name: String,
    pub decimals: u8,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub logo_uri: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price_usd: Option<f64>,
}

impl Token {
    /// Two tokens are the same asset when they live on the same chain and
    /// share an address, compared case-insensitively.
    pub fn is_same(&self, other: &Token) -> bool {
        self.chain_id == other.chain_id && self.address.eq_ignore_ascii_case(&other.address)
    }

    /// Stable lowercase key for pair-scoped bookkeeping.
    pub fn pair_key(&self, other: &Token) -> String {
        format!(
            "{}:{}->{}:{}",
            self.chain_id,
            self.address.to_lowercase(),
            other.chain_id,
            other.address.to_lowercase()
        )
    }
}

// Embed the default catalog at compile time; a live deployment replaces it
// with the backend catalog once fetched.
static TOKENS_JSON: &str = include_str!("../../assets/tokens.json");

static DEFAULT_CATALOG: Lazy<Vec<Token>> = Lazy::new(|| parse_catalog_from_json(TOKENS_JSON));

fn parse_catalog_from_json(json_str: &str) -> Vec<Token> {
    match serde_json::from_str::<Vec<Token>>(json_str) {
        Ok(tokens) => {
            log::info!("Loaded {} tokens from embedded catalog", tokens.len());
            tokens
        }
        Err(e) => {
            log::error!("Failed to parse embedded token catalog: {}", e);

            // Minimal fallback so the form stays usable.
            vec![
                Token {
                    chain_id: 1,
                    address: "0x0000000000000000000000000000000000000000".to_string(),
                    symbol: "ETH".to_string(),
                    name: "Ether".to_string(),
                    decimals: 18,
                    logo_uri: None,
                    price_usd: None,
                },
                Token {
                    chain_id: 1,
                    address: "0xA0b86991c6218b36c1d19D4a2e9Eb0cE3606eB48".to_string(),
                    symbol: "USDC".to_string(),
                    name: "USD Coin".to_string(),
                    decimals: 6,
                    logo_uri: None,
                    price_usd: None,
                },
            ]
        }
    }
}

/// The embedded default token catalog.
pub fn default_catalog() -> &'static [Token] {
    &DEFAULT_CATALOG
}

/// Look a token up by (chain id, address), case-insensitive on the address.
pub fn find_token<'a>(catalog: &'a [Token], chain_id: u64, address: &str) -> Option<&'a Token> {
    catalog
        .iter()
        .find(|t| t.chain_id == chain_id && t.address.eq_ignore_ascii_case(address))
}

/// First catalog entry with the given symbol, if any.
pub fn find_by_symbol<'a>(catalog: &'a [Token], symbol: &str) -> Option<&'a Token> {
    catalog.iter().find(|t| t.symbol.eq_ignore_ascii_case(symbol))
}
