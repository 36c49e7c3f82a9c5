pub mod tokens;

/// Application configuration.
///
/// Everything here has a sensible default so a session can be constructed
/// in tests without touching the environment.
#[derive(Debug, Clone, PartialEq)]
pub struct AppConfig {
    /// Base URL of the REST backend (token catalog, history, rewards).
    pub api_base_url: String,
    /// Base URL of the swap aggregator's quote endpoint.
    pub aggregator_base_url: String,
    /// Integrator id sent with every quote and backend request.
    pub integrator_id: String,
    /// Default slippage tolerance, in percent.
    pub default_slippage: f64,
    /// Default transaction deadline, in minutes.
    pub default_deadline_minutes: u32,
    /// Seconds between automatic quote refreshes.
    pub quote_refresh_secs: u64,
    /// Seconds after which a quote with no successful update is stale.
    pub quote_stale_secs: u64,
    /// Milliseconds the typed amount must be stable before a fetch fires.
    pub debounce_ms: u64,
}

pub const DEFAULT_API_BASE_URL: &str = "https://api.swapdeck.app/v1";
pub const DEFAULT_AGGREGATOR_BASE_URL: &str = "https://li.quest/v1";
pub const DEFAULT_INTEGRATOR_ID: &str = "swapdeck";

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            aggregator_base_url: DEFAULT_AGGREGATOR_BASE_URL.to_string(),
            integrator_id: DEFAULT_INTEGRATOR_ID.to_string(),
            default_slippage: 0.5,
            default_deadline_minutes: 30,
            quote_refresh_secs: 30,
            quote_stale_secs: 45,
            debounce_ms: 400,
        }
    }
}

impl AppConfig {
    /// Load configuration from environment variables, falling back to
    /// defaults for anything unset.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            api_base_url: std::env::var("SWAPDECK_API_URL").unwrap_or(defaults.api_base_url.clone()),
            aggregator_base_url: std::env::var("SWAPDECK_AGGREGATOR_URL")
                .unwrap_or(defaults.aggregator_base_url.clone()),
            integrator_id: std::env::var("SWAPDECK_INTEGRATOR")
                .unwrap_or(defaults.integrator_id.clone()),
            ..defaults
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = AppConfig::default();
        assert_eq!(config.quote_refresh_secs, 30);
        assert_eq!(config.quote_stale_secs, 45);
        assert!(config.default_slippage > 0.0);
        assert!(!config.integrator_id.is_empty());
    }
}
