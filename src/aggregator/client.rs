// HTTP client for the aggregator's quote endpoint.

use async_trait::async_trait;
use reqwest::StatusCode;

use super::types::{QuoteRequest, Route};
use super::{AggregatorError, QuoteProvider};

pub struct HttpQuoteClient {
    http: reqwest::Client,
    base_url: String,
}

impl HttpQuoteClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.into(),
        }
    }

    fn quote_url(&self) -> String {
        format!("{}/quote", self.base_url.trim_end_matches('/'))
    }

    fn query_params(request: &QuoteRequest) -> Vec<(String, String)> {
        let mut params = vec![
            ("fromChain".to_string(), request.from_chain_id.to_string()),
            ("toChain".to_string(), request.to_chain_id.to_string()),
            ("fromToken".to_string(), request.from_token_address.clone()),
            ("toToken".to_string(), request.to_token_address.clone()),
            ("fromAmount".to_string(), request.from_amount.clone()),
            ("fromAddress".to_string(), request.from_address.clone()),
            ("slippage".to_string(), request.slippage.to_string()),
            ("integrator".to_string(), request.integrator.clone()),
        ];
        if let Some(to_address) = &request.to_address {
            params.push(("toAddress".to_string(), to_address.clone()));
        }
        if let Some(fee) = request.fee {
            params.push(("fee".to_string(), fee.to_string()));
        }
        if let Some(allow) = &request.allow_tools {
            params.push(("allowExchanges".to_string(), allow.join(",")));
        }
        if let Some(deny) = &request.deny_tools {
            params.push(("denyExchanges".to_string(), deny.join(",")));
        }
        if let Some(prefer) = &request.prefer_tools {
            params.push(("preferExchanges".to_string(), prefer.join(",")));
        }
        params
    }
}

#[async_trait]
impl QuoteProvider for HttpQuoteClient {
    async fn fetch_quote(&self, request: &QuoteRequest) -> Result<Route, AggregatorError> {
        let url = self.quote_url();
        log::debug!(
            "Requesting quote {}:{} -> {}:{} amount {}",
            request.from_chain_id,
            request.from_token_address,
            request.to_chain_id,
            request.to_token_address,
            request.from_amount
        );

        let response = self
            .http
            .get(&url)
            .query(&Self::query_params(request))
            .header("Accept", "application/json")
            .send()
            .await
            .map_err(|e| AggregatorError::Network(e.to_string()))?;

        let status = response.status();

        if status == StatusCode::TOO_MANY_REQUESTS {
            let retry_after_secs = response
                .headers()
                .get(reqwest::header::RETRY_AFTER)
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.parse::<u64>().ok());
            log::warn!("Quote endpoint rate limited us, retry-after: {:?}", retry_after_secs);
            return Err(AggregatorError::RateLimited { retry_after_secs });
        }

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(match status {
                StatusCode::BAD_REQUEST | StatusCode::UNPROCESSABLE_ENTITY => {
                    AggregatorError::Validation(body)
                }
                StatusCode::NOT_FOUND => AggregatorError::NoRoute(body),
                _ => AggregatorError::Unexpected(format!("{}: {}", status, body)),
            });
        }

        let route: Route = response
            .json()
            .await
            .map_err(|e| AggregatorError::Unexpected(e.to_string()))?;

        log::debug!(
            "Quote received: route {} estimates {} -> {}",
            route.id,
            route.from_amount,
            route.to_amount
        );
        Ok(route)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request() -> QuoteRequest {
        QuoteRequest {
            from_chain_id: 1,
            to_chain_id: 137,
            from_token_address: "0xAAA".to_string(),
            to_token_address: "0xBBB".to_string(),
            from_amount: "1000000".to_string(),
            from_address: "0xME".to_string(),
            to_address: Some("0xYOU".to_string()),
            slippage: 0.005,
            integrator: "swapdeck".to_string(),
            fee: Some(0.0025),
            allow_tools: Some(vec!["uniswap".to_string(), "sushiswap".to_string()]),
            deny_tools: None,
            prefer_tools: None,
        }
    }

    #[test]
    fn test_query_params() {
        let params = HttpQuoteClient::query_params(&request());
        let get = |key: &str| {
            params
                .iter()
                .find(|(k, _)| k == key)
                .map(|(_, v)| v.as_str())
        };
        assert_eq!(get("fromChain"), Some("1"));
        assert_eq!(get("toChain"), Some("137"));
        assert_eq!(get("fromAmount"), Some("1000000"));
        assert_eq!(get("toAddress"), Some("0xYOU"));
        assert_eq!(get("allowExchanges"), Some("uniswap,sushiswap"));
        assert_eq!(get("denyExchanges"), None);
    }

    #[test]
    fn test_quote_url_trims_trailing_slash() {
        let client = HttpQuoteClient::new("https://example.test/v1/");
        assert_eq!(client.quote_url(), "https://example.test/v1/quote");
    }
}
