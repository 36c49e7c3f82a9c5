//! Pure form validation: per-field checks plus the pair-distinctness rule.

use crate::config::tokens::Token;
use crate::form::SwapForm;

/// Field-keyed validation errors. Recomputed on every relevant input change;
/// holds no state of its own.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ValidationErrors {
    pub from_token: Option<String>,
    pub to_token: Option<String>,
    pub amount: Option<String>,
    pub general: Option<String>,
}

impl ValidationErrors {
    pub fn is_valid(&self) -> bool {
        self.from_token.is_none()
            && self.to_token.is_none()
            && self.amount.is_none()
            && self.general.is_none()
    }
}

/// Same chain AND same contract address (case-insensitive) defeats
/// distinctness; the same symbol on different chains does not.
pub fn is_same_token(a: &Token, b: &Token) -> bool {
    a.is_same(b)
}

/// Distinctness check for a candidate pair.
pub fn pair_error(from: &Token, to: &Token) -> Option<String> {
    if is_same_token(from, to) {
        Some("Cannot swap the same token".to_string())
    } else {
        None
    }
}

/// `None` when the amount is a well-formed positive number.
pub fn validate_amount(amount: &str) -> Option<String> {
    let trimmed = amount.trim();
    if trimmed.is_empty() {
        return Some("Enter an amount".to_string());
    }
    match trimmed.parse::<f64>() {
        Err(_) => Some("Amount must be a number".to_string()),
        // NaN fails the comparison too, which is what we want.
        Ok(value) if !(value > 0.0) => Some("Amount must be greater than zero".to_string()),
        Ok(_) => None,
    }
}

pub fn validate_form(form: &SwapForm) -> ValidationErrors {
    let mut errors = ValidationErrors::default();

    if form.from_token().is_none() {
        errors.from_token = Some("Select a token to sell".to_string());
    }
    if form.to_token().is_none() {
        errors.to_token = Some("Select a token to buy".to_string());
    }
    if let (Some(from), Some(to)) = (form.from_token(), form.to_token()) {
        errors.general = pair_error(from, to);
    }
    errors.amount = validate_amount(form.from_amount());

    errors
}

/// Fast gate for enabling the fetch and the submit action.
pub fn can_submit(form: &SwapForm) -> bool {
    validate_form(form).is_valid()
}

/// Syntactic check for a 20-byte hex contract address.
pub fn is_valid_address(address: &str) -> bool {
    address
        .strip_prefix("0x")
        .map(|h| h.len() == 40 && hex::decode(h).is_ok())
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn token(chain_id: u64, address: &str, symbol: &str) -> Token {
        Token {
            chain_id,
            address: address.to_string(),
            symbol: symbol.to_string(),
            name: symbol.to_string(),
            decimals: 18,
            logo_uri: None,
            price_usd: None,
        }
    }

    #[test]
    fn test_same_token_pair_fails() {
        let a = token(1, "0xAAA", "WETH");
        let b = token(1, "0xaaa", "WETH");
        assert_eq!(
            pair_error(&a, &b).as_deref(),
            Some("Cannot swap the same token")
        );
    }

    #[test]
    fn test_same_symbol_on_different_chains_passes() {
        let a = token(1, "0xAAA", "USDC");
        let b = token(137, "0xAAA", "USDC");
        assert!(!is_same_token(&a, &b));
    }

    #[test]
    fn test_amount_validation_table() {
        for bad in ["", "   ", "abc", "1.2.3", "NaN"] {
            assert!(validate_amount(bad).is_some(), "expected error for {:?}", bad);
        }
        for non_positive in ["0", "0.0", "-1", "-0.5"] {
            assert!(
                validate_amount(non_positive).is_some(),
                "expected error for {:?}",
                non_positive
            );
        }
        for good in ["1", "0.5", "1.5", "100.000001"] {
            assert!(validate_amount(good).is_none(), "expected ok for {:?}", good);
        }
    }

    #[test]
    fn test_missing_tokens_reported_per_field() {
        let form = SwapForm::new();
        let errors = validate_form(&form);
        assert!(errors.from_token.is_some());
        assert!(errors.to_token.is_some());
        assert!(errors.amount.is_some());
        assert!(!errors.is_valid());
        assert!(!can_submit(&form));
    }

    #[test]
    fn test_valid_form() {
        let mut form = SwapForm::new();
        form.set_from_token(Some(token(1, "0xAAA", "ETH")));
        form.set_to_token(Some(token(1, "0xBBB", "USDC")));
        form.set_from_amount("1.5");
        assert!(can_submit(&form));
    }

    #[test]
    fn test_address_syntax() {
        assert!(is_valid_address("0xC02aaA39b223FE8D0A0e5C4F27eAD9083C756Cc2"));
        assert!(!is_valid_address("C02aaA39b223FE8D0A0e5C4F27eAD9083C756Cc2"));
        assert!(!is_valid_address("0x1234"));
        assert!(!is_valid_address("0xZZZaaA39b223FE8D0A0e5C4F27eAD9083C756Cc2"));
    }
}
