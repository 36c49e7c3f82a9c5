//! Swap form state: the two selected tokens and the two amount fields.
//!
//! Pure state holder; validation lives in [`crate::validation`] and all
//! side effects (quote fetches, review clearing) in the session.

use crate::config::tokens::Token;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SwapForm {
    from_token: Option<Token>,
    to_token: Option<Token>,
    from_amount: String,
    /// Derived from the live quote; the session mirrors it in.
    to_amount: String,
}

impl SwapForm {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_token(&self) -> Option<&Token> {
        self.from_token.as_ref()
    }

    pub fn to_token(&self) -> Option<&Token> {
        self.to_token.as_ref()
    }

    pub fn from_amount(&self) -> &str {
        &self.from_amount
    }

    pub fn to_amount(&self) -> &str {
        &self.to_amount
    }

    /// Select the token being sold. If the buy side currently holds the same
    /// asset, it is cleared rather than leaving an unswappable pair.
    pub fn set_from_token(&mut self, token: Option<Token>) {
        if let (Some(new), Some(other)) = (&token, &self.to_token) {
            if new.is_same(other) {
                self.to_token = None;
            }
        }
        self.from_token = token;
    }

    /// Select the token being bought; clears the sell side on coincidence.
    pub fn set_to_token(&mut self, token: Option<Token>) {
        if let (Some(new), Some(other)) = (&token, &self.from_token) {
            if new.is_same(other) {
                self.from_token = None;
            }
        }
        self.to_token = token;
    }

    pub fn set_from_amount(&mut self, amount: impl Into<String>) {
        self.from_amount = amount.into();
    }

    pub fn set_to_amount(&mut self, amount: impl Into<String>) {
        self.to_amount = amount.into();
    }

    /// Exchange both token and amount pairs in one update.
    pub fn switch(&mut self) {
        std::mem::swap(&mut self.from_token, &mut self.to_token);
        std::mem::swap(&mut self.from_amount, &mut self.to_amount);
    }

    /// Catalog entries selectable on the sell side: everything except the
    /// token already chosen on the buy side.
    pub fn selectable_from<'a>(&self, catalog: &'a [Token]) -> Vec<&'a Token> {
        catalog
            .iter()
            .filter(|t| self.to_token.as_ref().map_or(true, |other| !t.is_same(other)))
            .collect()
    }

    pub fn selectable_to<'a>(&self, catalog: &'a [Token]) -> Vec<&'a Token> {
        catalog
            .iter()
            .filter(|t| self.from_token.as_ref().map_or(true, |other| !t.is_same(other)))
            .collect()
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
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
    fn test_switch_is_involutive() {
        let mut form = SwapForm::new();
        form.set_from_token(Some(token(1, "0xAAA", "ETH")));
        form.set_to_token(Some(token(1, "0xBBB", "USDC")));
        form.set_from_amount("1.5");
        form.set_to_amount("2700.0");

        let original = form.clone();
        form.switch();
        assert_eq!(form.from_token().unwrap().symbol, "USDC");
        assert_eq!(form.from_amount(), "2700.0");
        form.switch();
        assert_eq!(form, original);
    }

    #[test]
    fn test_selecting_coinciding_token_clears_other_side() {
        let eth = token(1, "0xAAA", "ETH");
        let usdc = token(1, "0xBBB", "USDC");

        let mut form = SwapForm::new();
        form.set_from_token(Some(eth.clone()));
        form.set_to_token(Some(usdc.clone()));

        // Picking the sell-side token on the buy side clears the sell side.
        form.set_to_token(Some(eth.clone()));
        assert!(form.from_token().is_none());
        assert_eq!(form.to_token().unwrap().symbol, "ETH");

        form.set_from_token(Some(eth.clone()));
        assert!(form.to_token().is_none());
    }

    #[test]
    fn test_coincidence_is_case_insensitive() {
        let mut form = SwapForm::new();
        form.set_from_token(Some(token(1, "0xabc", "ETH")));
        form.set_to_token(Some(token(1, "0xABC", "ETH")));
        assert!(form.from_token().is_none());
    }

    #[test]
    fn test_same_symbol_different_chain_does_not_clear() {
        let mut form = SwapForm::new();
        form.set_from_token(Some(token(1, "0xAAA", "USDC")));
        form.set_to_token(Some(token(137, "0xAAA", "USDC")));
        assert!(form.from_token().is_some());
        assert!(form.to_token().is_some());
    }

    #[test]
    fn test_selectable_excludes_opposite_side() {
        let catalog = vec![
            token(1, "0xAAA", "ETH"),
            token(1, "0xBBB", "USDC"),
            token(1, "0xCCC", "DAI"),
        ];
        let mut form = SwapForm::new();
        form.set_from_token(Some(catalog[0].clone()));

        let selectable: Vec<&str> = form
            .selectable_to(&catalog)
            .iter()
            .map(|t| t.symbol.as_str())
            .collect();
        assert_eq!(selectable, vec!["USDC", "DAI"]);

        // With nothing picked on the buy side, everything is selectable to sell.
        assert_eq!(form.selectable_from(&catalog).len(), 3);
    }

    #[test]
    fn test_reset() {
        let mut form = SwapForm::new();
        form.set_from_token(Some(token(1, "0xAAA", "ETH")));
        form.set_from_amount("5");
        form.reset();
        assert_eq!(form, SwapForm::default());
    }
}
