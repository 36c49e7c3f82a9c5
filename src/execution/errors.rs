//! Classification of execution failures into a user-facing taxonomy.
//!
//! The executor reports errors as free text; classification is by message
//! matching, the same way the host app turns aggregator error strings into
//! friendly copy. Every class carries a suggested remediation and a
//! recoverability flag; only an on-chain execution failure is final.

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ExecutionErrorKind {
    UserRejected,
    InsufficientBalance,
    InsufficientGas,
    SlippageExceeded,
    QuoteExpired,
    UnsupportedRoute,
    Network,
    WalletError,
    ExecutionFailed,
    Unknown,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Error)]
#[error("{message}")]
pub struct ClassifiedError {
    pub kind: ExecutionErrorKind,
    pub message: String,
    pub suggested_action: String,
    /// Whether retrying (resuming from the last known route) makes sense.
    pub recoverable: bool,
}

pub fn classify_execution_error(message: &str) -> ClassifiedError {
    let lower = message.to_lowercase();

    let kind = if lower.contains("user rejected")
        || lower.contains("user denied")
        || lower.contains("rejected the request")
        || lower.contains("rejected by user")
    {
        ExecutionErrorKind::UserRejected
    } else if lower.contains("insufficient funds for gas")
        || lower.contains("gas required exceeds")
        || lower.contains("out of gas")
    {
        ExecutionErrorKind::InsufficientGas
    } else if lower.contains("insufficient") {
        ExecutionErrorKind::InsufficientBalance
    } else if lower.contains("slippage") || lower.contains("return amount is not enough") {
        ExecutionErrorKind::SlippageExceeded
    } else if lower.contains("expired") {
        ExecutionErrorKind::QuoteExpired
    } else if lower.contains("no route") || lower.contains("unsupported") {
        ExecutionErrorKind::UnsupportedRoute
    } else if lower.contains("network") || lower.contains("timeout") || lower.contains("timed out")
    {
        ExecutionErrorKind::Network
    } else if lower.contains("execution failed")
        || lower.contains("transaction reverted")
        || lower.contains("reverted on chain")
    {
        ExecutionErrorKind::ExecutionFailed
    } else if lower.contains("wallet") {
        ExecutionErrorKind::WalletError
    } else {
        ExecutionErrorKind::Unknown
    };

    let (suggested_action, recoverable) = match kind {
        ExecutionErrorKind::UserRejected => {
            ("Approve the request in your wallet to continue", true)
        }
        ExecutionErrorKind::InsufficientBalance => {
            ("Top up your balance or lower the amount", true)
        }
        ExecutionErrorKind::InsufficientGas => {
            ("Add gas funds on the source chain and retry", true)
        }
        ExecutionErrorKind::SlippageExceeded => {
            ("Increase your slippage tolerance or retry with a fresh quote", true)
        }
        ExecutionErrorKind::QuoteExpired => ("Refresh the quote and try again", true),
        ExecutionErrorKind::UnsupportedRoute => {
            ("Try a different token pair or a smaller amount", true)
        }
        ExecutionErrorKind::Network => ("Check your connection and retry", true),
        ExecutionErrorKind::WalletError => ("Reconnect your wallet and retry", true),
        ExecutionErrorKind::ExecutionFailed => {
            ("The transaction failed on-chain; start a new swap", false)
        }
        ExecutionErrorKind::Unknown => {
            ("Retry, and contact support if the problem persists", true)
        }
    };

    ClassifiedError {
        kind,
        message: message.to_string(),
        suggested_action: suggested_action.to_string(),
        recoverable,
    }
}
