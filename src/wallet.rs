//! Wallet provider seam and chain-switch verification.
//!
//! The wallet itself (connection transport, RPC, signing) belongs to the
//! host application; the orchestration layer only needs this trait plus a
//! verified chain switch: request, then poll until the wallet actually
//! reports the target chain.

use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WalletError {
    #[error("wallet is not connected")]
    NotConnected,
    #[error("user rejected the request")]
    UserRejected,
    #[error("chain {0} is not supported by the wallet")]
    UnsupportedChain(u64),
    #[error("wallet error: {0}")]
    Other(String),
}

#[async_trait]
pub trait WalletProvider: Send + Sync {
    async fn is_connected(&self) -> bool;
    async fn address(&self) -> Option<String>;
    async fn chain_id(&self) -> Result<u64, WalletError>;
    async fn balance(&self, chain_id: u64, token_address: &str) -> Result<u128, WalletError>;
    async fn disconnect(&self) -> Result<(), WalletError>;
    /// Ask the wallet to switch its active chain. Completion of the request
    /// does not guarantee the switch happened; verify by polling.
    async fn request_chain_switch(&self, chain_id: u64) -> Result<(), WalletError>;
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ChainSwitchError {
    #[error("user rejected the network switch")]
    UserRejected,
    #[error("the wallet does not support chain {0}")]
    UnsupportedChain(u64),
    #[error("timed out waiting for the wallet to switch chains")]
    Timeout,
    #[error("wallet error during chain switch: {0}")]
    Wallet(String),
    #[error("no wallet is connected")]
    NotConnected,
}

pub const CHAIN_SWITCH_POLL_INTERVAL: Duration = Duration::from_millis(100);
pub const CHAIN_SWITCH_TIMEOUT: Duration = Duration::from_secs(5);

/// Request a chain switch and poll the wallet's reported chain id every
/// 100 ms until it matches or the timeout passes.
pub async fn switch_chain_verified(
    provider: &dyn WalletProvider,
    target_chain_id: u64,
    timeout: Duration,
) -> Result<(), ChainSwitchError> {
    if !provider.is_connected().await {
        return Err(ChainSwitchError::NotConnected);
    }

    match provider.request_chain_switch(target_chain_id).await {
        Ok(()) => {}
        Err(WalletError::UserRejected) => return Err(ChainSwitchError::UserRejected),
        Err(WalletError::UnsupportedChain(id)) => {
            return Err(ChainSwitchError::UnsupportedChain(id))
        }
        Err(WalletError::NotConnected) => return Err(ChainSwitchError::NotConnected),
        Err(WalletError::Other(msg)) => return Err(ChainSwitchError::Wallet(msg)),
    }

    let deadline = tokio::time::Instant::now() + timeout;
    loop {
        match provider.chain_id().await {
            Ok(id) if id == target_chain_id => {
                log::info!("Wallet switched to chain {}", target_chain_id);
                return Ok(());
            }
            Ok(_) => {}
            Err(WalletError::NotConnected) => return Err(ChainSwitchError::NotConnected),
            Err(e) => return Err(ChainSwitchError::Wallet(e.to_string())),
        }
        if tokio::time::Instant::now() >= deadline {
            log::warn!(
                "Wallet never reported chain {} within {:?}",
                target_chain_id,
                timeout
            );
            return Err(ChainSwitchError::Timeout);
        }
        tokio::time::sleep(CHAIN_SWITCH_POLL_INTERVAL).await;
    }
}
