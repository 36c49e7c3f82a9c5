//! File-backed persistence for the in-flight execution record and the user's
//! swap settings.
//!
//! Records live as JSON files under a per-user directory. Only an execution
//! with an in-flight status is ever written; a record that is malformed,
//! terminal, or older than 24 hours is discarded on load and the file is
//! cleared as a side effect.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::aggregator::types::Route;
use crate::execution::status::ExecutionStatus;
use crate::execution::ExecutionState;

pub const EXECUTION_STATE_FILE: &str = "active_swap.json";
pub const SETTINGS_FILE: &str = "swap_settings.json";
pub const PERSISTED_EXECUTION_MAX_AGE_HOURS: i64 = 24;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("storage io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("storage serialization error: {0}")]
    Serde(#[from] serde_json::Error),
}

/// A deep copy of the execution state, written while a swap is in flight so
/// a restart can offer to resume it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersistedExecution {
    pub route: Route,
    pub status: ExecutionStatus,
    pub start_time: DateTime<Utc>,
    pub last_update: DateTime<Utc>,
}

impl PersistedExecution {
    /// Structural validity beyond what deserialization enforces.
    fn is_well_formed(&self) -> bool {
        !self.route.id.is_empty() && self.status.is_in_flight()
    }

    fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now - self.last_update > Duration::hours(PERSISTED_EXECUTION_MAX_AGE_HOURS)
    }
}

/// User slippage/deadline settings, loaded on startup and saved on every
/// change.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SwapSettings {
    /// Slippage tolerance in percent.
    pub slippage: f64,
    /// Transaction deadline in minutes.
    pub deadline_minutes: u32,
}

impl Default for SwapSettings {
    fn default() -> Self {
        Self {
            slippage: 0.5,
            deadline_minutes: 30,
        }
    }
}

pub struct SwapStore {
    dir: PathBuf,
}

impl SwapStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Per-user storage directory under the home directory.
    pub fn default_dir() -> PathBuf {
        let home = std::env::var("HOME")
            .or_else(|_| std::env::var("USERPROFILE"))
            .unwrap_or_else(|_| ".".to_string());
        Path::new(&home).join(".swapdeck")
    }

    fn ensure_dir(&self) -> Result<(), StorageError> {
        std::fs::create_dir_all(&self.dir)?;
        Ok(())
    }

    fn execution_path(&self) -> PathBuf {
        self.dir.join(EXECUTION_STATE_FILE)
    }

    fn settings_path(&self) -> PathBuf {
        self.dir.join(SETTINGS_FILE)
    }

    pub fn save_execution(&self, record: &PersistedExecution) -> Result<(), StorageError> {
        self.ensure_dir()?;
        let serialized = serde_json::to_string_pretty(record)?;
        std::fs::write(self.execution_path(), serialized)?;
        log::info!(
            "💾 Persisted in-flight execution of route {} ({:?})",
            record.route.id,
            record.status
        );
        Ok(())
    }

    /// Load the persisted execution, discarding (and clearing the file for)
    /// anything malformed, terminal, or older than 24 hours.
    pub fn load_execution(&self) -> Option<PersistedExecution> {
        let path = self.execution_path();
        if !path.exists() {
            return None;
        }
        let data = match std::fs::read_to_string(&path) {
            Ok(data) => data,
            Err(e) => {
                log::error!("❌ Failed to read persisted execution: {}", e);
                return None;
            }
        };
        let record: PersistedExecution = match serde_json::from_str(&data) {
            Ok(record) => record,
            Err(e) => {
                log::error!("❌ Persisted execution is malformed, clearing: {}", e);
                self.clear_execution();
                return None;
            }
        };
        if !record.is_well_formed() {
            log::warn!("Persisted execution failed structural checks, clearing");
            self.clear_execution();
            return None;
        }
        if record.is_expired(Utc::now()) {
            log::info!(
                "Persisted execution of route {} is older than {}h, clearing",
                record.route.id,
                PERSISTED_EXECUTION_MAX_AGE_HOURS
            );
            self.clear_execution();
            return None;
        }
        log::info!("✅ Restored in-flight execution of route {}", record.route.id);
        Some(record)
    }

    pub fn clear_execution(&self) {
        match std::fs::remove_file(self.execution_path()) {
            Ok(_) => log::info!("Cleared persisted execution"),
            Err(e) => {
                if e.kind() != std::io::ErrorKind::NotFound {
                    log::error!("❌ Failed to clear persisted execution: {}", e);
                }
            }
        }
    }

    /// The persistence rule applied on every execution-state change: write a
    /// deep copy while in flight, clear otherwise.
    pub fn sync_execution_state(&self, state: &ExecutionState) {
        if state.status.is_in_flight() {
            if let Some(route) = &state.route {
                let record = PersistedExecution {
                    route: route.clone(),
                    status: state.status,
                    start_time: state.started_at.unwrap_or_else(Utc::now),
                    last_update: Utc::now(),
                };
                if let Err(e) = self.save_execution(&record) {
                    log::error!("❌ Failed to persist execution state: {}", e);
                }
                return;
            }
        }
        self.clear_execution();
    }

    pub fn save_settings(&self, settings: &SwapSettings) -> Result<(), StorageError> {
        self.ensure_dir()?;
        let serialized = serde_json::to_string_pretty(settings)?;
        std::fs::write(self.settings_path(), serialized)?;
        log::info!("✅ Swap settings saved");
        Ok(())
    }

    pub fn load_settings(&self) -> SwapSettings {
        match std::fs::read_to_string(self.settings_path()) {
            Ok(data) => match serde_json::from_str(&data) {
                Ok(settings) => settings,
                Err(e) => {
                    log::error!("❌ Failed to parse swap settings, using defaults: {}", e);
                    SwapSettings::default()
                }
            },
            Err(e) => {
                if e.kind() != std::io::ErrorKind::NotFound {
                    log::error!("❌ Failed to read swap settings: {}", e);
                }
                SwapSettings::default()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::tokens::Token;
    use std::sync::atomic::{AtomicU32, Ordering};

    static DIR_SEQ: AtomicU32 = AtomicU32::new(0);

    fn temp_store() -> SwapStore {
        let dir = std::env::temp_dir().join(format!(
            "swapdeck-test-{}-{}",
            std::process::id(),
            DIR_SEQ.fetch_add(1, Ordering::SeqCst)
        ));
        SwapStore::new(dir)
    }

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

    fn route() -> Route {
        Route {
            id: "route-1".to_string(),
            from_chain_id: 1,
            to_chain_id: 1,
            from_token: token(1, "0xAAA", "ETH"),
            to_token: token(1, "0xBBB", "USDC"),
            from_amount: "1000000000000000000".to_string(),
            to_amount: "1800000000".to_string(),
            to_amount_min: "1791000000".to_string(),
            from_amount_usd: None,
            to_amount_usd: None,
            gas_cost_usd: None,
            steps: Vec::new(),
        }
    }

    fn record(status: ExecutionStatus, last_update: DateTime<Utc>) -> PersistedExecution {
        PersistedExecution {
            route: route(),
            status,
            start_time: last_update,
            last_update,
        }
    }

    #[test]
    fn test_round_trip() {
        let store = temp_store();
        let original = record(ExecutionStatus::Signing, Utc::now());
        store.save_execution(&original).unwrap();
        assert_eq!(store.load_execution(), Some(original));
        store.clear_execution();
        assert_eq!(store.load_execution(), None);
    }

    #[test]
    fn test_expired_record_is_discarded_and_cleared() {
        let store = temp_store();
        let stale = record(ExecutionStatus::Executing, Utc::now() - Duration::hours(25));
        store.save_execution(&stale).unwrap();

        assert_eq!(store.load_execution(), None);
        // The file was cleared as a side effect.
        assert!(!store.execution_path().exists());
    }

    #[test]
    fn test_terminal_record_is_discarded() {
        let store = temp_store();
        let terminal = record(ExecutionStatus::Completed, Utc::now());
        store.save_execution(&terminal).unwrap();
        assert_eq!(store.load_execution(), None);
        assert!(!store.execution_path().exists());
    }

    #[test]
    fn test_malformed_record_is_discarded() {
        let store = temp_store();
        std::fs::create_dir_all(&store.dir).unwrap();
        std::fs::write(store.execution_path(), "{\"not\": \"a record\"}").unwrap();
        assert_eq!(store.load_execution(), None);
        assert!(!store.execution_path().exists());
    }

    #[test]
    fn test_sync_writes_in_flight_and_clears_terminal() {
        let store = temp_store();

        let mut state = ExecutionState {
            status: ExecutionStatus::Approving,
            route: Some(route()),
            ..ExecutionState::default()
        };
        store.sync_execution_state(&state);
        assert!(store.load_execution().is_some());

        state.status = ExecutionStatus::Completed;
        store.sync_execution_state(&state);
        assert!(store.load_execution().is_none());
        assert!(!store.execution_path().exists());
    }

    #[test]
    fn test_settings_default_and_round_trip() {
        let store = temp_store();
        assert_eq!(store.load_settings(), SwapSettings::default());

        let custom = SwapSettings {
            slippage: 1.0,
            deadline_minutes: 10,
        };
        store.save_settings(&custom).unwrap();
        assert_eq!(store.load_settings(), custom);

        std::fs::write(store.settings_path(), "garbage").unwrap();
        assert_eq!(store.load_settings(), SwapSettings::default());
    }
}
