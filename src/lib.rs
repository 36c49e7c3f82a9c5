//! swapdeck: swap lifecycle orchestration for a DeFi token-swap product.
//!
//! The crate coordinates everything between "the user typed an amount" and
//! "the swap finished on-chain": form state, debounced quote fetching, quote
//! freshness and staleness, review locking, execution driven by the
//! aggregator's executor, persistence of in-flight runs, and error
//! classification. The wallet, the aggregator's execution engine, and the
//! presentation layer stay behind trait and event seams.

pub mod aggregator;
pub mod amount;
pub mod api;
pub mod config;
pub mod debounce;
pub mod execution;
pub mod form;
pub mod quote;
pub mod refresh;
pub mod session;
pub mod status;
pub mod storage;
pub mod validation;
pub mod wallet;

pub use aggregator::client::HttpQuoteClient;
pub use aggregator::types::{Route, RouteStep};
pub use aggregator::{AggregatorError, ExecutionOptions, QuoteProvider, RouteExecutor};
pub use api::BackendClient;
pub use config::tokens::Token;
pub use config::AppConfig;
pub use execution::errors::{ClassifiedError, ExecutionErrorKind};
pub use execution::status::ExecutionStatus;
pub use execution::{ControllerError, ExecutionController, ExecutionState};
pub use form::SwapForm;
pub use quote::{QuoteError, QuoteFetcher, QuoteView};
pub use session::{SessionError, SessionEvent, SwapSession};
pub use status::SwapStatus;
pub use storage::{PersistedExecution, SwapSettings, SwapStore};
pub use validation::ValidationErrors;
pub use wallet::{ChainSwitchError, WalletError, WalletProvider};
