//! Interface to the third-party swap aggregator.
//!
//! Quoting is a plain REST call and implemented here ([`client`]); route
//! execution involves wallet signing and on-chain mechanics that live in the
//! aggregator's own SDK, so it stays behind the [`RouteExecutor`] trait.

pub mod client;
pub mod types;

use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;

use self::types::{QuoteRequest, Route};

#[derive(Debug, Clone, Error)]
pub enum AggregatorError {
    #[error("invalid quote request: {0}")]
    Validation(String),
    #[error("aggregator request failed: {0}")]
    Network(String),
    #[error("aggregator is rate limiting requests")]
    RateLimited { retry_after_secs: Option<u64> },
    #[error("no route available: {0}")]
    NoRoute(String),
    #[error("route execution failed: {0}")]
    Execution(String),
    #[error("unexpected aggregator response: {0}")]
    Unexpected(String),
}

/// Receives route snapshots as the executor makes progress. Each snapshot
/// carries the full route with per-step process statuses filled in.
pub type RouteUpdateHandler = Arc<dyn Fn(Route) + Send + Sync>;

/// Execution tuning passed explicitly with each run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExecutionOptions {
    /// Run without prompting for intermediate confirmations where the
    /// executor supports it.
    pub background: bool,
}

#[async_trait]
pub trait QuoteProvider: Send + Sync {
    async fn fetch_quote(&self, request: &QuoteRequest) -> Result<Route, AggregatorError>;
}

#[async_trait]
pub trait RouteExecutor: Send + Sync {
    /// Start a fresh run of the route. Resolves once the route reaches a
    /// terminal state, streaming snapshots through `on_update` on the way.
    async fn execute_route(
        &self,
        route: Route,
        options: ExecutionOptions,
        on_update: RouteUpdateHandler,
    ) -> Result<Route, AggregatorError>;

    /// Continue a previously interrupted run.
    async fn resume_route(
        &self,
        route: Route,
        options: ExecutionOptions,
        on_update: RouteUpdateHandler,
    ) -> Result<Route, AggregatorError>;

    /// Ask the executor to stop and return the halted route. Cooperative:
    /// transactions already in flight on-chain are not aborted.
    async fn cancel_route(&self, route: Route) -> Result<Route, AggregatorError>;
}
