//! Execution controller: wraps the aggregator's route executor, derives the
//! coarse status from its progress callbacks, and keeps an observable
//! execution state.

pub mod errors;
pub mod status;

use std::sync::Arc;

use chrono::{DateTime, Utc};
use thiserror::Error;
use tokio::sync::watch;

use crate::aggregator::types::Route;
use crate::aggregator::{AggregatorError, ExecutionOptions, RouteExecutor, RouteUpdateHandler};
use crate::wallet::WalletProvider;
use self::errors::{classify_execution_error, ClassifiedError};
use self::status::{derive_execution_status, derive_progress, ExecutionProgress, ExecutionStatus};

#[derive(Debug, Clone)]
pub struct ExecutionState {
    pub status: ExecutionStatus,
    pub route: Option<Route>,
    pub progress: ExecutionProgress,
    pub error: Option<ClassifiedError>,
    pub started_at: Option<DateTime<Utc>>,
    pub finished_at: Option<DateTime<Utc>>,
}

impl Default for ExecutionState {
    fn default() -> Self {
        Self {
            status: ExecutionStatus::Idle,
            route: None,
            progress: ExecutionProgress::default(),
            error: None,
            started_at: None,
            finished_at: None,
        }
    }
}

#[derive(Debug, Error)]
pub enum ControllerError {
    #[error("no connected wallet is available to sign")]
    NoSigner,
    #[error("an execution is already in flight")]
    Busy,
    #[error("no active execution")]
    NoActiveExecution,
    #[error(transparent)]
    Aggregator(#[from] AggregatorError),
}

pub struct ExecutionController {
    executor: Arc<dyn RouteExecutor>,
    wallet: Arc<dyn WalletProvider>,
    state: Arc<watch::Sender<ExecutionState>>,
}

impl ExecutionController {
    pub fn new(executor: Arc<dyn RouteExecutor>, wallet: Arc<dyn WalletProvider>) -> Self {
        let (tx, _rx) = watch::channel(ExecutionState::default());
        Self {
            executor,
            wallet,
            state: Arc::new(tx),
        }
    }

    /// Observe execution-state changes.
    pub fn subscribe(&self) -> watch::Receiver<ExecutionState> {
        self.state.subscribe()
    }

    pub fn state(&self) -> ExecutionState {
        self.state.borrow().clone()
    }

    /// Start a fresh run. Resolves with the terminal state; progress arrives
    /// through [`subscribe`](Self::subscribe) while it runs.
    pub async fn execute(
        &self,
        route: Route,
        options: ExecutionOptions,
    ) -> Result<ExecutionState, ControllerError> {
        self.ensure_signer().await?;
        if self.state.borrow().status.is_in_flight() {
            return Err(ControllerError::Busy);
        }
        self.begin(&route, Utc::now());
        log::info!("Starting execution of route {}", route.id);
        let result = self
            .executor
            .execute_route(route, options, self.update_handler())
            .await;
        Ok(self.finish(result))
    }

    /// Continue a previously interrupted run, e.g. one restored from the
    /// persisted record after a restart.
    pub async fn resume(
        &self,
        route: Route,
        options: ExecutionOptions,
    ) -> Result<ExecutionState, ControllerError> {
        self.ensure_signer().await?;
        if self.state.borrow().status.is_in_flight() {
            return Err(ControllerError::Busy);
        }
        self.begin(&route, Utc::now());
        log::info!("Resuming execution of route {}", route.id);
        let result = self
            .executor
            .resume_route(route, options, self.update_handler())
            .await;
        Ok(self.finish(result))
    }

    /// Ask the executor to stop. Returns the halted route; the state reflects
    /// whatever intermediate progress the executor reports.
    pub async fn cancel(&self) -> Result<Route, ControllerError> {
        self.ensure_signer().await?;
        let route = self
            .state
            .borrow()
            .route
            .clone()
            .ok_or(ControllerError::NoActiveExecution)?;
        log::info!("Cancelling execution of route {}", route.id);
        let halted = self.executor.cancel_route(route).await?;

        let derived = derive_execution_status(&halted);
        let final_status = if derived.is_terminal() {
            derived
        } else {
            ExecutionStatus::Cancelled
        };
        self.state.send_modify(|state| {
            state.status = final_status;
            state.progress = derive_progress(&halted);
            state.route = Some(halted.clone());
            state.finished_at = Some(Utc::now());
        });
        Ok(halted)
    }

    /// Clear all execution state.
    pub fn reset(&self) {
        self.state.send_modify(|state| *state = ExecutionState::default());
    }

    async fn ensure_signer(&self) -> Result<(), ControllerError> {
        if self.wallet.is_connected().await {
            Ok(())
        } else {
            Err(ControllerError::NoSigner)
        }
    }

    fn begin(&self, route: &Route, now: DateTime<Utc>) {
        let progress = derive_progress(route);
        let route = route.clone();
        self.state.send_modify(|state| {
            *state = ExecutionState {
                status: ExecutionStatus::Executing,
                route: Some(route.clone()),
                progress: progress.clone(),
                error: None,
                started_at: Some(now),
                finished_at: None,
            };
        });
    }

    fn update_handler(&self) -> RouteUpdateHandler {
        let state = Arc::clone(&self.state);
        Arc::new(move |route: Route| {
            let derived = derive_execution_status(&route);
            let progress = derive_progress(&route);
            log::debug!("Execution update for route {}: {:?}", route.id, derived);
            state.send_modify(|state| {
                state.status = derived;
                state.progress = progress.clone();
                state.route = Some(route.clone());
                if derived.is_terminal() && state.finished_at.is_none() {
                    state.finished_at = Some(Utc::now());
                }
            });
        })
    }

    fn finish(&self, result: Result<Route, AggregatorError>) -> ExecutionState {
        match result {
            Ok(route) => {
                let derived = derive_execution_status(&route);
                // An executor that resolved cleanly has finished the route
                // even if the final snapshot lags behind.
                let final_status = if derived.is_terminal() {
                    derived
                } else {
                    ExecutionStatus::Completed
                };
                log::info!("Execution of route {} finished: {:?}", route.id, final_status);
                self.state.send_modify(|state| {
                    state.status = final_status;
                    state.progress = derive_progress(&route);
                    state.route = Some(route.clone());
                    if state.finished_at.is_none() {
                        state.finished_at = Some(Utc::now());
                    }
                });
            }
            Err(e) => {
                let classified = classify_execution_error(&e.to_string());
                log::error!(
                    "Execution failed ({:?}): {}",
                    classified.kind,
                    classified.message
                );
                self.state.send_modify(|state| {
                    state.status = ExecutionStatus::Failed;
                    state.error = Some(classified.clone());
                    state.finished_at = Some(Utc::now());
                });
            }
        }
        self.state.borrow().clone()
    }
}
