//! The swap session: top-level orchestrator wiring form state, debounced
//! quoting, the refresh timer, review locking, execution, and persistence
//! behind one API.
//!
//! State lives in owned structs guarded by mutexes; changes are broadcast as
//! [`SessionEvent`]s over an unbounded channel the presentation layer
//! consumes. Construction spawns the driver tasks, so a session must be
//! created inside a tokio runtime.

use std::sync::{Arc, Mutex, Weak};
use std::time::Duration;

use thiserror::Error;
use tokio::sync::mpsc;

use crate::aggregator::types::Route;
use crate::aggregator::{ExecutionOptions, QuoteProvider, RouteExecutor};
use crate::config::tokens::{self, Token};
use crate::config::AppConfig;
use crate::debounce::Debouncer;
use crate::execution::errors::ClassifiedError;
use crate::execution::status::ExecutionStatus;
use crate::execution::{ControllerError, ExecutionController, ExecutionState};
use crate::form::SwapForm;
use crate::quote::{QuoteError, QuoteFetcher, QuoteView};
use crate::refresh::RefreshTimer;
use crate::status::{derive_swap_status, SwapStatus};
use crate::storage::{PersistedExecution, SwapSettings, SwapStore};
use crate::validation::{self, ValidationErrors};
use crate::wallet::WalletProvider;

#[derive(Debug, Clone)]
pub enum SessionEvent {
    /// Any user edit to the form.
    FormChanged,
    QuoteUpdated(QuoteView),
    QuoteCleared,
    QuoteFailed(QuoteError),
    StatusChanged(SwapStatus),
    /// The user locked the current quote and entered review.
    ReviewOpened,
    /// Review state was cleared; close the review modal if open.
    ReviewDismissed,
    /// An execution view should open.
    ExecutionOpened,
    ExecutionUpdated(ExecutionState),
    /// Execution finished; carries a clone of the resulting route.
    ExecutionSucceeded(Route),
    ExecutionFailed(ClassifiedError),
    /// A fresh persisted execution was found on startup.
    ResumeAvailable(PersistedExecution),
}

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("no quote available")]
    NoQuote,
    #[error("nothing to resume")]
    NothingToResume,
    #[error("an execution is already in flight")]
    ExecutionInFlight,
    #[error(transparent)]
    Controller(#[from] ControllerError),
}

enum Command {
    FetchQuote,
    Refresh,
}

pub struct SwapSession {
    config: AppConfig,
    form: Mutex<SwapForm>,
    catalog: Mutex<Vec<Token>>,
    settings: Mutex<SwapSettings>,
    fetcher: QuoteFetcher,
    timer: RefreshTimer,
    controller: Arc<ExecutionController>,
    store: Arc<SwapStore>,
    wallet: Arc<dyn WalletProvider>,
    quote: Mutex<Option<QuoteView>>,
    quote_loading: Mutex<bool>,
    locked_route: Mutex<Option<Route>>,
    manual_status: Mutex<Option<SwapStatus>>,
    last_status: Mutex<Option<SwapStatus>>,
    debouncer: Debouncer<String>,
    commands: mpsc::UnboundedSender<Command>,
    events: mpsc::UnboundedSender<SessionEvent>,
}

impl SwapSession {
    /// Build a session and start its driver tasks. Returns the session and
    /// the event stream for the presentation layer.
    pub fn new(
        config: AppConfig,
        provider: Arc<dyn QuoteProvider>,
        executor: Arc<dyn RouteExecutor>,
        wallet: Arc<dyn WalletProvider>,
        store: SwapStore,
    ) -> (Arc<Self>, mpsc::UnboundedReceiver<SessionEvent>) {
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        let (commands_tx, commands_rx) = mpsc::unbounded_channel();

        let settings = store.load_settings();
        let fetcher = QuoteFetcher::new(provider, config.integrator_id.clone());
        let controller = Arc::new(ExecutionController::new(executor, Arc::clone(&wallet)));
        let timer = RefreshTimer::new(config.quote_refresh_secs, config.quote_stale_secs);
        let debouncer = {
            let commands = commands_tx.clone();
            Debouncer::new(Duration::from_millis(config.debounce_ms), move |_: String| {
                let _ = commands.send(Command::FetchQuote);
            })
        };

        let session = Arc::new(Self {
            config,
            form: Mutex::new(SwapForm::new()),
            catalog: Mutex::new(tokens::default_catalog().to_vec()),
            settings: Mutex::new(settings),
            fetcher,
            timer,
            controller,
            store: Arc::new(store),
            wallet,
            quote: Mutex::new(None),
            quote_loading: Mutex::new(false),
            locked_route: Mutex::new(None),
            manual_status: Mutex::new(None),
            last_status: Mutex::new(None),
            debouncer,
            commands: commands_tx.clone(),
            events: events_tx,
        });

        session.timer.start({
            let commands = commands_tx;
            move || {
                let _ = commands.send(Command::Refresh);
            }
        });

        tokio::spawn(Self::drive_commands(Arc::downgrade(&session), commands_rx));
        tokio::spawn(Self::observe_execution(
            Arc::downgrade(&session),
            session.controller.subscribe(),
        ));

        // A fresh in-flight record from a previous run can be resumed.
        if let Some(record) = session.store.load_execution() {
            session.emit(SessionEvent::ResumeAvailable(record));
        }

        (session, events_rx)
    }

    async fn drive_commands(
        session: Weak<SwapSession>,
        mut commands: mpsc::UnboundedReceiver<Command>,
    ) {
        while let Some(command) = commands.recv().await {
            let Some(session) = session.upgrade() else {
                break;
            };
            match command {
                Command::FetchQuote => session.run_quote_fetch(false).await,
                Command::Refresh => session.run_quote_fetch(true).await,
            }
        }
    }

    async fn observe_execution(
        session: Weak<SwapSession>,
        mut updates: tokio::sync::watch::Receiver<ExecutionState>,
    ) {
        while updates.changed().await.is_ok() {
            let Some(session) = session.upgrade() else {
                break;
            };
            let state = updates.borrow().clone();
            session.on_execution_change(state);
        }
    }

    // ── Form edits ────────────────────────────────────────────────────────

    pub fn set_from_token(&self, token: Option<Token>) {
        self.form.lock().unwrap().set_from_token(token);
        self.on_form_edited();
        self.clear_quote();
        self.request_quote();
    }

    pub fn set_to_token(&self, token: Option<Token>) {
        self.form.lock().unwrap().set_to_token(token);
        self.on_form_edited();
        self.clear_quote();
        self.request_quote();
    }

    pub fn set_amount(&self, value: impl Into<String>) {
        let value = value.into();
        self.form.lock().unwrap().set_from_amount(value.clone());
        self.on_form_edited();
        self.clear_quote();
        self.debouncer.update(value);
    }

    pub fn switch_tokens(&self) {
        self.form.lock().unwrap().switch();
        self.on_form_edited();
        self.clear_quote();
        self.request_quote();
    }

    pub fn reset_form(&self) {
        self.form.lock().unwrap().reset();
        self.debouncer.cancel();
        self.on_form_edited();
        self.clear_quote();
    }

    /// Any form edit clears active review state and closes a review modal.
    fn on_form_edited(&self) {
        let was_reviewing = {
            let mut manual = self.manual_status.lock().unwrap();
            let mut locked = self.locked_route.lock().unwrap();
            let was = manual.is_some() || locked.is_some();
            *manual = None;
            *locked = None;
            was
        };
        if was_reviewing {
            self.emit(SessionEvent::ReviewDismissed);
        }
        self.emit(SessionEvent::FormChanged);
        self.sync_refresh_pause();
        self.emit_status();
    }

    fn clear_quote(&self) {
        let had_quote = self.quote.lock().unwrap().take().is_some();
        self.form.lock().unwrap().set_to_amount("");
        if had_quote {
            self.emit(SessionEvent::QuoteCleared);
            self.emit_status();
        }
    }

    fn request_quote(&self) {
        let _ = self.commands.send(Command::FetchQuote);
    }

    /// Kick a refresh outside the countdown (e.g. a refresh button).
    pub fn refresh_now(&self) {
        let _ = self.commands.send(Command::Refresh);
    }

    // ── Quote pipeline ────────────────────────────────────────────────────

    async fn run_quote_fetch(&self, fresh: bool) {
        let (from, to, amount) = {
            let form = self.form.lock().unwrap();
            (
                form.from_token().cloned(),
                form.to_token().cloned(),
                form.from_amount().to_string(),
            )
        };
        let (Some(from), Some(to)) = (from, to) else {
            self.timer.refresh_finished();
            return;
        };
        // Gate: no fetching while reviewing or executing.
        let enabled = !self.status().should_pause_refresh();
        let slippage = self.settings.lock().unwrap().slippage;
        let from_address = self.wallet.address().await.unwrap_or_default();

        *self.quote_loading.lock().unwrap() = true;
        self.emit_status();

        let result = if fresh {
            self.fetcher
                .fetch_fresh(&from, &to, &amount, slippage, &from_address, None, enabled)
                .await
        } else {
            self.fetcher
                .fetch(&from, &to, &amount, slippage, &from_address, None, enabled)
                .await
        };

        *self.quote_loading.lock().unwrap() = false;

        match result {
            Ok(Some(view)) => {
                *self.quote.lock().unwrap() = Some(view.clone());
                // Mirror the derived output amount into the form.
                self.form
                    .lock()
                    .unwrap()
                    .set_to_amount(view.to_amount_display.clone());
                // Fresh quote timestamp observed: restart countdown and
                // staleness clock.
                self.timer.mark_refreshed();
                self.emit(SessionEvent::QuoteUpdated(view));
            }
            Ok(None) => {
                self.timer.refresh_finished();
                let had_quote = self.quote.lock().unwrap().take().is_some();
                if had_quote {
                    self.form.lock().unwrap().set_to_amount("");
                    self.emit(SessionEvent::QuoteCleared);
                }
            }
            Err(error) => {
                self.timer.refresh_finished();
                if let QuoteError::RateLimited {
                    retry_after_secs: Some(secs),
                } = &error
                {
                    // Re-fetch automatically once the throttle window passes.
                    let commands = self.commands.clone();
                    let delay = Duration::from_secs(*secs);
                    tokio::spawn(async move {
                        tokio::time::sleep(delay).await;
                        let _ = commands.send(Command::FetchQuote);
                    });
                }
                log::warn!("Quote fetch failed: {}", error);
                self.emit(SessionEvent::QuoteFailed(error));
            }
        }
        self.sync_refresh_pause();
        self.emit_status();
    }

    // ── Review & execution ────────────────────────────────────────────────

    /// Snapshot the current quote into a locked route and enter review.
    /// The lock is a deep copy, so later refreshes cannot mutate what the
    /// review modal shows.
    pub fn begin_review(&self) -> Result<(), SessionError> {
        let route = {
            let quote = self.quote.lock().unwrap();
            quote.as_ref().map(|q| q.route.clone())
        }
        .ok_or(SessionError::NoQuote)?;

        *self.locked_route.lock().unwrap() = Some(route);
        *self.manual_status.lock().unwrap() = Some(SwapStatus::Reviewing);
        self.emit(SessionEvent::ReviewOpened);
        self.sync_refresh_pause();
        self.emit_status();
        Ok(())
    }

    pub fn cancel_review(&self) {
        *self.locked_route.lock().unwrap() = None;
        *self.manual_status.lock().unwrap() = None;
        self.emit(SessionEvent::ReviewDismissed);
        self.sync_refresh_pause();
        self.emit_status();
    }

    /// Hand the locked route (or the live quote when no lock exists) to the
    /// execution controller. Resolves when the run reaches a terminal state.
    pub async fn confirm(&self, options: ExecutionOptions) -> Result<(), SessionError> {
        if self.controller.state().status.is_in_flight() {
            return Err(SessionError::ExecutionInFlight);
        }
        let route = {
            let locked = self.locked_route.lock().unwrap();
            locked.clone()
        }
        .or_else(|| {
            let quote = self.quote.lock().unwrap();
            quote.as_ref().map(|q| q.route.clone())
        })
        .ok_or(SessionError::NoQuote)?;

        *self.manual_status.lock().unwrap() = None;
        self.emit(SessionEvent::ExecutionOpened);
        self.controller.execute(route, options).await?;
        Ok(())
    }

    /// Resume the persisted in-flight execution from a previous run.
    pub async fn resume_persisted(&self, options: ExecutionOptions) -> Result<(), SessionError> {
        let record = self
            .store
            .load_execution()
            .ok_or(SessionError::NothingToResume)?;
        self.emit(SessionEvent::ExecutionOpened);
        self.controller.resume(record.route, options).await?;
        Ok(())
    }

    pub async fn cancel_execution(&self) -> Result<Route, SessionError> {
        Ok(self.controller.cancel().await?)
    }

    /// Clear terminal execution state so the form is ready for a new swap.
    pub fn reset_execution(&self) {
        self.controller.reset();
    }

    /// Applied on every execution-state change.
    fn on_execution_change(&self, state: ExecutionState) {
        self.store.sync_execution_state(&state);
        self.emit(SessionEvent::ExecutionUpdated(state.clone()));

        match state.status {
            ExecutionStatus::Completed => {
                if let Some(route) = &state.route {
                    self.emit(SessionEvent::ExecutionSucceeded(route.clone()));
                }
                // Reset approval/review sub-state for the next swap.
                *self.locked_route.lock().unwrap() = None;
                *self.manual_status.lock().unwrap() = None;
            }
            ExecutionStatus::Failed => {
                if let Some(error) = &state.error {
                    self.emit(SessionEvent::ExecutionFailed(error.clone()));
                }
            }
            _ => {}
        }

        self.sync_refresh_pause();
        self.emit_status();
    }

    // ── Derived state & accessors ─────────────────────────────────────────

    pub fn status(&self) -> SwapStatus {
        let overridden = *self.manual_status.lock().unwrap();
        let execution = self.controller.state().status;
        let quote_loading = *self.quote_loading.lock().unwrap();
        let has_quote = self.quote.lock().unwrap().is_some();
        derive_swap_status(overridden, execution, quote_loading, has_quote)
    }

    fn sync_refresh_pause(&self) {
        if self.status().should_pause_refresh() {
            self.timer.pause();
        } else {
            self.timer.resume();
        }
    }

    pub fn form(&self) -> SwapForm {
        self.form.lock().unwrap().clone()
    }

    pub fn quote(&self) -> Option<QuoteView> {
        self.quote.lock().unwrap().clone()
    }

    pub fn execution(&self) -> ExecutionState {
        self.controller.state()
    }

    pub fn validation(&self) -> ValidationErrors {
        validation::validate_form(&self.form.lock().unwrap())
    }

    pub fn can_submit(&self) -> bool {
        self.validation().is_valid()
    }

    pub fn is_quote_stale(&self) -> bool {
        self.timer.is_stale()
    }

    pub fn seconds_until_refresh(&self) -> u64 {
        self.timer.remaining_secs()
    }

    pub fn settings(&self) -> SwapSettings {
        *self.settings.lock().unwrap()
    }

    /// Update settings; saved on every change.
    pub fn set_settings(&self, settings: SwapSettings) {
        *self.settings.lock().unwrap() = settings;
        if let Err(e) = self.store.save_settings(&settings) {
            log::error!("Failed to save swap settings: {}", e);
        }
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn catalog(&self) -> Vec<Token> {
        self.catalog.lock().unwrap().clone()
    }

    /// Replace the embedded catalog, e.g. with the backend listing.
    pub fn set_catalog(&self, tokens: Vec<Token>) {
        *self.catalog.lock().unwrap() = tokens;
    }

    pub fn selectable_from(&self) -> Vec<Token> {
        let catalog = self.catalog.lock().unwrap();
        self.form
            .lock()
            .unwrap()
            .selectable_from(&catalog)
            .into_iter()
            .cloned()
            .collect()
    }

    pub fn selectable_to(&self) -> Vec<Token> {
        let catalog = self.catalog.lock().unwrap();
        self.form
            .lock()
            .unwrap()
            .selectable_to(&catalog)
            .into_iter()
            .cloned()
            .collect()
    }

    fn emit(&self, event: SessionEvent) {
        let _ = self.events.send(event);
    }

    /// Emit StatusChanged only on actual transitions.
    fn emit_status(&self) {
        let status = self.status();
        let mut last = self.last_status.lock().unwrap();
        if *last != Some(status) {
            *last = Some(status);
            let _ = self.events.send(SessionEvent::StatusChanged(status));
        }
    }
}

impl Drop for SwapSession {
    fn drop(&mut self) {
        self.timer.stop();
        self.debouncer.cancel();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregator::types::{
        Process, ProcessStatus, ProcessType, QuoteRequest, RouteStep, StepExecution,
    };
    use crate::aggregator::{AggregatorError, RouteUpdateHandler};
    use crate::execution::errors::ExecutionErrorKind;
    use crate::wallet::WalletError;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicU32, AtomicUsize, Ordering};

    fn token(chain_id: u64, address: &str, symbol: &str, decimals: u8) -> Token {
        Token {
            chain_id,
            address: address.to_string(),
            symbol: symbol.to_string(),
            name: symbol.to_string(),
            decimals,
            logo_uri: None,
            price_usd: None,
        }
    }

    fn eth() -> Token {
        token(1, "0xAAA", "ETH", 18)
    }

    fn usdc() -> Token {
        token(1, "0xBBB", "USDC", 6)
    }

    struct CountingProvider {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl QuoteProvider for CountingProvider {
        async fn fetch_quote(&self, request: &QuoteRequest) -> Result<Route, AggregatorError> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(Route {
                id: format!("route-{}", call),
                from_chain_id: request.from_chain_id,
                to_chain_id: request.to_chain_id,
                from_token: eth(),
                to_token: usdc(),
                from_amount: request.from_amount.clone(),
                to_amount: "2700000000".to_string(),
                to_amount_min: "2686000000".to_string(),
                from_amount_usd: Some("2700.0".to_string()),
                to_amount_usd: Some("2695.0".to_string()),
                gas_cost_usd: Some("3.1".to_string()),
                steps: vec![RouteStep {
                    id: "step-1".to_string(),
                    tool: "uniswap".to_string(),
                    tool_name: None,
                    estimated_duration_secs: 30,
                    gas_cost_usd: None,
                    execution: None,
                }],
            })
        }
    }

    /// Executor scripted per-test via a behavior enum.
    enum ExecutorBehavior {
        Succeed,
        RejectSigning,
    }

    struct TestExecutor {
        behavior: ExecutorBehavior,
    }

    fn executed_route(mut route: Route, status: ProcessStatus) -> Route {
        route.steps[0].execution = Some(StepExecution {
            status: if status == ProcessStatus::Done {
                ProcessStatus::Done
            } else {
                ProcessStatus::Pending
            },
            process: vec![Process {
                process_type: ProcessType::Transaction,
                status,
                tx_hash: Some("0xHASH".to_string()),
                chain_id: Some(1),
                message: None,
                error: None,
            }],
        });
        route
    }

    #[async_trait]
    impl RouteExecutor for TestExecutor {
        async fn execute_route(
            &self,
            route: Route,
            _options: ExecutionOptions,
            on_update: RouteUpdateHandler,
        ) -> Result<Route, AggregatorError> {
            match self.behavior {
                ExecutorBehavior::Succeed => {
                    on_update(executed_route(route.clone(), ProcessStatus::Started));
                    let done = executed_route(route, ProcessStatus::Done);
                    on_update(done.clone());
                    Ok(done)
                }
                ExecutorBehavior::RejectSigning => {
                    on_update(executed_route(route, ProcessStatus::ActionRequired));
                    Err(AggregatorError::Execution(
                        "User rejected the request".to_string(),
                    ))
                }
            }
        }

        async fn resume_route(
            &self,
            route: Route,
            options: ExecutionOptions,
            on_update: RouteUpdateHandler,
        ) -> Result<Route, AggregatorError> {
            self.execute_route(route, options, on_update).await
        }

        async fn cancel_route(&self, route: Route) -> Result<Route, AggregatorError> {
            Ok(route)
        }
    }

    struct TestWallet;

    #[async_trait]
    impl WalletProvider for TestWallet {
        async fn is_connected(&self) -> bool {
            true
        }
        async fn address(&self) -> Option<String> {
            Some("0xME".to_string())
        }
        async fn chain_id(&self) -> Result<u64, WalletError> {
            Ok(1)
        }
        async fn balance(&self, _chain_id: u64, _token: &str) -> Result<u128, WalletError> {
            Ok(u128::MAX)
        }
        async fn disconnect(&self) -> Result<(), WalletError> {
            Ok(())
        }
        async fn request_chain_switch(&self, _chain_id: u64) -> Result<(), WalletError> {
            Ok(())
        }
    }

    static STORE_SEQ: AtomicU32 = AtomicU32::new(0);

    fn temp_store() -> SwapStore {
        SwapStore::new(std::env::temp_dir().join(format!(
            "swapdeck-session-test-{}-{}",
            std::process::id(),
            STORE_SEQ.fetch_add(1, Ordering::SeqCst)
        )))
    }

    fn session_with(
        behavior: ExecutorBehavior,
    ) -> (
        Arc<SwapSession>,
        mpsc::UnboundedReceiver<SessionEvent>,
        Arc<CountingProvider>,
    ) {
        let provider = Arc::new(CountingProvider {
            calls: AtomicUsize::new(0),
        });
        let (session, events) = SwapSession::new(
            AppConfig::default(),
            Arc::clone(&provider) as Arc<dyn QuoteProvider>,
            Arc::new(TestExecutor { behavior }) as Arc<dyn RouteExecutor>,
            Arc::new(TestWallet) as Arc<dyn WalletProvider>,
            temp_store(),
        );
        (session, events, provider)
    }

    async fn wait_for(
        events: &mut mpsc::UnboundedReceiver<SessionEvent>,
        mut predicate: impl FnMut(&SessionEvent) -> bool,
    ) -> SessionEvent {
        loop {
            let event = tokio::time::timeout(Duration::from_secs(120), events.recv())
                .await
                .expect("timed out waiting for session event")
                .expect("event channel closed");
            if predicate(&event) {
                return event;
            }
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_typed_amount_debounces_quotes_and_auto_refreshes_once() {
        let (session, mut events, provider) = session_with(ExecutorBehavior::Succeed);

        session.set_from_token(Some(eth()));
        session.set_to_token(Some(usdc()));
        // Rapid typing: only the settled value should fetch.
        session.set_amount("1");
        session.set_amount("1.");
        session.set_amount("1.5");

        let event = wait_for(&mut events, |e| matches!(e, SessionEvent::QuoteUpdated(_))).await;
        let SessionEvent::QuoteUpdated(view) = event else {
            unreachable!()
        };
        assert_eq!(view.to_amount_display, "2700.0");
        assert_eq!(view.to_amount_usd, Some(2695.0));
        assert_eq!(provider.calls.load(Ordering::SeqCst), 1);
        // The derived output amount was mirrored into the form.
        assert_eq!(session.form().to_amount(), "2700.0");
        assert_eq!(session.status(), SwapStatus::Ready);

        // Thirty seconds with no user action: the next provider hit is the
        // automatic refresh (interim QuoteUpdated events come from the dedup
        // cache and don't reach the provider).
        loop {
            wait_for(&mut events, |e| matches!(e, SessionEvent::QuoteUpdated(_))).await;
            if provider.calls.load(Ordering::SeqCst) >= 2 {
                break;
            }
        }
        assert_eq!(provider.calls.load(Ordering::SeqCst), 2);
        assert!(session.seconds_until_refresh() > 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_review_pauses_refresh_and_form_edit_clears_it() {
        let (session, mut events, _provider) = session_with(ExecutorBehavior::Succeed);

        session.set_from_token(Some(eth()));
        session.set_to_token(Some(usdc()));
        session.set_amount("1.5");
        wait_for(&mut events, |e| matches!(e, SessionEvent::QuoteUpdated(_))).await;

        session.begin_review().unwrap();
        assert_eq!(session.status(), SwapStatus::Reviewing);
        assert!(session.timer.is_paused());
        wait_for(&mut events, |e| matches!(e, SessionEvent::ReviewOpened)).await;

        // Editing the amount dismisses the review and resumes refresh.
        session.set_amount("2.0");
        wait_for(&mut events, |e| matches!(e, SessionEvent::ReviewDismissed)).await;
        assert_ne!(session.status(), SwapStatus::Reviewing);
        assert!(!session.timer.is_paused());
    }

    #[tokio::test(start_paused = true)]
    async fn test_confirm_executes_locked_route_and_succeeds() {
        let (session, mut events, _provider) = session_with(ExecutorBehavior::Succeed);

        session.set_from_token(Some(eth()));
        session.set_to_token(Some(usdc()));
        session.set_amount("1.5");
        wait_for(&mut events, |e| matches!(e, SessionEvent::QuoteUpdated(_))).await;

        session.begin_review().unwrap();
        session.confirm(ExecutionOptions::default()).await.unwrap();

        let event = wait_for(&mut events, |e| {
            matches!(e, SessionEvent::ExecutionSucceeded(_))
        })
        .await;
        let SessionEvent::ExecutionSucceeded(route) = event else {
            unreachable!()
        };
        assert!(!route.id.is_empty());
        assert_eq!(session.execution().status, ExecutionStatus::Completed);
        // Terminal state cleared the persisted record.
        assert!(session.store.load_execution().is_none());
        // Review sub-state was reset.
        assert!(session.locked_route.lock().unwrap().is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_wallet_rejection_surfaces_classified_error() {
        let (session, mut events, _provider) = session_with(ExecutorBehavior::RejectSigning);

        session.set_from_token(Some(eth()));
        session.set_to_token(Some(usdc()));
        session.set_amount("1.5");
        wait_for(&mut events, |e| matches!(e, SessionEvent::QuoteUpdated(_))).await;

        session.confirm(ExecutionOptions::default()).await.unwrap();

        let event = wait_for(&mut events, |e| {
            matches!(e, SessionEvent::ExecutionFailed(_))
        })
        .await;
        let SessionEvent::ExecutionFailed(error) = event else {
            unreachable!()
        };
        assert_eq!(error.kind, ExecutionErrorKind::UserRejected);
        assert!(error.recoverable);
        assert_eq!(session.status(), SwapStatus::Failed);
    }

    #[tokio::test(start_paused = true)]
    async fn test_switch_swaps_pairs_and_clears_quote() {
        let (session, mut events, _provider) = session_with(ExecutorBehavior::Succeed);

        session.set_from_token(Some(eth()));
        session.set_to_token(Some(usdc()));
        session.set_amount("1.5");
        wait_for(&mut events, |e| matches!(e, SessionEvent::QuoteUpdated(_))).await;

        session.switch_tokens();
        let form = session.form();
        assert_eq!(form.from_token().unwrap().symbol, "USDC");
        assert_eq!(form.to_token().unwrap().symbol, "ETH");
        assert!(session.quote().is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_selectable_lists_exclude_opposite_side() {
        let (session, _events, _provider) = session_with(ExecutorBehavior::Succeed);
        let catalog = session.catalog();
        session.set_from_token(Some(catalog[0].clone()));

        let selectable = session.selectable_to();
        assert!(selectable.iter().all(|t| !t.is_same(&catalog[0])));
        assert_eq!(selectable.len(), catalog.len() - 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_settings_are_saved_on_change() {
        let (session, _events, _provider) = session_with(ExecutorBehavior::Succeed);
        let custom = SwapSettings {
            slippage: 1.0,
            deadline_minutes: 15,
        };
        session.set_settings(custom);
        assert_eq!(session.store.load_settings(), custom);
        assert_eq!(session.settings(), custom);
    }
}
