//! Quote freshness: a one-second refresh countdown plus an independent
//! staleness clock.
//!
//! The tick logic is a pure state struct so every property (single fire per
//! cycle, pause continuity, staleness) is testable without a runtime; the
//! tokio loop underneath is a thin driver.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::task::JoinHandle;

pub const DEFAULT_REFRESH_INTERVAL_SECS: u64 = 30;
pub const DEFAULT_STALE_AFTER_SECS: u64 = 45;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickAction {
    None,
    /// The countdown reached zero and a refresh should run.
    Fire,
}

#[derive(Debug, Clone)]
pub struct CountdownState {
    interval_secs: u64,
    stale_after_secs: u64,
    remaining_secs: u64,
    paused: bool,
    /// True while a fired refresh has not reported back; blocks re-fire.
    refreshing: bool,
    secs_since_refresh: u64,
}

impl CountdownState {
    pub fn new(interval_secs: u64, stale_after_secs: u64) -> Self {
        Self {
            interval_secs,
            stale_after_secs,
            remaining_secs: interval_secs,
            paused: false,
            refreshing: false,
            secs_since_refresh: 0,
        }
    }

    /// Advance one second. Staleness accrues even while paused; the
    /// countdown itself freezes.
    pub fn tick(&mut self) -> TickAction {
        self.secs_since_refresh = self.secs_since_refresh.saturating_add(1);

        if self.paused {
            return TickAction::None;
        }

        if self.remaining_secs > 0 {
            self.remaining_secs -= 1;
        }
        if self.remaining_secs == 0 {
            // Restart regardless of what the refresh ends up doing.
            self.remaining_secs = self.interval_secs;
            if !self.refreshing {
                self.refreshing = true;
                return TickAction::Fire;
            }
        }
        TickAction::None
    }

    /// Freeze the countdown without resetting it.
    pub fn pause(&mut self) {
        self.paused = true;
    }

    /// Continue from where the countdown left off.
    pub fn resume(&mut self) {
        self.paused = false;
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    /// A successful update landed: restart the countdown and clear both the
    /// staleness clock and the in-flight guard.
    pub fn mark_refreshed(&mut self) {
        self.secs_since_refresh = 0;
        self.remaining_secs = self.interval_secs;
        self.refreshing = false;
    }

    /// A refresh attempt finished without producing a fresh quote.
    pub fn refresh_finished(&mut self) {
        self.refreshing = false;
    }

    pub fn is_stale(&self) -> bool {
        self.secs_since_refresh >= self.stale_after_secs
    }

    pub fn remaining_secs(&self) -> u64 {
        self.remaining_secs
    }
}

/// Drives a [`CountdownState`] on a one-second tokio interval and invokes the
/// refresh callback on every fire.
pub struct RefreshTimer {
    state: Arc<Mutex<CountdownState>>,
    task: Mutex<Option<JoinHandle<()>>>,
}

impl RefreshTimer {
    pub fn new(interval_secs: u64, stale_after_secs: u64) -> Self {
        Self {
            state: Arc::new(Mutex::new(CountdownState::new(interval_secs, stale_after_secs))),
            task: Mutex::new(None),
        }
    }

    /// Start ticking. Replaces any previous driver task.
    pub fn start(&self, on_refresh: impl Fn() + Send + Sync + 'static) {
        let state = Arc::clone(&self.state);
        let mut slot = self.task.lock().unwrap();
        if let Some(previous) = slot.take() {
            previous.abort();
        }
        *slot = Some(tokio::spawn(async move {
            let period = Duration::from_secs(1);
            let mut interval = tokio::time::interval_at(tokio::time::Instant::now() + period, period);
            interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            loop {
                interval.tick().await;
                let action = state.lock().unwrap().tick();
                if action == TickAction::Fire {
                    log::debug!("Quote refresh countdown fired");
                    on_refresh();
                }
            }
        }));
    }

    pub fn stop(&self) {
        if let Some(task) = self.task.lock().unwrap().take() {
            task.abort();
        }
    }

    pub fn pause(&self) {
        self.state.lock().unwrap().pause();
    }

    pub fn resume(&self) {
        self.state.lock().unwrap().resume();
    }

    pub fn is_paused(&self) -> bool {
        self.state.lock().unwrap().is_paused()
    }

    pub fn mark_refreshed(&self) {
        self.state.lock().unwrap().mark_refreshed();
    }

    pub fn refresh_finished(&self) {
        self.state.lock().unwrap().refresh_finished();
    }

    pub fn is_stale(&self) -> bool {
        self.state.lock().unwrap().is_stale()
    }

    pub fn remaining_secs(&self) -> u64 {
        self.state.lock().unwrap().remaining_secs()
    }
}

impl Drop for RefreshTimer {
    fn drop(&mut self) {
        if let Some(task) = self.task.lock().unwrap().take() {
            task.abort();
        }
    }
}
