//! The single status enum the presentation layer consumes, merged from the
//! manual override, the execution controller, and the quote-loading flags.

use crate::execution::status::ExecutionStatus;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SwapStatus {
    Idle,
    /// A quote fetch is in flight.
    Fetching,
    /// A quote is available and the form is actionable.
    Ready,
    /// Manual override while the user reviews a locked quote.
    Reviewing,
    Approving,
    Signing,
    Executing,
    Confirming,
    Completed,
    Failed,
    Cancelled,
}

/// Precedence: manual override > non-idle execution status > quote-derived
/// status > idle.
pub fn derive_swap_status(
    overridden: Option<SwapStatus>,
    execution: ExecutionStatus,
    quote_loading: bool,
    has_quote: bool,
) -> SwapStatus {
    if let Some(status) = overridden {
        return status;
    }
    match execution {
        ExecutionStatus::Idle => {}
        ExecutionStatus::Approving => return SwapStatus::Approving,
        ExecutionStatus::Signing => return SwapStatus::Signing,
        ExecutionStatus::Executing => return SwapStatus::Executing,
        ExecutionStatus::Confirming => return SwapStatus::Confirming,
        ExecutionStatus::Completed => return SwapStatus::Completed,
        ExecutionStatus::Failed => return SwapStatus::Failed,
        ExecutionStatus::Cancelled => return SwapStatus::Cancelled,
    }
    if quote_loading {
        return SwapStatus::Fetching;
    }
    if has_quote {
        return SwapStatus::Ready;
    }
    SwapStatus::Idle
}

impl SwapStatus {
    pub fn is_loading(&self) -> bool {
        matches!(self, SwapStatus::Fetching)
    }

    pub fn is_reviewing(&self) -> bool {
        matches!(self, SwapStatus::Reviewing)
    }

    pub fn is_executing(&self) -> bool {
        matches!(
            self,
            SwapStatus::Approving
                | SwapStatus::Signing
                | SwapStatus::Executing
                | SwapStatus::Confirming
        )
    }

    pub fn is_completed(&self) -> bool {
        matches!(self, SwapStatus::Completed)
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, SwapStatus::Failed | SwapStatus::Cancelled)
    }

    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            SwapStatus::Completed | SwapStatus::Failed | SwapStatus::Cancelled
        )
    }

    /// Auto-refresh is suspended while reviewing and through every in-flight
    /// execution phase.
    pub fn should_pause_refresh(&self) -> bool {
        self.is_reviewing() || self.is_executing()
    }
}
