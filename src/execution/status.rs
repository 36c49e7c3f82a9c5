//! Pure derivation of the coarse execution status and progress from a route
//! snapshot. No side effects here; the controller feeds snapshots in.

use serde::{Deserialize, Serialize};

use crate::aggregator::types::{ProcessStatus, ProcessType, Route};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ExecutionStatus {
    Idle,
    Executing,
    Approving,
    Signing,
    Confirming,
    Completed,
    Failed,
    Cancelled,
}

impl ExecutionStatus {
    pub fn is_in_flight(&self) -> bool {
        matches!(
            self,
            ExecutionStatus::Approving
                | ExecutionStatus::Signing
                | ExecutionStatus::Executing
                | ExecutionStatus::Confirming
        )
    }

    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            ExecutionStatus::Completed | ExecutionStatus::Failed | ExecutionStatus::Cancelled
        )
    }
}

/// Derive the coarse status from the route's sub-process list.
///
/// Precedence, top to bottom: failed > cancelled > completed > approving >
/// signing > confirming > executing, with a final Executing fallback. The
/// fallback duplicates the arm above it on purpose; the documented
/// precedence ends with an explicit default and we keep it verbatim.
pub fn derive_execution_status(route: &Route) -> ExecutionStatus {
    let processes: Vec<_> = route.processes().collect();

    if processes.iter().any(|p| p.status == ProcessStatus::Failed) {
        return ExecutionStatus::Failed;
    }
    if processes.iter().any(|p| p.status == ProcessStatus::Cancelled) {
        return ExecutionStatus::Cancelled;
    }
    if !route.steps.is_empty() && route.steps.iter().all(|s| s.is_done()) {
        return ExecutionStatus::Completed;
    }
    if processes
        .iter()
        .any(|p| p.process_type == ProcessType::TokenAllowance && p.status.is_outstanding())
    {
        return ExecutionStatus::Approving;
    }
    if processes
        .iter()
        .any(|p| p.status == ProcessStatus::ActionRequired)
    {
        return ExecutionStatus::Signing;
    }
    if processes.iter().any(|p| {
        p.process_type == ProcessType::ReceivingChain
            && matches!(p.status, ProcessStatus::Started | ProcessStatus::Pending)
    }) {
        return ExecutionStatus::Confirming;
    }
    if processes
        .iter()
        .any(|p| matches!(p.status, ProcessStatus::Started | ProcessStatus::Pending))
    {
        return ExecutionStatus::Executing;
    }
    ExecutionStatus::Executing
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TransactionStatus {
    Pending,
    Confirmed,
    Failed,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionRecord {
    pub tx_hash: String,
    pub chain_id: Option<u64>,
    pub status: TransactionStatus,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecutionProgress {
    /// Index of the step currently running; equals `total_steps` once done.
    pub current_step: usize,
    pub total_steps: usize,
    pub step_labels: Vec<String>,
    /// Flattened, deduplicated transactions across all steps.
    pub transactions: Vec<TransactionRecord>,
    /// Sum of the estimates of steps not yet done.
    pub estimated_secs_remaining: u64,
}

pub fn derive_progress(route: &Route) -> ExecutionProgress {
    let total_steps = route.steps.len();
    let current_step = route
        .steps
        .iter()
        .position(|s| !s.is_done())
        .unwrap_or(total_steps);

    let step_labels = route
        .steps
        .iter()
        .map(|s| {
            if route.from_chain_id != route.to_chain_id {
                format!("Bridge via {}", s.display_label())
            } else {
                format!("Swap via {}", s.display_label())
            }
        })
        .collect();

    let mut transactions: Vec<TransactionRecord> = Vec::new();
    for process in route.processes() {
        let Some(tx_hash) = &process.tx_hash else {
            continue;
        };
        let status = match process.status {
            ProcessStatus::Done => TransactionStatus::Confirmed,
            ProcessStatus::Failed => TransactionStatus::Failed,
            _ => TransactionStatus::Pending,
        };
        if let Some(existing) = transactions.iter_mut().find(|t| &t.tx_hash == tx_hash) {
            // Later process entries carry the newer status for the same hash.
            existing.status = status;
            existing.chain_id = existing.chain_id.or(process.chain_id);
        } else {
            transactions.push(TransactionRecord {
                tx_hash: tx_hash.clone(),
                chain_id: process.chain_id,
                status,
            });
        }
    }

    let estimated_secs_remaining = route
        .steps
        .iter()
        .filter(|s| !s.is_done())
        .map(|s| s.estimated_duration_secs)
        .sum();

    ExecutionProgress {
        current_step,
        total_steps,
        step_labels,
        transactions,
        estimated_secs_remaining,
    }
}
