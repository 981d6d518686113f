//! Settlement outcome types
//!
//! Every expected result of a settlement attempt is a value, not an error.
//! Only storage failures cross the engine boundary as `Err`.

use crate::db::models::{FailedFinancialTransaction, FinancialTransaction};

/// The one result of running the decision procedure for a work order
#[derive(Debug, Clone)]
pub enum SettlementOutcome {
    /// A transaction was written; any prior failure record is gone
    Settled(FinancialTransaction),
    /// Blocked on an admin discount confirmation; resumable, recorded as
    /// a failure flagged `requires_admin_action`
    Pending(FailedFinancialTransaction),
    /// A terminal-for-now failure was recorded with a typed reason
    Failed(FailedFinancialTransaction),
    /// Work order exists but is not completed+verified yet; nothing written
    NotEligible,
    /// Work order was excluded from finances by an admin; nothing written
    Excluded,
}

impl SettlementOutcome {
    pub fn is_settled(&self) -> bool {
        matches!(self, SettlementOutcome::Settled(_))
    }

    /// Short label for logs and batch reports
    pub fn label(&self) -> &'static str {
        match self {
            SettlementOutcome::Settled(_) => "settled",
            SettlementOutcome::Pending(_) => "pending",
            SettlementOutcome::Failed(_) => "failed",
            SettlementOutcome::NotEligible => "not_eligible",
            SettlementOutcome::Excluded => "excluded",
        }
    }
}
