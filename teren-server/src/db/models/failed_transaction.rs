//! Failed Financial Transaction Model
//!
//! One record per work order that could not be settled, with a typed
//! reason, so an administrator can retry, resolve or exclude it without
//! re-deriving the diagnosis. Superseded by a successful settlement.

use super::serde_helpers;
use super::WorkOrderSnapshot;
use serde::{Deserialize, Serialize};
use surrealdb::RecordId;

/// Why settlement could not produce a transaction. Closed set; the
/// remediation UI switches over these.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FailureReason {
    WorkOrderNotFound,
    MissingWorkOrderEvidence,
    MissingCustomerStatus,
    MissingFinancialSettings,
    NoPriceForCustomerStatus,
    PendingDiscountConfirmation,
    NoTechniciansAssigned,
    MissingTechnicianPricing,
    OtherError,
}

impl FailureReason {
    /// Pending confirmation is a resumable policy gate, not a data defect
    pub fn is_pending(&self) -> bool {
        matches!(self, FailureReason::PendingDiscountConfirmation)
    }
}

/// Failure record entity (record key = work order key)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FailedFinancialTransaction {
    #[serde(default, skip_serializing_if = "Option::is_none", with = "serde_helpers::option_record_id")]
    pub id: Option<RecordId>,
    #[serde(with = "serde_helpers::record_id")]
    pub work_order: RecordId,
    pub reason: FailureReason,
    /// Human-readable diagnosis for the remediation list
    pub message: String,
    /// Which inputs were missing (field descriptors, e.g. "customer_status")
    #[serde(default)]
    pub missing_fields: Vec<String>,
    #[serde(default)]
    pub order_snapshot: WorkOrderSnapshot,

    /// Configured percent waiting for confirmation
    /// (only for `PENDING_DISCOUNT_CONFIRMATION`)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suggested_discount_percent: Option<f64>,
    #[serde(default, deserialize_with = "serde_helpers::bool_false")]
    pub requires_admin_action: bool,

    pub attempt_count: i32,
    pub last_attempt_at: i64,

    // Terminal flags set from the remediation list
    #[serde(default, deserialize_with = "serde_helpers::bool_false")]
    pub resolved: bool,
    #[serde(default, deserialize_with = "serde_helpers::bool_false")]
    pub excluded_from_finances: bool,

    pub created_at: i64,
}
