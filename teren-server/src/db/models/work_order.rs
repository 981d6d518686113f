//! Work Order Model
//!
//! Work orders are owned by the dispatch side of the system; settlement
//! reads them and never mutates them.

use super::serde_helpers;
use serde::{Deserialize, Serialize};
use surrealdb::RecordId;

/// Work order lifecycle status (wire values are the dispatch system's)
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum WorkOrderStatus {
    /// Still in progress
    #[serde(rename = "nezavrsen")]
    Nezavrsen,
    /// Completed by the technician(s)
    #[serde(rename = "zavrsen")]
    Zavrsen,
    /// Cancelled
    #[serde(rename = "otkazan")]
    Otkazan,
    /// Postponed
    #[serde(rename = "odlozen")]
    Odlozen,
}

/// Work order entity
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkOrder {
    #[serde(default, skip_serializing_if = "Option::is_none", with = "serde_helpers::option_record_id")]
    pub id: Option<RecordId>,
    /// Human-facing order number (e.g. "RN-2026-00431")
    pub order_number: String,
    pub status: WorkOrderStatus,
    /// Set by an administrator after reviewing the completed job
    #[serde(default, deserialize_with = "serde_helpers::bool_false")]
    pub verified: bool,
    /// Verification time (Unix millis)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub verified_at: Option<i64>,
    pub municipality: String,
    /// Subscriber name, carried into failure snapshots
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    /// Assigned technicians (zero, one or two)
    #[serde(default, with = "serde_helpers::vec_record_id")]
    pub technicians: Vec<RecordId>,
    pub created_at: i64,
}

impl WorkOrder {
    /// A work order enters settlement only once completed and verified
    pub fn is_settlement_eligible(&self) -> bool {
        self.status == WorkOrderStatus::Zavrsen && self.verified
    }

    /// Identifying snapshot carried on failure records
    pub fn snapshot(&self) -> WorkOrderSnapshot {
        WorkOrderSnapshot {
            order_number: self.order_number.clone(),
            municipality: self.municipality.clone(),
            user_name: self.user_name.clone(),
            address: self.address.clone(),
        }
    }
}

/// Identifying details of a work order, denormalized onto failure records
/// so the remediation list renders without extra lookups.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct WorkOrderSnapshot {
    pub order_number: String,
    pub municipality: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
}
