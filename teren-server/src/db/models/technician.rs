//! Technician Model

use super::serde_helpers;
use serde::{Deserialize, Serialize};
use surrealdb::RecordId;

/// How a technician is compensated
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum PaymentType {
    /// Paid per completed job, by service classification
    #[serde(rename = "po_statusu")]
    PoStatusu,
    /// Fixed monthly salary; job earnings accrue toward the salary cap
    #[serde(rename = "plata")]
    Plata,
}

/// Technician entity
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Technician {
    #[serde(default, skip_serializing_if = "Option::is_none", with = "serde_helpers::option_record_id")]
    pub id: Option<RecordId>,
    pub name: String,
    pub payment_type: PaymentType,
    /// Only meaningful for `plata` technicians
    #[serde(default)]
    pub monthly_salary: f64,
}
