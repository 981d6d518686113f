//! Financial Transaction Model
//!
//! The settlement record: one per settled work order, written only by the
//! settlement engine and never partially. The record key equals the work
//! order key, so the storage layer itself rules out duplicates.

use super::serde_helpers;
use super::{CustomerStatus, PaymentType};
use serde::{Deserialize, Serialize};
use surrealdb::RecordId;

/// One technician's share of a settled work order.
///
/// `amount` is the company's compensation cost for this technician on this
/// job: the full resolved price for `po_statusu` technicians, and the
/// portion accrued toward the monthly salary for `plata` technicians
/// (their `excess_amount` lands in company profit instead).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TechnicianEarning {
    #[serde(with = "serde_helpers::record_id")]
    pub technician: RecordId,
    /// Name at settlement time; later renames do not rewrite history
    pub technician_name: String,
    pub payment_type: PaymentType,
    /// Value of the job for this technician before salary accounting
    pub nominal_amount: f64,
    /// Compensation cost counted against this job (see above)
    pub amount: f64,
    /// Cash paid out for this job (zero for salaried technicians)
    pub paid_amount: f64,

    // Salary accounting, only present for `plata` technicians
    #[serde(skip_serializing_if = "Option::is_none")]
    pub earned_towards_salary: Option<f64>,
    /// Sum of `earned_towards_salary` across this technician's other
    /// transactions in the same calendar month, at settlement time
    #[serde(skip_serializing_if = "Option::is_none")]
    pub previously_earned: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exceeded_salary: Option<bool>,
    /// Portion of `nominal_amount` above the salary headroom, redirected
    /// to company profit
    #[serde(skip_serializing_if = "Option::is_none")]
    pub excess_amount: Option<f64>,
}

/// Settlement record entity
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FinancialTransaction {
    #[serde(default, skip_serializing_if = "Option::is_none", with = "serde_helpers::option_record_id")]
    pub id: Option<RecordId>,
    #[serde(with = "serde_helpers::record_id")]
    pub work_order: RecordId,
    #[serde(with = "serde_helpers::record_id")]
    pub evidence: RecordId,
    pub order_number: String,
    pub customer_status: CustomerStatus,
    pub municipality: String,

    pub base_price: f64,
    pub discount_percent: f64,
    pub discount_amount: f64,
    pub final_price: f64,

    pub technician_earnings: Vec<TechnicianEarning>,
    /// Sum of per-technician `amount` (compensation cost)
    pub total_technician_earnings: f64,
    /// `final_price - total_technician_earnings`
    pub company_profit: f64,

    /// Verification time of the underlying work order (Unix millis);
    /// also the timestamp that places the record in a salary month
    pub verified_at: i64,
    pub created_at: i64,
}
