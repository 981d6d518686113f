//! Database models
//!
//! Document shapes stored in SurrealDB. Work orders, evidence and
//! technicians are owned by the dispatch side and read-only here; the
//! pricing settings, confirmations and both ledgers belong to settlement.

pub mod serde_helpers;

pub mod discount_confirmation;
pub mod evidence;
pub mod failed_transaction;
pub mod pricing;
pub mod technician;
pub mod transaction;
pub mod work_order;

pub use discount_confirmation::{municipality_key, DiscountConfirmation};
pub use evidence::{CustomerStatus, EvidenceRecord};
pub use failed_transaction::{FailedFinancialTransaction, FailureReason};
pub use pricing::{
    eq_municipality, MunicipalityDiscount, OverrideLookup, PricingSettings,
    TechnicianPriceOverride,
};
pub use technician::{PaymentType, Technician};
pub use transaction::{FinancialTransaction, TechnicianEarning};
pub use work_order::{WorkOrder, WorkOrderSnapshot, WorkOrderStatus};
