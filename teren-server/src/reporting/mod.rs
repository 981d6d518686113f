//! Reporting Module
//!
//! Read-side aggregation over the transaction ledger, with a short-lived
//! cache invalidated by the settlement engine's ledger-write hook.

pub mod aggregator;
pub mod cache;

pub use aggregator::{
    ReportTotals, ReportingService, SalaryProgressRow, TechnicianReportRow, TransactionReport,
    TransactionReportQuery,
};
pub use cache::ReportCache;
