//! Settlement Module
//!
//! The financial core: the decision procedure that settles completed,
//! verified work orders, and the batch driver that re-runs it after
//! configuration fixes or discount confirmations.

pub mod engine;
pub mod money;
pub mod outcome;
pub mod recalc;

pub use engine::{LedgerWriteHook, SettlementEngine};
pub use outcome::SettlementOutcome;
pub use recalc::{RecalcDriver, RecalcReport, RecalcSummary};
