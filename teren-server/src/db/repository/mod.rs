//! Repository Module
//!
//! Data access for SurrealDB tables. Ledger repositories key their records
//! by the work-order key, so uniqueness is enforced where the data lives.

// Read-only dispatch data
pub mod evidence;
pub mod technician;
pub mod work_order;

// Settlement configuration
pub mod discount_confirmation;
pub mod pricing;

// Ledgers
pub mod failed_transaction;
pub mod transaction;

// Re-exports
pub use discount_confirmation::DiscountConfirmationRepository;
pub use evidence::EvidenceRepository;
pub use failed_transaction::FailedTransactionRepository;
pub use pricing::PricingSettingsRepository;
pub use technician::TechnicianRepository;
pub use transaction::{LedgerTotals, TransactionRepository};
pub use work_order::WorkOrderRepository;

use surrealdb::engine::local::Db;
use surrealdb::Surreal;
use thiserror::Error;

/// Repository error types
#[derive(Debug, Error)]
pub enum RepoError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Duplicate: {0}")]
    Duplicate(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Validation error: {0}")]
    Validation(String),
}

impl From<surrealdb::Error> for RepoError {
    fn from(err: surrealdb::Error) -> Self {
        RepoError::Database(err.to_string())
    }
}

/// Result type for repository operations
pub type RepoResult<T> = Result<T, RepoError>;

/// Base repository with database reference
#[derive(Clone)]
pub struct BaseRepository {
    db: Surreal<Db>,
}

impl BaseRepository {
    pub fn new(db: Surreal<Db>) -> Self {
        Self { db }
    }

    pub fn db(&self) -> &Surreal<Db> {
        &self.db
    }
}
