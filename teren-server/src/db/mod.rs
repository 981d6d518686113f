//! Database Module
//!
//! Embedded SurrealDB (RocksDB backend) bootstrap and schema definition.

pub mod models;
pub mod repository;

use std::path::Path;

use surrealdb::engine::local::{Db, RocksDb};
use surrealdb::Surreal;

use crate::utils::AppError;

const NAMESPACE: &str = "teren";
const DATABASE: &str = "main";

/// Database service: owns the embedded SurrealDB handle
#[derive(Clone)]
pub struct DbService {
    pub db: Surreal<Db>,
}

impl DbService {
    /// Open (or create) the database at `db_path` and apply the schema
    pub async fn new(db_path: &Path) -> Result<Self, AppError> {
        let db: Surreal<Db> = Surreal::new::<RocksDb>(db_path)
            .await
            .map_err(|e| AppError::database(format!("Failed to open database: {e}")))?;

        db.use_ns(NAMESPACE)
            .use_db(DATABASE)
            .await
            .map_err(|e| AppError::database(format!("Failed to select namespace: {e}")))?;

        define_schema(&db).await?;

        tracing::info!(path = %db_path.display(), "Database connection established (SurrealDB RocksDB)");

        Ok(Self { db })
    }
}

/// Table and index definitions.
///
/// The unique indexes on `work_order` are what turn the
/// at-most-one-record-per-work-order rule into a storage-level guarantee:
/// a second concurrent writer's insert collides and is retried as an
/// update instead of duplicating a payout.
async fn define_schema(db: &Surreal<Db>) -> Result<(), AppError> {
    db.query(
        r#"
        DEFINE TABLE IF NOT EXISTS work_order SCHEMALESS;
        DEFINE TABLE IF NOT EXISTS work_evidence SCHEMALESS;
        DEFINE TABLE IF NOT EXISTS technician SCHEMALESS;
        DEFINE TABLE IF NOT EXISTS pricing_settings SCHEMALESS;
        DEFINE TABLE IF NOT EXISTS discount_confirmation SCHEMALESS;
        DEFINE TABLE IF NOT EXISTS financial_transaction SCHEMALESS;
        DEFINE TABLE IF NOT EXISTS failed_financial_transaction SCHEMALESS;

        DEFINE INDEX IF NOT EXISTS uniq_transaction_work_order
            ON TABLE financial_transaction COLUMNS work_order UNIQUE;
        DEFINE INDEX IF NOT EXISTS uniq_failed_transaction_work_order
            ON TABLE failed_financial_transaction COLUMNS work_order UNIQUE;
        DEFINE INDEX IF NOT EXISTS uniq_evidence_work_order
            ON TABLE work_evidence COLUMNS work_order UNIQUE;

        DEFINE INDEX IF NOT EXISTS idx_transaction_verified_at
            ON TABLE financial_transaction COLUMNS verified_at;
        "#,
    )
    .await
    .map_err(|e| AppError::database(format!("Failed to define schema: {e}")))?;

    tracing::debug!("Database schema applied");
    Ok(())
}
