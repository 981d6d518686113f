//! Failed Financial Transaction Repository (Failure Ledger)
//!
//! Keyed by the work-order key like the transaction ledger. Upserts keep
//! the attempt counter and terminal flags across repeated failures, so a
//! work order that keeps failing for the same cause never multiplies
//! records.

use super::{BaseRepository, RepoError, RepoResult};
use crate::db::models::{eq_municipality, FailedFinancialTransaction, FailureReason};
use surrealdb::engine::local::Db;
use surrealdb::Surreal;

const TABLE: &str = "failed_financial_transaction";

#[derive(Clone)]
pub struct FailedTransactionRepository {
    base: BaseRepository,
}

impl FailedTransactionRepository {
    pub fn new(db: Surreal<Db>) -> Self {
        Self {
            base: BaseRepository::new(db),
        }
    }

    /// Find the failure record for a work order
    pub async fn find_by_work_order(
        &self,
        work_order_key: &str,
    ) -> RepoResult<Option<FailedFinancialTransaction>> {
        let record: Option<FailedFinancialTransaction> =
            self.base.db().select((TABLE, work_order_key)).await?;
        Ok(record)
    }

    /// Whether a work order has been excluded from settlement entirely
    pub async fn is_excluded(&self, work_order_key: &str) -> RepoResult<bool> {
        Ok(self
            .find_by_work_order(work_order_key)
            .await?
            .map(|r| r.excluded_from_finances)
            .unwrap_or(false))
    }

    /// Insert-or-replace the failure record for a work order.
    ///
    /// The diagnosis fields are taken from `draft`; the attempt counter,
    /// creation time and the excluded flag carry over from any existing
    /// record, and `resolved` drops back to false: a fresh failure
    /// reopens the case.
    pub async fn upsert_for_work_order(
        &self,
        work_order_key: &str,
        mut draft: FailedFinancialTransaction,
    ) -> RepoResult<FailedFinancialTransaction> {
        if let Some(existing) = self.find_by_work_order(work_order_key).await? {
            draft.attempt_count = existing.attempt_count + 1;
            draft.created_at = existing.created_at;
            draft.excluded_from_finances = existing.excluded_from_finances;
        }
        draft.id = None;
        draft.resolved = false;

        let saved: Option<FailedFinancialTransaction> = self
            .base
            .db()
            .upsert((TABLE, work_order_key))
            .content(draft)
            .await?;
        saved.ok_or_else(|| {
            RepoError::Database(format!(
                "Failed to persist failure record for work order {work_order_key}"
            ))
        })
    }

    /// Delete the failure record for a work order; true if one existed
    pub async fn delete_for_work_order(&self, work_order_key: &str) -> RepoResult<bool> {
        let deleted: Option<FailedFinancialTransaction> =
            self.base.db().delete((TABLE, work_order_key)).await?;
        Ok(deleted.is_some())
    }

    /// Every failure still waiting on someone: unresolved and not excluded,
    /// most recently attempted first.
    pub async fn list_unresolved(&self) -> RepoResult<Vec<FailedFinancialTransaction>> {
        let mut result = self
            .base
            .db()
            .query(
                r#"
                SELECT * FROM failed_financial_transaction
                WHERE resolved = false AND excluded_from_finances = false
                ORDER BY last_attempt_at DESC
                "#,
            )
            .await?;
        let records: Vec<FailedFinancialTransaction> = result.take(0)?;
        Ok(records)
    }

    /// Work-order keys blocked on a pending discount confirmation for the
    /// given municipality.
    pub async fn find_pending_for_municipality(
        &self,
        municipality: &str,
    ) -> RepoResult<Vec<String>> {
        let pending: Vec<String> = self
            .list_unresolved()
            .await?
            .into_iter()
            .filter(|r| r.reason == FailureReason::PendingDiscountConfirmation)
            .filter(|r| eq_municipality(&r.order_snapshot.municipality, municipality))
            .map(|r| r.work_order.key().to_string())
            .collect();
        Ok(pending)
    }

    /// Mark a failure as handled outside settlement (no further action)
    pub async fn mark_resolved(
        &self,
        work_order_key: &str,
    ) -> RepoResult<FailedFinancialTransaction> {
        self.set_flag(work_order_key, "resolved").await
    }

    /// Permanently exclude a work order from settlement
    pub async fn mark_excluded(
        &self,
        work_order_key: &str,
    ) -> RepoResult<FailedFinancialTransaction> {
        self.set_flag(work_order_key, "excluded_from_finances").await
    }

    async fn set_flag(
        &self,
        work_order_key: &str,
        flag: &str,
    ) -> RepoResult<FailedFinancialTransaction> {
        let mut record = self
            .find_by_work_order(work_order_key)
            .await?
            .ok_or_else(|| {
                RepoError::NotFound(format!(
                    "No failure record for work order {work_order_key}"
                ))
            })?;

        match flag {
            "resolved" => record.resolved = true,
            "excluded_from_finances" => record.excluded_from_finances = true,
            other => {
                return Err(RepoError::Validation(format!("Unknown flag: {other}")));
            }
        }

        record.id = None;
        let saved: Option<FailedFinancialTransaction> = self
            .base
            .db()
            .upsert((TABLE, work_order_key))
            .content(record)
            .await?;
        saved.ok_or_else(|| {
            RepoError::Database(format!(
                "Failed to update failure record for work order {work_order_key}"
            ))
        })
    }
}
