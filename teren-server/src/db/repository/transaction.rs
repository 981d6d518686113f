//! Financial Transaction Repository (Transaction Ledger)
//!
//! Records are keyed by the work-order key and additionally covered by a
//! unique index on `work_order`, so at most one settlement record can ever
//! exist per work order.

use serde::Deserialize;

use super::{BaseRepository, RepoError, RepoResult};
use crate::db::models::FinancialTransaction;
use surrealdb::engine::local::Db;
use surrealdb::{RecordId, Surreal};

const TABLE: &str = "financial_transaction";

/// Ledger-wide totals for a time window
#[derive(Debug, Clone, Deserialize)]
pub struct LedgerTotals {
    pub revenue: f64,
    pub payouts: f64,
    pub profit: f64,
    pub transactions: i64,
}

#[derive(Clone)]
pub struct TransactionRepository {
    base: BaseRepository,
}

impl TransactionRepository {
    pub fn new(db: Surreal<Db>) -> Self {
        Self {
            base: BaseRepository::new(db),
        }
    }

    /// Insert-or-replace the settlement record for a work order.
    ///
    /// A concurrent writer for the same work order lands on the same record
    /// key, so the slower one replaces instead of duplicating.
    pub async fn upsert_for_work_order(
        &self,
        work_order_key: &str,
        mut tx: FinancialTransaction,
    ) -> RepoResult<FinancialTransaction> {
        tx.id = None;
        let saved: Option<FinancialTransaction> = self
            .base
            .db()
            .upsert((TABLE, work_order_key))
            .content(tx)
            .await?;
        saved.ok_or_else(|| {
            RepoError::Database(format!(
                "Failed to persist transaction for work order {work_order_key}"
            ))
        })
    }

    /// Find the settlement record for a work order
    pub async fn find_by_work_order(
        &self,
        work_order_key: &str,
    ) -> RepoResult<Option<FinancialTransaction>> {
        let tx: Option<FinancialTransaction> =
            self.base.db().select((TABLE, work_order_key)).await?;
        Ok(tx)
    }

    /// Delete the settlement record for a work order; true if one existed
    pub async fn delete_for_work_order(&self, work_order_key: &str) -> RepoResult<bool> {
        let deleted: Option<FinancialTransaction> =
            self.base.db().delete((TABLE, work_order_key)).await?;
        Ok(deleted.is_some())
    }

    /// All transactions in a half-open `[start, end)` verification window,
    /// newest first.
    ///
    /// Pagination and free-text filtering happen in memory: the embedded
    /// SurrealDB engine drops the first record when LIMIT is combined with
    /// computed fields on indexed columns, and the window bounds the
    /// dataset anyway.
    pub async fn list_in_range(
        &self,
        start: i64,
        end: i64,
    ) -> RepoResult<Vec<FinancialTransaction>> {
        let mut result = self
            .base
            .db()
            .query(
                r#"
                SELECT * FROM financial_transaction
                WHERE verified_at >= $start AND verified_at < $end
                ORDER BY verified_at DESC
                "#,
            )
            .bind(("start", start))
            .bind(("end", end))
            .await?;
        let txs: Vec<FinancialTransaction> = result.take(0)?;
        Ok(txs)
    }

    /// Revenue / payout / profit totals over a verification window
    pub async fn totals_in_range(&self, start: i64, end: i64) -> RepoResult<LedgerTotals> {
        let mut result = self
            .base
            .db()
            .query(
                r#"
                LET $txs = SELECT final_price, total_technician_earnings, company_profit
                    FROM financial_transaction
                    WHERE verified_at >= $start AND verified_at < $end;

                RETURN {
                    revenue: math::sum($txs.final_price) OR 0,
                    payouts: math::sum($txs.total_technician_earnings) OR 0,
                    profit: math::sum($txs.company_profit) OR 0,
                    transactions: count($txs)
                }
                "#,
            )
            .bind(("start", start))
            .bind(("end", end))
            .await?;

        let totals: Option<LedgerTotals> = result.take(1)?;
        Ok(totals.unwrap_or(LedgerTotals {
            revenue: 0.0,
            payouts: 0.0,
            profit: 0.0,
            transactions: 0,
        }))
    }

    /// Sum of a salaried technician's `earned_towards_salary` across the
    /// given month window, excluding the work order currently being
    /// settled so recomputing it converges.
    pub async fn earned_towards_salary_in_window(
        &self,
        technician: &RecordId,
        start: i64,
        end: i64,
        exclude_work_order_key: Option<&str>,
    ) -> RepoResult<f64> {
        let exclude = exclude_work_order_key
            .map(|key| RecordId::from_table_key("work_order", key).to_string())
            .unwrap_or_default();
        let mut result = self
            .base
            .db()
            .query(
                r#"
                SELECT technician_earnings FROM financial_transaction
                WHERE verified_at >= $start AND verified_at < $end
                AND work_order != $exclude
                "#,
            )
            .bind(("start", start))
            .bind(("end", end))
            .bind(("exclude", exclude))
            .await?;

        #[derive(Deserialize)]
        struct Row {
            technician_earnings: Vec<crate::db::models::TechnicianEarning>,
        }

        let rows: Vec<Row> = result.take(0)?;
        let total = rows
            .iter()
            .flat_map(|r| r.technician_earnings.iter())
            .filter(|e| &e.technician == technician)
            .filter_map(|e| e.earned_towards_salary)
            .map(crate::settlement::money::to_decimal)
            .sum();
        Ok(crate::settlement::money::to_f64(total))
    }
}
