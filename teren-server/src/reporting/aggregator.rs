//! Reporting Aggregator
//!
//! Read-side summaries over the transaction ledger: revenue/payout/profit
//! totals, a paginated transaction listing, a per-technician breakdown and
//! the salary month-to-date view. Every query goes through the TTL cache;
//! the ledger-write hook clears it.

use std::sync::Arc;
use std::time::Duration;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use surrealdb::engine::local::Db;
use surrealdb::Surreal;

use crate::db::models::FinancialTransaction;
use crate::db::repository::{TechnicianRepository, TransactionRepository};
use crate::settlement::money;
use crate::utils::{time, AppResult};

use super::cache::ReportCache;

// ============================================================================
// Query / Response Types
// ============================================================================

/// Filters for the transaction report
#[derive(Debug, Clone, Default)]
pub struct TransactionReportQuery {
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
    /// Free-text match on order number, municipality, classification and
    /// technician names
    pub q: Option<String>,
    /// Technician record id ("technician:x") or name fragment
    pub technician: Option<String>,
    pub page: i32,
    pub page_size: i32,
}

/// Ledger totals for the filtered set
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportTotals {
    pub revenue: f64,
    pub payouts: f64,
    pub profit: f64,
    pub transactions: i64,
}

/// Paginated transaction report
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionReport {
    pub items: Vec<FinancialTransaction>,
    pub totals: ReportTotals,
    pub total: i32,
    pub page: i32,
    pub page_size: i32,
    pub total_pages: i32,
}

/// One technician's aggregate over the filtered window
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TechnicianReportRow {
    pub technician: String,
    pub technician_name: String,
    pub jobs: i32,
    /// Compensation cost across jobs
    pub total_amount: f64,
    pub cash_paid: f64,
    pub toward_salary: f64,
    pub excess_to_profit: f64,
}

/// Month-to-date salary view for one fixed-salary technician
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SalaryProgressRow {
    pub technician: String,
    pub technician_name: String,
    pub monthly_salary: f64,
    pub earned: f64,
    pub remaining: f64,
    pub exceeded: bool,
}

// ============================================================================
// Service
// ============================================================================

/// Reporting service: owns the cache, reads the ledger
#[derive(Clone)]
pub struct ReportingService {
    transactions: TransactionRepository,
    technicians: TechnicianRepository,
    cache: Arc<ReportCache>,
    tz: chrono_tz::Tz,
}

impl ReportingService {
    pub fn new(db: Surreal<Db>, tz: chrono_tz::Tz, cache_ttl: Duration) -> Self {
        Self {
            transactions: TransactionRepository::new(db.clone()),
            technicians: TechnicianRepository::new(db),
            cache: Arc::new(ReportCache::new(cache_ttl)),
            tz,
        }
    }

    /// The cache handle, for wiring the ledger-write hook
    pub fn cache(&self) -> Arc<ReportCache> {
        self.cache.clone()
    }

    /// Paginated, filterable transaction listing with summary totals
    pub async fn transaction_report(
        &self,
        query: TransactionReportQuery,
    ) -> AppResult<TransactionReport> {
        let page = query.page.max(1);
        let page_size = query.page_size.clamp(1, 100);
        let (start, end) = self.range_millis(query.from, query.to);

        let cache_key = format!(
            "tx:{start}:{end}:{}:{}:{page}:{page_size}",
            query.q.as_deref().unwrap_or(""),
            query.technician.as_deref().unwrap_or(""),
        );
        if let Some(hit) = self.cache.get(&cache_key) {
            if let Ok(report) = serde_json::from_value(hit) {
                return Ok(report);
            }
        }

        let all = self.transactions.list_in_range(start, end).await?;
        let filtered: Vec<FinancialTransaction> = all
            .into_iter()
            .filter(|tx| matches_free_text(tx, query.q.as_deref()))
            .filter(|tx| matches_technician(tx, query.technician.as_deref()))
            .collect();

        // Totals must respect every filter; only the unfiltered window can
        // be summed in the database.
        let totals = if query.q.is_none() && query.technician.is_none() {
            let t = self.transactions.totals_in_range(start, end).await?;
            ReportTotals {
                revenue: t.revenue,
                payouts: t.payouts,
                profit: t.profit,
                transactions: t.transactions,
            }
        } else {
            totals_of(&filtered)
        };

        let total = filtered.len() as i32;
        let total_pages = if total > 0 {
            (total + page_size - 1) / page_size
        } else {
            1
        };
        let items: Vec<FinancialTransaction> = filtered
            .into_iter()
            .skip(((page - 1) * page_size) as usize)
            .take(page_size as usize)
            .collect();

        let report = TransactionReport {
            items,
            totals,
            total,
            page,
            page_size,
            total_pages,
        };
        if let Ok(value) = serde_json::to_value(&report) {
            self.cache.put(cache_key, value);
        }
        Ok(report)
    }

    /// Per-technician aggregates over a date window
    pub async fn technician_report(
        &self,
        from: Option<NaiveDate>,
        to: Option<NaiveDate>,
    ) -> AppResult<Vec<TechnicianReportRow>> {
        let (start, end) = self.range_millis(from, to);

        let cache_key = format!("tech:{start}:{end}");
        if let Some(hit) = self.cache.get(&cache_key) {
            if let Ok(rows) = serde_json::from_value(hit) {
                return Ok(rows);
            }
        }

        let txs = self.transactions.list_in_range(start, end).await?;

        #[derive(Default)]
        struct Acc {
            name: String,
            jobs: i32,
            total: Decimal,
            cash: Decimal,
            toward: Decimal,
            excess: Decimal,
        }

        let mut by_tech: std::collections::BTreeMap<String, Acc> = Default::default();
        for tx in &txs {
            for e in &tx.technician_earnings {
                let acc = by_tech.entry(e.technician.to_string()).or_default();
                acc.name = e.technician_name.clone();
                acc.jobs += 1;
                acc.total += money::to_decimal(e.amount);
                acc.cash += money::to_decimal(e.paid_amount);
                acc.toward += money::to_decimal(e.earned_towards_salary.unwrap_or(0.0));
                acc.excess += money::to_decimal(e.excess_amount.unwrap_or(0.0));
            }
        }

        let rows: Vec<TechnicianReportRow> = by_tech
            .into_iter()
            .map(|(technician, acc)| TechnicianReportRow {
                technician,
                technician_name: acc.name,
                jobs: acc.jobs,
                total_amount: money::to_f64(acc.total),
                cash_paid: money::to_f64(acc.cash),
                toward_salary: money::to_f64(acc.toward),
                excess_to_profit: money::to_f64(acc.excess),
            })
            .collect();

        if let Ok(value) = serde_json::to_value(&rows) {
            self.cache.put(cache_key, value);
        }
        Ok(rows)
    }

    /// Salary accrual for every fixed-salary technician in a month
    pub async fn salary_progress(
        &self,
        year: i32,
        month: u32,
    ) -> AppResult<Vec<SalaryProgressRow>> {
        let (start, end) = time::month_window(year, month, self.tz);

        let cache_key = format!("salary:{start}:{end}");
        if let Some(hit) = self.cache.get(&cache_key) {
            if let Ok(rows) = serde_json::from_value(hit) {
                return Ok(rows);
            }
        }

        let mut rows = Vec::new();
        for tech in self.technicians.find_salaried().await? {
            let Some(id) = tech.id.clone() else { continue };
            let earned = self
                .transactions
                .earned_towards_salary_in_window(&id, start, end, None)
                .await?;
            let remaining = money::to_f64(
                (money::to_decimal(tech.monthly_salary) - money::to_decimal(earned))
                    .max(Decimal::ZERO),
            );
            rows.push(SalaryProgressRow {
                technician: id.to_string(),
                technician_name: tech.name,
                monthly_salary: tech.monthly_salary,
                earned,
                remaining,
                exceeded: earned >= tech.monthly_salary && tech.monthly_salary > 0.0,
            });
        }

        if let Ok(value) = serde_json::to_value(&rows) {
            self.cache.put(cache_key, value);
        }
        Ok(rows)
    }

    /// Resolve optional dates to a half-open millis window
    fn range_millis(&self, from: Option<NaiveDate>, to: Option<NaiveDate>) -> (i64, i64) {
        let start = from
            .map(|d| time::day_start_millis(d, self.tz))
            .unwrap_or(0);
        let end = to
            .map(|d| time::day_end_millis(d, self.tz))
            .unwrap_or(i64::MAX);
        (start, end)
    }
}

fn matches_free_text(tx: &FinancialTransaction, q: Option<&str>) -> bool {
    let Some(q) = q.map(str::trim).filter(|q| !q.is_empty()) else {
        return true;
    };
    let needle = q.to_lowercase();
    tx.order_number.to_lowercase().contains(&needle)
        || tx.municipality.to_lowercase().contains(&needle)
        || tx.customer_status.as_str().to_lowercase().contains(&needle)
        || tx
            .technician_earnings
            .iter()
            .any(|e| e.technician_name.to_lowercase().contains(&needle))
}

fn matches_technician(tx: &FinancialTransaction, technician: Option<&str>) -> bool {
    let Some(t) = technician.map(str::trim).filter(|t| !t.is_empty()) else {
        return true;
    };
    let needle = t.to_lowercase();
    tx.technician_earnings.iter().any(|e| {
        e.technician.to_string().to_lowercase() == needle
            || e.technician_name.to_lowercase().contains(&needle)
    })
}

fn totals_of(txs: &[FinancialTransaction]) -> ReportTotals {
    let mut revenue = Decimal::ZERO;
    let mut payouts = Decimal::ZERO;
    let mut profit = Decimal::ZERO;
    for tx in txs {
        revenue += money::to_decimal(tx.final_price);
        payouts += money::to_decimal(tx.total_technician_earnings);
        profit += money::to_decimal(tx.company_profit);
    }
    ReportTotals {
        revenue: money::to_f64(revenue),
        payouts: money::to_f64(payouts),
        profit: money::to_f64(profit),
        transactions: txs.len() as i64,
    }
}
