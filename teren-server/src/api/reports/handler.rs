//! Reports API Handlers

use axum::{
    extract::{Query, State},
    Json,
};
use serde::Deserialize;

use crate::core::ServerState;
use crate::reporting::{
    SalaryProgressRow, TechnicianReportRow, TransactionReport, TransactionReportQuery,
};
use crate::utils::{time, AppResult};

// ============================================================================
// Query Parameters
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct TransactionsQuery {
    /// Start date, YYYY-MM-DD (inclusive)
    pub from: Option<String>,
    /// End date, YYYY-MM-DD (inclusive)
    pub to: Option<String>,
    /// Free-text filter
    pub q: Option<String>,
    /// Technician id or name fragment
    pub technician: Option<String>,
    #[serde(default = "default_page")]
    pub page: i32,
    #[serde(default = "default_page_size", rename = "pageSize")]
    pub page_size: i32,
}

fn default_page() -> i32 {
    1
}

fn default_page_size() -> i32 {
    20
}

#[derive(Debug, Deserialize)]
pub struct DateRangeQuery {
    pub from: Option<String>,
    pub to: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct SalaryProgressQuery {
    /// Month as YYYY-MM; defaults to the current month
    pub month: Option<String>,
}

// ============================================================================
// Handlers
// ============================================================================

/// GET /api/reports/transactions - paginated listing with summary totals
pub async fn transactions(
    State(state): State<ServerState>,
    Query(query): Query<TransactionsQuery>,
) -> AppResult<Json<TransactionReport>> {
    let report = state
        .reports
        .transaction_report(TransactionReportQuery {
            from: query.from.as_deref().map(time::parse_date).transpose()?,
            to: query.to.as_deref().map(time::parse_date).transpose()?,
            q: query.q,
            technician: query.technician,
            page: query.page,
            page_size: query.page_size,
        })
        .await?;
    Ok(Json(report))
}

/// GET /api/reports/technicians - per-technician totals
pub async fn technicians(
    State(state): State<ServerState>,
    Query(query): Query<DateRangeQuery>,
) -> AppResult<Json<Vec<TechnicianReportRow>>> {
    let rows = state
        .reports
        .technician_report(
            query.from.as_deref().map(time::parse_date).transpose()?,
            query.to.as_deref().map(time::parse_date).transpose()?,
        )
        .await?;
    Ok(Json(rows))
}

/// GET /api/reports/salary-progress - fixed-salary month-to-date view
pub async fn salary_progress(
    State(state): State<ServerState>,
    Query(query): Query<SalaryProgressQuery>,
) -> AppResult<Json<Vec<SalaryProgressRow>>> {
    let (year, month) = match query.month.as_deref() {
        Some(m) => time::parse_month(m)?,
        None => time::current_month(state.config.timezone),
    };
    let rows = state.reports.salary_progress(year, month).await?;
    Ok(Json(rows))
}
