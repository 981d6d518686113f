//! Failure remediation API Handlers
//!
//! The admin-facing loop over the failure ledger: list what is unresolved,
//! retry, mark resolved, or exclude from finances for good. `{id}` is the
//! work-order key the failure record is keyed by.

use axum::{
    extract::{Path, State},
    Json,
};

use crate::core::ServerState;
use crate::db::models::FailedFinancialTransaction;
use crate::db::repository::FailedTransactionRepository;
use crate::settlement::RecalcReport;
use crate::utils::AppResult;

/// GET /api/failures - unresolved failures, newest attempt first
pub async fn list(
    State(state): State<ServerState>,
) -> AppResult<Json<Vec<FailedFinancialTransaction>>> {
    let repo = FailedTransactionRepository::new(state.db.clone());
    let failures = repo.list_unresolved().await?;
    Ok(Json(failures))
}

/// POST /api/failures/{id}/retry - re-run settlement for the work order
pub async fn retry(
    State(state): State<ServerState>,
    Path(id): Path<String>,
) -> AppResult<Json<RecalcReport>> {
    let report = state.recalc.recalculate_one(&id).await;
    Ok(Json(report))
}

/// POST /api/failures/{id}/resolve - no further action expected
pub async fn resolve(
    State(state): State<ServerState>,
    Path(id): Path<String>,
) -> AppResult<Json<FailedFinancialTransaction>> {
    let repo = FailedTransactionRepository::new(state.db.clone());
    let record = repo.mark_resolved(&id).await?;
    Ok(Json(record))
}

/// POST /api/failures/{id}/exclude - permanently out of settlement scope
pub async fn exclude(
    State(state): State<ServerState>,
    Path(id): Path<String>,
) -> AppResult<Json<FailedFinancialTransaction>> {
    let repo = FailedTransactionRepository::new(state.db.clone());
    let record = repo.mark_excluded(&id).await?;
    Ok(Json(record))
}
