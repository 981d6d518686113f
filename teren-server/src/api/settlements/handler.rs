//! Settlement API Handlers

use axum::{
    extract::{Path, State},
    Json,
};
use serde::Deserialize;

use crate::core::ServerState;
use crate::settlement::{RecalcReport, RecalcSummary};
use crate::utils::AppResult;

/// POST /api/settlements/work-orders/{id} - settle one work order
pub async fn settle_one(
    State(state): State<ServerState>,
    Path(id): Path<String>,
) -> AppResult<Json<RecalcReport>> {
    let report = state.recalc.recalculate_one(&id).await;
    Ok(Json(report))
}

#[derive(Debug, Deserialize)]
pub struct RecalculateRequest {
    /// Explicit targets; omit for a full sweep over every eligible work order
    #[serde(default, rename = "workOrderIds")]
    pub work_order_ids: Option<Vec<String>>,
}

/// POST /api/settlements/recalculate - explicit list or full sweep
pub async fn recalculate(
    State(state): State<ServerState>,
    Json(payload): Json<RecalculateRequest>,
) -> AppResult<Json<RecalcSummary>> {
    let summary = match payload.work_order_ids {
        Some(ids) => state.recalc.recalculate_many(ids).await,
        None => state.recalc.recalculate_all_eligible().await?,
    };
    Ok(Json(summary))
}
