//! Discount confirmation API Handlers
//!
//! Confirming a municipality discount unblocks every work order parked in
//! `PENDING_DISCOUNT_CONFIRMATION` for that municipality: the confirmation
//! is stored, then the blocked set is recalculated.

use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::core::ServerState;
use crate::db::models::DiscountConfirmation;
use crate::db::repository::{DiscountConfirmationRepository, FailedTransactionRepository};
use crate::settlement::RecalcSummary;
use crate::utils::{AppError, AppResult};

/// GET /api/discounts - all confirmation records
pub async fn list(
    State(state): State<ServerState>,
) -> AppResult<Json<Vec<DiscountConfirmation>>> {
    let repo = DiscountConfirmationRepository::new(state.db.clone());
    let records = repo.find_all().await?;
    Ok(Json(records))
}

#[derive(Debug, Deserialize, Validate)]
pub struct ConfirmDiscountRequest {
    #[validate(length(min = 1, message = "municipality must not be empty"))]
    pub municipality: String,
    #[validate(range(min = 0.0, max = 100.0, message = "discount must be within 0-100"))]
    #[serde(rename = "discountPercent")]
    pub discount_percent: f64,
    #[validate(length(min = 1, message = "confirmedBy must not be empty"))]
    #[serde(rename = "confirmedBy")]
    pub confirmed_by: String,
    /// Explicit work orders to retry; defaults to everything blocked on
    /// this municipality
    #[serde(default, rename = "workOrderIds")]
    pub work_order_ids: Option<Vec<String>>,
}

#[derive(Debug, Serialize)]
pub struct ConfirmDiscountResponse {
    pub confirmation: DiscountConfirmation,
    pub recalculation: RecalcSummary,
}

/// POST /api/discounts/confirm - confirm and recalculate the blocked set
pub async fn confirm(
    State(state): State<ServerState>,
    Json(payload): Json<ConfirmDiscountRequest>,
) -> AppResult<Json<ConfirmDiscountResponse>> {
    payload
        .validate()
        .map_err(|e| AppError::validation(e.to_string()))?;

    let confirmations = DiscountConfirmationRepository::new(state.db.clone());
    let confirmation = confirmations
        .confirm(
            &payload.municipality,
            payload.discount_percent,
            &payload.confirmed_by,
        )
        .await?;

    let targets = match payload.work_order_ids {
        Some(ids) => ids,
        None => {
            let failures = FailedTransactionRepository::new(state.db.clone());
            failures
                .find_pending_for_municipality(&payload.municipality)
                .await?
        }
    };

    tracing::info!(
        municipality = %confirmation.municipality,
        percent = confirmation.discount_percent,
        blocked = targets.len(),
        "Discount confirmed, recalculating blocked work orders"
    );

    let recalculation = state.recalc.recalculate_many(targets).await;

    Ok(Json(ConfirmDiscountResponse {
        confirmation,
        recalculation,
    }))
}
