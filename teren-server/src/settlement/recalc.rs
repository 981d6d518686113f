//! Recalculation Driver
//!
//! Re-runs the decision procedure for one, many, or all eligible work
//! orders. Each target gets a full recompute (its settlement record is
//! dropped first), so a recalculation after a configuration fix converges
//! to exactly what a fresh settlement would produce. Individual failures
//! are reported, never propagated: one bad work order cannot halt a sweep.

use futures::stream::{self, StreamExt};
use serde::Serialize;
use tokio_util::sync::CancellationToken;

use crate::db::models::FailureReason;
use crate::db::repository::{RepoResult, WorkOrderRepository};

use super::engine::SettlementEngine;
use super::outcome::SettlementOutcome;

/// Per-work-order result of a recalculation
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RecalcReport {
    pub work_order: String,
    /// settled | pending | failed | not_eligible | excluded | error | skipped
    pub outcome: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<FailureReason>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// Batch summary returned by the list and sweep entry points
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RecalcSummary {
    pub total: usize,
    pub settled: usize,
    pub pending: usize,
    pub failed: usize,
    pub skipped: usize,
    pub items: Vec<RecalcReport>,
}

impl RecalcSummary {
    fn from_items(items: Vec<RecalcReport>) -> Self {
        let settled = items.iter().filter(|i| i.outcome == "settled").count();
        let pending = items.iter().filter(|i| i.outcome == "pending").count();
        let failed = items
            .iter()
            .filter(|i| i.outcome == "failed" || i.outcome == "error")
            .count();
        Self {
            total: items.len(),
            settled,
            pending,
            failed,
            skipped: items.len() - settled - pending - failed,
            items,
        }
    }
}

/// Recalculation driver: bounded-concurrency batch runner over the engine
#[derive(Clone)]
pub struct RecalcDriver {
    engine: SettlementEngine,
    work_orders: WorkOrderRepository,
    concurrency: usize,
    shutdown: CancellationToken,
}

impl RecalcDriver {
    pub fn new(
        engine: SettlementEngine,
        work_orders: WorkOrderRepository,
        concurrency: usize,
        shutdown: CancellationToken,
    ) -> Self {
        Self {
            engine,
            work_orders,
            concurrency: concurrency.max(1),
            shutdown,
        }
    }

    /// Recalculate a single work order (manual retry path)
    pub async fn recalculate_one(&self, work_order_key: &str) -> RecalcReport {
        self.recalc_item(work_order_key.to_string()).await
    }

    /// Recalculate an explicit list (e.g. after a discount confirmation)
    pub async fn recalculate_many(&self, work_order_keys: Vec<String>) -> RecalcSummary {
        let items: Vec<RecalcReport> = stream::iter(work_order_keys)
            .map(|key| self.recalc_item(key))
            .buffer_unordered(self.concurrency)
            .collect()
            .await;

        let summary = RecalcSummary::from_items(items);
        tracing::info!(
            total = summary.total,
            settled = summary.settled,
            pending = summary.pending,
            failed = summary.failed,
            "Recalculation batch finished"
        );
        summary
    }

    /// Recalculate every completed+verified work order (reconciliation sweep)
    pub async fn recalculate_all_eligible(&self) -> RepoResult<RecalcSummary> {
        let keys = self.work_orders.find_eligible_keys().await?;
        tracing::info!(count = keys.len(), "Starting full recalculation sweep");
        Ok(self.recalculate_many(keys).await)
    }

    /// One target: drop the old settlement record, re-run the engine, and
    /// fold any unexpected error into an `OTHER_ERROR` failure record.
    async fn recalc_item(&self, key: String) -> RecalcReport {
        if self.shutdown.is_cancelled() {
            return RecalcReport {
                work_order: key,
                outcome: "skipped".to_string(),
                reason: None,
                message: Some("Shutdown in progress".to_string()),
            };
        }

        let result = async {
            self.engine.clear_settlement(&key).await?;
            self.engine.settle(&key).await
        }
        .await;

        match result {
            Ok(outcome) => {
                let (reason, message) = match &outcome {
                    SettlementOutcome::Failed(record) | SettlementOutcome::Pending(record) => {
                        (Some(record.reason), Some(record.message.clone()))
                    }
                    _ => (None, None),
                };
                RecalcReport {
                    work_order: key,
                    outcome: outcome.label().to_string(),
                    reason,
                    message,
                }
            }
            Err(err) => {
                let message = err.to_string();
                tracing::error!(work_order = %key, error = %message, "Settlement error");
                if let Err(record_err) = self
                    .engine
                    .record_unexpected_error(&key, &message)
                    .await
                {
                    // Storage is failing outright; the report itself is the
                    // only remaining trace.
                    tracing::error!(
                        work_order = %key,
                        error = %record_err,
                        "Could not record settlement error"
                    );
                }
                RecalcReport {
                    work_order: key,
                    outcome: "error".to_string(),
                    reason: Some(FailureReason::OtherError),
                    message: Some(message),
                }
            }
        }
    }
}
