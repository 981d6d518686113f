//! Settlement Decision Procedure
//!
//! Turns a completed, verified work order plus the pricing configuration
//! into exactly one outcome (a persisted transaction, a typed failure
//! record, or a pending-confirmation record) with exactly one ledger
//! write per invocation. The checks run in a fixed order and short-circuit
//! on the first failure.

use std::sync::Arc;

use rust_decimal::Decimal;
use surrealdb::engine::local::Db;
use surrealdb::Surreal;

use crate::db::models::{
    CustomerStatus, FailedFinancialTransaction, FailureReason, FinancialTransaction,
    OverrideLookup, PaymentType, PricingSettings, Technician, TechnicianEarning, WorkOrder,
    WorkOrderSnapshot,
};
use crate::db::repository::{
    DiscountConfirmationRepository, EvidenceRepository, FailedTransactionRepository,
    PricingSettingsRepository, RepoResult, TechnicianRepository, TransactionRepository,
    WorkOrderRepository,
};
use crate::utils::time;

use super::money;
use super::outcome::SettlementOutcome;

/// Callback fired after every ledger write that can change report totals.
/// The wiring layer points this at the report cache.
pub type LedgerWriteHook = Arc<dyn Fn() + Send + Sync>;

/// Settlement engine: owns the repositories it reads and the two ledgers
/// it writes.
#[derive(Clone)]
pub struct SettlementEngine {
    work_orders: WorkOrderRepository,
    evidence: EvidenceRepository,
    technicians: TechnicianRepository,
    pricing: PricingSettingsRepository,
    confirmations: DiscountConfirmationRepository,
    transactions: TransactionRepository,
    failures: FailedTransactionRepository,
    tz: chrono_tz::Tz,
    on_ledger_write: LedgerWriteHook,
}

impl std::fmt::Debug for SettlementEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SettlementEngine")
            .field("tz", &self.tz)
            .finish()
    }
}

impl SettlementEngine {
    pub fn new(db: Surreal<Db>, tz: chrono_tz::Tz) -> Self {
        Self {
            work_orders: WorkOrderRepository::new(db.clone()),
            evidence: EvidenceRepository::new(db.clone()),
            technicians: TechnicianRepository::new(db.clone()),
            pricing: PricingSettingsRepository::new(db.clone()),
            confirmations: DiscountConfirmationRepository::new(db.clone()),
            transactions: TransactionRepository::new(db.clone()),
            failures: FailedTransactionRepository::new(db),
            tz,
            on_ledger_write: Arc::new(|| {}),
        }
    }

    /// Install the ledger-write callback (report cache invalidation)
    pub fn with_ledger_write_hook(mut self, hook: LedgerWriteHook) -> Self {
        self.on_ledger_write = hook;
        self
    }

    /// Run the decision procedure for one work order.
    ///
    /// Every expected domain failure comes back as a [`SettlementOutcome`];
    /// only storage errors surface as `Err`.
    pub async fn settle(&self, work_order_key: &str) -> RepoResult<SettlementOutcome> {
        // Excluded work orders are out of settlement scope until an admin
        // clears the flag.
        if self.failures.is_excluded(work_order_key).await? {
            tracing::debug!(work_order = work_order_key, "Skipping settlement: excluded");
            return Ok(SettlementOutcome::Excluded);
        }

        // 1. The work order itself
        let Some(order) = self.work_orders.find_by_key(work_order_key).await? else {
            let record = self
                .write_failure(
                    work_order_key,
                    FailureReason::WorkOrderNotFound,
                    format!("Work order {work_order_key} not found"),
                    vec!["work_order".to_string()],
                    WorkOrderSnapshot {
                        order_number: work_order_key.to_string(),
                        ..Default::default()
                    },
                    None,
                )
                .await?;
            return Ok(SettlementOutcome::Failed(record));
        };

        // 2. Not completed+verified yet: not an error, nothing to write
        if !order.is_settlement_eligible() {
            return Ok(SettlementOutcome::NotEligible);
        }

        let snapshot = order.snapshot();
        let wo_id = WorkOrderRepository::record_id(work_order_key);

        // 3. Evidence record
        let Some(evidence) = self.evidence.find_by_work_order(&wo_id).await? else {
            let record = self
                .write_failure(
                    work_order_key,
                    FailureReason::MissingWorkOrderEvidence,
                    format!("No evidence record for work order {}", order.order_number),
                    vec!["evidence".to_string()],
                    snapshot,
                    None,
                )
                .await?;
            return Ok(SettlementOutcome::Failed(record));
        };

        // 4. Service classification
        let Some(status) = evidence.customer_status else {
            let record = self
                .write_failure(
                    work_order_key,
                    FailureReason::MissingCustomerStatus,
                    format!(
                        "Evidence for work order {} has no customer status",
                        order.order_number
                    ),
                    vec!["customer_status".to_string()],
                    snapshot,
                    None,
                )
                .await?;
            return Ok(SettlementOutcome::Failed(record));
        };

        // 5. Pricing configuration singleton
        let Some(settings) = self.pricing.get().await? else {
            let record = self
                .write_failure(
                    work_order_key,
                    FailureReason::MissingFinancialSettings,
                    "Pricing settings have not been configured".to_string(),
                    vec!["pricing_settings".to_string()],
                    snapshot,
                    None,
                )
                .await?;
            return Ok(SettlementOutcome::Failed(record));
        };

        // 6. Base price for the classification
        let Some(base_price) = settings.price_for(status) else {
            let record = self
                .write_failure(
                    work_order_key,
                    FailureReason::NoPriceForCustomerStatus,
                    format!("No price configured for customer status '{status}'"),
                    vec![format!("prices_by_status.{status}")],
                    snapshot,
                    None,
                )
                .await?;
            return Ok(SettlementOutcome::Failed(record));
        };

        // 7. Municipality discount, gated on admin confirmation
        let configured_discount = settings.discount_for(&order.municipality);
        let discount_percent = if configured_discount > 0.0 {
            match self
                .confirmations
                .find_by_municipality(&order.municipality)
                .await?
            {
                Some(confirmation) if confirmation.confirmed => confirmation.discount_percent,
                _ => {
                    let record = self
                        .write_failure(
                            work_order_key,
                            FailureReason::PendingDiscountConfirmation,
                            format!(
                                "Discount of {configured_discount}% for municipality '{}' \
                                 awaits admin confirmation",
                                order.municipality
                            ),
                            vec![],
                            snapshot,
                            Some(configured_discount),
                        )
                        .await?;
                    return Ok(SettlementOutcome::Pending(record));
                }
            }
        } else {
            0.0
        };

        // 8. Customer-side amounts
        let base = money::to_decimal(base_price);
        let discount_amount = money::percent_of(base, discount_percent);
        let final_price = (base - discount_amount).max(Decimal::ZERO);

        // 9. Assigned technicians
        if order.technicians.is_empty() {
            let record = self
                .write_failure(
                    work_order_key,
                    FailureReason::NoTechniciansAssigned,
                    format!("Work order {} has no technicians assigned", order.order_number),
                    vec!["technicians".to_string()],
                    snapshot,
                    None,
                )
                .await?;
            return Ok(SettlementOutcome::Failed(record));
        }

        let mut crew: Vec<(surrealdb::RecordId, Technician)> =
            Vec::with_capacity(order.technicians.len());
        for tech_id in &order.technicians {
            match self.technicians.find_by_id(tech_id).await? {
                Some(tech) => crew.push((tech_id.clone(), tech)),
                None => {
                    let record = self
                        .write_failure(
                            work_order_key,
                            FailureReason::OtherError,
                            format!("Assigned technician {tech_id} does not exist"),
                            vec!["technicians".to_string()],
                            snapshot,
                            None,
                        )
                        .await?;
                    return Ok(SettlementOutcome::Failed(record));
                }
            }
        }

        // 10. Per-technician earnings
        let earnings = match self
            .compute_earnings(work_order_key, &order, &settings, status, final_price, &crew)
            .await?
        {
            Ok(earnings) => earnings,
            Err(record) => return Ok(SettlementOutcome::Failed(record)),
        };

        // 11. Totals: compensation cost vs company profit
        let total_earnings: Decimal = earnings
            .iter()
            .map(|e| money::to_decimal(e.amount))
            .sum();
        let company_profit = final_price - total_earnings;

        // 12. Persist: keyed upsert replaces any prior record, failure
        // record is superseded
        let verified_at = order.verified_at.unwrap_or(order.created_at);
        let created_at = self
            .transactions
            .find_by_work_order(work_order_key)
            .await?
            .map(|prior| prior.created_at)
            .unwrap_or_else(time::now_millis);

        let tx = FinancialTransaction {
            id: None,
            work_order: wo_id,
            evidence: evidence.id.clone().unwrap_or_else(|| {
                surrealdb::RecordId::from_table_key("work_evidence", work_order_key)
            }),
            order_number: order.order_number.clone(),
            customer_status: status,
            municipality: order.municipality.clone(),
            base_price: money::to_f64(base),
            discount_percent,
            discount_amount: money::to_f64(discount_amount),
            final_price: money::to_f64(final_price),
            technician_earnings: earnings,
            total_technician_earnings: money::to_f64(total_earnings),
            company_profit: money::to_f64(company_profit),
            verified_at,
            created_at,
        };

        let saved = self
            .transactions
            .upsert_for_work_order(work_order_key, tx)
            .await?;
        self.failures.delete_for_work_order(work_order_key).await?;
        (self.on_ledger_write)();

        tracing::info!(
            work_order = %order.order_number,
            final_price = saved.final_price,
            payout = saved.total_technician_earnings,
            profit = saved.company_profit,
            "Work order settled"
        );

        Ok(SettlementOutcome::Settled(saved))
    }

    /// Delete the settlement record of a work order (full-recompute path);
    /// true if one existed.
    pub async fn clear_settlement(&self, work_order_key: &str) -> RepoResult<bool> {
        let had_tx = self.transactions.delete_for_work_order(work_order_key).await?;
        if had_tx {
            (self.on_ledger_write)();
        }
        Ok(had_tx)
    }

    /// Record an unexpected error (storage failure, defect) as an
    /// `OTHER_ERROR` failure so batch sweeps never lose the diagnosis.
    pub async fn record_unexpected_error(
        &self,
        work_order_key: &str,
        error: &str,
    ) -> RepoResult<FailedFinancialTransaction> {
        let snapshot = match self.work_orders.find_by_key(work_order_key).await {
            Ok(Some(order)) => order.snapshot(),
            _ => WorkOrderSnapshot {
                order_number: work_order_key.to_string(),
                ..Default::default()
            },
        };
        self.write_failure(
            work_order_key,
            FailureReason::OtherError,
            format!("Unexpected error during settlement: {error}"),
            vec![],
            snapshot,
            None,
        )
        .await
    }

    /// Resolve each technician's nominal value for the job and run salary
    /// accounting. Returns `Err(record)` when a technician's pricing is
    /// unresolvable.
    async fn compute_earnings(
        &self,
        work_order_key: &str,
        order: &WorkOrder,
        settings: &PricingSettings,
        status: CustomerStatus,
        final_price: Decimal,
        crew: &[(surrealdb::RecordId, Technician)],
    ) -> RepoResult<Result<Vec<TechnicianEarning>, FailedFinancialTransaction>> {
        let shares = money::split_even(final_price, crew.len());
        let (month_start, month_end) =
            time::month_window_of(order.verified_at.unwrap_or(order.created_at), self.tz);

        let mut earnings = Vec::with_capacity(crew.len());
        for (idx, (tech_id, tech)) in crew.iter().enumerate() {
            let nominal = match settings.technician_price(tech_id, status) {
                OverrideLookup::Price(price) => money::to_decimal(price),
                // An override table that lacks this classification is a
                // configuration failure; silently falling back would
                // contradict the override's intent.
                OverrideLookup::MissingEntry => {
                    let record = self
                        .write_failure(
                            work_order_key,
                            FailureReason::MissingTechnicianPricing,
                            format!(
                                "Technician '{}' has a price table without an entry for '{status}'",
                                tech.name
                            ),
                            vec![format!("technician_prices.{}.{status}", tech.name)],
                            order.snapshot(),
                            None,
                        )
                        .await?;
                    return Ok(Err(record));
                }
                OverrideLookup::NoTable => shares[idx],
            };

            let earning = match tech.payment_type {
                PaymentType::PoStatusu => TechnicianEarning {
                    technician: tech_id.clone(),
                    technician_name: tech.name.clone(),
                    payment_type: tech.payment_type,
                    nominal_amount: money::to_f64(nominal),
                    amount: money::to_f64(nominal),
                    paid_amount: money::to_f64(nominal),
                    earned_towards_salary: None,
                    previously_earned: None,
                    exceeded_salary: None,
                    excess_amount: None,
                },
                PaymentType::Plata => {
                    let previously_earned = self
                        .transactions
                        .earned_towards_salary_in_window(
                            tech_id,
                            month_start,
                            month_end,
                            Some(work_order_key),
                        )
                        .await?;
                    let salary = money::to_decimal(tech.monthly_salary);
                    let headroom = (salary - money::to_decimal(previously_earned))
                        .max(Decimal::ZERO);
                    let toward = nominal.min(headroom);
                    let excess = nominal - toward;

                    TechnicianEarning {
                        technician: tech_id.clone(),
                        technician_name: tech.name.clone(),
                        payment_type: tech.payment_type,
                        nominal_amount: money::to_f64(nominal),
                        // Compensation cost is the salary accrual; the
                        // excess lands in company profit instead
                        amount: money::to_f64(toward),
                        paid_amount: 0.0,
                        earned_towards_salary: Some(money::to_f64(toward)),
                        previously_earned: Some(previously_earned),
                        exceeded_salary: Some(excess > Decimal::ZERO),
                        excess_amount: Some(money::to_f64(excess)),
                    }
                }
            };
            earnings.push(earning);
        }

        Ok(Ok(earnings))
    }

    /// Upsert a failure record (attempt counter preserved by the
    /// repository) and drop any stale transaction so the work order is
    /// never simultaneously settled and failed.
    async fn write_failure(
        &self,
        work_order_key: &str,
        reason: FailureReason,
        message: String,
        missing_fields: Vec<String>,
        snapshot: WorkOrderSnapshot,
        suggested_discount_percent: Option<f64>,
    ) -> RepoResult<FailedFinancialTransaction> {
        let now = time::now_millis();
        let draft = FailedFinancialTransaction {
            id: None,
            work_order: WorkOrderRepository::record_id(work_order_key),
            reason,
            message,
            missing_fields,
            order_snapshot: snapshot,
            suggested_discount_percent,
            requires_admin_action: reason.is_pending(),
            attempt_count: 1,
            last_attempt_at: now,
            resolved: false,
            excluded_from_finances: false,
            created_at: now,
        };

        if self.transactions.delete_for_work_order(work_order_key).await? {
            (self.on_ledger_write)();
        }

        let saved = self
            .failures
            .upsert_for_work_order(work_order_key, draft)
            .await?;

        tracing::warn!(
            work_order = work_order_key,
            reason = ?saved.reason,
            attempt = saved.attempt_count,
            "Settlement failed: {}",
            saved.message
        );

        Ok(saved)
    }
}
