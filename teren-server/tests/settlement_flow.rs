//! End-to-end settlement tests over an embedded database.
//!
//! Each test gets its own RocksDB under a temp dir, seeds the dispatch-side
//! data directly through the repositories, and drives the engine/driver the
//! same way the HTTP layer does.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use chrono::NaiveDate;
use surrealdb::engine::local::Db;
use surrealdb::{RecordId, Surreal};
use tokio_util::sync::CancellationToken;

use teren_server::db::models::{
    CustomerStatus, EvidenceRecord, FailureReason, MunicipalityDiscount, PaymentType,
    PricingSettings, Technician, TechnicianPriceOverride, WorkOrder, WorkOrderStatus,
};
use teren_server::db::repository::{
    DiscountConfirmationRepository, EvidenceRepository, FailedTransactionRepository,
    PricingSettingsRepository, TechnicianRepository, TransactionRepository, WorkOrderRepository,
};
use teren_server::db::DbService;
use teren_server::reporting::{ReportingService, TransactionReportQuery};
use teren_server::settlement::{RecalcDriver, SettlementEngine, SettlementOutcome};

const TZ: chrono_tz::Tz = chrono_tz::Europe::Belgrade;

// ============================================================================
// Test Harness
// ============================================================================

struct TestEnv {
    _tmp: tempfile::TempDir,
    db: Surreal<Db>,
    work_orders: WorkOrderRepository,
    evidence: EvidenceRepository,
    technicians: TechnicianRepository,
    pricing: PricingSettingsRepository,
    confirmations: DiscountConfirmationRepository,
    transactions: TransactionRepository,
    failures: FailedTransactionRepository,
    engine: SettlementEngine,
    driver: RecalcDriver,
    reports: ReportingService,
}

async fn setup() -> TestEnv {
    let tmp = tempfile::tempdir().expect("tempdir");
    let db = DbService::new(&tmp.path().join("db"))
        .await
        .expect("db bootstrap")
        .db;

    let reports = ReportingService::new(db.clone(), TZ, Duration::from_secs(300));
    let cache = reports.cache();
    let engine = SettlementEngine::new(db.clone(), TZ)
        .with_ledger_write_hook(Arc::new(move || cache.invalidate_all()));
    let driver = RecalcDriver::new(
        engine.clone(),
        WorkOrderRepository::new(db.clone()),
        4,
        CancellationToken::new(),
    );

    TestEnv {
        work_orders: WorkOrderRepository::new(db.clone()),
        evidence: EvidenceRepository::new(db.clone()),
        technicians: TechnicianRepository::new(db.clone()),
        pricing: PricingSettingsRepository::new(db.clone()),
        confirmations: DiscountConfirmationRepository::new(db.clone()),
        transactions: TransactionRepository::new(db.clone()),
        failures: FailedTransactionRepository::new(db.clone()),
        engine,
        driver,
        reports,
        db,
        _tmp: tmp,
    }
}

/// Unix millis for a date at noon, business timezone
fn at_noon(year: i32, month: u32, day: u32) -> i64 {
    teren_server::utils::time::date_hms_to_millis(
        NaiveDate::from_ymd_opt(year, month, day).expect("valid date"),
        12,
        0,
        0,
        TZ,
    )
}

async fn seed_prices(env: &TestEnv, prices: &[(CustomerStatus, f64)]) -> PricingSettings {
    let settings = PricingSettings {
        prices_by_status: prices.iter().copied().collect::<BTreeMap<_, _>>(),
        ..PricingSettings::default()
    };
    env.pricing.save(settings).await.expect("seed prices")
}

async fn seed_technician(
    env: &TestEnv,
    name: &str,
    payment_type: PaymentType,
    monthly_salary: f64,
) -> RecordId {
    env.technicians
        .create(Technician {
            id: None,
            name: name.to_string(),
            payment_type,
            monthly_salary,
        })
        .await
        .expect("seed technician")
        .id
        .expect("technician id")
}

async fn seed_work_order(
    env: &TestEnv,
    order_number: &str,
    municipality: &str,
    technicians: Vec<RecordId>,
    verified_at: i64,
) -> String {
    let order = env
        .work_orders
        .create(WorkOrder {
            id: None,
            order_number: order_number.to_string(),
            status: WorkOrderStatus::Zavrsen,
            verified: true,
            verified_at: Some(verified_at),
            municipality: municipality.to_string(),
            user_name: Some("Petar Petrović".to_string()),
            address: Some("Bulevar kralja Aleksandra 73".to_string()),
            technicians,
            created_at: verified_at - 86_400_000,
        })
        .await
        .expect("seed work order");
    order.id.expect("work order id").key().to_string()
}

async fn seed_evidence(env: &TestEnv, work_order_key: &str, status: Option<CustomerStatus>) {
    env.evidence
        .create(EvidenceRecord {
            id: None,
            work_order: WorkOrderRepository::record_id(work_order_key),
            customer_status: status,
            submitted_at: at_noon(2026, 3, 9),
        })
        .await
        .expect("seed evidence");
}

/// Add a per-technician price table to the stored settings
async fn seed_override(env: &TestEnv, technician: &RecordId, prices: &[(CustomerStatus, f64)]) {
    let mut settings = env.pricing.get().await.expect("get").expect("settings");
    settings.technician_prices.push(TechnicianPriceOverride {
        technician: technician.clone(),
        prices_by_status: prices.iter().copied().collect(),
    });
    env.pricing.save(settings).await.expect("save override");
}

async fn seed_municipality_discount(env: &TestEnv, municipality: &str, percent: f64) {
    let mut settings = env.pricing.get().await.expect("get").expect("settings");
    settings.municipality_discounts.push(MunicipalityDiscount {
        municipality: municipality.to_string(),
        discount_percent: percent,
    });
    env.pricing.save(settings).await.expect("save discount");
}

fn settled(outcome: SettlementOutcome) -> teren_server::db::models::FinancialTransaction {
    match outcome {
        SettlementOutcome::Settled(tx) => tx,
        other => panic!("expected Settled, got {}", other.label()),
    }
}

// ============================================================================
// Worked scenarios
// ============================================================================

#[tokio::test]
async fn settles_discounted_work_order() {
    let env = setup().await;
    seed_prices(&env, &[(CustomerStatus::NovKorisnik, 10000.0)]).await;
    seed_municipality_discount(&env, "Zvezdara", 10.0).await;
    env.confirmations
        .confirm("Zvezdara", 10.0, "admin")
        .await
        .expect("confirm");

    let tech = seed_technician(&env, "Marko", PaymentType::PoStatusu, 0.0).await;
    seed_override(&env, &tech, &[(CustomerStatus::NovKorisnik, 6000.0)]).await;

    let key = seed_work_order(&env, "RN-1", "Zvezdara", vec![tech], at_noon(2026, 3, 10)).await;
    seed_evidence(&env, &key, Some(CustomerStatus::NovKorisnik)).await;

    let tx = settled(env.engine.settle(&key).await.expect("settle"));

    assert_eq!(tx.base_price, 10000.0);
    assert_eq!(tx.discount_percent, 10.0);
    assert_eq!(tx.discount_amount, 1000.0);
    assert_eq!(tx.final_price, 9000.0);
    assert_eq!(tx.technician_earnings.len(), 1);
    assert_eq!(tx.technician_earnings[0].amount, 6000.0);
    assert_eq!(tx.technician_earnings[0].paid_amount, 6000.0);
    assert_eq!(tx.total_technician_earnings, 6000.0);
    assert_eq!(tx.company_profit, 3000.0);

    // No failure record remains
    assert!(env
        .failures
        .find_by_work_order(&key)
        .await
        .expect("query")
        .is_none());
}

#[tokio::test]
async fn salary_cap_splits_straddling_job() {
    let env = setup().await;
    seed_prices(
        &env,
        &[
            (CustomerStatus::NovKorisnik, 60000.0),
            (CustomerStatus::Servis, 8000.0),
        ],
    )
    .await;

    let tech = seed_technician(&env, "Jovan", PaymentType::Plata, 50000.0).await;
    seed_override(
        &env,
        &tech,
        &[
            (CustomerStatus::NovKorisnik, 48000.0),
            (CustomerStatus::Servis, 5000.0),
        ],
    )
    .await;

    // First job in March fills the salary to 48000
    let first = seed_work_order(&env, "RN-10", "Palilula", vec![tech.clone()], at_noon(2026, 3, 5)).await;
    seed_evidence(&env, &first, Some(CustomerStatus::NovKorisnik)).await;
    let tx = settled(env.engine.settle(&first).await.expect("settle first"));
    assert_eq!(tx.technician_earnings[0].earned_towards_salary, Some(48000.0));
    assert_eq!(tx.technician_earnings[0].excess_amount, Some(0.0));
    assert_eq!(tx.technician_earnings[0].exceeded_salary, Some(false));

    // Second job straddles the remaining 2000 of headroom
    let second = seed_work_order(&env, "RN-11", "Palilula", vec![tech.clone()], at_noon(2026, 3, 20)).await;
    seed_evidence(&env, &second, Some(CustomerStatus::Servis)).await;
    let tx = settled(env.engine.settle(&second).await.expect("settle second"));

    let earning = &tx.technician_earnings[0];
    assert_eq!(earning.nominal_amount, 5000.0);
    assert_eq!(earning.previously_earned, Some(48000.0));
    assert_eq!(earning.earned_towards_salary, Some(2000.0));
    assert_eq!(earning.excess_amount, Some(3000.0));
    assert_eq!(earning.exceeded_salary, Some(true));
    assert_eq!(earning.paid_amount, 0.0);

    // Profit gains the excess: 8000 - 5000 + 3000
    assert_eq!(tx.final_price, 8000.0);
    assert_eq!(tx.total_technician_earnings, 2000.0);
    assert_eq!(tx.company_profit, 6000.0);
}

#[tokio::test]
async fn salary_cap_fully_exceeded_redirects_everything() {
    let env = setup().await;
    seed_prices(
        &env,
        &[
            (CustomerStatus::NovKorisnik, 4000.0),
            (CustomerStatus::Servis, 1500.0),
        ],
    )
    .await;

    let tech = seed_technician(&env, "Luka", PaymentType::Plata, 2000.0).await;
    seed_override(
        &env,
        &tech,
        &[
            (CustomerStatus::NovKorisnik, 2500.0),
            (CustomerStatus::Servis, 1000.0),
        ],
    )
    .await;

    let first = seed_work_order(&env, "RN-20", "Vračar", vec![tech.clone()], at_noon(2026, 4, 2)).await;
    seed_evidence(&env, &first, Some(CustomerStatus::NovKorisnik)).await;
    let tx = settled(env.engine.settle(&first).await.expect("settle first"));
    assert_eq!(tx.technician_earnings[0].earned_towards_salary, Some(2000.0));
    assert_eq!(tx.technician_earnings[0].excess_amount, Some(500.0));

    // Cap already reached: the whole job is excess
    let second = seed_work_order(&env, "RN-21", "Vračar", vec![tech.clone()], at_noon(2026, 4, 9)).await;
    seed_evidence(&env, &second, Some(CustomerStatus::Servis)).await;
    let tx = settled(env.engine.settle(&second).await.expect("settle second"));

    let earning = &tx.technician_earnings[0];
    assert_eq!(earning.previously_earned, Some(2000.0));
    assert_eq!(earning.earned_towards_salary, Some(0.0));
    assert_eq!(earning.excess_amount, Some(1000.0));
    assert_eq!(earning.exceeded_salary, Some(true));
    assert_eq!(earning.amount, 0.0);
    assert_eq!(tx.company_profit, tx.final_price);
}

#[tokio::test]
async fn even_split_conserves_final_price() {
    let env = setup().await;
    seed_prices(&env, &[(CustomerStatus::Preseljenje, 100.01)]).await;

    let a = seed_technician(&env, "Ana", PaymentType::PoStatusu, 0.0).await;
    let b = seed_technician(&env, "Bojan", PaymentType::PoStatusu, 0.0).await;

    let key = seed_work_order(&env, "RN-30", "Zemun", vec![a, b], at_noon(2026, 3, 12)).await;
    seed_evidence(&env, &key, Some(CustomerStatus::Preseljenje)).await;

    let tx = settled(env.engine.settle(&key).await.expect("settle"));
    assert_eq!(tx.technician_earnings[0].amount, 50.0);
    assert_eq!(tx.technician_earnings[1].amount, 50.01);
    assert_eq!(tx.total_technician_earnings, 100.01);
    assert_eq!(tx.company_profit, 0.0);
}

// ============================================================================
// Discount gate
// ============================================================================

#[tokio::test]
async fn unconfirmed_discount_stalls_until_confirmation() {
    let env = setup().await;
    seed_prices(&env, &[(CustomerStatus::NovKorisnik, 10000.0)]).await;
    seed_municipality_discount(&env, "Novi Beograd", 10.0).await;

    let tech = seed_technician(&env, "Marko", PaymentType::PoStatusu, 0.0).await;
    seed_override(&env, &tech, &[(CustomerStatus::NovKorisnik, 6000.0)]).await;

    let key =
        seed_work_order(&env, "RN-40", "Novi Beograd", vec![tech], at_noon(2026, 3, 15)).await;
    seed_evidence(&env, &key, Some(CustomerStatus::NovKorisnik)).await;

    // Settlement parks the work order instead of settling
    let outcome = env.engine.settle(&key).await.expect("settle");
    assert!(matches!(outcome, SettlementOutcome::Pending(_)));

    let record = env
        .failures
        .find_by_work_order(&key)
        .await
        .expect("query")
        .expect("failure record");
    assert_eq!(record.reason, FailureReason::PendingDiscountConfirmation);
    assert!(record.requires_admin_action);
    assert_eq!(record.suggested_discount_percent, Some(10.0));
    assert!(env
        .transactions
        .find_by_work_order(&key)
        .await
        .expect("query")
        .is_none());

    // Admin confirms a different percent; the confirmed one wins
    env.confirmations
        .confirm("Novi Beograd", 12.0, "admin")
        .await
        .expect("confirm");
    let blocked = env
        .failures
        .find_pending_for_municipality("Novi Beograd")
        .await
        .expect("pending list");
    assert_eq!(blocked, vec![key.clone()]);

    let summary = env.driver.recalculate_many(blocked).await;
    assert_eq!(summary.settled, 1);

    let tx = env
        .transactions
        .find_by_work_order(&key)
        .await
        .expect("query")
        .expect("transaction");
    assert_eq!(tx.discount_percent, 12.0);
    assert_eq!(tx.final_price, 8800.0);
    assert!(env
        .failures
        .find_by_work_order(&key)
        .await
        .expect("query")
        .is_none());
}

// ============================================================================
// Failure taxonomy
// ============================================================================

#[tokio::test]
async fn missing_inputs_produce_matching_reasons() {
    let env = setup().await;

    // No settings at all
    let tech = seed_technician(&env, "Marko", PaymentType::PoStatusu, 0.0).await;
    let key = seed_work_order(&env, "RN-50", "Zvezdara", vec![tech.clone()], at_noon(2026, 3, 10)).await;

    // 1. missing evidence
    let outcome = env.engine.settle(&key).await.expect("settle");
    match &outcome {
        SettlementOutcome::Failed(rec) => {
            assert_eq!(rec.reason, FailureReason::MissingWorkOrderEvidence);
            assert_eq!(rec.missing_fields, vec!["evidence".to_string()]);
            assert_eq!(rec.order_snapshot.order_number, "RN-50");
        }
        other => panic!("expected Failed, got {}", other.label()),
    }

    // 2. evidence without classification
    seed_evidence(&env, &key, None).await;
    let outcome = env.engine.settle(&key).await.expect("settle");
    match &outcome {
        SettlementOutcome::Failed(rec) => {
            assert_eq!(rec.reason, FailureReason::MissingCustomerStatus);
            // Same record, attempt counter moved on
            assert_eq!(rec.attempt_count, 2);
        }
        other => panic!("expected Failed, got {}", other.label()),
    }
}

#[tokio::test]
async fn missing_settings_and_price_reasons() {
    let env = setup().await;
    let tech = seed_technician(&env, "Marko", PaymentType::PoStatusu, 0.0).await;
    let key = seed_work_order(&env, "RN-51", "Zvezdara", vec![tech], at_noon(2026, 3, 10)).await;
    seed_evidence(&env, &key, Some(CustomerStatus::Servis)).await;

    // Settings singleton never created
    let outcome = env.engine.settle(&key).await.expect("settle");
    match &outcome {
        SettlementOutcome::Failed(rec) => {
            assert_eq!(rec.reason, FailureReason::MissingFinancialSettings)
        }
        other => panic!("expected Failed, got {}", other.label()),
    }

    // Settings exist but the classification is unpriced
    seed_prices(&env, &[(CustomerStatus::NovKorisnik, 10000.0)]).await;
    let outcome = env.engine.settle(&key).await.expect("settle");
    match &outcome {
        SettlementOutcome::Failed(rec) => {
            assert_eq!(rec.reason, FailureReason::NoPriceForCustomerStatus)
        }
        other => panic!("expected Failed, got {}", other.label()),
    }
}

#[tokio::test]
async fn no_technicians_and_missing_override_entry() {
    let env = setup().await;
    seed_prices(&env, &[(CustomerStatus::NovKorisnik, 10000.0)]).await;

    // No technicians assigned
    let key = seed_work_order(&env, "RN-52", "Zvezdara", vec![], at_noon(2026, 3, 10)).await;
    seed_evidence(&env, &key, Some(CustomerStatus::NovKorisnik)).await;
    let outcome = env.engine.settle(&key).await.expect("settle");
    match &outcome {
        SettlementOutcome::Failed(rec) => {
            assert_eq!(rec.reason, FailureReason::NoTechniciansAssigned)
        }
        other => panic!("expected Failed, got {}", other.label()),
    }

    // Override table exists but lacks the resolved classification
    let tech = seed_technician(&env, "Marko", PaymentType::PoStatusu, 0.0).await;
    seed_override(&env, &tech, &[(CustomerStatus::Servis, 2000.0)]).await;
    let key2 = seed_work_order(&env, "RN-53", "Zvezdara", vec![tech], at_noon(2026, 3, 11)).await;
    seed_evidence(&env, &key2, Some(CustomerStatus::NovKorisnik)).await;
    let outcome = env.engine.settle(&key2).await.expect("settle");
    match &outcome {
        SettlementOutcome::Failed(rec) => {
            assert_eq!(rec.reason, FailureReason::MissingTechnicianPricing);
            assert!(rec.message.contains("Marko"));
        }
        other => panic!("expected Failed, got {}", other.label()),
    }
}

#[tokio::test]
async fn unknown_work_order_is_recorded() {
    let env = setup().await;
    let outcome = env.engine.settle("no-such-order").await.expect("settle");
    match &outcome {
        SettlementOutcome::Failed(rec) => {
            assert_eq!(rec.reason, FailureReason::WorkOrderNotFound)
        }
        other => panic!("expected Failed, got {}", other.label()),
    }
}

#[tokio::test]
async fn ineligible_work_order_writes_nothing() {
    let env = setup().await;
    seed_prices(&env, &[(CustomerStatus::NovKorisnik, 10000.0)]).await;
    let tech = seed_technician(&env, "Marko", PaymentType::PoStatusu, 0.0).await;

    let order = env
        .work_orders
        .create(WorkOrder {
            id: None,
            order_number: "RN-60".to_string(),
            status: WorkOrderStatus::Zavrsen,
            verified: false,
            verified_at: None,
            municipality: "Zvezdara".to_string(),
            user_name: None,
            address: None,
            technicians: vec![tech],
            created_at: at_noon(2026, 3, 1),
        })
        .await
        .expect("create");
    let key = order.id.expect("id").key().to_string();

    let outcome = env.engine.settle(&key).await.expect("settle");
    assert!(matches!(outcome, SettlementOutcome::NotEligible));
    assert!(env.failures.find_by_work_order(&key).await.expect("q").is_none());
    assert!(env.transactions.find_by_work_order(&key).await.expect("q").is_none());
}

// ============================================================================
// Uniqueness / idempotence
// ============================================================================

#[tokio::test]
async fn resettlement_is_idempotent() {
    let env = setup().await;
    seed_prices(&env, &[(CustomerStatus::NovKorisnik, 10000.0)]).await;
    let tech = seed_technician(&env, "Jovan", PaymentType::Plata, 50000.0).await;
    seed_override(&env, &tech, &[(CustomerStatus::NovKorisnik, 6000.0)]).await;

    let key = seed_work_order(&env, "RN-70", "Zvezdara", vec![tech], at_noon(2026, 3, 10)).await;
    seed_evidence(&env, &key, Some(CustomerStatus::NovKorisnik)).await;

    let first = settled(env.engine.settle(&key).await.expect("settle"));
    let second = settled(env.engine.settle(&key).await.expect("settle again"));

    assert_eq!(first.final_price, second.final_price);
    assert_eq!(first.company_profit, second.company_profit);
    assert_eq!(first.created_at, second.created_at);
    // Own record is excluded from the month sum, so the accrual is stable
    assert_eq!(
        first.technician_earnings[0].earned_towards_salary,
        second.technician_earnings[0].earned_towards_salary
    );
    assert_eq!(
        second.technician_earnings[0].previously_earned,
        Some(0.0)
    );

    // Still exactly one row in the ledger
    let mut result = env
        .db
        .query("SELECT count() AS c FROM financial_transaction GROUP ALL")
        .await
        .expect("count query");
    #[derive(serde::Deserialize)]
    struct CountRow {
        c: i64,
    }
    let rows: Vec<CountRow> = result.take(0).expect("take");
    assert_eq!(rows.first().map(|r| r.c), Some(1));
}

#[tokio::test]
async fn concurrent_settlement_never_duplicates() {
    let env = setup().await;
    seed_prices(&env, &[(CustomerStatus::NovKorisnik, 10000.0)]).await;
    let tech = seed_technician(&env, "Marko", PaymentType::PoStatusu, 0.0).await;
    seed_override(&env, &tech, &[(CustomerStatus::NovKorisnik, 6000.0)]).await;
    let key = seed_work_order(&env, "RN-71", "Zvezdara", vec![tech], at_noon(2026, 3, 10)).await;
    seed_evidence(&env, &key, Some(CustomerStatus::NovKorisnik)).await;

    let (a, b) = tokio::join!(env.engine.settle(&key), env.engine.settle(&key));
    assert!(a.expect("settle a").is_settled());
    assert!(b.expect("settle b").is_settled());

    let mut result = env
        .db
        .query("SELECT count() AS c FROM financial_transaction GROUP ALL")
        .await
        .expect("count query");
    #[derive(serde::Deserialize)]
    struct CountRow {
        c: i64,
    }
    let rows: Vec<CountRow> = result.take(0).expect("take");
    assert_eq!(rows.first().map(|r| r.c), Some(1));
}

#[tokio::test]
async fn never_settled_and_failed_at_once() {
    let env = setup().await;
    seed_prices(&env, &[(CustomerStatus::NovKorisnik, 10000.0)]).await;
    let tech = seed_technician(&env, "Marko", PaymentType::PoStatusu, 0.0).await;
    seed_override(&env, &tech, &[(CustomerStatus::NovKorisnik, 6000.0)]).await;
    let key = seed_work_order(&env, "RN-72", "Zvezdara", vec![tech], at_noon(2026, 3, 10)).await;
    seed_evidence(&env, &key, Some(CustomerStatus::NovKorisnik)).await;

    assert!(env.engine.settle(&key).await.expect("settle").is_settled());

    // Break the configuration and recalculate: the transaction must give
    // way to the failure record
    let mut settings = env.pricing.get().await.expect("get").expect("settings");
    settings.prices_by_status.clear();
    env.pricing.save(settings).await.expect("save");

    let report = env.driver.recalculate_one(&key).await;
    assert_eq!(report.outcome, "failed");
    assert!(env.transactions.find_by_work_order(&key).await.expect("q").is_none());
    assert!(env.failures.find_by_work_order(&key).await.expect("q").is_some());

    // Fix it again: failure record gives way to the transaction
    seed_prices(&env, &[(CustomerStatus::NovKorisnik, 10000.0)]).await;
    let report = env.driver.recalculate_one(&key).await;
    assert_eq!(report.outcome, "settled");
    assert!(env.transactions.find_by_work_order(&key).await.expect("q").is_some());
    assert!(env.failures.find_by_work_order(&key).await.expect("q").is_none());
}

// ============================================================================
// Remediation actions
// ============================================================================

#[tokio::test]
async fn retry_after_fix_supersedes_failure() {
    let env = setup().await;
    seed_prices(&env, &[(CustomerStatus::NovKorisnik, 10000.0)]).await;
    let tech = seed_technician(&env, "Marko", PaymentType::PoStatusu, 0.0).await;
    seed_override(&env, &tech, &[(CustomerStatus::NovKorisnik, 6000.0)]).await;
    let key = seed_work_order(&env, "RN-80", "Zvezdara", vec![tech], at_noon(2026, 3, 10)).await;

    let outcome = env.engine.settle(&key).await.expect("settle");
    assert!(matches!(outcome, SettlementOutcome::Failed(_)));

    seed_evidence(&env, &key, Some(CustomerStatus::NovKorisnik)).await;
    let report = env.driver.recalculate_one(&key).await;
    assert_eq!(report.outcome, "settled");
    assert!(env.failures.find_by_work_order(&key).await.expect("q").is_none());
}

#[tokio::test]
async fn excluded_work_order_is_skipped_everywhere() {
    let env = setup().await;
    seed_prices(&env, &[(CustomerStatus::NovKorisnik, 10000.0)]).await;
    let tech = seed_technician(&env, "Marko", PaymentType::PoStatusu, 0.0).await;
    seed_override(&env, &tech, &[(CustomerStatus::NovKorisnik, 6000.0)]).await;
    let key = seed_work_order(&env, "RN-81", "Zvezdara", vec![tech], at_noon(2026, 3, 10)).await;

    // Fails first (no evidence), then the admin writes it off
    assert!(matches!(
        env.engine.settle(&key).await.expect("settle"),
        SettlementOutcome::Failed(_)
    ));
    env.failures.mark_excluded(&key).await.expect("exclude");

    // Even after the data is fixed, settlement refuses to touch it
    seed_evidence(&env, &key, Some(CustomerStatus::NovKorisnik)).await;
    assert!(matches!(
        env.engine.settle(&key).await.expect("settle"),
        SettlementOutcome::Excluded
    ));
    let report = env.driver.recalculate_one(&key).await;
    assert_eq!(report.outcome, "excluded");
    assert!(env.transactions.find_by_work_order(&key).await.expect("q").is_none());

    // And it no longer shows in the remediation list
    assert!(env.failures.list_unresolved().await.expect("list").is_empty());
}

#[tokio::test]
async fn resolve_removes_from_remediation_list() {
    let env = setup().await;
    let tech = seed_technician(&env, "Marko", PaymentType::PoStatusu, 0.0).await;
    let key = seed_work_order(&env, "RN-82", "Zvezdara", vec![tech], at_noon(2026, 3, 10)).await;

    assert!(matches!(
        env.engine.settle(&key).await.expect("settle"),
        SettlementOutcome::Failed(_)
    ));
    assert_eq!(env.failures.list_unresolved().await.expect("list").len(), 1);

    env.failures.mark_resolved(&key).await.expect("resolve");
    assert!(env.failures.list_unresolved().await.expect("list").is_empty());
}

// ============================================================================
// Bulk sweep
// ============================================================================

#[tokio::test]
async fn sweep_reports_mixed_outcomes_without_aborting() {
    let env = setup().await;
    seed_prices(&env, &[(CustomerStatus::NovKorisnik, 10000.0)]).await;
    seed_municipality_discount(&env, "Novi Beograd", 10.0).await;
    let tech = seed_technician(&env, "Marko", PaymentType::PoStatusu, 0.0).await;
    seed_override(&env, &tech, &[(CustomerStatus::NovKorisnik, 6000.0)]).await;

    // One settles, one lacks evidence, one waits on a discount
    let good = seed_work_order(&env, "RN-90", "Zvezdara", vec![tech.clone()], at_noon(2026, 3, 10)).await;
    seed_evidence(&env, &good, Some(CustomerStatus::NovKorisnik)).await;
    let broken = seed_work_order(&env, "RN-91", "Zvezdara", vec![tech.clone()], at_noon(2026, 3, 11)).await;
    let parked =
        seed_work_order(&env, "RN-92", "Novi Beograd", vec![tech.clone()], at_noon(2026, 3, 12)).await;
    seed_evidence(&env, &parked, Some(CustomerStatus::NovKorisnik)).await;

    let summary = env.driver.recalculate_all_eligible().await.expect("sweep");
    assert_eq!(summary.total, 3);
    assert_eq!(summary.settled, 1);
    assert_eq!(summary.failed, 1);
    assert_eq!(summary.pending, 1);

    // The successful item stayed committed despite its neighbors
    assert!(env.transactions.find_by_work_order(&good).await.expect("q").is_some());
    assert!(env.failures.find_by_work_order(&broken).await.expect("q").is_some());
    assert!(env.failures.find_by_work_order(&parked).await.expect("q").is_some());
}

// ============================================================================
// Reporting
// ============================================================================

#[tokio::test]
async fn report_totals_follow_ledger_writes() {
    let env = setup().await;
    seed_prices(&env, &[(CustomerStatus::NovKorisnik, 10000.0)]).await;
    let tech = seed_technician(&env, "Marko", PaymentType::PoStatusu, 0.0).await;
    seed_override(&env, &tech, &[(CustomerStatus::NovKorisnik, 6000.0)]).await;

    let first = seed_work_order(&env, "RN-100", "Zvezdara", vec![tech.clone()], at_noon(2026, 3, 10)).await;
    seed_evidence(&env, &first, Some(CustomerStatus::NovKorisnik)).await;
    env.engine.settle(&first).await.expect("settle");

    let report = env
        .reports
        .transaction_report(TransactionReportQuery {
            page: 1,
            page_size: 20,
            ..Default::default()
        })
        .await
        .expect("report");
    assert_eq!(report.total, 1);
    assert_eq!(report.totals.revenue, 10000.0);
    assert_eq!(report.totals.payouts, 6000.0);
    assert_eq!(report.totals.profit, 4000.0);

    // A new settlement invalidates the cache through the ledger-write hook
    let second = seed_work_order(&env, "RN-101", "Zvezdara", vec![tech.clone()], at_noon(2026, 3, 11)).await;
    seed_evidence(&env, &second, Some(CustomerStatus::NovKorisnik)).await;
    env.engine.settle(&second).await.expect("settle");

    let report = env
        .reports
        .transaction_report(TransactionReportQuery {
            page: 1,
            page_size: 20,
            ..Default::default()
        })
        .await
        .expect("report");
    assert_eq!(report.total, 2);
    assert_eq!(report.totals.revenue, 20000.0);

    // Free-text filter narrows both items and totals
    let filtered = env
        .reports
        .transaction_report(TransactionReportQuery {
            q: Some("RN-100".to_string()),
            page: 1,
            page_size: 20,
            ..Default::default()
        })
        .await
        .expect("report");
    assert_eq!(filtered.total, 1);
    assert_eq!(filtered.totals.revenue, 10000.0);
}

#[tokio::test]
async fn technician_and_salary_reports_aggregate_earnings() {
    let env = setup().await;
    seed_prices(
        &env,
        &[
            (CustomerStatus::NovKorisnik, 60000.0),
            (CustomerStatus::Servis, 8000.0),
        ],
    )
    .await;
    let tech = seed_technician(&env, "Jovan", PaymentType::Plata, 50000.0).await;
    seed_override(
        &env,
        &tech,
        &[
            (CustomerStatus::NovKorisnik, 48000.0),
            (CustomerStatus::Servis, 5000.0),
        ],
    )
    .await;

    let first = seed_work_order(&env, "RN-110", "Palilula", vec![tech.clone()], at_noon(2026, 3, 5)).await;
    seed_evidence(&env, &first, Some(CustomerStatus::NovKorisnik)).await;
    env.engine.settle(&first).await.expect("settle");
    let second = seed_work_order(&env, "RN-111", "Palilula", vec![tech.clone()], at_noon(2026, 3, 20)).await;
    seed_evidence(&env, &second, Some(CustomerStatus::Servis)).await;
    env.engine.settle(&second).await.expect("settle");

    let rows = env
        .reports
        .technician_report(None, None)
        .await
        .expect("technician report");
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].jobs, 2);
    assert_eq!(rows[0].toward_salary, 50000.0);
    assert_eq!(rows[0].excess_to_profit, 3000.0);
    assert_eq!(rows[0].cash_paid, 0.0);

    let salary = env
        .reports
        .salary_progress(2026, 3)
        .await
        .expect("salary progress");
    assert_eq!(salary.len(), 1);
    assert_eq!(salary[0].monthly_salary, 50000.0);
    assert_eq!(salary[0].earned, 50000.0);
    assert_eq!(salary[0].remaining, 0.0);
    assert!(salary[0].exceeded);
}
