//! Server state - shared references to every service
//!
//! `ServerState` is cloned into each handler; all members are cheap
//! shallow copies over `Arc`-backed handles.

use std::sync::Arc;
use std::time::Duration;

use surrealdb::engine::local::Db;
use surrealdb::Surreal;
use tokio_util::sync::CancellationToken;

use crate::core::Config;
use crate::db::repository::{PricingSettingsRepository, WorkOrderRepository};
use crate::db::DbService;
use crate::reporting::ReportingService;
use crate::settlement::{RecalcDriver, SettlementEngine};
use crate::utils::AppResult;

/// Shared server state
#[derive(Clone)]
pub struct ServerState {
    /// Server configuration
    pub config: Config,
    /// Embedded database (SurrealDB)
    pub db: Surreal<Db>,
    /// Settlement decision procedure
    pub settlement: SettlementEngine,
    /// Batch recalculation driver
    pub recalc: RecalcDriver,
    /// Read-side reporting with cache
    pub reports: ReportingService,
    /// Cooperative shutdown signal for long sweeps
    pub shutdown: CancellationToken,
}

impl ServerState {
    /// Initialize the server state
    ///
    /// Order matters: work directory, database, then services. The report
    /// cache is wired into the settlement engine here: every ledger write
    /// that can move a total clears it.
    pub async fn initialize(config: &Config) -> AppResult<Self> {
        config.ensure_work_dir_structure()?;

        let db_path = config.database_dir().join("teren.db");
        let db_service = DbService::new(&db_path).await?;
        let db = db_service.db;

        // Settings singleton exists from first boot so admin tooling always
        // has a record to edit
        PricingSettingsRepository::new(db.clone())
            .ensure_exists()
            .await?;

        let shutdown = CancellationToken::new();

        let reports = ReportingService::new(
            db.clone(),
            config.timezone,
            Duration::from_secs(config.report_cache_ttl_secs),
        );

        let cache = reports.cache();
        let settlement = SettlementEngine::new(db.clone(), config.timezone)
            .with_ledger_write_hook(Arc::new(move || cache.invalidate_all()));

        let recalc = RecalcDriver::new(
            settlement.clone(),
            WorkOrderRepository::new(db.clone()),
            config.recalc_concurrency,
            shutdown.clone(),
        );

        Ok(Self {
            config: config.clone(),
            db,
            settlement,
            recalc,
            reports,
            shutdown,
        })
    }
}
