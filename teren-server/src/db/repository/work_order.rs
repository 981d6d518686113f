//! Work Order Repository
//!
//! Read-side access for settlement. Work orders are created and mutated by
//! the dispatch system; `create` exists for seeding and tests.

use super::{BaseRepository, RepoError, RepoResult};
use crate::db::models::WorkOrder;
use surrealdb::engine::local::Db;
use surrealdb::{RecordId, Surreal};
use uuid::Uuid;

const TABLE: &str = "work_order";

#[derive(Clone)]
pub struct WorkOrderRepository {
    base: BaseRepository,
}

impl WorkOrderRepository {
    pub fn new(db: Surreal<Db>) -> Self {
        Self {
            base: BaseRepository::new(db),
        }
    }

    /// Record id for a work-order key
    pub fn record_id(key: &str) -> RecordId {
        RecordId::from_table_key(TABLE, key)
    }

    /// Create a work order with a generated key (seed/test path)
    pub async fn create(&self, data: WorkOrder) -> RepoResult<WorkOrder> {
        let key = Uuid::new_v4().simple().to_string();
        let created: Option<WorkOrder> = self
            .base
            .db()
            .create((TABLE, key.as_str()))
            .content(data)
            .await?;
        created.ok_or_else(|| RepoError::Database("Failed to create work order".to_string()))
    }

    /// Find a work order by key
    pub async fn find_by_key(&self, key: &str) -> RepoResult<Option<WorkOrder>> {
        let order: Option<WorkOrder> = self.base.db().select((TABLE, key)).await?;
        Ok(order)
    }

    /// Keys of every work order that is completed and verified
    pub async fn find_eligible_keys(&self) -> RepoResult<Vec<String>> {
        let mut result = self
            .base
            .db()
            .query("SELECT VALUE id FROM work_order WHERE status = 'zavrsen' AND verified = true")
            .await?;
        let ids: Vec<RecordId> = result.take(0)?;
        Ok(ids.into_iter().map(|id| id.key().to_string()).collect())
    }
}
