//! Evidence Repository

use super::{BaseRepository, RepoError, RepoResult};
use crate::db::models::EvidenceRecord;
use surrealdb::engine::local::Db;
use surrealdb::{RecordId, Surreal};

const TABLE: &str = "work_evidence";

#[derive(Clone)]
pub struct EvidenceRepository {
    base: BaseRepository,
}

impl EvidenceRepository {
    pub fn new(db: Surreal<Db>) -> Self {
        Self {
            base: BaseRepository::new(db),
        }
    }

    /// Create an evidence record (seed/test path)
    pub async fn create(&self, data: EvidenceRecord) -> RepoResult<EvidenceRecord> {
        let created: Option<EvidenceRecord> = self.base.db().create(TABLE).content(data).await?;
        created.ok_or_else(|| RepoError::Database("Failed to create evidence record".to_string()))
    }

    /// Find the evidence record for a work order
    pub async fn find_by_work_order(
        &self,
        work_order: &RecordId,
    ) -> RepoResult<Option<EvidenceRecord>> {
        let wo = work_order.to_string();
        let mut result = self
            .base
            .db()
            .query("SELECT * FROM work_evidence WHERE work_order = $wo LIMIT 1")
            .bind(("wo", wo))
            .await?;
        let records: Vec<EvidenceRecord> = result.take(0)?;
        Ok(records.into_iter().next())
    }
}
