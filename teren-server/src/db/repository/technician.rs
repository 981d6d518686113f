//! Technician Repository

use super::{BaseRepository, RepoError, RepoResult};
use crate::db::models::Technician;
use surrealdb::engine::local::Db;
use surrealdb::{RecordId, Surreal};

const TABLE: &str = "technician";

#[derive(Clone)]
pub struct TechnicianRepository {
    base: BaseRepository,
}

impl TechnicianRepository {
    pub fn new(db: Surreal<Db>) -> Self {
        Self {
            base: BaseRepository::new(db),
        }
    }

    /// Create a technician (seed/test path)
    pub async fn create(&self, data: Technician) -> RepoResult<Technician> {
        let created: Option<Technician> = self.base.db().create(TABLE).content(data).await?;
        created.ok_or_else(|| RepoError::Database("Failed to create technician".to_string()))
    }

    /// Find a technician by record id
    pub async fn find_by_id(&self, id: &RecordId) -> RepoResult<Option<Technician>> {
        let tech: Option<Technician> = self.base.db().select(id.clone()).await?;
        Ok(tech)
    }

    /// All technicians paid a fixed monthly salary
    pub async fn find_salaried(&self) -> RepoResult<Vec<Technician>> {
        let mut result = self
            .base
            .db()
            .query("SELECT * FROM technician WHERE payment_type = 'plata' ORDER BY name")
            .await?;
        let techs: Vec<Technician> = result.take(0)?;
        Ok(techs)
    }
}
