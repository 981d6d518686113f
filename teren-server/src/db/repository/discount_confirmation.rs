//! Discount Confirmation Repository
//!
//! Keyed upsert per municipality: confirming the same municipality twice
//! updates the one record instead of growing the table.

use super::{BaseRepository, RepoError, RepoResult};
use crate::db::models::{municipality_key, DiscountConfirmation};
use crate::utils::time;
use surrealdb::engine::local::Db;
use surrealdb::Surreal;

const TABLE: &str = "discount_confirmation";

#[derive(Clone)]
pub struct DiscountConfirmationRepository {
    base: BaseRepository,
}

impl DiscountConfirmationRepository {
    pub fn new(db: Surreal<Db>) -> Self {
        Self {
            base: BaseRepository::new(db),
        }
    }

    /// Find the confirmation record for a municipality
    pub async fn find_by_municipality(
        &self,
        municipality: &str,
    ) -> RepoResult<Option<DiscountConfirmation>> {
        let key = municipality_key(municipality);
        if key.is_empty() {
            return Ok(None);
        }
        let record: Option<DiscountConfirmation> =
            self.base.db().select((TABLE, key.as_str())).await?;
        Ok(record)
    }

    /// All confirmation records
    pub async fn find_all(&self) -> RepoResult<Vec<DiscountConfirmation>> {
        let mut result = self
            .base
            .db()
            .query("SELECT * FROM discount_confirmation ORDER BY municipality")
            .await?;
        let records: Vec<DiscountConfirmation> = result.take(0)?;
        Ok(records)
    }

    /// Confirm a municipality discount, stamping identity and time
    pub async fn confirm(
        &self,
        municipality: &str,
        discount_percent: f64,
        confirmed_by: &str,
    ) -> RepoResult<DiscountConfirmation> {
        let key = municipality_key(municipality);
        if key.is_empty() {
            return Err(RepoError::Validation(
                "Municipality name must not be empty".to_string(),
            ));
        }

        let record = DiscountConfirmation {
            id: None,
            municipality: municipality.trim().to_string(),
            discount_percent,
            confirmed: true,
            confirmed_by: confirmed_by.to_string(),
            confirmed_at: time::now_millis(),
        };

        let saved: Option<DiscountConfirmation> = self
            .base
            .db()
            .upsert((TABLE, key.as_str()))
            .content(record)
            .await?;
        saved.ok_or_else(|| {
            RepoError::Database(format!(
                "Failed to save discount confirmation for {municipality}"
            ))
        })
    }
}
