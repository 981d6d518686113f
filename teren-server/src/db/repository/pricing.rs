//! Pricing Settings Repository (Singleton)

use super::{BaseRepository, RepoError, RepoResult};
use crate::db::models::PricingSettings;
use crate::utils::time;
use surrealdb::engine::local::Db;
use surrealdb::Surreal;

const TABLE: &str = "pricing_settings";
const SINGLETON_ID: &str = "main";

#[derive(Clone)]
pub struct PricingSettingsRepository {
    base: BaseRepository,
}

impl PricingSettingsRepository {
    pub fn new(db: Surreal<Db>) -> Self {
        Self {
            base: BaseRepository::new(db),
        }
    }

    /// Get the singleton settings record
    pub async fn get(&self) -> RepoResult<Option<PricingSettings>> {
        let settings: Option<PricingSettings> =
            self.base.db().select((TABLE, SINGLETON_ID)).await?;
        Ok(settings)
    }

    /// Get the singleton, creating an empty one if missing.
    ///
    /// An empty settings document still fails price resolution (every
    /// classification is unpriced), but it gives admin tooling a stable
    /// record to edit.
    pub async fn ensure_exists(&self) -> RepoResult<PricingSettings> {
        if let Some(settings) = self.get().await? {
            return Ok(settings);
        }

        let settings = PricingSettings {
            updated_at: time::now_millis(),
            ..PricingSettings::default()
        };
        let created: Option<PricingSettings> = self
            .base
            .db()
            .create((TABLE, SINGLETON_ID))
            .content(settings)
            .await?;
        created.ok_or_else(|| RepoError::Database("Failed to create pricing settings".to_string()))
    }

    /// Overwrite the singleton in place (admin edit / seed path)
    pub async fn save(&self, mut settings: PricingSettings) -> RepoResult<PricingSettings> {
        settings.id = None;
        settings.updated_at = time::now_millis();
        let saved: Option<PricingSettings> = self
            .base
            .db()
            .upsert((TABLE, SINGLETON_ID))
            .content(settings)
            .await?;
        saved.ok_or_else(|| RepoError::Database("Failed to save pricing settings".to_string()))
    }
}
