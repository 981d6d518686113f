//! Server configuration
//!
//! # Environment variables
//!
//! Every setting can be overridden through the environment:
//!
//! | Variable | Default | Meaning |
//! |----------|---------|---------|
//! | WORK_DIR | /var/lib/teren | Work directory (database, logs) |
//! | HTTP_PORT | 3000 | HTTP API port |
//! | TIMEZONE | Europe/Belgrade | Business timezone (salary months, report windows) |
//! | ENVIRONMENT | development | development \| staging \| production |
//! | RECALC_CONCURRENCY | 8 | In-flight settlements during a bulk sweep |
//! | REPORT_CACHE_TTL_SECS | 300 | Report cache lifetime |
//!
//! # Example
//!
//! ```ignore
//! WORK_DIR=/data/teren HTTP_PORT=8080 cargo run
//! ```

use std::path::PathBuf;

use crate::utils::AppError;

#[derive(Debug, Clone)]
pub struct Config {
    /// Work directory holding database and log files
    pub work_dir: String,
    /// HTTP API port
    pub http_port: u16,
    /// Business timezone
    pub timezone: chrono_tz::Tz,
    /// Runtime environment: development | staging | production
    pub environment: String,
    /// Concurrency bound for bulk recalculation sweeps
    pub recalc_concurrency: usize,
    /// Report cache lifetime in seconds
    pub report_cache_ttl_secs: u64,
}

impl Config {
    /// Load configuration from environment variables, with defaults
    pub fn from_env() -> Self {
        Self {
            work_dir: std::env::var("WORK_DIR").unwrap_or_else(|_| "/var/lib/teren".into()),
            http_port: std::env::var("HTTP_PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(3000),
            timezone: std::env::var("TIMEZONE")
                .ok()
                .and_then(|tz| tz.parse().ok())
                .unwrap_or(chrono_tz::Europe::Belgrade),
            environment: std::env::var("ENVIRONMENT").unwrap_or_else(|_| "development".into()),
            recalc_concurrency: std::env::var("RECALC_CONCURRENCY")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(8),
            report_cache_ttl_secs: std::env::var("REPORT_CACHE_TTL_SECS")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(300),
        }
    }

    /// Database directory: `<work_dir>/database`
    pub fn database_dir(&self) -> PathBuf {
        PathBuf::from(&self.work_dir).join("database")
    }

    /// Log directory: `<work_dir>/logs`
    pub fn logs_dir(&self) -> PathBuf {
        PathBuf::from(&self.work_dir).join("logs")
    }

    /// Create the work directory layout if missing
    pub fn ensure_work_dir_structure(&self) -> Result<(), AppError> {
        for dir in [self.database_dir(), self.logs_dir()] {
            std::fs::create_dir_all(&dir).map_err(|e| {
                AppError::internal(format!("Failed to create {}: {e}", dir.display()))
            })?;
        }
        Ok(())
    }
}
