//! API routing module
//!
//! # Structure
//!
//! - [`health`] - health check
//! - [`settlements`] - trigger settlement / recalculation
//! - [`failures`] - remediation list and admin actions
//! - [`discounts`] - municipality discount confirmation
//! - [`reports`] - transaction report and breakdowns
//!
//! Authentication and TLS terminate in front of this service.

pub mod discounts;
pub mod failures;
pub mod health;
pub mod reports;
pub mod settlements;

use axum::Router;

use crate::core::ServerState;

/// Assemble every API router
pub fn router() -> Router<ServerState> {
    Router::new()
        .merge(health::router())
        .merge(settlements::router())
        .merge(failures::router())
        .merge(discounts::router())
        .merge(reports::router())
}
