//! Failure remediation API module

mod handler;

use axum::{
    routing::{get, post},
    Router,
};

use crate::core::ServerState;

pub fn router() -> Router<ServerState> {
    Router::new().nest("/api/failures", routes())
}

fn routes() -> Router<ServerState> {
    Router::new()
        .route("/", get(handler::list))
        .route("/{id}/retry", post(handler::retry))
        .route("/{id}/resolve", post(handler::resolve))
        .route("/{id}/exclude", post(handler::exclude))
}
