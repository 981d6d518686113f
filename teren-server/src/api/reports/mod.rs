//! Reports API module

mod handler;

use axum::{routing::get, Router};

use crate::core::ServerState;

pub fn router() -> Router<ServerState> {
    Router::new().nest("/api/reports", routes())
}

fn routes() -> Router<ServerState> {
    Router::new()
        .route("/transactions", get(handler::transactions))
        .route("/technicians", get(handler::technicians))
        .route("/salary-progress", get(handler::salary_progress))
}
