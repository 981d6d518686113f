//! Settlement API module

mod handler;

use axum::{routing::post, Router};

use crate::core::ServerState;

pub fn router() -> Router<ServerState> {
    Router::new().nest("/api/settlements", routes())
}

fn routes() -> Router<ServerState> {
    Router::new()
        .route("/work-orders/{id}", post(handler::settle_one))
        .route("/recalculate", post(handler::recalculate))
}
