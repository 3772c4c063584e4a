use axum::Router;
use axum::routing::{get, post};

pub mod health;
pub mod webhook;

#[tracing::instrument(level = "debug", skip_all)]
pub fn router() -> Router {
    Router::new()
        .route("/", post(webhook::receive))
        .route("/health", get(health::get_health))
}
