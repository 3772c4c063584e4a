use crate::error::ApiError;
use crate::server::AppState;
use axum::Extension;
use axum::body::Bytes;
use axum::http::StatusCode;
use statushook_core::Event;
use std::sync::Arc;

/// Receives one job event and writes its status onto the matching record.
///
/// The body is decoded by hand so that malformed JSON surfaces as a plain-text
/// `error decoding request` instead of axum's extractor rejection.
#[tracing::instrument(level = "info", skip_all)]
pub async fn receive(
    Extension(state): Extension<Arc<AppState>>,
    body: Bytes,
) -> Result<StatusCode, ApiError> {
    let event: Event =
        serde_json::from_slice(&body).map_err(|e| ApiError::Decode(e.to_string()))?;

    let outcome = state.tracker.handle(&event).await?;
    tracing::debug!(?outcome, "event handled");
    Ok(StatusCode::OK)
}
