use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use statushook_core::HandleError;

#[derive(thiserror::Error, Debug)]
pub enum ApiError {
    #[error("error decoding request: {0}")]
    Decode(String),

    #[error("{0}")]
    Handle(#[from] HandleError),
}

impl ApiError {
    fn status_code(&self) -> StatusCode {
        // Every rejected event is reported to the sender as a bad request,
        // including backend failures.
        match self {
            ApiError::Decode(_) | ApiError::Handle(_) => StatusCode::BAD_REQUEST,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let code = self.status_code();
        let body = self.to_string();
        tracing::warn!(status = code.as_u16(), error = %body, "event rejected");
        (code, format!("{body}\n")).into_response()
    }
}
