use std::error::Error as StdError;

/// Common error type for `statushook_core`.
///
/// Backend implementations (Wekan, MongoDB) should preserve the underlying
/// error chain where possible via `Error::backend`.
#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("unexpected type: {0}")]
    InvalidEventType(String),

    #[error("{0}")]
    NotFound(String),

    #[error("path not unique: {path} matches at least {count} records")]
    NotUnique { path: String, count: usize },

    #[error("unauthorized: {0}")]
    Unauthorized(String),

    #[error("backend error: {context}: {source}")]
    Backend {
        context: String,
        #[source]
        source: Box<dyn StdError + Send + Sync + 'static>,
    },

    #[error("backend error: {0}")]
    BackendMessage(String),
}

impl Error {
    #[tracing::instrument(level = "debug", name = "statushook.error.backend", skip(source))]
    pub fn backend(
        context: impl Into<String> + std::fmt::Debug,
        source: impl StdError + Send + Sync + 'static,
    ) -> Self {
        Self::Backend {
            context: context.into(),
            source: Box::new(source),
        }
    }

    /// Convenience: wrap any error into `Backend` with "reqwest" context.
    pub fn backend_reqwest(source: impl StdError + Send + Sync + 'static) -> Self {
        Self::Backend {
            context: "reqwest".into(),
            source: Box::new(source),
        }
    }

    pub fn path_not_found(path: &str) -> Self {
        Self::NotFound(format!("path not found: {path}"))
    }

    /// True for errors a backend reports when its session is no longer accepted.
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, Self::Unauthorized(_))
    }
}

pub type Result<T> = std::result::Result<T, Error>;

/// Failure of one event, tagged with the step that failed.
#[derive(thiserror::Error, Debug)]
pub enum HandleError {
    #[error("{0}")]
    InvalidEvent(#[source] Error),

    #[error("error finding record: {0}")]
    Resolve(#[source] Error),

    #[error("error updating state: {0}")]
    Update(#[source] Error),
}

impl HandleError {
    pub fn error(&self) -> &Error {
        match self {
            HandleError::InvalidEvent(e) | HandleError::Resolve(e) | HandleError::Update(e) => e,
        }
    }

    pub fn into_error(self) -> Error {
        match self {
            HandleError::InvalidEvent(e) | HandleError::Resolve(e) | HandleError::Update(e) => e,
        }
    }
}
