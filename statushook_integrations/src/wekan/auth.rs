use statushook_core::Result;
use std::future::Future;
use tokio::sync::Mutex;

/// Credentials returned by the Wekan `authorize` query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub user_id: String,
    pub token: String,
}

/// Process-wide holder of the current Wekan session.
///
/// The exchange runs under the lock, so requests arriving before the first
/// session exists wait for a single authorization instead of each running one.
#[derive(Debug, Default)]
pub struct TokenHolder {
    session: Mutex<Option<Session>>,
}

impl TokenHolder {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn current(&self) -> Option<Session> {
        self.session.lock().await.clone()
    }

    /// Return the cached session, running `authorize` only when none is cached.
    pub async fn get_or_authorize<F, Fut>(&self, authorize: F) -> Result<Session>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<Session>>,
    {
        let mut slot = self.session.lock().await;
        if let Some(session) = slot.as_ref() {
            return Ok(session.clone());
        }
        let session = authorize().await?;
        tracing::info!(user_id = %session.user_id, "wekan session established");
        *slot = Some(session.clone());
        Ok(session)
    }

    /// Drop `stale` if it is still the cached session.
    ///
    /// A session refreshed by a concurrent request in the meantime is kept.
    pub async fn invalidate(&self, stale: &Session) -> bool {
        let mut slot = self.session.lock().await;
        if slot.as_ref() == Some(stale) {
            *slot = None;
            true
        } else {
            false
        }
    }
}
