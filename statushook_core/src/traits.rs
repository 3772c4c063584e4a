use crate::Result;
use crate::models::{RecordScan, RecordUpdate};
use async_trait::async_trait;

/// Storage holding the records that events are written onto.
#[async_trait]
pub trait RecordBackend: Send + Sync {
    /// Short identifier used in logs and the health endpoint.
    fn id(&self) -> &'static str;

    /// Fetch the candidate records for `path` together with the scope's field definitions.
    ///
    /// Implementations may return the whole scope or pre-filter by path; the resolver
    /// performs the final match and enforces uniqueness.
    async fn scan(&self, path: &str) -> Result<RecordScan>;

    /// Persist one field change. Exactly one external mutation per call.
    async fn write(&self, update: &RecordUpdate) -> Result<()>;
}
