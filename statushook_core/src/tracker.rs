use std::sync::Arc;

use crate::models::{Event, EventKind, Outcome, Record};
use crate::resolver::{self, DEFAULT_PATH_FIELD};
use crate::traits::RecordBackend;
use crate::updater::{self, DEFAULT_STATUS_FIELD};
use crate::{Error, HandleError, Result};

/// Routes pipeline events onto records of one backend.
///
/// - `running` / `done` / `failed`: resolve by path, then write the kind as status
/// - `progress`: acknowledged without touching the backend
/// - anything else: `InvalidEventType`, also without touching the backend
#[derive(Clone)]
pub struct StatusTracker {
    backend: Arc<dyn RecordBackend>,
    path_field: String,
    status_field: String,
}

impl StatusTracker {
    pub fn new(backend: Arc<dyn RecordBackend>) -> Self {
        Self {
            backend,
            path_field: DEFAULT_PATH_FIELD.to_string(),
            status_field: DEFAULT_STATUS_FIELD.to_string(),
        }
    }

    pub fn with_path_field(mut self, name: impl Into<String>) -> Self {
        self.path_field = name.into();
        self
    }

    pub fn with_status_field(mut self, name: impl Into<String>) -> Self {
        self.status_field = name.into();
        self
    }

    pub fn backend_id(&self) -> &'static str {
        self.backend.id()
    }

    pub fn status_field(&self) -> &str {
        &self.status_field
    }

    pub async fn resolve(&self, path: &str) -> Result<Record> {
        resolver::resolve(self.backend.as_ref(), path, &self.path_field).await
    }

    pub async fn update_status(&self, record: &Record, status: &str) -> Result<()> {
        updater::update_status(self.backend.as_ref(), record, &self.status_field, status).await
    }

    /// Classify the event type; unknown types never reach the backend.
    pub fn classify(&self, event: &Event) -> Result<EventKind> {
        event
            .parsed_kind()
            .map_err(|_| Error::InvalidEventType(event.kind.clone()))
    }

    #[tracing::instrument(
        level = "info",
        skip(self, event),
        fields(kind = %event.kind, path = %event.payload.evidence_path)
    )]
    pub async fn handle(&self, event: &Event) -> std::result::Result<Outcome, HandleError> {
        let kind = self.classify(event).map_err(HandleError::InvalidEvent)?;
        let Some(status) = kind.status() else {
            tracing::debug!(progress = ?event.payload.progress, "progress event acknowledged");
            return Ok(Outcome::Acknowledged);
        };

        let record = self
            .resolve(&event.payload.evidence_path)
            .await
            .map_err(HandleError::Resolve)?;
        self.update_status(&record, status)
            .await
            .map_err(HandleError::Update)?;
        tracing::info!(record_id = %record.id, status, "record status updated");
        Ok(Outcome::Updated {
            record_id: record.id,
            status: status.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryBackend;

    async fn tracker_with_card() -> (StatusTracker, MemoryBackend) {
        let backend = MemoryBackend::with_path_and_status();
        backend.insert_card("c1", "/ev/1", "running").await;
        (StatusTracker::new(Arc::new(backend.clone())), backend)
    }

    #[tokio::test]
    async fn status_events_resolve_and_write_once() {
        for kind in ["running", "done", "failed"] {
            let (tracker, backend) = tracker_with_card().await;
            let out = tracker.handle(&Event::new(kind, "/ev/1")).await.unwrap();
            assert_eq!(
                out,
                Outcome::Updated {
                    record_id: "c1".into(),
                    status: kind.into()
                }
            );
            assert_eq!(backend.scan_count().await, 1);
            let writes = backend.writes().await;
            assert_eq!(writes.len(), 1);
            assert_eq!(writes[0].value, kind);
        }
    }

    #[tokio::test]
    async fn progress_touches_nothing() {
        let (tracker, backend) = tracker_with_card().await;
        let out = tracker
            .handle(&Event::new("progress", "/not/even/there"))
            .await
            .unwrap();
        assert_eq!(out, Outcome::Acknowledged);
        assert_eq!(backend.scan_count().await, 0);
        assert!(backend.writes().await.is_empty());
    }

    #[tokio::test]
    async fn unknown_type_is_rejected_before_the_backend() {
        let (tracker, backend) = tracker_with_card().await;
        let err = tracker
            .handle(&Event::new("paused", "/ev/1"))
            .await
            .unwrap_err();
        assert!(matches!(err.error(), Error::InvalidEventType(t) if t == "paused"));
        assert_eq!(err.to_string(), "unexpected type: paused");
        assert_eq!(backend.scan_count().await, 0);
    }

    #[tokio::test]
    async fn resolution_failure_skips_the_write() {
        let (tracker, backend) = tracker_with_card().await;
        let err = tracker.handle(&Event::new("done", "/ev/2")).await.unwrap_err();
        assert!(matches!(err, HandleError::Resolve(Error::NotFound(_))));
        assert_eq!(err.to_string(), "error finding record: path not found: /ev/2");
        assert!(backend.writes().await.is_empty());
    }

    #[tokio::test]
    async fn write_failure_is_tagged_as_update() {
        let backend = MemoryBackend::with_path_and_status().failing_writes("card is archived");
        backend.insert_card("c1", "/ev/1", "running").await;
        let tracker = StatusTracker::new(Arc::new(backend));

        let err = tracker.handle(&Event::new("done", "/ev/1")).await.unwrap_err();
        assert_eq!(
            err.to_string(),
            "error updating state: backend error: card is archived"
        );
        assert!(matches!(err.into_error(), Error::BackendMessage(_)));
    }

    #[tokio::test]
    async fn writes_into_a_configured_status_field() {
        let backend = MemoryBackend::new(vec![
            crate::models::FieldDef {
                id: "path".into(),
                name: "path".into(),
            },
            crate::models::FieldDef {
                id: "state".into(),
                name: "state".into(),
            },
        ]);
        backend
            .insert("d1", &[("path", "/ev/1"), ("state", "")])
            .await;
        let tracker = StatusTracker::new(Arc::new(backend.clone())).with_status_field("state");

        tracker.handle(&Event::new("failed", "/ev/1")).await.unwrap();

        let writes = backend.writes().await;
        assert_eq!(writes[0].field, "state");
        assert_eq!(writes[0].value, "failed");
    }
}
