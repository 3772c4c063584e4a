use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::models::{FieldDef, RawField, RawRecord, RecordScan, RecordUpdate};
use crate::traits::RecordBackend;
use crate::{Error, Result};

/// In-memory RecordBackend for local development and unit tests.
///
/// Semantics:
/// - `scan` returns every stored record (the whole scope), like the board backend
/// - `write` replaces the stored field values by id and records the update
#[derive(Clone, Default)]
pub struct MemoryBackend {
    field_defs: Arc<Vec<FieldDef>>,
    records: Arc<Mutex<Vec<RawRecord>>>,
    writes: Arc<Mutex<Vec<RecordUpdate>>>,
    scans: Arc<Mutex<usize>>,
    fail_writes: Option<String>,
}

impl MemoryBackend {
    pub fn new(field_defs: Vec<FieldDef>) -> Self {
        Self {
            field_defs: Arc::new(field_defs),
            ..Self::default()
        }
    }

    /// Board-shaped backend with `path` and `status` fields (ids `f-path`, `f-status`).
    pub fn with_path_and_status() -> Self {
        Self::new(vec![
            FieldDef {
                id: "f-path".into(),
                name: "path".into(),
            },
            FieldDef {
                id: "f-status".into(),
                name: "status".into(),
            },
        ])
    }

    /// Make every `write` fail with the given backend message.
    pub fn failing_writes(mut self, message: impl Into<String>) -> Self {
        self.fail_writes = Some(message.into());
        self
    }

    pub async fn insert(&self, id: impl Into<String>, fields: &[(&str, &str)]) {
        let record = RawRecord {
            id: id.into(),
            fields: fields
                .iter()
                .map(|(id, value)| RawField {
                    id: (*id).to_string(),
                    value: (*value).to_string(),
                })
                .collect(),
        };
        self.records.lock().await.push(record);
    }

    /// Convenience for the board shape: a record with a path and a status.
    pub async fn insert_card(&self, id: impl Into<String>, path: &str, status: &str) {
        self.insert(id, &[("f-path", path), ("f-status", status)])
            .await;
    }

    pub async fn record(&self, id: &str) -> Option<RawRecord> {
        self.records
            .lock()
            .await
            .iter()
            .find(|r| r.id == id)
            .cloned()
    }

    pub async fn writes(&self) -> Vec<RecordUpdate> {
        self.writes.lock().await.clone()
    }

    pub async fn scan_count(&self) -> usize {
        *self.scans.lock().await
    }
}

#[async_trait]
impl RecordBackend for MemoryBackend {
    fn id(&self) -> &'static str {
        "memory"
    }

    async fn scan(&self, _path: &str) -> Result<RecordScan> {
        *self.scans.lock().await += 1;
        Ok(RecordScan {
            field_defs: self.field_defs.as_ref().clone(),
            records: self.records.lock().await.clone(),
        })
    }

    async fn write(&self, update: &RecordUpdate) -> Result<()> {
        self.writes.lock().await.push(update.clone());
        if let Some(message) = &self.fail_writes {
            return Err(Error::BackendMessage(message.clone()));
        }

        let mut records = self.records.lock().await;
        let record = records
            .iter_mut()
            .find(|r| r.id == update.record_id)
            .ok_or_else(|| Error::NotFound(format!("record not found: {}", update.record_id)))?;
        record.fields = update
            .fields
            .iter()
            .map(|f| RawField {
                id: f.id.clone(),
                value: f.value.clone(),
            })
            .collect();
        Ok(())
    }
}
