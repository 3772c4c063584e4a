//! MongoDB document backend.
//!
//! Each document is a record; its top-level keys are the fields (id and name
//! are both the key). Lookups filter by the path key, updates `$set` the state
//! key on the matched `_id`.

use async_trait::async_trait;
use futures_util::TryStreamExt;
use mongodb::bson::oid::ObjectId;
use mongodb::bson::{Bson, Document, doc};
use mongodb::{Client, Collection};
use statushook_core::models::{FieldDef, RawField, RawRecord, RecordScan, RecordUpdate};
use statushook_core::traits::RecordBackend;
use statushook_core::{Error, Result};
use tracing::instrument;

/// Upper bound on documents fetched per lookup; two is enough to detect duplicates.
const SCAN_LIMIT: i64 = 2;

#[derive(Debug, Clone)]
pub struct MongoConfig {
    pub uri: String,
    pub database: String,
    pub collection: String,
    pub path_field: String,
    pub state_field: String,
}

impl MongoConfig {
    pub fn new(
        uri: impl Into<String>,
        database: impl Into<String>,
        collection: impl Into<String>,
    ) -> Self {
        Self {
            uri: uri.into(),
            database: database.into(),
            collection: collection.into(),
            path_field: "path".to_string(),
            state_field: "state".to_string(),
        }
    }

    pub fn validate(&self) -> Result<()> {
        for (name, value) in [
            ("uri", &self.uri),
            ("database", &self.database),
            ("collection", &self.collection),
            ("path_field", &self.path_field),
            ("state_field", &self.state_field),
        ] {
            if value.trim().is_empty() {
                return Err(Error::InvalidInput(format!("mongodb {name} is empty")));
            }
        }
        if self.path_field == "_id" || self.state_field == "_id" {
            return Err(Error::InvalidInput(
                "mongodb path/state field cannot be _id".to_string(),
            ));
        }
        Ok(())
    }
}

#[derive(Clone)]
pub struct MongoBackend {
    collection: Collection<Document>,
    path_field: String,
    state_field: String,
}

impl MongoBackend {
    /// Build the client. The driver connects lazily, so an unreachable server
    /// surfaces on the first request rather than here.
    #[instrument(level = "info", skip(cfg), fields(database = %cfg.database, collection = %cfg.collection))]
    pub async fn connect(cfg: &MongoConfig) -> Result<Self> {
        cfg.validate()?;
        let client = Client::with_uri_str(&cfg.uri)
            .await
            .map_err(|e| Error::backend("mongodb client", e))?;
        let collection = client
            .database(&cfg.database)
            .collection::<Document>(&cfg.collection);
        Ok(Self::new(collection, cfg))
    }

    pub fn new(collection: Collection<Document>, cfg: &MongoConfig) -> Self {
        Self {
            collection,
            path_field: cfg.path_field.clone(),
            state_field: cfg.state_field.clone(),
        }
    }

    pub fn state_field(&self) -> &str {
        &self.state_field
    }
}

#[async_trait]
impl RecordBackend for MongoBackend {
    fn id(&self) -> &'static str {
        "mongodb"
    }

    #[instrument(level = "debug", skip(self))]
    async fn scan(&self, path: &str) -> Result<RecordScan> {
        let mut filter = Document::new();
        filter.insert(self.path_field.clone(), path);

        let docs: Vec<Document> = self
            .collection
            .find(filter)
            .limit(SCAN_LIMIT)
            .await
            .map_err(|e| Error::backend("mongodb find", e))?
            .try_collect()
            .await
            .map_err(|e| Error::backend("mongodb cursor", e))?;

        let records: Vec<RawRecord> = docs
            .into_iter()
            .map(|d| raw_record(d, &self.state_field))
            .collect();
        Ok(RecordScan {
            field_defs: field_defs(&records),
            records,
        })
    }

    #[instrument(level = "debug", skip(self, update), fields(record_id = %update.record_id))]
    async fn write(&self, update: &RecordUpdate) -> Result<()> {
        let mut set = Document::new();
        set.insert(self.state_field.clone(), update.value.clone());

        let res = self
            .collection
            .update_one(id_filter(&update.record_id), doc! { "$set": set })
            .await
            .map_err(|e| Error::backend("mongodb update", e))?;
        if res.matched_count == 0 {
            return Err(Error::NotFound(format!(
                "document not found: {}",
                update.record_id
            )));
        }
        Ok(())
    }
}

/// Document → raw record. The state key is always present so it can be set.
fn raw_record(doc: Document, state_field: &str) -> RawRecord {
    let id = doc.get("_id").map(id_text).unwrap_or_default();
    let mut fields: Vec<RawField> = doc
        .iter()
        .filter(|(k, _)| k.as_str() != "_id")
        .map(|(k, v)| RawField {
            id: k.clone(),
            value: bson_text(v),
        })
        .collect();
    if !fields.iter().any(|f| f.id == state_field) {
        fields.push(RawField {
            id: state_field.to_string(),
            value: String::new(),
        });
    }
    RawRecord { id, fields }
}

/// Identity mapping over every key seen in the scanned documents.
fn field_defs(records: &[RawRecord]) -> Vec<FieldDef> {
    let mut defs: Vec<FieldDef> = Vec::new();
    for f in records.iter().flat_map(|r| r.fields.iter()) {
        if !defs.iter().any(|d| d.id == f.id) {
            defs.push(FieldDef {
                id: f.id.clone(),
                name: f.id.clone(),
            });
        }
    }
    defs
}

fn id_text(id: &Bson) -> String {
    match id {
        Bson::ObjectId(oid) => oid.to_hex(),
        other => bson_text(other),
    }
}

fn id_filter(id: &str) -> Document {
    match ObjectId::parse_str(id) {
        Ok(oid) => doc! { "_id": oid },
        Err(_) => doc! { "_id": id },
    }
}

fn bson_text(v: &Bson) -> String {
    match v {
        Bson::String(s) => s.clone(),
        Bson::Null | Bson::Undefined => String::new(),
        other => other.clone().into_relaxed_extjson().to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use statushook_core::resolver::select_unique;
    use statushook_core::updater::status_update;

    #[test]
    fn converts_documents_with_object_ids() {
        let oid = ObjectId::parse_str("65a1f0c2e4b0a1b2c3d4e5f6").unwrap();
        let rec = raw_record(
            doc! { "_id": oid, "path": "/ev/1", "state": "running", "attempt": 3 },
            "state",
        );
        assert_eq!(rec.id, "65a1f0c2e4b0a1b2c3d4e5f6");
        let values: Vec<(&str, &str)> = rec
            .fields
            .iter()
            .map(|f| (f.id.as_str(), f.value.as_str()))
            .collect();
        assert_eq!(
            values,
            vec![("path", "/ev/1"), ("state", "running"), ("attempt", "3")]
        );
    }

    #[test]
    fn adds_a_blank_state_when_missing() {
        let rec = raw_record(doc! { "_id": "run-7", "path": "/ev/7" }, "state");
        assert_eq!(rec.id, "run-7");
        assert_eq!(rec.fields.last().unwrap().id, "state");
        assert_eq!(rec.fields.last().unwrap().value, "");
    }

    #[test]
    fn scanned_documents_resolve_and_update_the_state_key() {
        let records = vec![raw_record(
            doc! { "_id": "run-1", "path": "/ev/1", "owner": "ci" },
            "state",
        )];
        let scan = RecordScan {
            field_defs: field_defs(&records),
            records,
        };
        let rec = select_unique(scan, "/ev/1", "path").unwrap();
        let update = status_update(&rec, "state", "done").unwrap();
        assert_eq!(update.record_id, "run-1");
        assert_eq!(update.field, "state");
        assert_eq!(update.value, "done");
        assert_eq!(rec.value("owner"), Some("ci"));
    }

    #[test]
    fn two_documents_with_one_path_are_not_unique() {
        let records = vec![
            raw_record(doc! { "_id": "a", "path": "/ev/1" }, "state"),
            raw_record(doc! { "_id": "b", "path": "/ev/1" }, "state"),
        ];
        let scan = RecordScan {
            field_defs: field_defs(&records),
            records,
        };
        let err = select_unique(scan, "/ev/1", "path").unwrap_err();
        assert!(matches!(err, Error::NotUnique { count: 2, .. }));
    }

    #[test]
    fn id_filter_prefers_object_ids() {
        let f = id_filter("65a1f0c2e4b0a1b2c3d4e5f6");
        assert!(matches!(f.get("_id"), Some(Bson::ObjectId(_))));
        let f = id_filter("run-1");
        assert_eq!(f.get_str("_id").unwrap(), "run-1");
    }

    #[test]
    fn rejects_id_as_state_field() {
        let mut cfg = MongoConfig::new("mongodb://localhost", "ci", "runs");
        cfg.state_field = "_id".into();
        assert!(cfg.validate().is_err());
    }

    /// Runs against a live server when `STATUSHOOK_TEST_MONGODB_URI` is set.
    #[tokio::test]
    async fn live_roundtrip_when_configured() {
        let Ok(uri) = std::env::var("STATUSHOOK_TEST_MONGODB_URI") else {
            return;
        };
        let cfg = MongoConfig::new(uri, "statushook_test", "records");
        let backend = MongoBackend::connect(&cfg).await.unwrap();
        backend.collection.delete_many(doc! {}).await.unwrap();
        backend
            .collection
            .insert_one(doc! { "_id": "r1", "path": "/ev/1", "state": "running" })
            .await
            .unwrap();

        let tracker = statushook_core::StatusTracker::new(std::sync::Arc::new(backend.clone()))
            .with_status_field("state");
        tracker
            .handle(&statushook_core::Event::new("done", "/ev/1"))
            .await
            .unwrap();

        let stored = backend
            .collection
            .find_one(doc! { "_id": "r1" })
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stored.get_str("state").unwrap(), "done");
    }
}
