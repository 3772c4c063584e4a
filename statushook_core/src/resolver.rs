//! Path → record resolution.

use crate::fields::FieldMap;
use crate::models::{Record, RecordScan};
use crate::traits::RecordBackend;
use crate::{Error, Result};

/// Field name holding the evidence path unless configured otherwise.
pub const DEFAULT_PATH_FIELD: &str = "path";

/// Find the single record whose `path_field` equals `path`.
///
/// Zero matches is `NotFound`; more than one is `NotUnique`. Duplicates are a
/// data-integrity problem in the backing store and are never broken by order.
#[tracing::instrument(level = "debug", skip(backend), fields(backend_id = backend.id()))]
pub async fn resolve(backend: &dyn RecordBackend, path: &str, path_field: &str) -> Result<Record> {
    let scan = backend.scan(path).await?;
    select_unique(scan, path, path_field)
}

/// Name the scanned records' fields and pick the unique match.
pub fn select_unique(scan: RecordScan, path: &str, path_field: &str) -> Result<Record> {
    let map = FieldMap::new(&scan.field_defs);
    let scanned = scan.records.len();

    let mut matches: Vec<Record> = scan
        .records
        .into_iter()
        .map(|raw| map.name_fields(raw))
        .filter(|rec| rec.value(path_field) == Some(path))
        .collect();

    tracing::debug!(scanned, matched = matches.len(), "scanned records for path");

    match matches.len() {
        0 => Err(Error::path_not_found(path)),
        1 => Ok(matches.remove(0)),
        count => Err(Error::NotUnique {
            path: path.to_string(),
            count,
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryBackend;

    #[tokio::test]
    async fn returns_the_single_match() {
        let backend = MemoryBackend::with_path_and_status();
        backend.insert_card("c1", "/ev/1", "running").await;
        backend.insert_card("c2", "/ev/2", "done").await;

        let rec = resolve(&backend, "/ev/2", DEFAULT_PATH_FIELD).await.unwrap();
        assert_eq!(rec.id, "c2");
        assert_eq!(rec.value("status"), Some("done"));
        assert_eq!(rec.value("path"), Some("/ev/2"));
    }

    #[tokio::test]
    async fn no_match_is_not_found() {
        let backend = MemoryBackend::with_path_and_status();
        backend.insert_card("c1", "/ev/1", "running").await;

        let err = resolve(&backend, "/ev/9", DEFAULT_PATH_FIELD)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::NotFound(_)));
        assert_eq!(err.to_string(), "path not found: /ev/9");
    }

    #[tokio::test]
    async fn empty_scope_is_not_found() {
        let backend = MemoryBackend::with_path_and_status();
        let err = resolve(&backend, "/ev/1", DEFAULT_PATH_FIELD)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::NotFound(_)));
    }

    #[tokio::test]
    async fn duplicate_paths_are_not_unique() {
        let backend = MemoryBackend::with_path_and_status();
        backend.insert_card("c1", "/ev/1", "running").await;
        backend.insert_card("c2", "/ev/1", "done").await;
        backend.insert_card("c3", "/ev/3", "done").await;

        let err = resolve(&backend, "/ev/1", DEFAULT_PATH_FIELD)
            .await
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "path not unique: /ev/1 matches at least 2 records"
        );
        match err {
            Error::NotUnique { path, count } => {
                assert_eq!(path, "/ev/1");
                assert_eq!(count, 2);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn matches_by_field_name_not_by_id() {
        // The path value sits in a field whose id the board does not define.
        let backend = MemoryBackend::with_path_and_status();
        backend
            .insert("c1", &[("f-unknown", "/ev/1"), ("f-status", "running")])
            .await;

        let err = resolve(&backend, "/ev/1", DEFAULT_PATH_FIELD)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::NotFound(_)));
    }

    #[test]
    fn honours_a_custom_path_field() {
        let scan = RecordScan {
            field_defs: vec![crate::models::FieldDef {
                id: "evidence".into(),
                name: "evidence".into(),
            }],
            records: vec![crate::models::RawRecord {
                id: "d1".into(),
                fields: vec![crate::models::RawField {
                    id: "evidence".into(),
                    value: "/ev/1".into(),
                }],
            }],
        };
        let rec = select_unique(scan, "/ev/1", "evidence").unwrap();
        assert_eq!(rec.id, "d1");
    }
}
