//! Read-modify-write of a record's status field.

use crate::models::{CustomField, Record, RecordUpdate};
use crate::traits::RecordBackend;
use crate::{Error, Result};

/// Field name the board variant writes statuses into.
pub const DEFAULT_STATUS_FIELD: &str = "status";

/// The record's full field list with `status_field` set to `status`.
///
/// Every other field keeps its value and position.
pub fn rebuild_fields(record: &Record, status_field: &str, status: &str) -> Result<Vec<CustomField>> {
    if record.field(status_field).is_none() {
        return Err(Error::NotFound(format!(
            "record {} has no '{status_field}' field",
            record.id
        )));
    }

    Ok(record
        .fields
        .iter()
        .map(|f| {
            let mut f = f.clone();
            if f.name == status_field {
                f.value = status.to_string();
            }
            f
        })
        .collect())
}

/// Build the update for `record` without sending it.
pub fn status_update(record: &Record, status_field: &str, status: &str) -> Result<RecordUpdate> {
    Ok(RecordUpdate {
        record_id: record.id.clone(),
        fields: rebuild_fields(record, status_field, status)?,
        field: status_field.to_string(),
        value: status.to_string(),
    })
}

#[tracing::instrument(level = "debug", skip(backend, record), fields(backend_id = backend.id(), record_id = %record.id))]
pub async fn update_status(
    backend: &dyn RecordBackend,
    record: &Record,
    status_field: &str,
    status: &str,
) -> Result<()> {
    let update = status_update(record, status_field, status)?;
    backend.write(&update).await
}
