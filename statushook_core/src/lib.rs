//! statushook core library: event model, record resolution and status updates
//! shared by every backend.

pub mod error;
pub mod fields;
pub mod memory;
pub mod models;
pub mod o11y;
pub mod resolver;
pub mod tracker;
pub mod traits;
pub mod updater;

pub use error::{Error, HandleError, Result};
pub use fields::FieldMap;
pub use models::{
    CustomField, Event, EventKind, EventPayload, FieldDef, Outcome, RawField, RawRecord, Record,
    RecordScan, RecordUpdate,
};
pub use tracker::StatusTracker;
pub use traits::RecordBackend;
