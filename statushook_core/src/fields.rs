use crate::models::{CustomField, FieldDef, RawRecord, Record};
use std::collections::HashMap;

/// Two-way lookup between opaque field ids and field names.
///
/// Built per resolve from the scope's field definitions and dropped afterwards.
#[derive(Debug, Clone, Default)]
pub struct FieldMap {
    names_by_id: HashMap<String, String>,
    ids_by_name: HashMap<String, String>,
}

impl FieldMap {
    pub fn new(defs: &[FieldDef]) -> Self {
        let mut map = Self::default();
        for def in defs {
            map.names_by_id.insert(def.id.clone(), def.name.clone());
            map.ids_by_name.insert(def.name.clone(), def.id.clone());
        }
        map
    }

    pub fn name_of(&self, id: &str) -> Option<&str> {
        self.names_by_id.get(id).map(String::as_str)
    }

    pub fn id_of(&self, name: &str) -> Option<&str> {
        self.ids_by_name.get(name).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.names_by_id.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names_by_id.is_empty()
    }

    /// Attach names to a raw record. Fields with an unknown id get an empty name.
    pub fn name_fields(&self, raw: RawRecord) -> Record {
        let fields = raw
            .fields
            .into_iter()
            .map(|f| CustomField {
                name: self.name_of(&f.id).unwrap_or_default().to_string(),
                id: f.id,
                value: f.value,
            })
            .collect();
        Record { id: raw.id, fields }
    }
}
