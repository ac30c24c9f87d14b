//! Export document
//!
//! A document is one JSON object: a `metadata` entry followed by one array
//! of records per entity type, in collection order.

use crate::error::DocumentError;
use chrono::{DateTime, Utc};
use serde::de::{Deserializer, MapAccess, Visitor};
use serde::ser::{SerializeMap, Serializer};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sjx_schema::{json_kind, EntityType, Record, RecordSet};
use std::collections::HashSet;
use std::fmt;

/// Format version written by this build
pub const FORMAT_VERSION: u32 = 1;

/// Key of the metadata entry
pub const METADATA_KEY: &str = "metadata";

/// Document header
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Metadata {
    /// Format version
    pub format_version: u32,
    /// Export time
    pub exported_at: DateTime<Utc>,
    /// Whether sensitive fields were redacted
    pub sanitized: bool,
    /// Root entity type
    pub root_type: EntityType,
    /// Ids of the root records the export started from
    pub root_ids: Vec<i64>,
}

impl Metadata {
    /// Metadata for an export happening now
    #[must_use]
    pub fn new(root_type: EntityType, root_ids: Vec<i64>, sanitized: bool) -> Self {
        Self {
            format_version: FORMAT_VERSION,
            exported_at: Utc::now(),
            sanitized,
            root_type,
            root_ids,
        }
    }
}

/// Parsed export document
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    metadata: Metadata,
    records: RecordSet,
}

impl Document {
    /// Create document
    #[inline]
    #[must_use]
    pub fn new(metadata: Metadata, records: RecordSet) -> Self {
        Self { metadata, records }
    }

    /// Header
    #[inline]
    #[must_use]
    pub fn metadata(&self) -> &Metadata {
        &self.metadata
    }

    /// Records by type, in document order
    #[inline]
    #[must_use]
    pub fn records(&self) -> &RecordSet {
        &self.records
    }

    /// Split into header and records
    #[must_use]
    pub fn into_parts(self) -> (Metadata, RecordSet) {
        (self.metadata, self.records)
    }

    /// Serialize as JSON text
    ///
    /// # Errors
    /// Returns [`DocumentError::Serialize`] if a value cannot be encoded
    pub fn to_json(&self, pretty: bool) -> Result<String, DocumentError> {
        let view = DocumentView {
            metadata: &self.metadata,
            records: &self.records,
        };
        let json = if pretty {
            serde_json::to_string_pretty(&view)
        } else {
            serde_json::to_string(&view)
        };
        json.map_err(DocumentError::Serialize)
    }
}

struct DocumentView<'a> {
    metadata: &'a Metadata,
    records: &'a RecordSet,
}

impl Serialize for DocumentView<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let types = self.records.types().count();
        let mut map = serializer.serialize_map(Some(types + 1))?;
        map.serialize_entry(METADATA_KEY, self.metadata)?;
        for (entity_type, records) in self.records.iter() {
            map.serialize_entry(entity_type.as_str(), records)?;
        }
        map.end()
    }
}

/// Serialize records and metadata as pretty JSON, preserving type order
///
/// # Errors
/// Returns [`DocumentError::Serialize`] if a value cannot be encoded
pub fn serialize(records: &RecordSet, metadata: &Metadata) -> Result<String, DocumentError> {
    let view = DocumentView { metadata, records };
    serde_json::to_string_pretty(&view).map_err(DocumentError::Serialize)
}

/// Top-level entries in document order
struct Entries(Vec<(String, Value)>);

impl<'de> Deserialize<'de> for Entries {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct EntriesVisitor;

        impl<'de> Visitor<'de> for EntriesVisitor {
            type Value = Entries;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a JSON object")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Entries, A::Error> {
                let mut entries = Vec::with_capacity(access.size_hint().unwrap_or(0));
                while let Some((key, value)) = access.next_entry::<String, Value>()? {
                    entries.push((key, value));
                }
                Ok(Entries(entries))
            }
        }

        deserializer.deserialize_map(EntriesVisitor)
    }
}

/// Parse a document without reassociating anything
///
/// # Errors
/// Any [`DocumentError`] shape violation; nothing is partially returned
pub fn deserialize(json: &str) -> Result<Document, DocumentError> {
    let Entries(entries) = serde_json::from_str(json).map_err(|e| {
        if e.is_data() {
            DocumentError::NotAnObject
        } else {
            DocumentError::Syntax(e)
        }
    })?;

    let mut metadata = None;
    let mut records = RecordSet::new();
    for (key, value) in entries {
        if key == METADATA_KEY {
            if metadata.is_some() {
                return Err(DocumentError::DuplicateEntry(key));
            }
            metadata = Some(parse_metadata(value)?);
            continue;
        }
        if records.contains_type(&key) {
            return Err(DocumentError::DuplicateEntry(key));
        }
        let entity_type = EntityType::new(key);
        let parsed = parse_records(&entity_type, value)?;
        records.insert(entity_type, parsed);
    }

    let metadata = metadata.ok_or(DocumentError::MissingMetadata)?;
    tracing::debug!(
        root = %metadata.root_type,
        total = records.total(),
        "parsed document"
    );
    Ok(Document::new(metadata, records))
}

fn parse_metadata(value: Value) -> Result<Metadata, DocumentError> {
    if !value.is_object() {
        return Err(DocumentError::InvalidMetadata(format!(
            "expected object, found {}",
            json_kind(&value)
        )));
    }
    let found = value
        .get("format_version")
        .and_then(Value::as_u64)
        .ok_or_else(|| DocumentError::InvalidMetadata("missing format_version".to_string()))?;
    if found != u64::from(FORMAT_VERSION) {
        return Err(DocumentError::UnsupportedVersion {
            found: u32::try_from(found).unwrap_or(u32::MAX),
            supported: FORMAT_VERSION,
        });
    }
    serde_json::from_value(value).map_err(|e| DocumentError::InvalidMetadata(e.to_string()))
}

fn parse_records(entity_type: &EntityType, value: Value) -> Result<Vec<Record>, DocumentError> {
    let items = match value {
        Value::Array(items) => items,
        other => {
            return Err(DocumentError::NotAnArray {
                entity_type: entity_type.to_string(),
                kind: json_kind(&other),
            })
        }
    };

    let mut seen = HashSet::with_capacity(items.len());
    let mut records = Vec::with_capacity(items.len());
    for (index, item) in items.into_iter().enumerate() {
        let fields = match item {
            Value::Object(fields) => fields,
            other => {
                return Err(DocumentError::RecordNotObject {
                    entity_type: entity_type.to_string(),
                    index,
                    kind: json_kind(&other),
                })
            }
        };
        let record = Record::new(fields);
        let id = record.id().ok_or_else(|| DocumentError::MissingId {
            entity_type: entity_type.to_string(),
            index,
        })?;
        if !seen.insert(id) {
            return Err(DocumentError::DuplicateId {
                entity_type: entity_type.to_string(),
                id,
            });
        }
        records.push(record);
    }
    Ok(records)
}
