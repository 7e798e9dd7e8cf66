// Document store: one metadata record per vector slot, deduplicated by a
// content hash. The record list is index-aligned with `FlatIpIndex`; every
// mutation here has a mirrored mutation there, performed by the retrieval
// service that owns both.

#[cfg(test)]
mod tests;

use chrono::Utc;
use itertools::Itertools;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::Path;
use tracing::debug;

use crate::{NeptuneError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DocType {
    Profile,
    Summary,
}

impl std::fmt::Display for DocType {
    #[inline]
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match *self {
            DocType::Profile => write!(f, "profile"),
            DocType::Summary => write!(f, "summary"),
        }
    }
}

/// Metadata for a single float profile measurement. Every field is optional:
/// a variable missing from the source record is simply absent, never filled
/// with a placeholder.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct ProfileMetadata {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub profile_index: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub latitude: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub longitude: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub platform_number: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cycle_number: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub salinity: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pressure: Option<f64>,
}

/// Metadata for a regional summary document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SummaryMetadata {
    pub region: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub profile_count: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
}

/// Typed union over per-document-type metadata.
///
/// Serialized untagged: the sibling `doc_type` field of the record carries
/// the discriminant on disk. `Summary` is tried first on deserialization
/// because its required `region` field makes it unambiguous, while
/// `Profile` (all fields optional) would match anything.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum DocMetadata {
    Summary(SummaryMetadata),
    Profile(ProfileMetadata),
}

impl DocMetadata {
    #[inline]
    pub fn doc_type(&self) -> DocType {
        match *self {
            DocMetadata::Summary(_) => DocType::Summary,
            DocMetadata::Profile(_) => DocType::Profile,
        }
    }

    #[inline]
    pub fn as_profile(&self) -> Option<&ProfileMetadata> {
        match self {
            DocMetadata::Profile(profile) => Some(profile),
            DocMetadata::Summary(_) => None,
        }
    }

    #[inline]
    pub fn as_summary(&self) -> Option<&SummaryMetadata> {
        match self {
            DocMetadata::Summary(summary) => Some(summary),
            DocMetadata::Profile(_) => None,
        }
    }
}

/// One searchable document: content, typed metadata, and timestamps.
///
/// `id` is a hash of `content`, so re-inserting identical content updates
/// the existing record instead of duplicating it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentRecord {
    pub id: String,
    pub content: String,
    pub metadata: DocMetadata,
    pub doc_type: DocType,
    pub created_at: String,
    pub updated_at: String,
}

/// Deterministic document id derived from content.
#[inline]
pub fn content_id(content: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(content.as_bytes());
    format!("{:x}", hasher.finalize())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UpsertOutcome {
    pub slot: usize,
    pub inserted: bool,
}

/// Slot-ordered record list plus the id→slot map.
///
/// Invariant: `records[slot].id` maps back to `slot` for every entry, and
/// the caller keeps `records.len()` equal to the vector index size.
#[derive(Debug, Default)]
pub struct DocumentStore {
    records: Vec<DocumentRecord>,
    id_to_slot: HashMap<String, usize>,
}

impl DocumentStore {
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    #[inline]
    pub fn records(&self) -> &[DocumentRecord] {
        &self.records
    }

    #[inline]
    pub fn record_at(&self, slot: usize) -> Option<&DocumentRecord> {
        self.records.get(slot)
    }

    #[inline]
    pub fn get(&self, id: &str) -> Option<&DocumentRecord> {
        self.id_to_slot.get(id).map(|slot| &self.records[*slot])
    }

    #[inline]
    pub fn slot_of(&self, id: &str) -> Option<usize> {
        self.id_to_slot.get(id).copied()
    }

    /// Insert or update the record for `content`.
    ///
    /// A known content hash replaces the record at its existing slot,
    /// preserving `created_at` and bumping `updated_at`. A new hash appends
    /// at the next slot.
    #[inline]
    pub fn upsert(&mut self, content: &str, metadata: DocMetadata) -> (String, UpsertOutcome) {
        let id = content_id(content);
        let now = Utc::now().to_rfc3339();
        let doc_type = metadata.doc_type();

        if let Some(slot) = self.id_to_slot.get(&id).copied() {
            let existing = &mut self.records[slot];
            debug!("Document {} already exists, updating slot {}", id, slot);
            existing.content = content.to_string();
            existing.metadata = metadata;
            existing.doc_type = doc_type;
            existing.updated_at = now;
            return (id, UpsertOutcome {
                slot,
                inserted: false,
            });
        }

        let slot = self.records.len();
        self.records.push(DocumentRecord {
            id: id.clone(),
            content: content.to_string(),
            metadata,
            doc_type,
            created_at: now.clone(),
            updated_at: now,
        });
        self.id_to_slot.insert(id.clone(), slot);

        (id, UpsertOutcome {
            slot,
            inserted: true,
        })
    }

    /// Remove the record with `id`, returning the slot it occupied.
    ///
    /// All records after the freed slot shift down, so the id→slot map is
    /// rebuilt; the caller must apply the same removal to the vector index.
    #[inline]
    pub fn remove(&mut self, id: &str) -> Option<usize> {
        let slot = self.id_to_slot.remove(id)?;
        self.records.remove(slot);
        self.rebuild_slot_map();
        debug!("Deleted document {} from slot {}", id, slot);
        Some(slot)
    }

    #[inline]
    pub fn clear(&mut self) {
        self.records.clear();
        self.id_to_slot.clear();
    }

    /// Distinct document types currently stored, in sorted order.
    #[inline]
    pub fn doc_types(&self) -> Vec<DocType> {
        self.records
            .iter()
            .map(|record| record.doc_type)
            .unique()
            .sorted()
            .collect()
    }

    /// Write the record list as a pretty JSON array in slot order.
    #[inline]
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let file = File::create(path.as_ref())?;
        serde_json::to_writer_pretty(BufWriter::new(file), &self.records)
            .map_err(|e| NeptuneError::Store(format!("Failed to serialize metadata: {}", e)))?;
        debug!(
            "Saved {} metadata records to {}",
            self.records.len(),
            path.as_ref().display()
        );
        Ok(())
    }

    #[inline]
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = File::open(path.as_ref())?;
        let records: Vec<DocumentRecord> = serde_json::from_reader(BufReader::new(file))
            .map_err(|e| NeptuneError::Store(format!("Failed to parse metadata: {}", e)))?;

        let mut store = Self {
            records,
            id_to_slot: HashMap::new(),
        };
        store.rebuild_slot_map();

        debug!(
            "Loaded {} metadata records from {}",
            store.records.len(),
            path.as_ref().display()
        );
        Ok(store)
    }

    fn rebuild_slot_map(&mut self) {
        self.id_to_slot = self
            .records
            .iter()
            .enumerate()
            .map(|(slot, record)| (record.id.clone(), slot))
            .collect();
    }
}
