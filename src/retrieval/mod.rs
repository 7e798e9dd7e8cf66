// Retrieval service: the public face of the vector store. Owns the encoder,
// the similarity index, and the document store, and keeps the last two
// slot-aligned through every mutation.


use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use crate::embeddings::Encoder;
use crate::index::FlatIpIndex;
use crate::store::{
    DocMetadata, DocType, DocumentRecord, DocumentStore, ProfileMetadata, SummaryMetadata,
};
use crate::{NeptuneError, Result};

pub const METADATA_FILE: &str = "metadata.json";
pub const INDEX_FILE: &str = "vector_index.bin";

pub const DEFAULT_SEARCH_K: usize = 10;

/// One incoming float profile measurement, as parsed from an ingest file.
/// Fields absent from the source stay `None` and are omitted from the
/// embedded content string.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct ProfileRecord {
    pub profile_index: Option<i64>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub date: Option<String>,
    pub platform_number: Option<String>,
    pub cycle_number: Option<i64>,
    pub temperature: Option<f64>,
    pub salinity: Option<f64>,
    pub pressure: Option<f64>,
    pub temperature_qc: Option<i64>,
    pub salinity_qc: Option<i64>,
    pub pressure_qc: Option<i64>,
    pub region: Option<String>,
    pub month: Option<String>,
    pub institution: Option<String>,
    pub profiler: Option<String>,
    pub ocean: Option<String>,
}

/// Search parameters. Filters are applied AFTER the nearest-neighbor pass,
/// on the `k` candidates the index returned; aggressive filters therefore
/// shrink the result set below `k` rather than triggering an over-fetch.
#[derive(Debug, Clone, Default)]
pub struct SearchOptions {
    pub k: usize,
    pub doc_types: Option<Vec<DocType>>,
    pub filter: Option<MetadataFilter>,
}

impl SearchOptions {
    #[inline]
    pub fn with_k(k: usize) -> Self {
        Self {
            k,
            doc_types: None,
            filter: None,
        }
    }
}

/// Metadata constraints for search results. Each set field must be present
/// AND matching in the candidate's metadata; a record whose metadata lacks
/// the field entirely is rejected, it does not pass by default.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MetadataFilter {
    pub region: Option<String>,
    pub platform_numbers: Option<Vec<String>>,
    pub date: Option<String>,
}

impl MetadataFilter {
    #[inline]
    pub fn matches(&self, metadata: &DocMetadata) -> bool {
        if let Some(region) = &self.region {
            match metadata.as_summary() {
                Some(summary) if summary.region == *region => {}
                _ => return false,
            }
        }

        if let Some(platforms) = &self.platform_numbers {
            match metadata.as_profile().and_then(|p| p.platform_number.as_ref()) {
                Some(platform) if platforms.contains(platform) => {}
                _ => return false,
            }
        }

        if let Some(date) = &self.date {
            match metadata.as_profile().and_then(|p| p.date.as_ref()) {
                Some(record_date) if record_date == date => {}
                _ => return false,
            }
        }

        true
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoredDocument {
    #[serde(flatten)]
    pub record: DocumentRecord,
    pub similarity_score: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StoreStats {
    pub total_documents: usize,
    pub index_size: usize,
    pub dimension: usize,
    pub model_name: String,
    pub doc_types: Vec<DocType>,
    pub last_updated: String,
}

/// Facade over encoder + index + document store.
///
/// All mutation happens in memory; nothing hits disk until [`save`] is
/// called. Not internally synchronized — multi-threaded callers must wrap
/// the service in a mutex and serialize access themselves.
///
/// [`save`]: RetrievalService::save
pub struct RetrievalService {
    encoder: Box<dyn Encoder>,
    index: FlatIpIndex,
    store: DocumentStore,
    dir: PathBuf,
}

impl RetrievalService {
    /// Open the store rooted at `dir`, loading persisted state when it is
    /// present and intact.
    ///
    /// A missing, corrupt, or misaligned persisted pair is downgraded to a
    /// warning and an empty store; a broken encoder is the caller's problem
    /// and must have failed before this point.
    #[inline]
    pub fn open<P: AsRef<Path>>(encoder: Box<dyn Encoder>, dir: P) -> Result<Self> {
        let dir = dir.as_ref().to_path_buf();
        let dimension = encoder.dimension();

        let mut service = Self {
            encoder,
            index: FlatIpIndex::new(dimension),
            store: DocumentStore::new(),
            dir,
        };

        let metadata_path = service.dir.join(METADATA_FILE);
        let index_path = service.dir.join(INDEX_FILE);

        if !metadata_path.exists() || !index_path.exists() {
            debug!(
                "No persisted vector store at {}, starting empty",
                service.dir.display()
            );
            return Ok(service);
        }

        match (DocumentStore::load(&metadata_path), FlatIpIndex::load(&index_path)) {
            (Ok(store), Ok(index)) => {
                if store.len() != index.len() {
                    warn!(
                        "Persisted store is misaligned ({} records vs {} vectors), starting empty",
                        store.len(),
                        index.len()
                    );
                } else if index.dimension() != dimension {
                    warn!(
                        "Persisted index dimension {} does not match encoder dimension {}, starting empty",
                        index.dimension(),
                        dimension
                    );
                } else {
                    info!(
                        "Loaded vector store with {} documents from {}",
                        store.len(),
                        service.dir.display()
                    );
                    service.store = store;
                    service.index = index;
                }
            }
            (Err(e), _) | (_, Err(e)) => {
                warn!("Failed to load persisted vector store: {}, starting empty", e);
            }
        }

        Ok(service)
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.store.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.store.is_empty()
    }

    /// Embed `content` and upsert it. Identical content updates the
    /// existing record in place (same slot, fresh vector); the in-memory
    /// store is mutated but nothing is persisted.
    #[inline]
    pub fn add_document(&mut self, content: &str, metadata: DocMetadata) -> Result<String> {
        let vector = self
            .encoder
            .encode(content)
            .map_err(|e| NeptuneError::Embedding(e.to_string()))?;

        let (id, outcome) = self.store.upsert(content, metadata);

        if outcome.inserted {
            let slot = self.index.add(&vector)?;
            debug_assert_eq!(slot, outcome.slot);
        } else {
            self.index.update(outcome.slot, &vector)?;
        }

        debug!("Added document {} at slot {}", id, outcome.slot);
        Ok(id)
    }

    /// Add a regional summary document.
    #[inline]
    pub fn add_summary(
        &mut self,
        region: &str,
        summary_text: &str,
        profile_count: Option<i64>,
        source: Option<String>,
    ) -> Result<String> {
        let content = format!("Region: {} | Summary: {}", region, summary_text);
        let metadata = DocMetadata::Summary(SummaryMetadata {
            region: region.to_string(),
            profile_count,
            source,
        });
        self.add_document(&content, metadata)
    }

    /// Add a batch of float profiles, one document per record.
    ///
    /// The content string carries only the fields a record actually has;
    /// records with identical content strings deduplicate to one document.
    #[inline]
    pub fn add_profile_batch(&mut self, records: &[ProfileRecord]) -> Result<Vec<String>> {
        let mut ids = Vec::with_capacity(records.len());

        for (position, record) in records.iter().enumerate() {
            let content = profile_content(record);
            let metadata = DocMetadata::Profile(ProfileMetadata {
                profile_index: record.profile_index.or(Some(position as i64)),
                latitude: record.latitude,
                longitude: record.longitude,
                date: record.date.clone(),
                platform_number: record.platform_number.clone(),
                cycle_number: record.cycle_number,
                temperature: record.temperature,
                salinity: record.salinity,
                pressure: record.pressure,
            });
            ids.push(self.add_document(&content, metadata)?);
        }

        info!("Added {} profiles to vector store", ids.len());
        Ok(ids)
    }

    /// Nearest-neighbor search with post-filtering.
    ///
    /// An empty index and a filter that eliminates every candidate both
    /// produce an empty list; the two cases are indistinguishable by design.
    #[inline]
    pub fn search(&self, query: &str, options: &SearchOptions) -> Result<Vec<ScoredDocument>> {
        let k = if options.k == 0 {
            DEFAULT_SEARCH_K
        } else {
            options.k
        };

        let query_vector = self
            .encoder
            .encode(query)
            .map_err(|e| NeptuneError::Embedding(e.to_string()))?;

        let neighbors = self.index.search(&query_vector, k)?;

        let mut results = Vec::new();
        for (slot, score) in neighbors {
            let Some(record) = self.store.record_at(slot) else {
                continue;
            };

            if let Some(doc_types) = &options.doc_types {
                if !doc_types.contains(&record.doc_type) {
                    continue;
                }
            }

            if let Some(filter) = &options.filter {
                if !filter.matches(&record.metadata) {
                    continue;
                }
            }

            results.push(ScoredDocument {
                record: record.clone(),
                similarity_score: score,
            });
        }

        debug!("Found {} results for query: {:.50}", results.len(), query);
        Ok(results)
    }

    #[inline]
    pub fn get_document(&self, id: &str) -> Option<&DocumentRecord> {
        self.store.get(id)
    }

    /// Delete by id. Returns `false` for an unknown id; never an error.
    #[inline]
    pub fn delete_document(&mut self, id: &str) -> bool {
        match self.store.remove(id) {
            Some(slot) => {
                self.index.remove(&[slot]);
                true
            }
            None => false,
        }
    }

    /// Drop every document and vector.
    #[inline]
    pub fn clear(&mut self) {
        self.store.clear();
        self.index.clear();
        info!("Cleared vector store");
    }

    /// `total_documents == index_size` always holds; a difference means the
    /// store and index desynchronized and is a bug.
    #[inline]
    pub fn get_stats(&self) -> StoreStats {
        StoreStats {
            total_documents: self.store.len(),
            index_size: self.index.len(),
            dimension: self.index.dimension(),
            model_name: self.encoder.model_name().to_string(),
            doc_types: self.store.doc_types(),
            last_updated: Utc::now().to_rfc3339(),
        }
    }

    /// Persist both files. A failure leaves the in-memory state untouched
    /// and is surfaced to the caller.
    #[inline]
    pub fn save(&self) -> Result<()> {
        fs::create_dir_all(&self.dir)?;
        self.store.save(self.dir.join(METADATA_FILE))?;
        self.index.save(self.dir.join(INDEX_FILE))?;
        info!(
            "Saved vector store with {} documents to {}",
            self.store.len(),
            self.dir.display()
        );
        Ok(())
    }

    /// Dump the metadata records to an arbitrary JSON file.
    #[inline]
    pub fn export_metadata<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        self.store.save(path.as_ref())?;
        info!("Exported metadata to {}", path.as_ref().display());
        Ok(())
    }
}

/// Human-readable content string for a profile record, mirroring the shape
/// regional users search with: location, date, platform, then whichever
/// measurements are present.
fn profile_content(record: &ProfileRecord) -> String {
    let mut parts = Vec::new();

    if let (Some(latitude), Some(longitude)) = (record.latitude, record.longitude) {
        parts.push(format!("Location: {:.2}°N, {:.2}°E", latitude, longitude));
    }

    if let Some(date) = &record.date {
        parts.push(format!("Date: {}", date));
    }

    if let Some(platform) = &record.platform_number {
        parts.push(format!("Platform: {}", platform));
    }

    for (label, value) in [
        ("Temperature", record.temperature),
        ("Salinity", record.salinity),
        ("Pressure", record.pressure),
    ] {
        if let Some(value) = value {
            parts.push(format!("{}: {:.2}", label, value));
        }
    }

    let mut qc_info = Vec::new();
    for (label, flag) in [
        ("temperature_qc", record.temperature_qc),
        ("salinity_qc", record.salinity_qc),
        ("pressure_qc", record.pressure_qc),
    ] {
        if let Some(flag) = flag {
            qc_info.push(format!("{}: {}", label, flag));
        }
    }
    if !qc_info.is_empty() {
        parts.push(format!("Quality: {}", qc_info.join(", ")));
    }

    parts.join(" | ")
}
