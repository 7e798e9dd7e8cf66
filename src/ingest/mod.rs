// Batch loading of float profile records into both stores: rows into
// SQLite for structured queries, content strings into the vector store for
// semantic search.

#[cfg(test)]
mod tests;

use anyhow::{Context, Result};
use indicatif::{ProgressBar, ProgressStyle};
use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use tracing::info;

use crate::database::{Database, NewFloatProfile};
use crate::retrieval::{ProfileRecord, RetrievalService};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IngestReport {
    pub rows_inserted: usize,
    pub documents_indexed: usize,
}

/// Parse an ingest file: a JSON array of profile records.
#[inline]
pub fn load_profiles<P: AsRef<Path>>(path: P) -> Result<Vec<ProfileRecord>> {
    let file = File::open(path.as_ref())
        .with_context(|| format!("Failed to open ingest file: {}", path.as_ref().display()))?;

    let records: Vec<ProfileRecord> = serde_json::from_reader(BufReader::new(file))
        .with_context(|| format!("Failed to parse ingest file: {}", path.as_ref().display()))?;

    info!(
        "Loaded {} profile records from {}",
        records.len(),
        path.as_ref().display()
    );
    Ok(records)
}

/// Ingest `records` into the structured store and the vector store, then
/// persist the vector store. Duplicate content strings deduplicate on the
/// vector side, so `documents_indexed` counts distinct documents and can be
/// smaller than `rows_inserted`.
#[inline]
pub async fn run(
    database: &Database,
    retrieval: &mut RetrievalService,
    records: &[ProfileRecord],
) -> Result<IngestReport> {
    let progress = ProgressBar::new(records.len() as u64);
    progress.set_style(
        ProgressStyle::with_template("{spinner} [{bar:40}] {pos}/{len} profiles")
            .unwrap_or_else(|_| ProgressStyle::default_bar()),
    );

    let documents_before = retrieval.len();

    for record in records {
        database
            .insert_profile(to_new_profile(record))
            .await
            .context("Failed to insert profile row")?;
        progress.inc(1);
    }
    progress.finish_and_clear();

    retrieval
        .add_profile_batch(records)
        .context("Failed to index profile documents")?;

    retrieval.save().context("Failed to persist vector store")?;

    if records.len() >= 1000 {
        database.optimize().await?;
    }

    let report = IngestReport {
        rows_inserted: records.len(),
        documents_indexed: retrieval.len() - documents_before,
    };

    info!(
        "Ingest complete: {} rows, {} new documents",
        report.rows_inserted, report.documents_indexed
    );
    Ok(report)
}

fn to_new_profile(record: &ProfileRecord) -> NewFloatProfile {
    NewFloatProfile {
        platform_number: record.platform_number.clone(),
        region: record.region.clone(),
        month: record.month.clone(),
        institution: record.institution.clone(),
        profiler: record.profiler.clone(),
        ocean: record.ocean.clone(),
        latitude: record.latitude,
        longitude: record.longitude,
        date: record.date.clone(),
        cycle_number: record.cycle_number,
        temperature: record.temperature,
        salinity: record.salinity,
        pressure: record.pressure,
    }
}
