// Flat inner-product similarity index.
//
// Vectors are stored in insertion order; the slot number is the only handle
// the rest of the system uses, so removal compacts the surviving slots and
// every caller holding slot numbers must remap (the document store does).

#[cfg(test)]
mod tests;

use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::Path;
use tracing::debug;

use crate::{NeptuneError, Result};

const INDEX_FORMAT_VERSION: u32 = 1;

/// Exhaustive inner-product index over L2-normalized vectors.
///
/// Scores are cosine similarities in `[-1, 1]` as long as both sides are
/// normalized. Search is O(n·d); at the profile counts this system holds
/// (tens of thousands) that is cheaper than maintaining a graph index, and
/// it keeps removal semantics exact.
///
/// Not internally synchronized: concurrent mutation requires an external
/// mutex.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FlatIpIndex {
    version: u32,
    dimension: usize,
    vectors: Vec<Vec<f32>>,
}

impl FlatIpIndex {
    #[inline]
    pub fn new(dimension: usize) -> Self {
        Self {
            version: INDEX_FORMAT_VERSION,
            dimension,
            vectors: Vec::new(),
        }
    }

    #[inline]
    pub fn dimension(&self) -> usize {
        self.dimension
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.vectors.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.vectors.is_empty()
    }

    #[inline]
    pub fn clear(&mut self) {
        self.vectors.clear();
    }

    /// Append a vector, returning its slot.
    #[inline]
    pub fn add(&mut self, vector: &[f32]) -> Result<usize> {
        self.check_dimension(vector)?;
        self.vectors.push(vector.to_vec());
        Ok(self.vectors.len() - 1)
    }

    /// Replace the vector at `slot` wholesale. Slots never change on update.
    #[inline]
    pub fn update(&mut self, slot: usize, vector: &[f32]) -> Result<()> {
        self.check_dimension(vector)?;
        let len = self.vectors.len();
        let stored = self
            .vectors
            .get_mut(slot)
            .ok_or_else(|| NeptuneError::Index(format!("Slot {} out of range ({})", slot, len)))?;
        *stored = vector.to_vec();
        Ok(())
    }

    /// Remove the given slots and compact the survivors in order.
    ///
    /// After this call every slot greater than a removed one has shifted
    /// down; callers must rebuild their slot maps.
    #[inline]
    pub fn remove(&mut self, slots: &[usize]) {
        if slots.is_empty() {
            return;
        }

        let mut doomed: Vec<usize> = slots
            .iter()
            .copied()
            .filter(|slot| *slot < self.vectors.len())
            .collect();
        doomed.sort_unstable();
        doomed.dedup();

        for slot in doomed.iter().rev() {
            self.vectors.remove(*slot);
        }

        debug!("Removed {} slots, {} vectors remain", doomed.len(), self.vectors.len());
    }

    /// Return up to `k` `(slot, score)` pairs ordered by descending inner
    /// product; equal scores are ordered by ascending slot so results are
    /// stable within a process run.
    ///
    /// An empty index yields an empty result, and `k` larger than the index
    /// yields everything; neither is an error.
    #[inline]
    pub fn search(&self, query: &[f32], k: usize) -> Result<Vec<(usize, f32)>> {
        self.check_dimension(query)?;

        if self.vectors.is_empty() || k == 0 {
            return Ok(Vec::new());
        }

        let mut scores: Vec<(usize, f32)> = self
            .vectors
            .iter()
            .enumerate()
            .map(|(slot, vector)| (slot, dot(query, vector)))
            .collect();

        scores.sort_by(|a, b| {
            b.1.partial_cmp(&a.1)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| a.0.cmp(&b.0))
        });
        scores.truncate(k);

        Ok(scores)
    }

    /// Serialize the index to a binary blob. Slot order is preserved so the
    /// file stays line-for-line aligned with `metadata.json`.
    #[inline]
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let file = File::create(path.as_ref())?;
        bincode::serialize_into(BufWriter::new(file), self)
            .map_err(|e| NeptuneError::Index(format!("Failed to serialize index: {}", e)))?;
        debug!(
            "Saved index with {} vectors to {}",
            self.vectors.len(),
            path.as_ref().display()
        );
        Ok(())
    }

    #[inline]
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = File::open(path.as_ref())?;
        let index: Self = bincode::deserialize_from(BufReader::new(file))
            .map_err(|e| NeptuneError::Index(format!("Failed to deserialize index: {}", e)))?;

        if index.version != INDEX_FORMAT_VERSION {
            return Err(NeptuneError::Index(format!(
                "Unsupported index format version {} (expected {})",
                index.version, INDEX_FORMAT_VERSION
            )));
        }

        if let Some(bad) = index.vectors.iter().find(|v| v.len() != index.dimension) {
            return Err(NeptuneError::Index(format!(
                "Corrupt index: vector of dimension {} in a {}-dimensional index",
                bad.len(),
                index.dimension
            )));
        }

        debug!(
            "Loaded index with {} vectors from {}",
            index.vectors.len(),
            path.as_ref().display()
        );
        Ok(index)
    }

    fn check_dimension(&self, vector: &[f32]) -> Result<()> {
        if vector.len() != self.dimension {
            return Err(NeptuneError::Index(format!(
                "Dimension mismatch: got {}, index holds {}-dimensional vectors",
                vector.len(),
                self.dimension
            )));
        }
        Ok(())
    }
}

fn dot(a: &[f32], b: &[f32]) -> f32 {
    a.iter().zip(b.iter()).map(|(x, y)| x * y).sum()
}
