
use anyhow::Result;
use rustc_hash::FxHasher;
use std::hash::Hasher;

use super::{Encoder, l2_normalize};

pub const HASHING_MODEL_NAME: &str = "feature-hashing-v1";

/// Local, fully deterministic encoder based on signed feature hashing.
///
/// Lowercased alphanumeric tokens and their bigrams are hashed into a
/// fixed number of buckets with a +/-1 sign drawn from the hash. Documents
/// sharing more surface vocabulary land closer together, which is exactly
/// the behavior the profile summaries need: `Location: 10.00°N` overlaps
/// `10N 80E` style queries on the shared numeric tokens.
///
/// No model files, no network, no startup failure mode. Vectors are not
/// comparable across different dimensions.
#[derive(Debug, Clone)]
pub struct HashingEncoder {
    dimension: usize,
}

impl HashingEncoder {
    #[inline]
    pub fn new(dimension: usize) -> Self {
        Self { dimension }
    }

    fn tokenize(text: &str) -> Vec<String> {
        text.to_lowercase()
            .split(|c: char| !c.is_alphanumeric())
            .filter(|token| !token.is_empty())
            .map(str::to_string)
            .collect()
    }

    /// Map a feature string to a bucket and a sign. The low hash bit picks
    /// the sign, the remaining bits pick the bucket, keeping the two
    /// decisions decorrelated.
    fn feature_slot(&self, feature: &str) -> (usize, f32) {
        let mut hasher = FxHasher::default();
        hasher.write(feature.as_bytes());
        let hash = hasher.finish();

        let sign = if (hash & 1) == 0 { 1.0 } else { -1.0 };
        let bucket = usize::try_from((hash >> 1) % self.dimension as u64).unwrap_or(0);
        (bucket, sign)
    }
}

impl Encoder for HashingEncoder {
    #[inline]
    fn encode(&self, text: &str) -> Result<Vec<f32>> {
        let tokens = Self::tokenize(text);
        let mut vector = vec![0.0f32; self.dimension];

        for token in &tokens {
            let (bucket, sign) = self.feature_slot(token);
            vector[bucket] += sign;
        }

        for pair in tokens.windows(2) {
            let feature = format!("{}\u{1}{}", pair[0], pair[1]);
            let (bucket, sign) = self.feature_slot(&feature);
            vector[bucket] += sign * 0.5;
        }

        l2_normalize(&mut vector);
        Ok(vector)
    }

    #[inline]
    fn dimension(&self) -> usize {
        self.dimension
    }

    #[inline]
    fn model_name(&self) -> &str {
        HASHING_MODEL_NAME
    }
}
