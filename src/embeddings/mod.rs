// Embedding encoders: text in, L2-normalized fixed-dimension vector out.

#[cfg(test)]
mod tests;

pub mod hashing;
pub mod remote;

use anyhow::Result;

use crate::config::{Config, EncoderProvider};

pub use hashing::HashingEncoder;
pub use remote::RemoteEncoder;

/// Turns text into a fixed-dimension embedding vector.
///
/// Implementations must be deterministic for a given model version. Vectors
/// returned by `encode` are L2-normalized, so inner product against another
/// encoded vector is cosine similarity.
pub trait Encoder: Send {
    fn encode(&self, text: &str) -> Result<Vec<f32>>;

    #[inline]
    fn encode_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        texts.iter().map(|text| self.encode(text)).collect()
    }

    fn dimension(&self) -> usize;

    fn model_name(&self) -> &str;
}

/// Scale `vector` to unit length in place. Zero vectors are left untouched
/// so they score 0 against everything instead of producing NaNs.
#[inline]
pub fn l2_normalize(vector: &mut [f32]) {
    let norm = vector.iter().map(|v| v * v).sum::<f32>().sqrt();
    if norm > 0.0 {
        for value in vector.iter_mut() {
            *value /= norm;
        }
    }
}

/// Construct the encoder selected by the configuration.
///
/// Remote construction performs a health check against the embedding server;
/// a failure here is fatal and callers must not fall back to a degraded
/// encoder silently.
#[inline]
pub fn build_encoder(config: &Config) -> Result<Box<dyn Encoder>> {
    match config.encoder.provider {
        EncoderProvider::Hashing => Ok(Box::new(HashingEncoder::new(
            config.encoder.dimension as usize,
        ))),
        EncoderProvider::Remote => {
            let encoder = RemoteEncoder::new(&config.encoder)?;
            encoder.health_check()?;
            Ok(Box::new(encoder))
        }
    }
}
