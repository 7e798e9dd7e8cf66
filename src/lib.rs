use thiserror::Error;

pub type Result<T> = std::result::Result<T, NeptuneError>;

#[derive(Error, Debug)]
pub enum NeptuneError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Embedding error: {0}")]
    Embedding(String),

    #[error("Vector index error: {0}")]
    Index(String),

    #[error("Document store error: {0}")]
    Store(String),

    #[error("Language model error: {0}")]
    Llm(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Other error: {0}")]
    Other(#[from] anyhow::Error),
}

pub mod commands;
pub mod config;
pub mod database;
pub mod embeddings;
pub mod index;
pub mod ingest;
pub mod intent;
pub mod llm;
pub mod pipeline;
pub mod retrieval;
pub mod store;
