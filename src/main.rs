use clap::{Parser, Subcommand};
use neptune_ai::Result;
use neptune_ai::commands::{
    chat, clear_store, delete_document, ingest_file, search_documents, show_status,
};
use neptune_ai::config::{run_interactive_config, show_config};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "neptune-ai")]
#[command(about = "Conversational retrieval over ARGO ocean float data")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Configure the embedding encoder and language model
    Config {
        /// Show current configuration
        #[arg(long)]
        show: bool,
    },
    /// Load float profile records from a JSON file into both stores
    Ingest {
        /// Path to a JSON array of profile records
        file: PathBuf,
    },
    /// Semantic search over indexed profile and summary documents
    Search {
        /// Search query
        query: String,
        /// Number of candidates to fetch from the index
        #[arg(short, long, default_value_t = 10)]
        k: usize,
        /// Restrict results to one document type ('profile' or 'summary')
        #[arg(long)]
        doc_type: Option<String>,
        /// Restrict results to summaries for this region
        #[arg(long)]
        region: Option<String>,
    },
    /// Interactive chat over the combined stores
    Chat,
    /// Show store statistics and data coverage
    Status,
    /// Delete one indexed document by id
    Delete {
        /// Document id (content hash)
        id: String,
    },
    /// Delete every indexed document
    Clear {
        /// Skip the confirmation prompt
        #[arg(long)]
        yes: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Config { show } => {
            if show {
                show_config()?;
            } else {
                run_interactive_config()?;
            }
        }
        Commands::Ingest { file } => {
            ingest_file(&file).await?;
        }
        Commands::Search {
            query,
            k,
            doc_type,
            region,
        } => {
            search_documents(&query, k, doc_type.as_deref(), region.as_deref()).await?;
        }
        Commands::Chat => {
            chat().await?;
        }
        Commands::Status => {
            show_status().await?;
        }
        Commands::Delete { id } => {
            delete_document(&id).await?;
        }
        Commands::Clear { yes } => {
            clear_store(yes).await?;
        }
    }

    Ok(())
}
