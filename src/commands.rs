use anyhow::{Context, Result};
use console::style;
use std::io::Write;
use std::path::Path;
use tracing::info;

use crate::config::Config;
use crate::database::Database;
use crate::embeddings::build_encoder;
use crate::ingest;
use crate::llm::LlmClient;
use crate::pipeline::QueryPipeline;
use crate::retrieval::{MetadataFilter, RetrievalService, SearchOptions};
use crate::store::DocType;

/// Load the profile records in `file` into the structured store and the
/// vector store.
#[inline]
pub async fn ingest_file(file: &Path) -> Result<()> {
    let config = Config::load()?;
    let records = ingest::load_profiles(file)?;

    if records.is_empty() {
        println!("No profile records found in {}", file.display());
        return Ok(());
    }

    let database = Database::new(config.database_path())
        .await
        .context("Failed to open database")?;
    let encoder = build_encoder(&config).context("Failed to initialize encoder")?;
    let mut retrieval = RetrievalService::open(encoder, config.vector_index_path())?;

    let report = ingest::run(&database, &mut retrieval, &records).await?;

    println!(
        "Ingested {} rows ({} new documents indexed)",
        style(report.rows_inserted).green(),
        style(report.documents_indexed).green()
    );
    Ok(())
}

/// Semantic search over the indexed documents.
#[inline]
pub async fn search_documents(
    query: &str,
    k: usize,
    doc_type: Option<&str>,
    region: Option<&str>,
) -> Result<()> {
    let config = Config::load()?;
    let encoder = build_encoder(&config).context("Failed to initialize encoder")?;
    let retrieval = RetrievalService::open(encoder, config.vector_index_path())?;

    let options = SearchOptions {
        k,
        doc_types: doc_type.map(parse_doc_type).transpose()?.map(|t| vec![t]),
        filter: region.map(|region| MetadataFilter {
            region: Some(region.to_string()),
            ..MetadataFilter::default()
        }),
    };

    let results = retrieval.search(query, &options)?;

    if results.is_empty() {
        println!("No results.");
        return Ok(());
    }

    for (rank, result) in results.iter().enumerate() {
        println!(
            "{:>2}. {} {} {}",
            rank + 1,
            style(format!("{:.4}", result.similarity_score)).cyan(),
            style(&result.record.doc_type).dim(),
            result.record.content
        );
    }
    Ok(())
}

/// Interactive chat over the combined stores.
#[inline]
pub async fn chat() -> Result<()> {
    let config = Config::load()?;

    let database = Database::new(config.database_path())
        .await
        .context("Failed to open database")?;
    let encoder = build_encoder(&config).context("Failed to initialize encoder")?;
    let retrieval = RetrievalService::open(encoder, config.vector_index_path())?;
    let llm = LlmClient::new(&config.llm);

    if !llm.is_configured() {
        println!(
            "{}",
            style("Note: no LLM API key configured; answers will use data templates.").yellow()
        );
    }

    let mut pipeline = QueryPipeline::new(database, retrieval, llm, config.search.clone());

    println!("{}", style("🌊 NeptuneAI ocean data chat").bold().cyan());
    println!("Ask about float profiles, regions, and measurements. Type 'exit' to quit.");
    println!();

    let stdin = std::io::stdin();
    loop {
        print!("You: ");
        std::io::stdout().flush()?;

        let mut line = String::new();
        if stdin.read_line(&mut line)? == 0 {
            break;
        }

        let question = line.trim();
        if question.is_empty() {
            continue;
        }
        if ["exit", "quit", "bye", "goodbye"].contains(&question.to_lowercase().as_str()) {
            println!("Goodbye! Stay curious about our oceans.");
            break;
        }

        let response = pipeline.process_query(question).await?;
        println!();
        println!("{}", response.summary);
        if let Some(chart) = response.chart {
            println!("{}", style(format!("[suggested chart: {}]", chart)).dim());
        }
        println!();
    }

    Ok(())
}

/// Print store statistics and structured-data coverage.
#[inline]
pub async fn show_status() -> Result<()> {
    let config = Config::load()?;

    let encoder = build_encoder(&config).context("Failed to initialize encoder")?;
    let retrieval = RetrievalService::open(encoder, config.vector_index_path())?;
    let stats = retrieval.get_stats();

    println!("{}", style("Vector store").bold().yellow());
    println!("  Documents: {}", stats.total_documents);
    println!("  Index size: {}", stats.index_size);
    println!("  Dimension: {}", stats.dimension);
    println!("  Model: {}", stats.model_name);
    let doc_types: Vec<String> = stats.doc_types.iter().map(ToString::to_string).collect();
    println!("  Doc types: {}", doc_types.join(", "));

    let database = Database::new(config.database_path())
        .await
        .context("Failed to open database")?;
    let count = database.count_profiles().await?;
    let regions = database.unique_regions().await?;

    println!();
    println!("{}", style("Structured store").bold().yellow());
    println!("  Profile rows: {}", count);
    println!("  Regions: {}", regions.join(", "));

    if count > 0 {
        let coverage = database.geographic_coverage(None).await?;
        if let (Some(min_lat), Some(max_lat)) = (coverage.min_lat, coverage.max_lat) {
            println!("  Latitude range: {:.2} to {:.2}", min_lat, max_lat);
        }
        if let (Some(min_lon), Some(max_lon)) = (coverage.min_lon, coverage.max_lon) {
            println!("  Longitude range: {:.2} to {:.2}", min_lon, max_lon);
        }
    }

    Ok(())
}

/// Delete one document from the vector store by id.
#[inline]
pub async fn delete_document(id: &str) -> Result<()> {
    let config = Config::load()?;
    let encoder = build_encoder(&config).context("Failed to initialize encoder")?;
    let mut retrieval = RetrievalService::open(encoder, config.vector_index_path())?;

    if retrieval.delete_document(id) {
        retrieval.save()?;
        info!("Deleted document {}", id);
        println!("Deleted {}", style(id).green());
    } else {
        println!("No document with id {}", style(id).red());
    }
    Ok(())
}

/// Clear the whole vector store (the structured store is left alone).
#[inline]
pub async fn clear_store(yes: bool) -> Result<()> {
    let config = Config::load()?;

    if !yes
        && !dialoguer::Confirm::new()
            .with_prompt("Delete every indexed document?")
            .default(false)
            .interact()?
    {
        println!("Aborted.");
        return Ok(());
    }

    let encoder = build_encoder(&config).context("Failed to initialize encoder")?;
    let mut retrieval = RetrievalService::open(encoder, config.vector_index_path())?;
    let removed = retrieval.len();
    retrieval.clear();
    retrieval.save()?;

    println!("Cleared {} documents", style(removed).green());
    Ok(())
}

fn parse_doc_type(value: &str) -> Result<DocType> {
    match value.to_lowercase().as_str() {
        "profile" => Ok(DocType::Profile),
        "summary" => Ok(DocType::Summary),
        other => Err(anyhow::anyhow!(
            "Unknown doc type '{}' (expected 'profile' or 'summary')",
            other
        )),
    }
}
