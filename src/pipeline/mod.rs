// Query orchestration: classify the question, gather structured rows and
// semantic passages, and synthesize an answer. The language model is the
// only unreliable dependency in the chain, so every path out of
// `process_query` still produces a usable response.


use anyhow::Result;
use chrono::Utc;
use serde::Serialize;
use tracing::{debug, warn};

use crate::config::SearchConfig;
use crate::database::{Database, FloatProfile};
use crate::intent::{self, QueryIntent};
use crate::llm::{LlmClient, SYSTEM_PROMPT};
use crate::retrieval::{RetrievalService, ScoredDocument, SearchOptions};

pub const MAX_HISTORY: usize = 15;
pub const DEFAULT_REGION: &str = "Indian Ocean";
const DB_QUERY_LIMIT: i64 = 1000;
const CONTEXT_SNIPPET_CHARS: usize = 200;

/// The fixed set of chart builders the frontend knows how to render.
/// Selection happens here; construction is presentation and lives with the
/// frontend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ChartKind {
    WorldMap,
    TrajectoryMap,
    DepthProfile,
    Heatmap,
    Dashboard,
}

impl std::fmt::Display for ChartKind {
    #[inline]
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match *self {
            ChartKind::WorldMap => write!(f, "world map"),
            ChartKind::TrajectoryMap => write!(f, "trajectory map"),
            ChartKind::DepthProfile => write!(f, "depth profile"),
            ChartKind::Heatmap => write!(f, "heatmap"),
            ChartKind::Dashboard => write!(f, "dashboard"),
        }
    }
}

/// Map a visualization request onto a chart. Checks run in a fixed order
/// and the first match wins ("map" is checked before "heatmap", so a
/// heatmap request containing the word "map" gets the world map — a
/// long-standing quirk the frontend compensates for).
#[inline]
pub fn select_chart(text: &str) -> ChartKind {
    let lower = text.to_lowercase();

    if lower.contains("map") || lower.contains("geographic") {
        ChartKind::WorldMap
    } else if lower.contains("trajectory") || lower.contains("path") {
        ChartKind::TrajectoryMap
    } else if lower.contains("profile") || lower.contains("depth") {
        ChartKind::DepthProfile
    } else if lower.contains("heatmap") {
        ChartKind::Heatmap
    } else {
        ChartKind::Dashboard
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChatTurn {
    pub user: String,
    pub assistant: String,
    pub region: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PipelineResponse {
    pub summary: String,
    pub chart: Option<ChartKind>,
    pub intent: QueryIntent,
    pub data_points: usize,
    pub context_used: usize,
    pub timestamp: String,
}

/// One pipeline per conversation. Holds shared mutable state (retrieval
/// store, history) without internal locking; callers needing concurrency
/// must serialize access externally.
pub struct QueryPipeline {
    database: Database,
    retrieval: RetrievalService,
    llm: LlmClient,
    search: SearchConfig,
    history: Vec<ChatTurn>,
}

impl QueryPipeline {
    #[inline]
    pub fn new(
        database: Database,
        retrieval: RetrievalService,
        llm: LlmClient,
        search: SearchConfig,
    ) -> Self {
        Self {
            database,
            retrieval,
            llm,
            search,
            history: Vec::new(),
        }
    }

    /// Answer one user query end to end.
    ///
    /// Never propagates a language-model failure: if the endpoint errors or
    /// times out (after its single retry), the summary degrades to a
    /// template assembled from the structured results.
    #[inline]
    pub async fn process_query(&mut self, user_input: &str) -> Result<PipelineResponse> {
        debug!("Processing query: {:.80}", user_input);

        let intent = intent::classify(user_input);

        let hits = self
            .retrieval
            .search(user_input, &SearchOptions::with_k(self.search.default_k))?;

        let rows = if intent.needs_database {
            let region = intent.region.as_deref().unwrap_or(DEFAULT_REGION);
            match self.database.list_by_region(region, DB_QUERY_LIMIT).await {
                Ok(rows) => rows,
                Err(e) => {
                    warn!("Database query failed: {}", e);
                    Vec::new()
                }
            }
        } else {
            Vec::new()
        };

        let context = self.build_context(&hits, &rows, &intent);
        let user_prompt = format!(
            "User query: \"{}\"\n\nAvailable data:\n{}\n\nGenerate a natural, helpful response \
             that directly answers the question using the available data.",
            user_input, context
        );

        let summary = match self.llm.generate(SYSTEM_PROMPT, &user_prompt) {
            Ok(text) => text,
            Err(e) => {
                warn!("Language model unavailable, using fallback response: {}", e);
                fallback_summary(user_input, &intent, &rows)
            }
        };

        let chart = if intent.needs_visualization {
            Some(select_chart(user_input))
        } else {
            None
        };

        self.push_history(ChatTurn {
            user: user_input.to_string(),
            assistant: summary.clone(),
            region: intent.region.clone(),
        });

        Ok(PipelineResponse {
            summary,
            chart,
            intent,
            data_points: rows.len(),
            context_used: hits.len(),
            timestamp: Utc::now().to_rfc3339(),
        })
    }

    #[inline]
    pub fn history(&self) -> &[ChatTurn] {
        &self.history
    }

    #[inline]
    pub fn clear_history(&mut self) {
        self.history.clear();
    }

    #[inline]
    pub fn retrieval(&self) -> &RetrievalService {
        &self.retrieval
    }

    #[inline]
    pub fn retrieval_mut(&mut self) -> &mut RetrievalService {
        &mut self.retrieval
    }

    #[inline]
    pub fn database(&self) -> &Database {
        &self.database
    }

    fn build_context(
        &self,
        hits: &[ScoredDocument],
        rows: &[FloatProfile],
        intent: &QueryIntent,
    ) -> String {
        let mut parts = Vec::new();

        if !hits.is_empty() {
            parts.push("Relevant ocean data context:".to_string());
            for hit in hits.iter().take(self.search.context_passages) {
                parts.push(format!(
                    "- {}",
                    truncate(&hit.record.content, CONTEXT_SNIPPET_CHARS)
                ));
            }
        }

        if !rows.is_empty() {
            parts.push(format!("Database query returned {} records", rows.len()));
            if let Some(region) = &intent.region {
                parts.push(format!("Data from {}", region));
            }
        }

        parts.join("\n")
    }

    fn push_history(&mut self, turn: ChatTurn) {
        self.history.push(turn);
        if self.history.len() > MAX_HISTORY {
            self.history.remove(0);
        }
    }
}

/// Templated answer for when the language model is unavailable. Built only
/// from facts already computed, so it cannot fail.
fn fallback_summary(user_input: &str, intent: &QueryIntent, rows: &[FloatProfile]) -> String {
    let lower = user_input.to_lowercase();
    let mut parts = Vec::new();

    if ["hello", "hi", "hey"].iter().any(|g| lower.contains(g)) {
        parts.push("Hello! I'm NeptuneAI, your ocean data assistant.".to_string());
    }

    if !rows.is_empty() {
        parts.push(format!("I found {} oceanographic records", rows.len()));

        if let Some(region) = &intent.region {
            parts.push(format!("focused on the {}", region));
        }

        if let Some(avg) = mean(rows.iter().filter_map(|row| row.temperature)) {
            parts.push(format!("Average temperature: {:.2}°C", avg));
        }

        if let Some(avg) = mean(rows.iter().filter_map(|row| row.salinity)) {
            parts.push(format!("Average salinity: {:.2} PSU", avg));
        }
    }

    if intent.needs_visualization {
        parts.push("I can create visualizations to help you explore this data further.".to_string());
    }

    if parts.is_empty() {
        parts.push(
            "I'm here to help you explore oceanographic data. What would you like to know?"
                .to_string(),
        );
    }

    parts.join(" ")
}

fn mean(values: impl Iterator<Item = f64>) -> Option<f64> {
    let mut sum = 0.0;
    let mut count = 0usize;
    for value in values {
        sum += value;
        count += 1;
    }
    if count == 0 {
        None
    } else {
        Some(sum / count as f64)
    }
}

fn truncate(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        text.to_string()
    } else {
        let clipped: String = text.chars().take(max_chars).collect();
        format!("{}...", clipped)
    }
}
