// Keyword-heuristic query intent classification.
//
// This is deliberately not a trained model: membership tests against fixed
// keyword tables, matching on the lowercased query as a substring scan.
// Its accuracy is bounded by the tables and that is an accepted property of
// the system; change the tables, not the control flow.


use serde::Serialize;

/// Queries that want concrete numbers out of the structured store.
pub const DATABASE_KEYWORDS: &[&str] = &[
    "show", "find", "get", "list", "count", "average", "mean", "max", "min",
];

/// Queries that want a chart alongside the answer.
pub const VISUALIZATION_KEYWORDS: &[&str] = &[
    "plot", "chart", "graph", "map", "visualize", "show me", "display",
];

/// Queries that want data handed over rather than summarized.
pub const EXPORT_KEYWORDS: &[&str] = &[
    "export", "download", "save", "csv", "netcdf", "json",
];

/// Known ocean regions, matched case-insensitively and reported title-cased.
pub const REGION_KEYWORDS: &[&str] = &[
    "indian ocean",
    "pacific ocean",
    "atlantic ocean",
    "arctic ocean",
    "southern ocean",
];

/// Oceanographic variables the system can reason about.
pub const VARIABLE_KEYWORDS: &[&str] = &[
    "temperature",
    "salinity",
    "pressure",
    "depth",
    "density",
];

/// Time references, coarsest useful granularity only.
pub const TIME_KEYWORDS: &[&str] = &[
    "january",
    "february",
    "march",
    "april",
    "may",
    "june",
    "july",
    "august",
    "september",
    "october",
    "november",
    "december",
    "2023",
    "2024",
    "last year",
    "this year",
    "recent",
];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Default)]
pub struct QueryIntent {
    pub needs_database: bool,
    pub needs_visualization: bool,
    pub needs_export: bool,
    pub region: Option<String>,
    pub variables: Vec<String>,
    pub time_range: Option<String>,
}

/// Classify a user utterance. Pure and deterministic: the same input always
/// yields the same intent.
#[inline]
pub fn classify(text: &str) -> QueryIntent {
    let lower = text.to_lowercase();

    let needs_database = DATABASE_KEYWORDS.iter().any(|kw| lower.contains(kw));
    let needs_visualization = VISUALIZATION_KEYWORDS.iter().any(|kw| lower.contains(kw));
    let needs_export = EXPORT_KEYWORDS.iter().any(|kw| lower.contains(kw));

    let region = REGION_KEYWORDS
        .iter()
        .find(|region| lower.contains(*region))
        .map(|region| title_case(region));

    let variables = VARIABLE_KEYWORDS
        .iter()
        .filter(|var| lower.contains(*var))
        .map(|var| (*var).to_string())
        .collect();

    let time_range = TIME_KEYWORDS
        .iter()
        .find(|kw| lower.contains(*kw))
        .map(|kw| (*kw).to_string());

    QueryIntent {
        needs_database,
        needs_visualization,
        needs_export,
        region,
        variables,
        time_range,
    }
}

fn title_case(text: &str) -> String {
    text.split_whitespace()
        .map(|word| {
            let mut chars = word.chars();
            chars.next().map_or_else(String::new, |first| {
                first.to_uppercase().collect::<String>() + chars.as_str()
            })
        })
        .collect::<Vec<_>>()
        .join(" ")
}
