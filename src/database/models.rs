use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// One ARGO float profile row in the structured store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct FloatProfile {
    pub id: i64,
    pub platform_number: Option<String>,
    pub region: Option<String>,
    pub month: Option<String>,
    pub institution: Option<String>,
    pub profiler: Option<String>,
    pub ocean: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub date: Option<String>,
    pub cycle_number: Option<i64>,
    pub temperature: Option<f64>,
    pub salinity: Option<f64>,
    pub pressure: Option<f64>,
    pub created_date: NaiveDateTime,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct NewFloatProfile {
    pub platform_number: Option<String>,
    pub region: Option<String>,
    pub month: Option<String>,
    pub institution: Option<String>,
    pub profiler: Option<String>,
    pub ocean: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub date: Option<String>,
    pub cycle_number: Option<i64>,
    pub temperature: Option<f64>,
    pub salinity: Option<f64>,
    pub pressure: Option<f64>,
}

/// Bounding box plus totals for a region (or the whole table).
#[derive(Debug, Clone, PartialEq, Serialize, FromRow)]
pub struct GeographicCoverage {
    pub min_lat: Option<f64>,
    pub max_lat: Option<f64>,
    pub min_lon: Option<f64>,
    pub max_lon: Option<f64>,
    pub total_measurements: i64,
    pub unique_profilers: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, FromRow)]
pub struct MonthlyCount {
    pub month: Option<String>,
    pub measurement_count: i64,
    pub unique_profilers: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, FromRow)]
pub struct ProfilerStats {
    pub profiler: Option<String>,
    pub count: i64,
    pub first_measurement: Option<String>,
    pub last_measurement: Option<String>,
}
