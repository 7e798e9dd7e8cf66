use anyhow::{Context, Result};
use chrono::Utc;
use sqlx::SqlitePool;
use tracing::warn;

use super::models::{FloatProfile, GeographicCoverage, MonthlyCount, NewFloatProfile, ProfilerStats};

/// Month names accepted by month-filtered queries. Anything else is
/// rejected before it reaches SQL.
pub const VALID_MONTHS: &[&str] = &[
    "January",
    "February",
    "March",
    "April",
    "May",
    "June",
    "July",
    "August",
    "September",
    "October",
    "November",
    "December",
];

const PROFILE_COLUMNS: &str = "id, platform_number, region, month, institution, profiler, ocean, \
                               latitude, longitude, date, cycle_number, temperature, salinity, \
                               pressure, created_date";

pub struct ProfileQueries;

impl ProfileQueries {
    #[inline]
    pub async fn create(pool: &SqlitePool, new_profile: NewFloatProfile) -> Result<FloatProfile> {
        let now = Utc::now().naive_utc();
        let id = sqlx::query(
            "INSERT INTO float_profiles (platform_number, region, month, institution, profiler, \
             ocean, latitude, longitude, date, cycle_number, temperature, salinity, pressure, \
             created_date) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&new_profile.platform_number)
        .bind(&new_profile.region)
        .bind(&new_profile.month)
        .bind(&new_profile.institution)
        .bind(&new_profile.profiler)
        .bind(&new_profile.ocean)
        .bind(new_profile.latitude)
        .bind(new_profile.longitude)
        .bind(&new_profile.date)
        .bind(new_profile.cycle_number)
        .bind(new_profile.temperature)
        .bind(new_profile.salinity)
        .bind(new_profile.pressure)
        .bind(now)
        .execute(pool)
        .await
        .context("Failed to insert float profile")?
        .last_insert_rowid();

        Self::get_by_id(pool, id)
            .await?
            .ok_or_else(|| anyhow::anyhow!("Failed to retrieve inserted profile"))
    }

    #[inline]
    pub async fn get_by_id(pool: &SqlitePool, id: i64) -> Result<Option<FloatProfile>> {
        let result = sqlx::query_as::<_, FloatProfile>(&format!(
            "SELECT {} FROM float_profiles WHERE id = ?",
            PROFILE_COLUMNS
        ))
        .bind(id)
        .fetch_optional(pool)
        .await
        .context("Failed to get profile by id")?;

        Ok(result)
    }

    #[inline]
    pub async fn list_by_region(
        pool: &SqlitePool,
        region: &str,
        limit: i64,
    ) -> Result<Vec<FloatProfile>> {
        let rows = sqlx::query_as::<_, FloatProfile>(&format!(
            "SELECT {} FROM float_profiles WHERE region = ? ORDER BY id LIMIT ?",
            PROFILE_COLUMNS
        ))
        .bind(region)
        .bind(limit)
        .fetch_all(pool)
        .await
        .context("Failed to query profiles by region")?;

        Ok(rows)
    }

    /// Month-filtered listing. An invalid month name yields an empty list
    /// with a warning, matching the lenient behavior the chat surface needs.
    #[inline]
    pub async fn list_by_month(
        pool: &SqlitePool,
        month: &str,
        limit: i64,
    ) -> Result<Vec<FloatProfile>> {
        if !VALID_MONTHS.contains(&month) {
            warn!("Invalid month name: {}", month);
            return Ok(Vec::new());
        }

        let rows = sqlx::query_as::<_, FloatProfile>(&format!(
            "SELECT {} FROM float_profiles WHERE month = ? ORDER BY id LIMIT ?",
            PROFILE_COLUMNS
        ))
        .bind(month)
        .bind(limit)
        .fetch_all(pool)
        .await
        .context("Failed to query profiles by month")?;

        Ok(rows)
    }

    #[inline]
    pub async fn list_by_institution(
        pool: &SqlitePool,
        institution: &str,
        limit: i64,
    ) -> Result<Vec<FloatProfile>> {
        let rows = sqlx::query_as::<_, FloatProfile>(&format!(
            "SELECT {} FROM float_profiles WHERE institution = ? ORDER BY id LIMIT ?",
            PROFILE_COLUMNS
        ))
        .bind(institution)
        .bind(limit)
        .fetch_all(pool)
        .await
        .context("Failed to query profiles by institution")?;

        Ok(rows)
    }

    #[inline]
    pub async fn unique_regions(pool: &SqlitePool) -> Result<Vec<String>> {
        let regions = sqlx::query_scalar::<_, String>(
            "SELECT DISTINCT region FROM float_profiles WHERE region IS NOT NULL ORDER BY region",
        )
        .fetch_all(pool)
        .await
        .context("Failed to list regions")?;

        Ok(regions)
    }

    #[inline]
    pub async fn unique_months(pool: &SqlitePool) -> Result<Vec<String>> {
        let months = sqlx::query_scalar::<_, String>(
            "SELECT DISTINCT month FROM float_profiles WHERE month IS NOT NULL ORDER BY month",
        )
        .fetch_all(pool)
        .await
        .context("Failed to list months")?;

        Ok(months)
    }

    #[inline]
    pub async fn unique_institutions(pool: &SqlitePool) -> Result<Vec<String>> {
        let institutions = sqlx::query_scalar::<_, String>(
            "SELECT DISTINCT institution FROM float_profiles WHERE institution IS NOT NULL \
             ORDER BY institution",
        )
        .fetch_all(pool)
        .await
        .context("Failed to list institutions")?;

        Ok(institutions)
    }

    #[inline]
    pub async fn geographic_coverage(
        pool: &SqlitePool,
        region: Option<&str>,
    ) -> Result<GeographicCoverage> {
        let base = "SELECT MIN(latitude) AS min_lat, MAX(latitude) AS max_lat, \
                    MIN(longitude) AS min_lon, MAX(longitude) AS max_lon, \
                    COUNT(*) AS total_measurements, \
                    COUNT(DISTINCT profiler) AS unique_profilers \
                    FROM float_profiles";

        let coverage = match region {
            Some(region) => {
                sqlx::query_as::<_, GeographicCoverage>(&format!("{} WHERE region = ?", base))
                    .bind(region)
                    .fetch_one(pool)
                    .await
            }
            None => {
                sqlx::query_as::<_, GeographicCoverage>(base)
                    .fetch_one(pool)
                    .await
            }
        }
        .context("Failed to compute geographic coverage")?;

        Ok(coverage)
    }

    #[inline]
    pub async fn monthly_distribution(
        pool: &SqlitePool,
        region: Option<&str>,
    ) -> Result<Vec<MonthlyCount>> {
        let base = "SELECT month, COUNT(*) AS measurement_count, \
                    COUNT(DISTINCT profiler) AS unique_profilers FROM float_profiles";
        let tail = "GROUP BY month ORDER BY measurement_count DESC";

        let rows = match region {
            Some(region) => {
                sqlx::query_as::<_, MonthlyCount>(&format!("{} WHERE region = ? {}", base, tail))
                    .bind(region)
                    .fetch_all(pool)
                    .await
            }
            None => {
                sqlx::query_as::<_, MonthlyCount>(&format!("{} {}", base, tail))
                    .fetch_all(pool)
                    .await
            }
        }
        .context("Failed to compute monthly distribution")?;

        Ok(rows)
    }

    #[inline]
    pub async fn profiler_stats(
        pool: &SqlitePool,
        region: Option<&str>,
        limit: i64,
    ) -> Result<Vec<ProfilerStats>> {
        let base = "SELECT profiler, COUNT(*) AS count, MIN(date) AS first_measurement, \
                    MAX(date) AS last_measurement FROM float_profiles";
        let tail = "GROUP BY profiler ORDER BY count DESC LIMIT ?";

        let rows = match region {
            Some(region) => {
                sqlx::query_as::<_, ProfilerStats>(&format!("{} WHERE region = ? {}", base, tail))
                    .bind(region)
                    .bind(limit)
                    .fetch_all(pool)
                    .await
            }
            None => {
                sqlx::query_as::<_, ProfilerStats>(&format!("{} {}", base, tail))
                    .bind(limit)
                    .fetch_all(pool)
                    .await
            }
        }
        .context("Failed to compute profiler stats")?;

        Ok(rows)
    }

    #[inline]
    pub async fn count(pool: &SqlitePool) -> Result<i64> {
        let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM float_profiles")
            .fetch_one(pool)
            .await
            .context("Failed to count profiles")?;

        Ok(count)
    }
}
