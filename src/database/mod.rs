// Structured store for ARGO float profile rows (SQLite via sqlx). The
// vector side lives in `crate::index` + `crate::store`; this side answers
// the region/month/institution questions the chat pipeline asks.


pub mod models;
pub mod queries;

use anyhow::{Context, Result};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::{Pool, Sqlite};
use std::path::Path;
use tracing::{debug, info};

pub use models::{FloatProfile, GeographicCoverage, MonthlyCount, NewFloatProfile, ProfilerStats};
pub use queries::{ProfileQueries, VALID_MONTHS};

pub type DbPool = Pool<Sqlite>;

#[derive(Debug, Clone)]
pub struct Database {
    pool: DbPool,
}

impl Database {
    #[inline]
    pub async fn new<P: AsRef<Path>>(database_path: P) -> Result<Self> {
        let options = SqliteConnectOptions::new()
            .filename(database_path)
            .create_if_missing(true)
            .foreign_keys(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(10)
            .connect_with(options)
            .await
            .context("Failed to create database connection pool")?;

        let database = Self { pool };
        database.run_migrations().await?;

        Ok(database)
    }

    #[inline]
    pub fn pool(&self) -> &DbPool {
        &self.pool
    }

    #[inline]
    pub async fn run_migrations(&self) -> Result<()> {
        info!("Running database migrations");

        sqlx::migrate!("src/database/migrations")
            .run(&self.pool)
            .await
            .context("Failed to run schema migration")?;

        debug!("Database migrations completed successfully");
        Ok(())
    }

    #[inline]
    pub async fn insert_profile(&self, profile: NewFloatProfile) -> Result<FloatProfile> {
        ProfileQueries::create(&self.pool, profile).await
    }

    #[inline]
    pub async fn list_by_region(&self, region: &str, limit: i64) -> Result<Vec<FloatProfile>> {
        ProfileQueries::list_by_region(&self.pool, region, limit).await
    }

    #[inline]
    pub async fn list_by_month(&self, month: &str, limit: i64) -> Result<Vec<FloatProfile>> {
        ProfileQueries::list_by_month(&self.pool, month, limit).await
    }

    #[inline]
    pub async fn list_by_institution(
        &self,
        institution: &str,
        limit: i64,
    ) -> Result<Vec<FloatProfile>> {
        ProfileQueries::list_by_institution(&self.pool, institution, limit).await
    }

    #[inline]
    pub async fn unique_regions(&self) -> Result<Vec<String>> {
        ProfileQueries::unique_regions(&self.pool).await
    }

    #[inline]
    pub async fn unique_months(&self) -> Result<Vec<String>> {
        ProfileQueries::unique_months(&self.pool).await
    }

    #[inline]
    pub async fn unique_institutions(&self) -> Result<Vec<String>> {
        ProfileQueries::unique_institutions(&self.pool).await
    }

    #[inline]
    pub async fn geographic_coverage(&self, region: Option<&str>) -> Result<GeographicCoverage> {
        ProfileQueries::geographic_coverage(&self.pool, region).await
    }

    #[inline]
    pub async fn monthly_distribution(&self, region: Option<&str>) -> Result<Vec<MonthlyCount>> {
        ProfileQueries::monthly_distribution(&self.pool, region).await
    }

    #[inline]
    pub async fn profiler_stats(
        &self,
        region: Option<&str>,
        limit: i64,
    ) -> Result<Vec<ProfilerStats>> {
        ProfileQueries::profiler_stats(&self.pool, region, limit).await
    }

    #[inline]
    pub async fn count_profiles(&self) -> Result<i64> {
        ProfileQueries::count(&self.pool).await
    }

    /// Reclaim space and refresh planner statistics after bulk ingest.
    #[inline]
    pub async fn optimize(&self) -> Result<()> {
        info!("Optimizing database performance");

        sqlx::query("VACUUM")
            .execute(&self.pool)
            .await
            .context("Failed to vacuum database")?;

        sqlx::query("ANALYZE")
            .execute(&self.pool)
            .await
            .context("Failed to analyze database")?;

        debug!("Database optimization completed");
        Ok(())
    }
}
