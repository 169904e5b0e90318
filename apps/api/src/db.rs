use anyhow::{Context, Result};
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use tracing::{info, warn};

use crate::store::StoreCapabilities;

/// Creates and returns a PostgreSQL connection pool.
pub async fn create_pool(database_url: &str, label: &str) -> Result<PgPool> {
    info!("Connecting to PostgreSQL ({label})...");

    let pool = PgPoolOptions::new()
        .max_connections(10)
        .connect(database_url)
        .await
        .with_context(|| format!("failed to connect the {label} pool"))?;

    info!("PostgreSQL {label} pool established");
    Ok(pool)
}

async fn table_exists(pool: &PgPool, table: &str) -> Result<bool> {
    let exists: bool = sqlx::query_scalar("SELECT to_regclass($1) IS NOT NULL")
        .bind(table)
        .fetch_one(pool)
        .await
        .with_context(|| format!("failed to probe table '{table}'"))?;
    Ok(exists)
}

/// Probes the optional cache tables once. A missing table disables its cache:
/// results are still computed, just never stored.
pub async fn resolve_capabilities(pool: &PgPool) -> Result<StoreCapabilities> {
    let capabilities = StoreCapabilities {
        skill_match_cache: table_exists(pool, "skill_match_analyses").await?,
        recommendation_cache: table_exists(pool, "skill_recommendation_cache").await?,
        roadmap_cache: table_exists(pool, "learning_roadmaps").await?,
    };

    if capabilities != StoreCapabilities::all() {
        warn!("Some analysis caches are disabled: {capabilities:?}");
    }
    Ok(capabilities)
}
