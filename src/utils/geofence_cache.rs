use anyhow::Result;
use futures_util::StreamExt;
use moka::future::Cache;
use once_cell::sync::OnceCell;
use sqlx::MySqlPool;
use std::time::Duration;

use crate::model::school::{School, SchoolPolicy};

/// Per-school geofence + late-cutoff policy, read on every check-in.
/// Admin updates go through `invalidate`.
static POLICY_CACHE: OnceCell<Cache<u64, SchoolPolicy>> = OnceCell::new();

const DEFAULT_TTL_SECS: u64 = 300; // 5 min

fn build_cache(ttl: Duration) -> Cache<u64, SchoolPolicy> {
    Cache::builder()
        .max_capacity(10_000)
        .time_to_live(ttl)
        .build()
}

/// Install the cache with the configured TTL. Called once at startup,
/// before any lookup; later calls are no-ops.
pub fn init(ttl_secs: u64) {
    let _ = POLICY_CACHE.set(build_cache(Duration::from_secs(ttl_secs)));
}

fn cache() -> &'static Cache<u64, SchoolPolicy> {
    POLICY_CACHE.get_or_init(|| build_cache(Duration::from_secs(DEFAULT_TTL_SECS)))
}

const SCHOOL_COLUMNS: &str = "id, name, latitude, longitude, radius_m, late_cutoff";

pub async fn fetch_school(pool: &MySqlPool, school_id: u64) -> Result<Option<School>, sqlx::Error> {
    sqlx::query_as::<_, School>(&format!(
        "SELECT {SCHOOL_COLUMNS} FROM schools WHERE id = ?"
    ))
    .bind(school_id)
    .fetch_optional(pool)
    .await
}

/// Cached lookup of the policy slice for one school.
pub async fn school_policy(
    pool: &MySqlPool,
    school_id: u64,
) -> Result<Option<SchoolPolicy>, sqlx::Error> {
    if let Some(policy) = cache().get(&school_id).await {
        return Ok(Some(policy));
    }

    let Some(school) = fetch_school(pool, school_id).await? else {
        return Ok(None);
    };

    let policy = school.policy();
    cache().insert(school_id, policy).await;
    Ok(Some(policy))
}

pub async fn invalidate(school_id: u64) {
    cache().invalidate(&school_id).await;
}

/// Preload every school policy at startup so the first check-in of the
/// morning does not pay the lookup.
pub async fn warmup_policy_cache(pool: &MySqlPool) -> Result<()> {
    let sql = format!("SELECT {SCHOOL_COLUMNS} FROM schools");
    let mut stream = sqlx::query_as::<_, School>(&sql).fetch(pool);

    let mut total_count = 0usize;
    while let Some(row) = stream.next().await {
        let school = row?;
        cache().insert(school.id, school.policy()).await;
        total_count += 1;
    }

    log::info!("Geofence policy cache warmup complete: {} schools", total_count);

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ttl_comes_from_configuration() {
        init(42);
        assert_eq!(
            cache().policy().time_to_live(),
            Some(Duration::from_secs(42))
        );

        // A second init never rebuilds an already-installed cache.
        init(7);
        assert_eq!(
            cache().policy().time_to_live(),
            Some(Duration::from_secs(42))
        );
    }
}
