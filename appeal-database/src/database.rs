use async_trait::async_trait;
use sqlx::{PgPool, migrate::Migrator};

use appeal_core::{SubmissionLock, SubmissionRecord, SubmissionStore};

use crate::cache::CacheService;
use crate::impls::submissions;

/// Compile-time discovered SQLx migrations for the `appeal-database` crate.
pub static MIGRATOR: Migrator = sqlx::migrate!();

/// Shared database handle passed across crates.
#[derive(Clone, Debug)]
pub struct Database {
    pool: PgPool,
    cache: CacheService,
}

impl Database {
    /// Create a database handle from an existing pool.
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool,
            cache: CacheService::disabled("appeals:prod"),
        }
    }

    /// Create a database handle from an existing pool and cache service.
    pub fn with_cache(pool: PgPool, cache: CacheService) -> Self {
        Self { pool, cache }
    }

    /// Expose the underlying pool for query modules.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Expose the cache service for query modules.
    pub fn cache(&self) -> &CacheService {
        &self.cache
    }
}

#[async_trait]
impl SubmissionStore for Database {
    async fn find_recent_submission(
        &self,
        user_id: &str,
        since: u64,
    ) -> anyhow::Result<Option<SubmissionRecord>> {
        submissions::cached_recent_submission(self, user_id, since).await
    }

    async fn try_lock_user(
        &self,
        user_id: &str,
    ) -> anyhow::Result<Option<Box<dyn SubmissionLock>>> {
        let lock = submissions::try_lock_user_submissions(self, user_id).await?;
        Ok(lock.map(|lock| Box::new(lock) as Box<dyn SubmissionLock>))
    }
}
