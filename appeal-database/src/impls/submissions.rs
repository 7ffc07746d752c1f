use std::time::Duration;

use anyhow::Context as _;
use async_trait::async_trait;
use sqlx::{PgExecutor, Postgres, Transaction};
use tracing::warn;

use appeal_core::{SubmissionLock, SubmissionRecord};

use crate::database::Database;

/// How long the Auth-Callback pre-check may reuse a cached lookup.
pub const RECENT_SUBMISSION_CACHE_TTL: Duration = Duration::from_secs(60);

#[derive(sqlx::FromRow)]
struct SubmissionRow {
    user_id: String,
    submitted_at: i64,
}

impl SubmissionRow {
    fn into_record(self) -> anyhow::Result<SubmissionRecord> {
        Ok(SubmissionRecord {
            user_id: self.user_id,
            submitted_at: u64::try_from(self.submitted_at)
                .context("submitted_at out of u64 range")?,
        })
    }
}

/// Return the most recent submission of a user at or after `since`.
pub async fn find_recent_submission<'e, E>(
    executor: E,
    user_id: &str,
    since: u64,
) -> anyhow::Result<Option<SubmissionRecord>>
where
    E: PgExecutor<'e>,
{
    let since_i64 = i64::try_from(since).context("since out of i64 range")?;

    let row: Option<SubmissionRow> = sqlx::query_as(
        "SELECT user_id, submitted_at
         FROM appeal_submissions
         WHERE user_id = $1 AND submitted_at >= $2
         ORDER BY submitted_at DESC
         LIMIT 1",
    )
    .bind(user_id)
    .bind(since_i64)
    .fetch_optional(executor)
    .await?;

    row.map(SubmissionRow::into_record).transpose()
}

/// Record a new submission.
pub async fn insert_submission<'e, E>(
    executor: E,
    user_id: &str,
    submitted_at: u64,
) -> anyhow::Result<()>
where
    E: PgExecutor<'e>,
{
    let submitted_at_i64 =
        i64::try_from(submitted_at).context("submitted_at out of i64 range")?;

    sqlx::query("INSERT INTO appeal_submissions (user_id, submitted_at) VALUES ($1, $2)")
        .bind(user_id)
        .bind(submitted_at_i64)
        .execute(executor)
        .await?;

    Ok(())
}

fn recent_submission_cache_key(db: &Database, user_id: &str) -> String {
    db.cache().key(format!("recent_submission:{user_id}"))
}

/// Cache-backed variant of [`find_recent_submission`] for the read-only
/// pre-check. Caches the latest submission time (or its absence).
pub async fn cached_recent_submission(
    db: &Database,
    user_id: &str,
    since: u64,
) -> anyhow::Result<Option<SubmissionRecord>> {
    let key = recent_submission_cache_key(db, user_id);
    let latest = db
        .cache()
        .get_or_load_json(&key, RECENT_SUBMISSION_CACHE_TTL, || async {
            let record = find_recent_submission(db.pool(), user_id, since).await?;
            Ok(record.map(|record| record.submitted_at))
        })
        .await?;

    Ok(latest
        .filter(|submitted_at| *submitted_at >= since)
        .map(|submitted_at| SubmissionRecord {
            user_id: user_id.to_owned(),
            submitted_at,
        }))
}

/// Open a transaction holding the per-user advisory lock, or `None` when
/// another transaction already holds it. Never waits on the lock, so a busy
/// user cannot pile up pooled connections.
pub async fn try_lock_user_submissions(
    db: &Database,
    user_id: &str,
) -> anyhow::Result<Option<PgSubmissionLock>> {
    let mut tx = db.pool().begin().await?;

    let acquired: bool = sqlx::query_scalar(
        "SELECT pg_try_advisory_xact_lock(hashtextextended('appeal_submissions:' || $1, 0))",
    )
    .bind(user_id)
    .fetch_one(&mut *tx)
    .await
    .context("failed to acquire submission lock")?;

    if !acquired {
        tx.rollback().await?;
        return Ok(None);
    }

    Ok(Some(PgSubmissionLock {
        db: db.clone(),
        user_id: user_id.to_owned(),
        tx,
    }))
}

/// Transaction scoped lock; rolled back (and released) on drop.
pub struct PgSubmissionLock {
    db: Database,
    user_id: String,
    tx: Transaction<'static, Postgres>,
}

#[async_trait]
impl SubmissionLock for PgSubmissionLock {
    async fn find_recent_submission(
        &mut self,
        since: u64,
    ) -> anyhow::Result<Option<SubmissionRecord>> {
        find_recent_submission(&mut *self.tx, &self.user_id, since).await
    }

    async fn record_submission(self: Box<Self>, submitted_at: u64) -> anyhow::Result<()> {
        let Self {
            db,
            user_id,
            mut tx,
        } = *self;

        insert_submission(&mut *tx, &user_id, submitted_at).await?;
        tx.commit().await?;

        if let Err(e) = db.cache().del(&recent_submission_cache_key(&db, &user_id)).await {
            warn!(?e, user_id = %user_id, "failed to invalidate recent submission cache");
        }

        Ok(())
    }
}
