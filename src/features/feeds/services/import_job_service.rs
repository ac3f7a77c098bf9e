use sqlx::{PgPool, Postgres, Transaction};
use uuid::Uuid;

use crate::core::error::{AppError, Result};
use crate::features::feeds::models::{ImportJob, ImportJobStatus};

/// Service for the feed import queue
pub struct ImportJobService {
    pool: PgPool,
}

impl ImportJobService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Queue an import of `feed_id` inside the registering transaction
    pub async fn create_in(tx: &mut Transaction<'_, Postgres>, feed_id: Uuid) -> Result<ImportJob> {
        let sql = format!(
            "INSERT INTO import_jobs (feed_id) VALUES ($1) RETURNING {}",
            ImportJob::COLUMNS
        );
        sqlx::query_as::<_, ImportJob>(&sql)
            .bind(feed_id)
            .fetch_one(&mut **tx)
            .await
            .map_err(|e| {
                tracing::error!("Failed to create import job: {:?}", e);
                AppError::Database(e)
            })
    }

    pub async fn get(&self, id: Uuid) -> Result<ImportJob> {
        let sql = format!("SELECT {} FROM import_jobs WHERE id = $1", ImportJob::COLUMNS);
        sqlx::query_as::<_, ImportJob>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| {
                tracing::error!("Failed to get import job: {:?}", e);
                AppError::Database(e)
            })?
            .ok_or_else(|| AppError::NotFound(format!("Import job {} not found", id)))
    }

    /// Fetch pending jobs for processing
    pub async fn fetch_pending(&self, max_retries: i32, batch_size: i64) -> Result<Vec<ImportJob>> {
        let sql = format!(
            r#"
            SELECT {}
            FROM import_jobs
            WHERE status = 'pending'
            AND retry_count < $1
            ORDER BY created_at ASC
            LIMIT $2
            "#,
            ImportJob::COLUMNS
        );
        sqlx::query_as::<_, ImportJob>(&sql)
            .bind(max_retries)
            .bind(batch_size)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| {
                tracing::error!("Failed to fetch pending import jobs: {:?}", e);
                AppError::Database(e)
            })
    }

    pub async fn mark_running(&self, job_id: Uuid) -> Result<()> {
        sqlx::query("UPDATE import_jobs SET status = $2, started_at = NOW() WHERE id = $1")
            .bind(job_id)
            .bind(ImportJobStatus::Running)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                tracing::error!("Failed to mark import job as running: {:?}", e);
                AppError::Database(e)
            })?;
        Ok(())
    }

    pub async fn mark_completed(&self, job_id: Uuid, videos_imported: i32) -> Result<()> {
        sqlx::query(
            r#"
            UPDATE import_jobs
            SET status = $2, videos_imported = $3, error_message = NULL, completed_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(job_id)
        .bind(ImportJobStatus::Completed)
        .bind(videos_imported)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to mark import job as completed: {:?}", e);
            AppError::Database(e)
        })?;

        tracing::info!("Import job {} completed: {} videos", job_id, videos_imported);
        Ok(())
    }

    /// Record a failed attempt; the job goes back to `pending` until
    /// `max_retries` attempts have failed.
    pub async fn mark_failed(
        &self,
        job: &ImportJob,
        max_retries: i32,
        error_message: &str,
    ) -> Result<()> {
        let retry_count = job.retry_count + 1;
        let status = status_after_failure(retry_count, max_retries);

        sqlx::query(
            r#"
            UPDATE import_jobs
            SET status = $2, error_message = $3, retry_count = $4,
                completed_at = CASE WHEN $2 = 'failed'::import_job_status THEN NOW() END
            WHERE id = $1
            "#,
        )
        .bind(job.id)
        .bind(status)
        .bind(error_message)
        .bind(retry_count)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to mark import job as failed: {:?}", e);
            AppError::Database(e)
        })?;

        if status == ImportJobStatus::Failed {
            tracing::warn!(
                "Import job {} permanently failed after {} attempts",
                job.id,
                retry_count
            );
        } else {
            tracing::info!(
                "Import job {} marked for retry ({}/{})",
                job.id,
                retry_count,
                max_retries
            );
        }

        Ok(())
    }
}

fn status_after_failure(retry_count: i32, max_retries: i32) -> ImportJobStatus {
    if retry_count >= max_retries {
        ImportJobStatus::Failed
    } else {
        ImportJobStatus::Pending
    }
}
