use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "import_job_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum ImportJobStatus {
    Pending,
    Running,
    Completed,
    Failed,
}

/// Queued import of a feed's entries
#[derive(Debug, Clone, FromRow)]
pub struct ImportJob {
    pub id: Uuid,
    pub feed_id: Uuid,
    pub status: ImportJobStatus,
    pub videos_imported: i32,
    pub retry_count: i32,
    pub error_message: Option<String>,
    pub created_at: DateTime<Utc>,
    pub started_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
}

impl ImportJob {
    pub const COLUMNS: &'static str = "id, feed_id, status, videos_imported, retry_count, \
        error_message, created_at, started_at, completed_at";
}
