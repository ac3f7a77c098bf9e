use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::features::feeds::models::{ImportJob, ImportJobStatus};
use crate::features::sources::dtos::SourceResponseDto;

/// Register a feed
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateFeedDto {
    #[validate(length(min = 1, max = 2000, message = "Feed URL is required"))]
    pub feed_url: String,
    #[serde(default)]
    pub auto_approve: bool,
    #[serde(default)]
    pub avoid_frontpage: bool,
    #[serde(default)]
    pub auto_categories: Vec<Uuid>,
    #[serde(default)]
    pub auto_authors: Vec<Uuid>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ImportJobResponseDto {
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

impl From<ImportJob> for ImportJobResponseDto {
    fn from(job: ImportJob) -> Self {
        Self {
            id: job.id,
            feed_id: job.feed_id,
            status: job.status,
            videos_imported: job.videos_imported,
            retry_count: job.retry_count,
            error_message: job.error_message,
            created_at: job.created_at,
            started_at: job.started_at,
            completed_at: job.completed_at,
        }
    }
}

/// A registered feed and the job importing its videos
#[derive(Debug, Serialize, ToSchema)]
pub struct FeedRegistrationDto {
    pub feed: SourceResponseDto,
    pub import_job: ImportJobResponseDto,
}
