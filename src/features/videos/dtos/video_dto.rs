use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::features::sources::models::SourceKind;
use crate::features::videos::models::{Video, VideoStatus};
use crate::shared::pagination::{PageLinks, PageWindow};

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct VideoResponseDto {
    pub id: Uuid,
    pub name: String,
    pub description: String,
    pub website_url: String,
    pub file_url: String,
    pub embed_code: String,
    pub thumbnail_url: String,
    pub status: VideoStatus,
    pub source_kind: SourceKind,
    pub source_name: Option<String>,
    pub feed_id: Option<Uuid>,
    pub search_id: Option<Uuid>,
    pub tags: Vec<String>,
    pub categories: Vec<Uuid>,
    pub authors: Vec<Uuid>,
    pub featured: bool,
    pub when_submitted: DateTime<Utc>,
    pub when_published: Option<DateTime<Utc>>,
    pub when_approved: Option<DateTime<Utc>>,
    pub last_featured: Option<DateTime<Utc>>,
}

impl From<Video> for VideoResponseDto {
    fn from(v: Video) -> Self {
        Self {
            source_kind: v.source_kind(),
            source_name: v.source_name().map(str::to_string),
            featured: v.is_featured(),
            id: v.id,
            name: v.name,
            description: v.description,
            website_url: v.website_url,
            file_url: v.file_url,
            embed_code: v.embed_code,
            thumbnail_url: v.thumbnail_url,
            status: v.status,
            feed_id: v.feed_id,
            search_id: v.search_id,
            tags: v.tags,
            categories: v.categories,
            authors: v.authors,
            when_submitted: v.when_submitted,
            when_published: v.when_published,
            when_approved: v.when_approved,
            last_featured: v.last_featured,
        }
    }
}

/// A page of the approve/reject queue
#[derive(Debug, Serialize, ToSchema)]
pub struct ApproveQueueDto {
    pub items: Vec<VideoResponseDto>,
    /// First video of the page, shown in the preview pane
    pub current_video: Option<VideoResponseDto>,
    pub page: PageWindow,
    pub links: PageLinks,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct ApproveQuery {
    /// `yes` also features the video
    pub feature: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct PageQuery {
    pub page: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct ClearAllDto {
    /// Must be `yes` to reject every unapproved video
    pub confirm: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ModerationResultDto {
    pub affected: u64,
}

/// One row of the bulk edit formset
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct VideoRowDto {
    pub id: Uuid,
    #[validate(length(min = 1, max = 250, message = "Name must be 1-250 characters"))]
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub website_url: String,
    #[serde(default)]
    pub file_url: String,
    #[serde(default)]
    pub embed_code: String,
    #[serde(default)]
    pub thumbnail_url: String,
    pub when_published: Option<DateTime<Utc>>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub categories: Vec<Uuid>,
    #[serde(default)]
    pub authors: Vec<Uuid>,
    /// Reject the video
    #[serde(default)]
    pub delete: bool,
    /// Selected for the bulk form and `bulk_action`
    #[serde(default)]
    pub bulk: bool,
}

/// Extra form applied to every row selected with `bulk`
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct VideoBulkFormDto {
    pub name: Option<String>,
    pub description: Option<String>,
    pub when_published: Option<DateTime<Utc>>,
    /// Added to each video's categories
    #[serde(default)]
    pub categories: Vec<Uuid>,
    /// Replaces each video's authors when non-empty
    pub authors: Option<Vec<Uuid>>,
    /// Replaces each video's tags when present
    pub tags: Option<Vec<String>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum VideoBulkAction {
    /// Rejects the videos
    Delete,
    Approve,
    Unapprove,
    Feature,
    Unfeature,
}

/// Bulk edit formset submission
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct VideoFormsetDto {
    pub rows: Vec<VideoRowDto>,
    #[serde(default)]
    pub bulk: VideoBulkFormDto,
    pub bulk_action: Option<VideoBulkAction>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct VideoFormsetResultDto {
    pub updated: usize,
    pub rejected: usize,
    pub bulk_action: Option<VideoBulkAction>,
    pub bulk_affected: usize,
}

/// Edit of one video; absent fields are left alone
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct VideoEditDto {
    pub name: Option<String>,
    pub description: Option<String>,
    pub website_url: Option<String>,
    pub thumbnail_url: Option<String>,
    pub when_published: Option<DateTime<Utc>>,
    /// Replaces the video's tags
    pub tags: Option<Vec<String>>,
    /// Replaces the video's categories
    pub categories: Option<Vec<Uuid>>,
    /// Replaces the video's authors
    pub authors: Option<Vec<Uuid>>,
}
