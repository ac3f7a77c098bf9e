use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::features::sources::models::{FeedStatus, Source, SourceEntry, SourceId, SourceKind};

/// A feed or saved search as listed in the source manager
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct SourceResponseDto {
    #[schema(value_type = String, example = "feed-0190c2a4-7b1e-7cc0-b3a5-0d2f3e4a5b6c")]
    pub id: SourceId,
    pub kind: SourceKind,
    pub name: String,
    pub auto_approve: bool,
    pub auto_categories: Vec<Uuid>,
    pub auto_authors: Vec<Uuid>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub feed_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub webpage: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<FeedStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub video_service: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub avoid_frontpage: Option<bool>,
}

impl From<SourceEntry> for SourceResponseDto {
    fn from(entry: SourceEntry) -> Self {
        let id = entry.source.id();
        let kind = entry.source.kind();
        let auto_approve = entry.source.auto_approve();

        let base = Self {
            id,
            kind,
            name: entry.source.display_name().to_string(),
            auto_approve,
            auto_categories: entry.auto_categories,
            auto_authors: entry.auto_authors,
            feed_url: None,
            webpage: None,
            status: None,
            video_service: None,
            avoid_frontpage: None,
        };

        match entry.source {
            Source::Feed(feed) => Self {
                feed_url: Some(feed.feed_url),
                webpage: Some(feed.webpage),
                status: Some(feed.status),
                video_service: feed.video_service,
                avoid_frontpage: Some(feed.avoid_frontpage),
                ..base
            },
            Source::Search(_) => base,
        }
    }
}

/// One row of the source formset
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct SourceRowDto {
    #[schema(value_type = String)]
    pub id: SourceId,
    /// Feeds only
    pub name: Option<String>,
    /// Feeds only
    pub feed_url: Option<String>,
    /// Feeds only
    pub webpage: Option<String>,
    /// Saved searches only
    pub query_string: Option<String>,
    #[serde(default)]
    pub delete: bool,
    /// Selected for the bulk form and `bulk_action`
    #[serde(default)]
    pub bulk: bool,
}

/// Extra form applied to every row selected with `bulk`
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct SourceBulkFormDto {
    #[serde(default)]
    pub auto_categories: Vec<Uuid>,
    #[serde(default)]
    pub auto_authors: Vec<Uuid>,
    pub auto_approve: Option<bool>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum SourceBulkAction {
    Remove,
}

/// Source formset submission
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct SourceFormsetDto {
    pub rows: Vec<SourceRowDto>,
    #[serde(default)]
    pub bulk: SourceBulkFormDto,
    pub bulk_action: Option<SourceBulkAction>,
    /// Detach instead of deleting the videos of removed sources
    #[serde(default)]
    pub keep_videos: bool,
}

impl SourceFormsetDto {
    pub fn is_deleted(&self, row: &SourceRowDto) -> bool {
        row.delete || (row.bulk && self.bulk_action == Some(SourceBulkAction::Remove))
    }
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct SourceFormsetResultDto {
    pub updated: usize,
    pub removed: usize,
    /// Videos deleted together with removed sources
    pub videos_deleted: u64,
    /// Videos whose categories or authors followed a changed auto set
    pub videos_reattributed: u64,
}

/// Inline edit of one feed; absent fields are left alone
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct FeedEditDto {
    pub name: Option<String>,
    /// Replaces the feed's auto categories
    pub auto_categories: Option<Vec<Uuid>>,
    /// Replaces the feed's auto authors
    pub auto_authors: Option<Vec<Uuid>>,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct CreateSavedSearchDto {
    #[validate(length(min = 1, max = 250, message = "Search query must be 1-250 characters"))]
    pub query_string: String,
    #[serde(default)]
    pub auto_approve: bool,
}
