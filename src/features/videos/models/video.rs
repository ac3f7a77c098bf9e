use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::features::sources::models::SourceKind;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "video_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum VideoStatus {
    Unapproved,
    Active,
    Rejected,
}

impl std::fmt::Display for VideoStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            VideoStatus::Unapproved => write!(f, "unapproved"),
            VideoStatus::Active => write!(f, "active"),
            VideoStatus::Rejected => write!(f, "rejected"),
        }
    }
}

/// A video with its source and attribution
#[derive(Debug, Clone, FromRow)]
pub struct Video {
    pub id: Uuid,
    pub name: String,
    pub description: String,
    pub website_url: String,
    pub file_url: String,
    pub embed_code: String,
    pub thumbnail_url: String,
    pub status: VideoStatus,
    pub feed_id: Option<Uuid>,
    pub search_id: Option<Uuid>,
    pub tags: Vec<String>,
    pub when_submitted: DateTime<Utc>,
    pub when_published: Option<DateTime<Utc>>,
    pub when_approved: Option<DateTime<Utc>>,
    pub last_featured: Option<DateTime<Utc>>,
    pub feed_name: Option<String>,
    pub feed_video_service: Option<String>,
    pub search_query: Option<String>,
    pub categories: Vec<Uuid>,
    pub authors: Vec<Uuid>,
}

impl Video {
    /// Select list joining the source and attribution; filters and
    /// orderings refer to `v`, `f` (feed) and `s` (saved search).
    pub const SELECT: &'static str = r#"
        SELECT v.id, v.name, v.description, v.website_url, v.file_url, v.embed_code,
               v.thumbnail_url, v.status, v.feed_id, v.search_id, v.tags, v.when_submitted,
               v.when_published, v.when_approved, v.last_featured,
               f.name AS feed_name, f.video_service AS feed_video_service,
               s.query_string AS search_query,
               ARRAY(SELECT vc.category_id FROM video_categories vc
                     WHERE vc.video_id = v.id ORDER BY vc.category_id) AS categories,
               ARRAY(SELECT va.author_id FROM video_authors va
                     WHERE va.video_id = v.id ORDER BY va.author_id) AS authors
        FROM videos v
        LEFT JOIN feeds f ON f.id = v.feed_id
        LEFT JOIN saved_searches s ON s.id = v.search_id
    "#;

    /// Feed videos take the feed's kind; direct submissions count as `user`.
    pub fn source_kind(&self) -> SourceKind {
        if self.search_id.is_some() {
            SourceKind::Search
        } else if self.feed_id.is_some() && self.feed_video_service.is_none() {
            SourceKind::Feed
        } else {
            SourceKind::User
        }
    }

    pub fn source_name(&self) -> Option<&str> {
        self.feed_name.as_deref().or(self.search_query.as_deref())
    }

    pub fn is_featured(&self) -> bool {
        self.last_featured.is_some()
    }
}
