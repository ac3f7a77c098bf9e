use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "feed_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum FeedStatus {
    /// Registered, first import not finished yet
    Unapproved,
    Active,
}

impl std::fmt::Display for FeedStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FeedStatus::Unapproved => write!(f, "unapproved"),
            FeedStatus::Active => write!(f, "active"),
        }
    }
}

/// An RSS/Atom feed videos are imported from
#[derive(Debug, Clone, FromRow)]
pub struct Feed {
    pub id: Uuid,
    pub name: String,
    pub feed_url: String,
    pub webpage: String,
    pub description: String,
    pub status: FeedStatus,
    pub auto_approve: bool,
    pub avoid_frontpage: bool,
    /// Set when the feed is a video service user's uploads (e.g. "YouTube")
    pub video_service: Option<String>,
    pub last_updated: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

impl Feed {
    pub const COLUMNS: &'static str = "id, name, feed_url, webpage, description, status, \
        auto_approve, avoid_frontpage, video_service, last_updated, created_at";
}
