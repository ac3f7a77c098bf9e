use chrono::{DateTime, Utc};
use sqlx::FromRow;
use uuid::Uuid;

/// A stored search query acting as a video source
#[derive(Debug, Clone, FromRow)]
pub struct SavedSearch {
    pub id: Uuid,
    pub query_string: String,
    pub auto_approve: bool,
    pub created_at: DateTime<Utc>,
}
