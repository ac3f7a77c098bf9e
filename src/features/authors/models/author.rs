use chrono::{DateTime, Utc};
use sqlx::FromRow;
use uuid::Uuid;

/// A person videos and sources can be attributed to
#[derive(Debug, Clone, FromRow)]
pub struct Author {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub website: Option<String>,
    pub created_at: DateTime<Utc>,
}
