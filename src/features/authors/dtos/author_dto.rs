use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::features::authors::models::Author;
use crate::shared::validation::USERNAME_REGEX;

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct AuthorResponseDto {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub website: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl From<Author> for AuthorResponseDto {
    fn from(a: Author) -> Self {
        Self {
            id: a.id,
            username: a.username,
            email: a.email,
            website: a.website,
            created_at: a.created_at,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct CreateAuthorDto {
    #[validate(
        length(min = 1, max = 150, message = "Username must be 1-150 characters"),
        regex(
            path = *USERNAME_REGEX,
            message = "Username may only contain letters, digits and @/./+/-/_"
        )
    )]
    pub username: String,

    #[serde(default)]
    #[validate(email(message = "Invalid email format"))]
    pub email: Option<String>,

    #[validate(url(message = "Website must be a valid URL"))]
    pub website: Option<String>,
}
