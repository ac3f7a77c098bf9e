use sqlx::{PgPool, Postgres, Transaction};
use uuid::Uuid;
use validator::Validate;

use crate::core::error::{map_db_error, AppError, Result};
use crate::features::authors::dtos::{AuthorResponseDto, CreateAuthorDto};
use crate::features::authors::models::Author;
use crate::shared::types::{FormErrors, FormOutcome};
use crate::shared::validation::collect_field_errors;

/// Service for author operations
pub struct AuthorService {
    pool: PgPool,
}

impl AuthorService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn list(&self) -> Result<Vec<AuthorResponseDto>> {
        let authors = sqlx::query_as::<_, Author>(
            r#"
            SELECT id, username, email, website, created_at
            FROM authors
            ORDER BY username
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to list authors: {:?}", e);
            AppError::Database(e)
        })?;

        Ok(authors.into_iter().map(Into::into).collect())
    }

    pub async fn create(&self, dto: CreateAuthorDto) -> Result<FormOutcome<AuthorResponseDto>> {
        let mut errors = FormErrors::new();
        if let Err(e) = dto.validate() {
            collect_field_errors(&e, None, None, &mut errors);
            return Ok(FormOutcome::Invalid(errors));
        }

        let taken = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT 1 FROM authors WHERE username = $1)",
        )
        .bind(&dto.username)
        .fetch_one(&self.pool)
        .await
        .map_err(AppError::Database)?;

        if taken {
            errors.field("username", "An author with this username already exists.");
            return Ok(FormOutcome::Invalid(errors));
        }

        let inserted = sqlx::query_as::<_, Author>(
            r#"
            INSERT INTO authors (username, email, website)
            VALUES ($1, $2, $3)
            RETURNING id, username, email, website, created_at
            "#,
        )
        .bind(&dto.username)
        .bind(dto.email.unwrap_or_default())
        .bind(dto.website.filter(|w| !w.is_empty()))
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to create author: {:?}", e);
            map_db_error(e)
        });
        let author = match inserted {
            Ok(author) => author,
            Err(e) => return FormOutcome::unique_violation(&e).ok_or(e),
        };

        tracing::info!("Created author {} ({})", author.username, author.id);
        Ok(FormOutcome::saved(author.into(), "Author created"))
    }

    /// Id of the author named `username`, created when missing.
    pub async fn get_or_create_in(
        tx: &mut Transaction<'_, Postgres>,
        username: &str,
    ) -> Result<Uuid> {
        sqlx::query_scalar::<_, Uuid>(
            r#"
            INSERT INTO authors (username)
            VALUES ($1)
            ON CONFLICT (username) DO UPDATE SET username = EXCLUDED.username
            RETURNING id
            "#,
        )
        .bind(username)
        .fetch_one(&mut **tx)
        .await
        .map_err(|e| {
            tracing::error!("Failed to get or create author {}: {:?}", username, e);
            AppError::Database(e)
        })
    }
}
