use std::sync::Arc;

use axum::{extract::State, Json};

use crate::core::error::Result;
use crate::core::extractor::AppJson;
use crate::features::auth::guards::RequireSiteAdmin;
use crate::features::authors::dtos::{AuthorResponseDto, CreateAuthorDto};
use crate::features::authors::services::AuthorService;
use crate::shared::types::{ApiResponse, FormOutcome, Meta};

/// List authors ordered by username
#[utoipa::path(
    get,
    path = "/api/admin/authors",
    responses(
        (status = 200, description = "Authors", body = ApiResponse<Vec<AuthorResponseDto>>),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden")
    ),
    security(("bearer_auth" = [])),
    tag = "authors"
)]
pub async fn list_authors(
    RequireSiteAdmin(_admin): RequireSiteAdmin,
    State(service): State<Arc<AuthorService>>,
) -> Result<Json<ApiResponse<Vec<AuthorResponseDto>>>> {
    let authors = service.list().await?;
    let total = authors.len() as i64;
    Ok(Json(ApiResponse::success(
        Some(authors),
        None,
        Some(Meta { total }),
    )))
}

/// Add an author
#[utoipa::path(
    post,
    path = "/api/admin/authors",
    request_body = CreateAuthorDto,
    responses(
        (status = 200, description = "Author created, or form errors", body = ApiResponse<AuthorResponseDto>),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden")
    ),
    security(("bearer_auth" = [])),
    tag = "authors"
)]
pub async fn create_author(
    RequireSiteAdmin(_admin): RequireSiteAdmin,
    State(service): State<Arc<AuthorService>>,
    AppJson(dto): AppJson<CreateAuthorDto>,
) -> Result<FormOutcome<AuthorResponseDto>> {
    service.create(dto).await
}
