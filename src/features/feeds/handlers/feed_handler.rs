use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use uuid::Uuid;

use crate::core::error::Result;
use crate::core::extractor::AppJson;
use crate::features::auth::guards::RequireSiteAdmin;
use crate::features::feeds::dtos::{CreateFeedDto, FeedRegistrationDto, ImportJobResponseDto};
use crate::features::feeds::services::FeedService;
use crate::shared::types::ApiResponse;

/// Register a feed
///
/// The feed is fetched once to check it parses; its videos are imported in
/// the background. Poll the returned import job for progress.
#[utoipa::path(
    post,
    path = "/api/admin/feeds",
    request_body = CreateFeedDto,
    responses(
        (status = 202, description = "Feed registered, import queued", body = ApiResponse<FeedRegistrationDto>),
        (status = 400, description = "Invalid, unsafe, duplicate or unparsable feed URL"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 502, description = "Feed could not be fetched")
    ),
    security(("bearer_auth" = [])),
    tag = "feeds"
)]
pub async fn register_feed(
    RequireSiteAdmin(admin): RequireSiteAdmin,
    State(service): State<Arc<FeedService>>,
    AppJson(dto): AppJson<CreateFeedDto>,
) -> Result<(StatusCode, Json<ApiResponse<FeedRegistrationDto>>)> {
    tracing::debug!("{} registering feed {}", admin.sub, dto.feed_url);
    let registration = service.register(dto).await?;

    Ok((
        StatusCode::ACCEPTED,
        Json(ApiResponse::success(
            Some(registration),
            Some("Feed added, import queued".to_string()),
            None,
        )),
    ))
}

/// Get an import job
#[utoipa::path(
    get,
    path = "/api/admin/import-jobs/{id}",
    params(("id" = Uuid, Path, description = "Import job ID")),
    responses(
        (status = 200, description = "Import job", body = ApiResponse<ImportJobResponseDto>),
        (status = 404, description = "Import job not found")
    ),
    security(("bearer_auth" = [])),
    tag = "feeds"
)]
pub async fn get_import_job(
    RequireSiteAdmin(_admin): RequireSiteAdmin,
    State(service): State<Arc<FeedService>>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<ImportJobResponseDto>>> {
    let job = service.import_job(id).await?;
    Ok(Json(ApiResponse::success(Some(job), None, None)))
}
