use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    Json,
};
use uuid::Uuid;

use crate::core::error::Result;
use crate::core::extractor::AppJson;
use crate::features::auth::guards::RequireSiteAdmin;
use crate::features::videos::dtos::{
    ApproveQuery, ApproveQueueDto, ClearAllDto, ModerationResultDto, PageQuery, VideoEditDto,
    VideoFormsetDto, VideoFormsetResultDto, VideoResponseDto,
};
use crate::features::videos::services::{Moderation, VideoService};
use crate::shared::query::QueryParams;
use crate::shared::types::{ApiResponse, FormOutcome, Listing, Meta};

/// Approve/reject queue
#[utoipa::path(
    get,
    path = "/api/admin/approve-reject",
    params(("page" = Option<String>, Query, description = "Page number, clamped to the last page")),
    responses(
        (status = 200, description = "Unapproved videos", body = ApiResponse<ApproveQueueDto>),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden")
    ),
    security(("bearer_auth" = [])),
    tag = "videos"
)]
pub async fn approve_queue(
    RequireSiteAdmin(_admin): RequireSiteAdmin,
    State(service): State<Arc<VideoService>>,
    params: QueryParams,
) -> Result<Json<ApiResponse<ApproveQueueDto>>> {
    let queue = service.approve_queue(&params).await?;
    Ok(Json(ApiResponse::success(Some(queue), None, None)))
}

/// Preview a single video
#[utoipa::path(
    get,
    path = "/api/admin/videos/{id}/preview",
    params(("id" = Uuid, Path, description = "Video ID")),
    responses(
        (status = 200, description = "Video", body = ApiResponse<VideoResponseDto>),
        (status = 404, description = "Video not found")
    ),
    security(("bearer_auth" = [])),
    tag = "videos"
)]
pub async fn preview_video(
    RequireSiteAdmin(_admin): RequireSiteAdmin,
    State(service): State<Arc<VideoService>>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<VideoResponseDto>>> {
    let video = service.get(id).await?;
    Ok(Json(ApiResponse::success(Some(video.into()), None, None)))
}

async fn moderate(
    service: &VideoService,
    id: Uuid,
    action: Moderation,
    message: &str,
) -> Result<Json<ApiResponse<VideoResponseDto>>> {
    let video = service.moderate(id, action).await?;
    Ok(Json(ApiResponse::success(
        Some(video.into()),
        Some(message.to_string()),
        None,
    )))
}

/// Approve a video, featuring it with `feature=yes`
#[utoipa::path(
    post,
    path = "/api/admin/videos/{id}/approve",
    params(
        ("id" = Uuid, Path, description = "Video ID"),
        ("feature" = Option<String>, Query, description = "`yes` to also feature the video")
    ),
    responses(
        (status = 200, description = "Video approved", body = ApiResponse<VideoResponseDto>),
        (status = 404, description = "Video not found")
    ),
    security(("bearer_auth" = [])),
    tag = "videos"
)]
pub async fn approve_video(
    RequireSiteAdmin(_admin): RequireSiteAdmin,
    State(service): State<Arc<VideoService>>,
    Path(id): Path<Uuid>,
    Query(query): Query<ApproveQuery>,
) -> Result<Json<ApiResponse<VideoResponseDto>>> {
    if query.feature.as_deref() == Some("yes") {
        moderate(&service, id, Moderation::ApproveFeatured, "Video approved and featured").await
    } else {
        moderate(&service, id, Moderation::Approve, "Video approved").await
    }
}

/// Reject a video
#[utoipa::path(
    post,
    path = "/api/admin/videos/{id}/reject",
    params(("id" = Uuid, Path, description = "Video ID")),
    responses(
        (status = 200, description = "Video rejected", body = ApiResponse<VideoResponseDto>),
        (status = 404, description = "Video not found")
    ),
    security(("bearer_auth" = [])),
    tag = "videos"
)]
pub async fn reject_video(
    RequireSiteAdmin(_admin): RequireSiteAdmin,
    State(service): State<Arc<VideoService>>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<VideoResponseDto>>> {
    moderate(&service, id, Moderation::Reject, "Video rejected").await
}

/// Feature a video, approving it if needed
#[utoipa::path(
    post,
    path = "/api/admin/videos/{id}/feature",
    params(("id" = Uuid, Path, description = "Video ID")),
    responses(
        (status = 200, description = "Video featured", body = ApiResponse<VideoResponseDto>),
        (status = 404, description = "Video not found")
    ),
    security(("bearer_auth" = [])),
    tag = "videos"
)]
pub async fn feature_video(
    RequireSiteAdmin(_admin): RequireSiteAdmin,
    State(service): State<Arc<VideoService>>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<VideoResponseDto>>> {
    moderate(&service, id, Moderation::Feature, "Video featured").await
}

/// Stop featuring a video
#[utoipa::path(
    post,
    path = "/api/admin/videos/{id}/unfeature",
    params(("id" = Uuid, Path, description = "Video ID")),
    responses(
        (status = 200, description = "Video unfeatured", body = ApiResponse<VideoResponseDto>),
        (status = 404, description = "Video not found")
    ),
    security(("bearer_auth" = [])),
    tag = "videos"
)]
pub async fn unfeature_video(
    RequireSiteAdmin(_admin): RequireSiteAdmin,
    State(service): State<Arc<VideoService>>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<VideoResponseDto>>> {
    moderate(&service, id, Moderation::Unfeature, "Video unfeatured").await
}

/// Approve every video on one page of the queue
#[utoipa::path(
    post,
    path = "/api/admin/approve-reject/approve-all",
    params(("page" = Option<String>, Query, description = "Queue page")),
    responses(
        (status = 200, description = "Videos approved", body = ApiResponse<ModerationResultDto>)
    ),
    security(("bearer_auth" = [])),
    tag = "videos"
)]
pub async fn approve_all(
    RequireSiteAdmin(_admin): RequireSiteAdmin,
    State(service): State<Arc<VideoService>>,
    Query(query): Query<PageQuery>,
) -> Result<Json<ApiResponse<ModerationResultDto>>> {
    let affected = service
        .moderate_queue_page(query.page.as_deref(), Moderation::Approve)
        .await?;
    Ok(Json(ApiResponse::success(
        Some(ModerationResultDto { affected }),
        Some(format!("{} videos approved", affected)),
        None,
    )))
}

/// Reject every video on one page of the queue
#[utoipa::path(
    post,
    path = "/api/admin/approve-reject/reject-all",
    params(("page" = Option<String>, Query, description = "Queue page")),
    responses(
        (status = 200, description = "Videos rejected", body = ApiResponse<ModerationResultDto>)
    ),
    security(("bearer_auth" = [])),
    tag = "videos"
)]
pub async fn reject_all(
    RequireSiteAdmin(_admin): RequireSiteAdmin,
    State(service): State<Arc<VideoService>>,
    Query(query): Query<PageQuery>,
) -> Result<Json<ApiResponse<ModerationResultDto>>> {
    let affected = service
        .moderate_queue_page(query.page.as_deref(), Moderation::Reject)
        .await?;
    Ok(Json(ApiResponse::success(
        Some(ModerationResultDto { affected }),
        Some(format!("{} videos rejected", affected)),
        None,
    )))
}

/// Every unapproved video, pending clear-all confirmation
#[utoipa::path(
    get,
    path = "/api/admin/approve-reject/clear-all",
    responses(
        (status = 200, description = "Unapproved videos", body = ApiResponse<Vec<VideoResponseDto>>)
    ),
    security(("bearer_auth" = [])),
    tag = "videos"
)]
pub async fn clear_all_preview(
    RequireSiteAdmin(_admin): RequireSiteAdmin,
    State(service): State<Arc<VideoService>>,
) -> Result<Json<ApiResponse<Vec<VideoResponseDto>>>> {
    let videos: Vec<VideoResponseDto> = service
        .unapproved()
        .await?
        .into_iter()
        .map(Into::into)
        .collect();
    let total = videos.len() as i64;
    Ok(Json(ApiResponse::success(Some(videos), None, Some(Meta { total }))))
}

/// Reject every unapproved video when `confirm` is `yes`
#[utoipa::path(
    post,
    path = "/api/admin/approve-reject/clear-all",
    request_body = ClearAllDto,
    responses(
        (status = 200, description = "Queue cleared, or nothing when unconfirmed", body = ApiResponse<ModerationResultDto>)
    ),
    security(("bearer_auth" = [])),
    tag = "videos"
)]
pub async fn clear_all(
    RequireSiteAdmin(admin): RequireSiteAdmin,
    State(service): State<Arc<VideoService>>,
    AppJson(dto): AppJson<ClearAllDto>,
) -> Result<Json<ApiResponse<ModerationResultDto>>> {
    if dto.confirm.as_deref() != Some("yes") {
        return Ok(Json(ApiResponse::success(
            Some(ModerationResultDto { affected: 0 }),
            Some("Nothing cleared without confirmation".to_string()),
            None,
        )));
    }

    tracing::info!("{} clearing the approve queue", admin.sub);
    let affected = service.clear_queue().await?;
    Ok(Json(ApiResponse::success(
        Some(ModerationResultDto { affected }),
        Some(format!("{} videos rejected", affected)),
        None,
    )))
}

/// Bulk edit listing of active (or rejected) videos
#[utoipa::path(
    get,
    path = "/api/admin/bulk-edit",
    params(
        ("sort" = Option<String>, Query, description = "name, source, when_published or when_submitted, `-` prefix for descending"),
        ("category" = Option<Uuid>, Query, description = "Only videos in this category"),
        ("author" = Option<Uuid>, Query, description = "Only videos by this author"),
        ("filter" = Option<String>, Query, description = "featured, rejected, no-attribution or no-category"),
        ("q" = Option<String>, Query, description = "Search name, description and feed name"),
        ("page" = Option<String>, Query, description = "Page number")
    ),
    responses(
        (status = 200, description = "Videos", body = ApiResponse<Listing<VideoResponseDto>>),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden")
    ),
    security(("bearer_auth" = [])),
    tag = "videos"
)]
pub async fn bulk_edit_listing(
    RequireSiteAdmin(_admin): RequireSiteAdmin,
    State(service): State<Arc<VideoService>>,
    params: QueryParams,
) -> Result<Json<ApiResponse<Listing<VideoResponseDto>>>> {
    let listing = service.bulk_edit_listing(&params).await?;
    Ok(Json(ApiResponse::success(Some(listing), None, None)))
}

/// Save the bulk edit formset
#[utoipa::path(
    post,
    path = "/api/admin/bulk-edit",
    request_body = VideoFormsetDto,
    responses(
        (status = 200, description = "Formset saved, or per-row errors", body = ApiResponse<VideoFormsetResultDto>),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden")
    ),
    security(("bearer_auth" = [])),
    tag = "videos"
)]
pub async fn save_bulk_edit(
    RequireSiteAdmin(admin): RequireSiteAdmin,
    State(service): State<Arc<VideoService>>,
    AppJson(form): AppJson<VideoFormsetDto>,
) -> Result<FormOutcome<VideoFormsetResultDto>> {
    tracing::debug!("{} saving {} video rows", admin.sub, form.rows.len());
    service.save_formset(form).await
}

/// Edit a single video
///
/// Serves the inline edits of the listings as well as the full edit form:
/// only the fields present are changed.
#[utoipa::path(
    patch,
    path = "/api/admin/videos/{id}",
    params(("id" = Uuid, Path, description = "Video ID")),
    request_body = VideoEditDto,
    responses(
        (status = 200, description = "Video saved, or form errors", body = ApiResponse<VideoResponseDto>),
        (status = 404, description = "Video not found")
    ),
    security(("bearer_auth" = [])),
    tag = "videos"
)]
pub async fn edit_video(
    RequireSiteAdmin(_admin): RequireSiteAdmin,
    State(service): State<Arc<VideoService>>,
    Path(id): Path<Uuid>,
    AppJson(edit): AppJson<VideoEditDto>,
) -> Result<FormOutcome<VideoResponseDto>> {
    service.edit(id, edit).await
}
