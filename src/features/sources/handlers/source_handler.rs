use std::sync::Arc;

use axum::{
    extract::{Path, State},
    Json,
};
use uuid::Uuid;

use crate::core::error::Result;
use crate::core::extractor::AppJson;
use crate::features::auth::guards::RequireSiteAdmin;
use crate::features::sources::dtos::{
    CreateSavedSearchDto, FeedEditDto, SourceFormsetDto, SourceFormsetResultDto,
    SourceResponseDto,
};
use crate::features::sources::models::SourceId;
use crate::features::sources::services::SourceService;
use crate::shared::query::QueryParams;
use crate::shared::types::{ApiResponse, FormOutcome, Listing};

/// List feeds and saved searches
///
/// Unknown `sort` or `filter` values fall back to the defaults; pages past
/// the end show the last page.
#[utoipa::path(
    get,
    path = "/api/admin/sources",
    params(
        ("sort" = Option<String>, Query, description = "name__lower, type or auto_approve, `-` prefix for descending"),
        ("filter" = Option<String>, Query, description = "feed, user or search"),
        ("q" = Option<String>, Query, description = "Case-insensitive text search"),
        ("page" = Option<String>, Query, description = "Page number")
    ),
    responses(
        (status = 200, description = "Sources", body = ApiResponse<Listing<SourceResponseDto>>),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden")
    ),
    security(("bearer_auth" = [])),
    tag = "sources"
)]
pub async fn list_sources(
    RequireSiteAdmin(_admin): RequireSiteAdmin,
    State(service): State<Arc<SourceService>>,
    params: QueryParams,
) -> Result<Json<ApiResponse<Listing<SourceResponseDto>>>> {
    let listing = service.list(&params).await?;
    Ok(Json(ApiResponse::success(Some(listing), None, None)))
}

/// Save the source formset
#[utoipa::path(
    post,
    path = "/api/admin/sources",
    request_body = SourceFormsetDto,
    responses(
        (status = 200, description = "Formset saved, or per-row errors", body = ApiResponse<SourceFormsetResultDto>),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden")
    ),
    security(("bearer_auth" = [])),
    tag = "sources"
)]
pub async fn save_sources(
    RequireSiteAdmin(admin): RequireSiteAdmin,
    State(service): State<Arc<SourceService>>,
    AppJson(form): AppJson<SourceFormsetDto>,
) -> Result<FormOutcome<SourceFormsetResultDto>> {
    tracing::debug!("{} saving {} source rows", admin.sub, form.rows.len());
    service.save_formset(form).await
}

/// Inline edit of a feed's name, auto categories or auto authors
#[utoipa::path(
    patch,
    path = "/api/admin/feeds/{id}",
    params(("id" = Uuid, Path, description = "Feed ID")),
    request_body = FeedEditDto,
    responses(
        (status = 200, description = "Feed saved, or form errors", body = ApiResponse<SourceResponseDto>),
        (status = 404, description = "Feed not found")
    ),
    security(("bearer_auth" = [])),
    tag = "sources"
)]
pub async fn edit_feed(
    RequireSiteAdmin(_admin): RequireSiteAdmin,
    State(service): State<Arc<SourceService>>,
    Path(id): Path<Uuid>,
    AppJson(edit): AppJson<FeedEditDto>,
) -> Result<FormOutcome<SourceResponseDto>> {
    service.edit_feed(id, edit).await
}

async fn toggle(service: &SourceService, source: SourceId, enabled: bool) -> Result<Json<ApiResponse<()>>> {
    service.set_auto_approve(source, enabled).await?;
    let message = if enabled {
        "Auto approve enabled"
    } else {
        "Auto approve disabled"
    };
    Ok(Json(ApiResponse::success(None, Some(message.to_string()), None)))
}

/// Enable auto approve on a feed
#[utoipa::path(
    post,
    path = "/api/admin/feeds/{id}/auto-approve",
    params(("id" = Uuid, Path, description = "Feed ID")),
    responses(
        (status = 200, description = "Auto approve enabled"),
        (status = 404, description = "Feed not found")
    ),
    security(("bearer_auth" = [])),
    tag = "sources"
)]
pub async fn enable_feed_auto_approve(
    RequireSiteAdmin(_admin): RequireSiteAdmin,
    State(service): State<Arc<SourceService>>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<()>>> {
    toggle(&service, SourceId::Feed(id), true).await
}

/// Disable auto approve on a feed
#[utoipa::path(
    post,
    path = "/api/admin/feeds/{id}/auto-approve/disable",
    params(("id" = Uuid, Path, description = "Feed ID")),
    responses(
        (status = 200, description = "Auto approve disabled"),
        (status = 404, description = "Feed not found")
    ),
    security(("bearer_auth" = [])),
    tag = "sources"
)]
pub async fn disable_feed_auto_approve(
    RequireSiteAdmin(_admin): RequireSiteAdmin,
    State(service): State<Arc<SourceService>>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<()>>> {
    toggle(&service, SourceId::Feed(id), false).await
}

/// Enable auto approve on a saved search
#[utoipa::path(
    post,
    path = "/api/admin/searches/{id}/auto-approve",
    params(("id" = Uuid, Path, description = "Saved search ID")),
    responses(
        (status = 200, description = "Auto approve enabled"),
        (status = 404, description = "Saved search not found")
    ),
    security(("bearer_auth" = [])),
    tag = "sources"
)]
pub async fn enable_search_auto_approve(
    RequireSiteAdmin(_admin): RequireSiteAdmin,
    State(service): State<Arc<SourceService>>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<()>>> {
    toggle(&service, SourceId::Search(id), true).await
}

/// Disable auto approve on a saved search
#[utoipa::path(
    post,
    path = "/api/admin/searches/{id}/auto-approve/disable",
    params(("id" = Uuid, Path, description = "Saved search ID")),
    responses(
        (status = 200, description = "Auto approve disabled"),
        (status = 404, description = "Saved search not found")
    ),
    security(("bearer_auth" = [])),
    tag = "sources"
)]
pub async fn disable_search_auto_approve(
    RequireSiteAdmin(_admin): RequireSiteAdmin,
    State(service): State<Arc<SourceService>>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<()>>> {
    toggle(&service, SourceId::Search(id), false).await
}

/// Add a saved search
#[utoipa::path(
    post,
    path = "/api/admin/searches",
    request_body = CreateSavedSearchDto,
    responses(
        (status = 200, description = "Saved search added, or form errors", body = ApiResponse<SourceResponseDto>),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden")
    ),
    security(("bearer_auth" = [])),
    tag = "sources"
)]
pub async fn create_search(
    RequireSiteAdmin(_admin): RequireSiteAdmin,
    State(service): State<Arc<SourceService>>,
    AppJson(dto): AppJson<CreateSavedSearchDto>,
) -> Result<FormOutcome<SourceResponseDto>> {
    service.create_search(dto).await
}
