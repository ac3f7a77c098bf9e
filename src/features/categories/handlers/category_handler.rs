use std::sync::Arc;

use axum::{extract::State, Json};

use crate::core::error::Result;
use crate::core::extractor::AppJson;
use crate::features::auth::guards::RequireSiteAdmin;
use crate::features::categories::dtos::{
    CategoryFormsetDto, CategoryFormsetResultDto, CategoryListDto, CategoryResponseDto,
    CreateCategoryDto,
};
use crate::features::categories::services::CategoryService;
use crate::shared::types::{ApiResponse, FormOutcome};

/// List categories
///
/// Returns every category ordered by name, and the same categories as a tree.
#[utoipa::path(
    get,
    path = "/api/admin/categories",
    responses(
        (status = 200, description = "Categories", body = ApiResponse<CategoryListDto>),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden")
    ),
    security(("bearer_auth" = [])),
    tag = "categories"
)]
pub async fn list_categories(
    RequireSiteAdmin(_admin): RequireSiteAdmin,
    State(service): State<Arc<CategoryService>>,
) -> Result<Json<ApiResponse<CategoryListDto>>> {
    let categories = service.list().await?;
    Ok(Json(ApiResponse::success(Some(categories), None, None)))
}

/// Add a category
///
/// Invalid input answers 200 with `success: false` and per-field errors.
#[utoipa::path(
    post,
    path = "/api/admin/categories",
    request_body = CreateCategoryDto,
    responses(
        (status = 200, description = "Category created, or form errors", body = ApiResponse<CategoryResponseDto>),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden")
    ),
    security(("bearer_auth" = [])),
    tag = "categories"
)]
pub async fn create_category(
    RequireSiteAdmin(admin): RequireSiteAdmin,
    State(service): State<Arc<CategoryService>>,
    AppJson(dto): AppJson<CreateCategoryDto>,
) -> Result<FormOutcome<CategoryResponseDto>> {
    tracing::debug!("{} adding category {:?}", admin.sub, dto.name);
    service.create(dto).await
}

/// Save the category formset
///
/// Edits, deletions and parent reassignments are validated together against
/// the resulting tree. Any error (including a parent cycle) persists nothing.
#[utoipa::path(
    post,
    path = "/api/admin/categories/bulk",
    request_body = CategoryFormsetDto,
    responses(
        (status = 200, description = "Formset saved, or per-row errors", body = ApiResponse<CategoryFormsetResultDto>),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden")
    ),
    security(("bearer_auth" = [])),
    tag = "categories"
)]
pub async fn save_categories(
    RequireSiteAdmin(_admin): RequireSiteAdmin,
    State(service): State<Arc<CategoryService>>,
    AppJson(form): AppJson<CategoryFormsetDto>,
) -> Result<FormOutcome<CategoryFormsetResultDto>> {
    service.save_formset(form).await
}
