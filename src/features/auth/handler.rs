use axum::Json;

use super::dto::MeResponseDto;
use super::guards::RequireSiteAdmin;
use crate::core::error::Result;
use crate::shared::types::ApiResponse;

/// Get the current administrator
#[utoipa::path(
    get,
    path = "/api/auth/me",
    responses(
        (status = 200, description = "Current administrator", body = ApiResponse<MeResponseDto>),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Not a site admin")
    ),
    security(("bearer_auth" = [])),
    tag = "auth"
)]
pub async fn get_me(
    RequireSiteAdmin(admin): RequireSiteAdmin,
) -> Result<Json<ApiResponse<MeResponseDto>>> {
    Ok(Json(ApiResponse::success(
        Some(MeResponseDto::from(admin)),
        None,
        None,
    )))
}
