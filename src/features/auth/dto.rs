use serde::Serialize;
use utoipa::ToSchema;

use super::model::AuthenticatedAdmin;

#[derive(Debug, Serialize, ToSchema)]
pub struct MeResponseDto {
    pub sub: String,
    pub username: Option<String>,
    pub roles: Vec<String>,
    pub is_superuser: bool,
}

impl From<AuthenticatedAdmin> for MeResponseDto {
    fn from(admin: AuthenticatedAdmin) -> Self {
        Self {
            is_superuser: admin.is_superuser(),
            sub: admin.sub,
            username: admin.username,
            roles: admin.roles,
        }
    }
}
