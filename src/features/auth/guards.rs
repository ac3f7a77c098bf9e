//! Authorization guards for admin routes.
//!
//! `auth_middleware` puts an [`AuthenticatedAdmin`] into the request
//! extensions; these extractors check its roles.
//!
//! - superuser: administers every site
//! - site_admin: administers this site's videos, sources and categories

use crate::core::error::AppError;
use crate::features::auth::model::AuthenticatedAdmin;
use axum::{extract::FromRequestParts, http::request::Parts};

fn authenticated(parts: &Parts) -> Result<&AuthenticatedAdmin, AppError> {
    parts
        .extensions
        .get::<AuthenticatedAdmin>()
        .ok_or_else(|| AppError::Unauthorized("User not authenticated".to_string()))
}

/// Allows site admins and superusers.
///
/// ```ignore
/// pub async fn handler(RequireSiteAdmin(admin): RequireSiteAdmin) { ... }
/// ```
pub struct RequireSiteAdmin(pub AuthenticatedAdmin);

impl<S> FromRequestParts<S> for RequireSiteAdmin
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let admin = authenticated(parts)?;

        if !admin.is_site_admin() {
            return Err(AppError::Forbidden("Site admin access required".to_string()));
        }

        Ok(RequireSiteAdmin(admin.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::test_helpers::{with_admin, with_roles};
    use axum::{http::StatusCode, routing::get, Router};
    use axum_test::TestServer;

    async fn site_admin_only(RequireSiteAdmin(admin): RequireSiteAdmin) -> String {
        admin.sub
    }

    fn router() -> Router {
        Router::new().route("/site", get(site_admin_only))
    }

    #[tokio::test]
    async fn test_missing_admin_is_unauthorized() {
        let server = TestServer::new(router()).unwrap();
        server
            .get("/site")
            .await
            .assert_status(StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_site_admin_passes() {
        let server = TestServer::new(with_roles(router(), &["site_admin"])).unwrap();
        server.get("/site").await.assert_text("test-admin");
    }

    #[tokio::test]
    async fn test_superuser_passes() {
        let server = TestServer::new(with_admin(router())).unwrap();
        server.get("/site").await.assert_status_ok();
    }

    #[tokio::test]
    async fn test_unprivileged_user_is_forbidden() {
        let server = TestServer::new(with_roles(router(), &["viewer"])).unwrap();
        server
            .get("/site")
            .await
            .assert_status(StatusCode::FORBIDDEN);
    }
}
