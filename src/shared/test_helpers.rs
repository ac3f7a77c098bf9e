use crate::features::auth::model::AuthenticatedAdmin;
use axum::{extract::Request, middleware::Next, response::Response, Router};

pub fn admin_with_roles(roles: &[&str]) -> AuthenticatedAdmin {
    AuthenticatedAdmin {
        sub: "test-admin".to_string(),
        username: Some("tester".to_string()),
        roles: roles.iter().map(|r| r.to_string()).collect(),
    }
}

/// Inject an authenticated admin, standing in for `auth_middleware`.
pub fn with_roles(router: Router, roles: &[&str]) -> Router {
    let admin = admin_with_roles(roles);
    router.layer(axum::middleware::from_fn(
        move |mut request: Request, next: Next| {
            let admin = admin.clone();
            async move {
                request.extensions_mut().insert(admin);
                let response: Response = next.run(request).await;
                response
            }
        },
    ))
}

pub fn with_admin(router: Router) -> Router {
    with_roles(router, &["superuser"])
}
