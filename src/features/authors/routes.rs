use crate::features::authors::handlers;
use crate::features::authors::services::AuthorService;
use axum::{routing::get, Router};
use std::sync::Arc;

pub fn routes(service: Arc<AuthorService>) -> Router {
    Router::new()
        .route(
            "/authors",
            get(handlers::list_authors).post(handlers::create_author),
        )
        .with_state(service)
}
