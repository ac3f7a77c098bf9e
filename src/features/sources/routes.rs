use crate::features::sources::handlers;
use crate::features::sources::services::SourceService;
use axum::{
    routing::{get, patch, post},
    Router,
};
use std::sync::Arc;

pub fn routes(service: Arc<SourceService>) -> Router {
    Router::new()
        .route(
            "/sources",
            get(handlers::list_sources).post(handlers::save_sources),
        )
        .route("/feeds/{id}", patch(handlers::edit_feed))
        .route(
            "/feeds/{id}/auto-approve",
            post(handlers::enable_feed_auto_approve),
        )
        .route(
            "/feeds/{id}/auto-approve/disable",
            post(handlers::disable_feed_auto_approve),
        )
        .route("/searches", post(handlers::create_search))
        .route(
            "/searches/{id}/auto-approve",
            post(handlers::enable_search_auto_approve),
        )
        .route(
            "/searches/{id}/auto-approve/disable",
            post(handlers::disable_search_auto_approve),
        )
        .with_state(service)
}
