use crate::features::feeds::handlers;
use crate::features::feeds::services::FeedService;
use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;

pub fn routes(service: Arc<FeedService>) -> Router {
    Router::new()
        .route("/feeds", post(handlers::register_feed))
        .route("/import-jobs/{id}", get(handlers::get_import_job))
        .with_state(service)
}
