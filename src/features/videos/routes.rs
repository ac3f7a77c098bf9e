use crate::features::videos::handlers;
use crate::features::videos::services::VideoService;
use axum::{
    routing::{get, patch, post},
    Router,
};
use std::sync::Arc;

pub fn routes(service: Arc<VideoService>) -> Router {
    Router::new()
        .route("/approve-reject", get(handlers::approve_queue))
        .route("/approve-reject/approve-all", post(handlers::approve_all))
        .route("/approve-reject/reject-all", post(handlers::reject_all))
        .route(
            "/approve-reject/clear-all",
            get(handlers::clear_all_preview).post(handlers::clear_all),
        )
        .route("/videos/{id}", patch(handlers::edit_video))
        .route("/videos/{id}/preview", get(handlers::preview_video))
        .route("/videos/{id}/approve", post(handlers::approve_video))
        .route("/videos/{id}/reject", post(handlers::reject_video))
        .route("/videos/{id}/feature", post(handlers::feature_video))
        .route("/videos/{id}/unfeature", post(handlers::unfeature_video))
        .route(
            "/bulk-edit",
            get(handlers::bulk_edit_listing).post(handlers::save_bulk_edit),
        )
        .with_state(service)
}
