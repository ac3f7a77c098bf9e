use crate::features::categories::handlers;
use crate::features::categories::services::CategoryService;
use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;

pub fn routes(service: Arc<CategoryService>) -> Router {
    Router::new()
        .route(
            "/categories",
            get(handlers::list_categories).post(handlers::create_category),
        )
        .route("/categories/bulk", post(handlers::save_categories))
        .with_state(service)
}
