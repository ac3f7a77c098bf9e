use super::handler;
use axum::{routing::get, Router};

pub fn routes() -> Router {
    Router::new().route("/api/auth/me", get(handler::get_me))
}
