//! Route definitions for LFG domain API

use axum::{
    routing::{get, post},
    Router,
};

use super::handlers;
use super::middleware::LfgState;

/// Create all LFG domain routes
pub fn routes() -> Router<LfgState> {
    Router::new()
        .route(
            "/v1/lfg",
            get(handlers::list_posts).post(handlers::create_post),
        )
        .route("/v1/lfg/{post_id}", get(handlers::get_post))
        .route("/v1/lfg/{post_id}/close", post(handlers::close_post))
}
