//! Route definitions for the `/videos` resource.
//!
//! Split in two because streaming sits outside the bearer-token gate (media
//! elements cannot attach headers); the handler applies the configured
//! access policy itself.

use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post};
use axum::Router;

use crate::handlers::video;
use crate::state::AppState;

/// Authenticated routes, paths relative to `/api`.
///
/// ```text
/// POST   /videos/upload   -> upload_video (body limit: upload_body_limit)
/// GET    /videos          -> list_videos
/// GET    /videos/{id}     -> get_video
/// DELETE /videos/{id}     -> delete_video
/// ```
pub fn router(upload_body_limit: usize) -> Router<AppState> {
    Router::new()
        .route(
            "/videos/upload",
            post(video::upload_video).layer(DefaultBodyLimit::max(upload_body_limit)),
        )
        .route("/videos", get(video::list_videos))
        .route(
            "/videos/{id}",
            get(video::get_video).delete(video::delete_video),
        )
}

/// Streaming routes, paths relative to `/api`.
///
/// ```text
/// GET, HEAD /videos/{id}/stream  -> stream_video
/// OPTIONS   /videos/{id}/stream  -> stream_preflight
/// ```
pub fn stream_router() -> Router<AppState> {
    Router::new().route(
        "/videos/{id}/stream",
        get(video::stream_video).options(video::stream_preflight),
    )
}
