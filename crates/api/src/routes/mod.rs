pub mod auth;
pub mod health;
pub mod room;
pub mod user;
pub mod video;

use axum::middleware;
use axum::Router;

use crate::middleware::auth::require_bearer;
use crate::state::AppState;

/// Build the `/api` route tree.
///
/// ```text
/// /auth/login                  login (public)
/// /auth/logout                 logout (public, no-op)
///
/// /videos/{id}/stream          stream, pre-flight (public unless the
///                              access policy requires a token)
///
/// /videos/upload               upload (bearer)
/// /videos                      list (bearer)
/// /videos/{id}                 detail, delete (bearer; delete is owner or
///                              manager/supervisor)
///
/// /rooms                       list (bearer), create (manager/supervisor)
/// /rooms/{id}                  update, delete (manager/supervisor)
///
/// /users                       list, create (manager/supervisor)
/// /users/{id}                  get, update, delete (manager/supervisor)
/// ```
pub fn api_routes(state: &AppState) -> Router<AppState> {
    let protected = Router::new()
        .merge(video::router(state.config.upload.body_limit()))
        .nest("/rooms", room::router())
        .nest("/users", user::router())
        .route_layer(middleware::from_fn_with_state(state.clone(), require_bearer));

    Router::new()
        .nest("/auth", auth::router())
        .merge(video::stream_router())
        .merge(protected)
}
