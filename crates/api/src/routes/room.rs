//! Route definitions for the `/rooms` resource.

use axum::routing::{get, put};
use axum::Router;

use crate::handlers::room;
use crate::state::AppState;

/// Routes mounted at `/rooms`.
///
/// Listing needs any authenticated user; mutations require manager or
/// supervisor (enforced by handler extractors).
///
/// ```text
/// GET    /        -> list_rooms
/// POST   /        -> create_room
/// PUT    /{id}    -> update_room
/// DELETE /{id}    -> delete_room
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(room::list_rooms).post(room::create_room))
        .route("/{id}", put(room::update_room).delete(room::delete_room))
}
