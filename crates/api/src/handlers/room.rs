//! Handlers for the `/rooms` resource.
//!
//! Listing is open to any authenticated caller; mutations require
//! [`RequireManagement`].

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use roomvid_core::error::CoreError;
use roomvid_core::types::DbId;
use roomvid_core::validation::validate_room_number;
use roomvid_db::models::room::{CreateRoom, Room, UpdateRoom};
use roomvid_db::repositories::{RoomRepo, VideoRepo};
use serde::{Deserialize, Serialize};

use crate::error::{AppError, AppResult};
use crate::extract::{JsonBody, PathParam};
use crate::middleware::auth::AuthUser;
use crate::middleware::rbac::RequireManagement;
use crate::response::MessageResponse;
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Request / response types
// ---------------------------------------------------------------------------

/// Request body for `POST /rooms`. New rooms start active.
#[derive(Debug, Deserialize)]
pub struct CreateRoomRequest {
    pub room_number: String,
}

/// Request body for `PUT /rooms/{id}`: the full replacement record.
#[derive(Debug, Deserialize)]
pub struct UpdateRoomRequest {
    pub room_number: String,
    pub is_active: bool,
}

#[derive(Debug, Serialize)]
pub struct RoomListResponse {
    pub rooms: Vec<Room>,
}

#[derive(Debug, Serialize)]
pub struct RoomMutationResponse {
    pub message: &'static str,
    pub room: Room,
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// GET /api/rooms
pub async fn list_rooms(
    State(state): State<AppState>,
    _user: AuthUser,
) -> AppResult<Json<RoomListResponse>> {
    let rooms = RoomRepo::list(&state.pool).await?;
    Ok(Json(RoomListResponse { rooms }))
}

/// POST /api/rooms
pub async fn create_room(
    State(state): State<AppState>,
    RequireManagement(admin): RequireManagement,
    JsonBody(input): JsonBody<CreateRoomRequest>,
) -> AppResult<(StatusCode, Json<RoomMutationResponse>)> {
    let room_number = checked_room_number(&state, &input.room_number, None).await?;

    let room = RoomRepo::create(&state.pool, &CreateRoom { room_number }).await?;
    tracing::info!(room_id = room.id, room_number = %room.room_number, by = admin.user_id, "Room created");

    Ok((
        StatusCode::CREATED,
        Json(RoomMutationResponse {
            message: "Room created successfully",
            room,
        }),
    ))
}

/// PUT /api/rooms/{id}
///
/// Replaces the room number and the active flag.
pub async fn update_room(
    State(state): State<AppState>,
    RequireManagement(admin): RequireManagement,
    PathParam(id): PathParam<DbId>,
    JsonBody(input): JsonBody<UpdateRoomRequest>,
) -> AppResult<Json<RoomMutationResponse>> {
    find_room(&state, id).await?;
    let room_number = checked_room_number(&state, &input.room_number, Some(id)).await?;

    let update = UpdateRoom {
        room_number,
        is_active: input.is_active,
    };
    let room = RoomRepo::replace(&state.pool, id, &update)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound { entity: "Room", id }))?;
    tracing::info!(room_id = id, by = admin.user_id, "Room updated");

    Ok(Json(RoomMutationResponse {
        message: "Room updated successfully",
        room,
    }))
}

/// DELETE /api/rooms/{id}
///
/// Soft delete; refused while any live video is filed under the room.
pub async fn delete_room(
    State(state): State<AppState>,
    RequireManagement(admin): RequireManagement,
    PathParam(id): PathParam<DbId>,
) -> AppResult<Json<MessageResponse>> {
    find_room(&state, id).await?;

    let videos = VideoRepo::count_by_room(&state.pool, id).await?;
    if videos > 0 {
        return Err(AppError::Core(CoreError::HasDependents(format!(
            "Cannot delete room with existing videos ({videos})"
        ))));
    }

    if !RoomRepo::soft_delete(&state.pool, id).await? {
        return Err(AppError::Core(CoreError::NotFound { entity: "Room", id }));
    }
    tracing::info!(room_id = id, by = admin.user_id, "Room deleted");

    Ok(Json(MessageResponse::new("Room deleted successfully")))
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

async fn find_room(state: &AppState, id: DbId) -> AppResult<Room> {
    RoomRepo::find_by_id(&state.pool, id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound { entity: "Room", id }))
}

/// Trim and validate a room number, then make sure no other live room uses it.
async fn checked_room_number(
    state: &AppState,
    raw: &str,
    exclude_id: Option<DbId>,
) -> AppResult<String> {
    let room_number = raw.trim().to_string();
    validate_room_number(&room_number)?;

    if RoomRepo::exists_room_number(&state.pool, &room_number, exclude_id).await? {
        return Err(AppError::Core(CoreError::Conflict(
            "Room number already exists".into(),
        )));
    }
    Ok(room_number)
}
