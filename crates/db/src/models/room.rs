//! Room entity model and DTOs.

use roomvid_core::types::{DbId, Timestamp};
use serde::Serialize;
use sqlx::FromRow;

/// A room row from the `rooms` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Room {
    pub id: DbId,
    pub room_number: String,
    pub is_active: bool,
    #[serde(skip_serializing)]
    pub deleted_at: Option<Timestamp>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

#[derive(Debug, Clone)]
pub struct CreateRoom {
    pub room_number: String,
}

#[derive(Debug, Clone)]
pub struct UpdateRoom {
    pub room_number: String,
    pub is_active: bool,
}
