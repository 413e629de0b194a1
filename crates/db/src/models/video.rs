//! Video entity model, DTOs and the enriched view returned by the API.

use roomvid_core::types::{DbId, Timestamp};
use serde::Serialize;
use sqlx::FromRow;

use crate::models::room::Room;
use crate::models::user::UserResponse;

/// A video row from the `videos` table.
///
/// Immutable after creation apart from soft deletion.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Video {
    pub id: DbId,
    pub filename: String,
    pub original_filename: String,
    pub file_path: String,
    pub file_size: i64,
    pub duration_secs: Option<i32>,
    pub room_id: Option<DbId>,
    pub uploaded_by: DbId,
    pub upload_date: Timestamp,
    pub metadata: serde_json::Value,
    #[serde(skip_serializing)]
    pub deleted_at: Option<Timestamp>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl Video {
    /// Content type captured at upload time, if any.
    pub fn content_type(&self) -> Option<&str> {
        self.metadata
            .get("content_type")
            .and_then(|v| v.as_str())
            .filter(|s| !s.is_empty())
    }
}

#[derive(Debug, Clone)]
pub struct CreateVideo {
    pub filename: String,
    pub original_filename: String,
    pub file_path: String,
    pub file_size: i64,
    pub duration_secs: Option<i32>,
    pub room_id: Option<DbId>,
    pub uploaded_by: DbId,
    pub upload_date: Timestamp,
    pub metadata: serde_json::Value,
}

/// A video with its room and uploader resolved.
#[derive(Debug, Clone, Serialize)]
pub struct VideoDetail {
    #[serde(flatten)]
    pub video: Video,
    pub room: Option<Room>,
    pub user: Option<UserResponse>,
}

/// Optional narrowing for video list queries.
#[derive(Debug, Clone, Copy, Default)]
pub struct VideoFilter {
    pub uploaded_by: Option<DbId>,
}
