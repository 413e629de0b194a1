//! Repository for the `rooms` table.

use roomvid_core::types::DbId;
use sqlx::PgPool;

use crate::models::room::{CreateRoom, Room, UpdateRoom};

/// Column list shared across queries to avoid repetition.
const COLUMNS: &str = "id, room_number, is_active, deleted_at, created_at, updated_at";

/// Provides CRUD operations for rooms.
pub struct RoomRepo;

impl RoomRepo {
    /// Insert a new room, returning the created row.
    pub async fn create(pool: &PgPool, input: &CreateRoom) -> Result<Room, sqlx::Error> {
        let query = format!(
            "INSERT INTO rooms (room_number)
             VALUES ($1)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Room>(&query)
            .bind(&input.room_number)
            .fetch_one(pool)
            .await
    }

    /// Find a room by its internal ID. Excludes soft-deleted rows.
    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<Room>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM rooms WHERE id = $1 AND deleted_at IS NULL");
        sqlx::query_as::<_, Room>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// List all rooms ordered by room number. Excludes soft-deleted rows.
    pub async fn list(pool: &PgPool) -> Result<Vec<Room>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM rooms WHERE deleted_at IS NULL ORDER BY room_number, id"
        );
        sqlx::query_as::<_, Room>(&query).fetch_all(pool).await
    }

    /// Fetch rooms by ID, including soft-deleted rows.
    pub async fn find_many_include_deleted(
        pool: &PgPool,
        ids: &[DbId],
    ) -> Result<Vec<Room>, sqlx::Error> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let query = format!("SELECT {COLUMNS} FROM rooms WHERE id = ANY($1)");
        sqlx::query_as::<_, Room>(&query)
            .bind(ids)
            .fetch_all(pool)
            .await
    }

    /// Whether a live room other than `exclude_id` already uses `room_number`.
    pub async fn exists_room_number(
        pool: &PgPool,
        room_number: &str,
        exclude_id: Option<DbId>,
    ) -> Result<bool, sqlx::Error> {
        sqlx::query_scalar(
            "SELECT EXISTS(
                SELECT 1 FROM rooms
                WHERE room_number = $1 AND deleted_at IS NULL
                  AND ($2::BIGINT IS NULL OR id <> $2)
             )",
        )
        .bind(room_number)
        .bind(exclude_id)
        .fetch_one(pool)
        .await
    }

    /// Replace a room's mutable fields.
    ///
    /// Returns `None` if no live row with the given `id` exists.
    pub async fn replace(
        pool: &PgPool,
        id: DbId,
        input: &UpdateRoom,
    ) -> Result<Option<Room>, sqlx::Error> {
        let query = format!(
            "UPDATE rooms SET
                room_number = $2,
                is_active = $3
             WHERE id = $1 AND deleted_at IS NULL
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Room>(&query)
            .bind(id)
            .bind(&input.room_number)
            .bind(input.is_active)
            .fetch_optional(pool)
            .await
    }

    /// Soft-delete a room by ID. Returns `true` if a row was marked deleted.
    pub async fn soft_delete(pool: &PgPool, id: DbId) -> Result<bool, sqlx::Error> {
        let result =
            sqlx::query("UPDATE rooms SET deleted_at = NOW() WHERE id = $1 AND deleted_at IS NULL")
                .bind(id)
                .execute(pool)
                .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Count every row, soft-deleted ones included.
    pub async fn count_all(pool: &PgPool) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar("SELECT COUNT(*) FROM rooms")
            .fetch_one(pool)
            .await
    }
}
