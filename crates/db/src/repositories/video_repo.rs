//! Repository for the `videos` table.

use roomvid_core::types::DbId;
use sqlx::PgPool;

use crate::models::video::{CreateVideo, Video, VideoFilter};

/// Column list shared across queries to avoid repetition.
const COLUMNS: &str = "id, filename, original_filename, file_path, file_size, duration_secs, \
                       room_id, uploaded_by, upload_date, metadata, deleted_at, created_at, \
                       updated_at";

/// Provides create, read and soft-delete operations for videos.
pub struct VideoRepo;

impl VideoRepo {
    /// Insert a new video, returning the created row.
    pub async fn create(pool: &PgPool, input: &CreateVideo) -> Result<Video, sqlx::Error> {
        let query = format!(
            "INSERT INTO videos
                (filename, original_filename, file_path, file_size, duration_secs,
                 room_id, uploaded_by, upload_date, metadata)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Video>(&query)
            .bind(&input.filename)
            .bind(&input.original_filename)
            .bind(&input.file_path)
            .bind(input.file_size)
            .bind(input.duration_secs)
            .bind(input.room_id)
            .bind(input.uploaded_by)
            .bind(input.upload_date)
            .bind(&input.metadata)
            .fetch_one(pool)
            .await
    }

    /// Find a video by ID. Excludes soft-deleted rows.
    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<Video>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM videos WHERE id = $1 AND deleted_at IS NULL");
        sqlx::query_as::<_, Video>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// List videos, newest upload first. Excludes soft-deleted rows.
    pub async fn list(pool: &PgPool, filter: VideoFilter) -> Result<Vec<Video>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM videos
             WHERE deleted_at IS NULL
               AND ($1::BIGINT IS NULL OR uploaded_by = $1)
             ORDER BY upload_date DESC, id DESC"
        );
        sqlx::query_as::<_, Video>(&query)
            .bind(filter.uploaded_by)
            .fetch_all(pool)
            .await
    }

    /// Find a video the caller is allowed to delete.
    ///
    /// Ownership is part of the predicate: unless `elevated`, only the
    /// uploader's own row matches, so a foreign video looks exactly like a
    /// missing one.
    pub async fn find_deletable(
        pool: &PgPool,
        id: DbId,
        caller_id: DbId,
        elevated: bool,
    ) -> Result<Option<Video>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM videos
             WHERE id = $1 AND deleted_at IS NULL
               AND ($3 OR uploaded_by = $2)"
        );
        sqlx::query_as::<_, Video>(&query)
            .bind(id)
            .bind(caller_id)
            .bind(elevated)
            .fetch_optional(pool)
            .await
    }

    /// Soft-delete a video by ID. Returns `true` if a row was marked deleted.
    pub async fn soft_delete(pool: &PgPool, id: DbId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE videos SET deleted_at = NOW() WHERE id = $1 AND deleted_at IS NULL",
        )
        .bind(id)
        .execute(pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Number of live videos filed under a room.
    pub async fn count_by_room(pool: &PgPool, room_id: DbId) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar(
            "SELECT COUNT(*) FROM videos WHERE room_id = $1 AND deleted_at IS NULL",
        )
        .bind(room_id)
        .fetch_one(pool)
        .await
    }

    /// Number of live videos uploaded by a user.
    pub async fn count_by_uploader(pool: &PgPool, user_id: DbId) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar(
            "SELECT COUNT(*) FROM videos WHERE uploaded_by = $1 AND deleted_at IS NULL",
        )
        .bind(user_id)
        .fetch_one(pool)
        .await
    }
}
