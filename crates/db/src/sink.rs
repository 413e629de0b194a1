//! Store-backed sink for the upload pipeline.

use async_trait::async_trait;
use roomvid_core::upload::{VideoDraft, VideoRecordSink};
use sqlx::PgPool;

use crate::models::video::{CreateVideo, Video};
use crate::repositories::VideoRepo;

/// Records placed uploads as rows in `videos`.
pub struct PgVideoSink<'a> {
    pool: &'a PgPool,
}

impl<'a> PgVideoSink<'a> {
    pub fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl VideoRecordSink for PgVideoSink<'_> {
    type Record = Video;
    type Error = sqlx::Error;

    async fn insert(&self, draft: &VideoDraft) -> Result<Video, sqlx::Error> {
        let input = CreateVideo {
            filename: draft.filename.clone(),
            original_filename: draft.original_filename.clone(),
            file_path: draft.file_path.clone(),
            file_size: draft.file_size,
            duration_secs: None,
            room_id: Some(draft.room_id),
            uploaded_by: draft.uploaded_by,
            upload_date: draft.upload_date,
            metadata: draft.metadata.clone(),
        };
        VideoRepo::create(self.pool, &input).await
    }
}
