//! Handlers for the `/videos` resource: upload, listing, detail, deletion
//! and byte-range streaming.

use std::collections::HashMap;
use std::path::Path as FsPath;

use axum::body::Body;
use axum::extract::multipart::MultipartError;
use axum::extract::multipart::MultipartRejection;
use axum::extract::{Multipart, State};
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::Response;
use axum::Json;
use chrono::Utc;
use roomvid_core::error::CoreError;
use roomvid_core::naming::content_type_for_extension;
use roomvid_core::types::DbId;
use roomvid_core::upload::{remove_file_best_effort, StagedUpload, UploadTarget};
use roomvid_db::models::room::Room;
use roomvid_db::models::user::UserResponse;
use roomvid_db::models::video::{Video, VideoDetail, VideoFilter};
use roomvid_db::repositories::{RoomRepo, UserRepo, VideoRepo};
use roomvid_db::sink::PgVideoSink;
use serde::{Deserialize, Serialize};
use tokio::io::{AsyncReadExt, AsyncSeekExt};
use tokio_util::io::ReaderStream;

use crate::error::{AppError, AppResult};
use crate::extract::{PathParam, QueryParams};
use crate::middleware::auth::{bearer_token, decode_user, AuthUser};
use crate::response::MessageResponse;
use crate::state::AppState;

/// Largest slice served for an open-ended `bytes=N-` request.
const MAX_CHUNK_SIZE: u64 = 1024 * 1024;

/// Multipart field carrying the video file.
const VIDEO_FIELD: &str = "video";
/// Multipart field carrying the target room id.
const ROOM_FIELD: &str = "room_id";

const CORS_ALLOW_METHODS: &str = "GET, HEAD, OPTIONS";
const CORS_ALLOW_HEADERS: &str = "Range, Content-Range, Accept-Ranges, Authorization";
const CORS_EXPOSE_HEADERS: &str = "Content-Length, Content-Range, Accept-Ranges, Content-Type";

// ---------------------------------------------------------------------------
// Request / response types
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
pub struct UploadResponse {
    pub message: &'static str,
    pub video: UploadedVideo,
}

/// Summary of a freshly stored video.
#[derive(Debug, Serialize)]
pub struct UploadedVideo {
    pub id: DbId,
    pub filename: String,
    pub size: i64,
    pub room: String,
}

#[derive(Debug, Serialize)]
pub struct VideoListResponse {
    pub videos: Vec<VideoDetail>,
}

#[derive(Debug, Serialize)]
pub struct VideoEnvelope {
    pub video: VideoDetail,
}

/// Query parameters for `GET /videos/{id}/stream`.
#[derive(Debug, Deserialize)]
pub struct StreamParams {
    /// Access token for media elements that cannot send headers.
    pub token: Option<String>,
}

// ---------------------------------------------------------------------------
// Upload
// ---------------------------------------------------------------------------

/// POST /api/videos/upload
///
/// Multipart body with a `video` file part and a `room_id` text field, in
/// either order. The file is streamed to a staging area, moved under
/// `{upload_dir}/{YYYY}/{MM}/room_{number}/` and then recorded. Any failure
/// after bytes hit the disk removes the file again. Callers whose account
/// was deactivated or deleted after the token was issued get 401.
pub async fn upload_video(
    State(state): State<AppState>,
    user: AuthUser,
    multipart: Result<Multipart, MultipartRejection>,
) -> AppResult<(StatusCode, Json<UploadResponse>)> {
    let mut multipart = multipart?;
    ensure_active_uploader(&state, &user).await?;
    let upload = &state.config.upload;
    let mut room: Option<Room> = None;
    let mut staged: Option<StagedUpload> = None;

    while let Some(mut field) = multipart.next_field().await.map_err(multipart_error)? {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            ROOM_FIELD => {
                let raw = field.text().await.map_err(multipart_error)?;
                room = Some(resolve_room(&state, &raw).await?);
            }
            VIDEO_FIELD => {
                let original = match field.file_name() {
                    Some(f) if !f.trim().is_empty() => f.to_string(),
                    // A file input submitted with nothing selected.
                    _ => continue,
                };
                if staged.is_some() {
                    return Err(AppError::BadRequest(
                        "Only one video file may be uploaded per request".into(),
                    ));
                }
                let content_type = field.content_type().map(str::to_string);

                let mut file = StagedUpload::begin(
                    &upload.dir,
                    &original,
                    content_type.as_deref(),
                    upload.max_file_size,
                )
                .await?;
                while let Some(chunk) = field.chunk().await.map_err(multipart_error)? {
                    file.write_chunk(&chunk).await?;
                }
                staged = Some(file);
            }
            other => {
                tracing::debug!(field = other, "Ignoring unexpected multipart field");
            }
        }
    }

    let Some(mut file) = staged else {
        return Err(AppError::Core(CoreError::Validation(
            "No video file provided".into(),
        )));
    };
    let Some(room) = room else {
        file.discard().await;
        return Err(AppError::BadRequest("Room ID is required".into()));
    };

    let target = UploadTarget {
        room_id: room.id,
        room_number: room.room_number.clone(),
    };
    file.place(&upload.dir, target, Utc::now()).await?;

    let video = file
        .commit(&PgVideoSink::new(&state.pool), user.user_id)
        .await?;

    tracing::info!(
        video_id = video.id,
        room_id = room.id,
        user_id = user.user_id,
        size = video.file_size,
        path = %video.file_path,
        "Video uploaded"
    );

    Ok((
        StatusCode::CREATED,
        Json(UploadResponse {
            message: "Video uploaded successfully",
            video: UploadedVideo {
                id: video.id,
                filename: video.filename,
                size: video.file_size,
                room: room.room_number,
            },
        }),
    ))
}

/// A token outlives its account, so the uploader is checked against the
/// store before any byte is written.
async fn ensure_active_uploader(state: &AppState, user: &AuthUser) -> AppResult<()> {
    match UserRepo::find_by_id(&state.pool, user.user_id).await? {
        Some(account) if account.is_active => Ok(()),
        _ => Err(AppError::Core(CoreError::Unauthorized(
            "Account is inactive or no longer exists".into(),
        ))),
    }
}

/// Parse the `room_id` field and load the live room it names.
async fn resolve_room(state: &AppState, raw: &str) -> AppResult<Room> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Err(AppError::BadRequest("Room ID is required".into()));
    }
    let id: DbId = raw
        .parse()
        .map_err(|_| AppError::BadRequest(format!("Invalid room ID '{raw}'")))?;

    let room = RoomRepo::find_by_id(&state.pool, id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound { entity: "Room", id }))?;
    if !room.is_active {
        return Err(AppError::Core(CoreError::Validation(format!(
            "Room {} is not accepting uploads",
            room.room_number
        ))));
    }
    Ok(room)
}

fn multipart_error(err: MultipartError) -> AppError {
    if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        return AppError::Core(CoreError::Validation(
            "File too large: request exceeds the upload size limit".into(),
        ));
    }
    AppError::BadRequest(format!("Invalid multipart body: {}", err.body_text()))
}

// ---------------------------------------------------------------------------
// Listing / detail
// ---------------------------------------------------------------------------

/// GET /api/videos
///
/// Newest first, each item carrying its room and uploader.
pub async fn list_videos(
    State(state): State<AppState>,
    user: AuthUser,
) -> AppResult<Json<VideoListResponse>> {
    let filter = VideoFilter {
        uploaded_by: state
            .config
            .access
            .uploader_filter(user.user_id, user.role),
    };
    let videos = VideoRepo::list(&state.pool, filter).await?;
    let videos = enrich_videos(&state, videos).await?;
    Ok(Json(VideoListResponse { videos }))
}

/// GET /api/videos/{id}
pub async fn get_video(
    State(state): State<AppState>,
    user: AuthUser,
    PathParam(id): PathParam<DbId>,
) -> AppResult<Json<VideoEnvelope>> {
    let not_found = || AppError::Core(CoreError::NotFound { entity: "Video", id });

    let video = VideoRepo::find_by_id(&state.pool, id)
        .await?
        .ok_or_else(not_found)?;
    if let Some(owner) = state
        .config
        .access
        .uploader_filter(user.user_id, user.role)
    {
        if video.uploaded_by != owner {
            return Err(not_found());
        }
    }

    let video = enrich_videos(&state, vec![video])
        .await?
        .pop()
        .ok_or_else(not_found)?;
    Ok(Json(VideoEnvelope { video }))
}

/// Attach rooms and uploaders with one batched lookup per table.
///
/// Soft-deleted rooms and users are still resolved so older videos keep
/// their history.
async fn enrich_videos(state: &AppState, videos: Vec<Video>) -> AppResult<Vec<VideoDetail>> {
    let mut room_ids: Vec<DbId> = videos.iter().filter_map(|v| v.room_id).collect();
    room_ids.sort_unstable();
    room_ids.dedup();
    let mut user_ids: Vec<DbId> = videos.iter().map(|v| v.uploaded_by).collect();
    user_ids.sort_unstable();
    user_ids.dedup();

    let rooms: HashMap<DbId, Room> = RoomRepo::find_many_include_deleted(&state.pool, &room_ids)
        .await?
        .into_iter()
        .map(|r| (r.id, r))
        .collect();
    let users: HashMap<DbId, UserResponse> =
        UserRepo::find_many_include_deleted(&state.pool, &user_ids)
            .await?
            .iter()
            .map(|u| (u.id, UserResponse::from(u)))
            .collect();

    Ok(videos
        .into_iter()
        .map(|video| VideoDetail {
            room: video.room_id.and_then(|id| rooms.get(&id).cloned()),
            user: users.get(&video.uploaded_by).cloned(),
            video,
        })
        .collect())
}

// ---------------------------------------------------------------------------
// Deletion
// ---------------------------------------------------------------------------

/// DELETE /api/videos/{id}
///
/// Uploaders may delete their own videos; managers and supervisors may delete
/// any. A video the caller may not delete is reported as missing.
pub async fn delete_video(
    State(state): State<AppState>,
    user: AuthUser,
    PathParam(id): PathParam<DbId>,
) -> AppResult<Json<MessageResponse>> {
    let video = VideoRepo::find_deletable(&state.pool, id, user.user_id, user.role.is_elevated())
        .await?
        .ok_or(AppError::Core(CoreError::NotFound { entity: "Video", id }))?;

    remove_file_best_effort(FsPath::new(&video.file_path)).await;

    if !VideoRepo::soft_delete(&state.pool, id).await? {
        return Err(AppError::Core(CoreError::NotFound { entity: "Video", id }));
    }
    tracing::info!(video_id = id, user_id = user.user_id, path = %video.file_path, "Video deleted");

    Ok(Json(MessageResponse::new("Video deleted successfully")))
}

// ---------------------------------------------------------------------------
// Streaming
// ---------------------------------------------------------------------------

/// A parsed single `Range: bytes=...` specifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ByteRange {
    /// `bytes=a-b`
    Bounded(u64, u64),
    /// `bytes=a-`
    From(u64),
    /// `bytes=-n`, the last `n` bytes.
    Suffix(u64),
}

/// Parse a `Range` header value.
///
/// Returns `None` for anything other than a single well-formed byte range;
/// such headers are ignored and the full file is served.
fn parse_range_header(range: &str) -> Option<ByteRange> {
    let ranges = range.trim().strip_prefix("bytes=")?.trim();
    if ranges.contains(',') {
        return None;
    }
    let (start, end) = ranges.split_once('-')?;
    let (start, end) = (start.trim(), end.trim());

    match (start.is_empty(), end.is_empty()) {
        (true, true) => None,
        (true, false) => end.parse().ok().map(ByteRange::Suffix),
        (false, true) => start.parse().ok().map(ByteRange::From),
        (false, false) => {
            let start: u64 = start.parse().ok()?;
            let end: u64 = end.parse().ok()?;
            Some(ByteRange::Bounded(start, end))
        }
    }
}

/// Resolve a range against the file size into inclusive `(start, end)`
/// offsets, or `None` if it cannot be satisfied.
fn resolve_range(range: ByteRange, file_size: u64) -> Option<(u64, u64)> {
    if file_size == 0 {
        return None;
    }
    let last = file_size - 1;
    let (start, end) = match range {
        ByteRange::Bounded(start, end) => (start, end.min(last)),
        ByteRange::From(start) => (start, start.saturating_add(MAX_CHUNK_SIZE - 1).min(last)),
        ByteRange::Suffix(0) => return None,
        ByteRange::Suffix(n) => (file_size.saturating_sub(n), last),
    };
    if start > last || start > end {
        return None;
    }
    Some((start, end))
}

/// Headers every stream response carries so browser players can seek
/// cross-origin.
fn stream_headers(builder: axum::http::response::Builder) -> axum::http::response::Builder {
    builder
        .header(header::ACCEPT_RANGES, "bytes")
        .header(header::CACHE_CONTROL, "no-cache")
        .header(header::ACCESS_CONTROL_ALLOW_ORIGIN, "*")
        .header(header::ACCESS_CONTROL_ALLOW_METHODS, CORS_ALLOW_METHODS)
        .header(header::ACCESS_CONTROL_ALLOW_HEADERS, CORS_ALLOW_HEADERS)
        .header(header::ACCESS_CONTROL_EXPOSE_HEADERS, CORS_EXPOSE_HEADERS)
}

fn build_response(
    builder: axum::http::response::Builder,
    body: Body,
) -> AppResult<Response> {
    builder
        .body(body)
        .map_err(|e| AppError::InternalError(format!("Failed to build response: {e}")))
}

/// When the access policy demands it, require a token from the
/// `Authorization` header or the `token` query parameter.
fn authorize_stream(
    state: &AppState,
    headers: &HeaderMap,
    params: &StreamParams,
) -> AppResult<()> {
    if !state.config.access.stream_requires_auth {
        return Ok(());
    }
    let token = match params.token.as_deref().filter(|t| !t.is_empty()) {
        Some(token) => token,
        None => bearer_token(headers)?,
    };
    decode_user(token, &state.config.jwt)?;
    Ok(())
}

/// GET /api/videos/{id}/stream
///
/// Serves the stored file, honouring a single `Range` request. A missing row
/// is `NOT_FOUND`; a row whose file has vanished is `FILE_MISSING`.
pub async fn stream_video(
    State(state): State<AppState>,
    PathParam(id): PathParam<DbId>,
    QueryParams(params): QueryParams<StreamParams>,
    headers: HeaderMap,
) -> AppResult<Response> {
    authorize_stream(&state, &headers, &params)?;

    let video = VideoRepo::find_by_id(&state.pool, id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound { entity: "Video", id }))?;
    let path = FsPath::new(&video.file_path);

    let metadata = match tokio::fs::metadata(path).await {
        Ok(m) if m.is_file() => m,
        Ok(_) => return Err(AppError::Core(CoreError::FileMissing { id })),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            tracing::warn!(video_id = id, path = %video.file_path, "Video file missing from storage");
            return Err(AppError::Core(CoreError::FileMissing { id }));
        }
        Err(e) => return Err(AppError::InternalError(e.to_string())),
    };
    let file_size = metadata.len();
    let content_type = video
        .content_type()
        .unwrap_or_else(|| content_type_for_extension(&video.file_path))
        .to_string();

    let range = match headers.get(header::RANGE) {
        Some(value) => {
            let range_str = value
                .to_str()
                .map_err(|_| AppError::BadRequest("Invalid Range header".into()))?;
            parse_range_header(range_str)
        }
        None => None,
    };

    if let Some(range) = range {
        let Some((start, end)) = resolve_range(range, file_size) else {
            return build_response(
                stream_headers(Response::builder())
                    .status(StatusCode::RANGE_NOT_SATISFIABLE)
                    .header(header::CONTENT_RANGE, format!("bytes */{file_size}")),
                Body::empty(),
            );
        };

        let length = end - start + 1;
        let mut file = tokio::fs::File::open(path)
            .await
            .map_err(|e| AppError::InternalError(e.to_string()))?;
        file.seek(std::io::SeekFrom::Start(start))
            .await
            .map_err(|e| AppError::InternalError(e.to_string()))?;
        let stream = ReaderStream::new(file.take(length));

        return build_response(
            stream_headers(Response::builder())
                .status(StatusCode::PARTIAL_CONTENT)
                .header(header::CONTENT_TYPE, content_type)
                .header(header::CONTENT_LENGTH, length.to_string())
                .header(
                    header::CONTENT_RANGE,
                    format!("bytes {start}-{end}/{file_size}"),
                ),
            Body::from_stream(stream),
        );
    }

    let file = tokio::fs::File::open(path)
        .await
        .map_err(|e| AppError::InternalError(e.to_string()))?;
    let stream = ReaderStream::new(file);

    build_response(
        stream_headers(Response::builder())
            .status(StatusCode::OK)
            .header(header::CONTENT_TYPE, content_type)
            .header(header::CONTENT_LENGTH, file_size.to_string()),
        Body::from_stream(stream),
    )
}

/// OPTIONS /api/videos/{id}/stream
///
/// Pre-flight for cross-origin players: headers only, never authenticated.
pub async fn stream_preflight() -> AppResult<Response> {
    build_response(
        stream_headers(Response::builder()).status(StatusCode::OK),
        Body::empty(),
    )
}
