//! Storage layout and filename convention for uploaded videos.
//!
//! Files are grouped by upload month and room so the upload root stays
//! browsable: `{root}/{YYYY}/{MM}/room_{room_number}/{filename}`.

use std::path::{Path, PathBuf};

use chrono::Datelike;
use uuid::Uuid;

use crate::types::Timestamp;

/// Longest extension kept from a client-supplied filename.
const MAX_EXTENSION_LENGTH: usize = 10;

/// Directory that holds uploads for `room_number` in the month of `now`.
///
/// ```
/// use chrono::TimeZone;
/// use roomvid_core::naming::storage_dir;
///
/// let now = chrono::Utc.with_ymd_and_hms(2024, 3, 9, 14, 5, 0).unwrap();
/// let dir = storage_dir("uploads".as_ref(), now, "101");
/// assert_eq!(dir, std::path::PathBuf::from("uploads/2024/03/room_101"));
/// ```
pub fn storage_dir(upload_root: &Path, now: Timestamp, room_number: &str) -> PathBuf {
    upload_root
        .join(now.year().to_string())
        .join(format!("{:02}", now.month()))
        .join(format!("room_{}", path_safe(room_number)))
}

/// Generate a stored filename for an upload.
///
/// Convention: `video_{YYYYmmdd_HHMMSS}_{room}_{unique}{.ext}`
///
/// - the timestamp keeps files sortable inside a room directory
/// - `unique` is a random v4 UUID in simple form, so two uploads to the same
///   room within the same second never collide
/// - `.ext` is the sanitized extension of the client filename, omitted when
///   there is none
pub fn video_filename(now: Timestamp, room_number: &str, original_filename: &str) -> String {
    video_filename_with_id(now, room_number, original_filename, Uuid::new_v4())
}

fn video_filename_with_id(
    now: Timestamp,
    room_number: &str,
    original_filename: &str,
    unique: Uuid,
) -> String {
    let mut name = format!(
        "video_{}_{}_{}",
        now.format("%Y%m%d_%H%M%S"),
        path_safe(room_number),
        unique.simple()
    );
    if let Some(ext) = sanitized_extension(original_filename) {
        name.push('.');
        name.push_str(&ext);
    }
    name
}

/// Lowercased extension of `filename`, if it is short and purely alphanumeric.
pub fn sanitized_extension(filename: &str) -> Option<String> {
    let base = filename.rsplit(['/', '\\']).next().unwrap_or(filename);
    let (stem, ext) = base.rsplit_once('.')?;
    if stem.is_empty()
        || ext.is_empty()
        || ext.len() > MAX_EXTENSION_LENGTH
        || !ext.chars().all(|c| c.is_ascii_alphanumeric())
    {
        return None;
    }
    Some(ext.to_ascii_lowercase())
}

/// Guess a Content-Type from a file extension.
pub fn content_type_for_extension(path: &str) -> &'static str {
    match sanitized_extension(path).as_deref() {
        Some("mp4" | "m4v") => "video/mp4",
        Some("webm") => "video/webm",
        Some("mov") => "video/quicktime",
        Some("mkv") => "video/x-matroska",
        Some("avi") => "video/x-msvideo",
        Some("ogv") => "video/ogg",
        _ => "application/octet-stream",
    }
}

/// Replace anything outside `[A-Za-z0-9_-]` so the value is a single, inert
/// path component. Room numbers are validated on write; this covers rows that
/// predate the validation.
fn path_safe(value: &str) -> String {
    let cleaned: String = value
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '_' || c == '-' {
                c
            } else {
                '_'
            }
        })
        .collect();
    if cleaned.is_empty() {
        "unknown".to_string()
    } else {
        cleaned
    }
}
