//! HTTP-level integration tests for upload, listing, deletion and streaming.

mod common;

use axum::body::Body;
use axum::http::{header, Method, Request, StatusCode};
use common::{
    body_bytes, body_json, create_room, delete_auth, files_under, get, get_auth,
    post_multipart, send, upload_video, user_token, Part,
};
use roomvid_core::access::ListScope;
use roomvid_core::roles::Role;
use roomvid_db::models::user::UpdateUser;
use roomvid_db::repositories::{RoomRepo, UserRepo};
use sqlx::PgPool;

const TEN_BYTES: &[u8] = b"0123456789";

// ---------------------------------------------------------------------------
// Upload
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../db/migrations")]
async fn test_upload_then_fetch_detail(pool: PgPool) {
    let room = create_room(&pool, "101").await;
    let test = common::build_test_app(pool.clone());
    let (user, token) = user_token(&test, &pool, "uploader", Role::User).await;

    let response = upload_video(test.app(), &token, &room.id.to_string(), TEN_BYTES).await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let json = body_json(response).await;
    assert_eq!(json["message"], "Video uploaded successfully");
    assert_eq!(json["video"]["size"], 10);
    assert_eq!(json["video"]["room"], "101");
    let filename = json["video"]["filename"].as_str().unwrap().to_string();
    assert!(filename.starts_with("video_"));
    assert!(filename.ends_with(".mp4"));
    let id = json["video"]["id"].as_i64().unwrap();

    let response = get_auth(test.app(), &format!("/api/videos/{id}"), &token).await;
    assert_eq!(response.status(), StatusCode::OK);
    let video = &body_json(response).await["video"];
    assert_eq!(video["file_size"], 10);
    assert_eq!(video["original_filename"], "clip.mp4");
    assert_eq!(video["room"]["room_number"], "101");
    assert_eq!(video["user"]["id"], user.id);
    assert_eq!(video["user"]["username"], "uploader");
    assert_eq!(video["metadata"]["content_type"], "video/mp4");

    let stored = std::path::PathBuf::from(video["file_path"].as_str().unwrap());
    assert_eq!(std::fs::read(&stored).unwrap(), TEN_BYTES);
    assert!(stored.starts_with(test.upload_dir()));
    assert_eq!(
        stored.parent().unwrap().file_name().unwrap().to_str().unwrap(),
        "room_101"
    );
    assert_eq!(files_under(&test.upload_dir()).len(), 1);
}

#[sqlx::test(migrations = "../db/migrations")]
async fn test_upload_file_before_room_field(pool: PgPool) {
    let room = create_room(&pool, "202").await;
    let test = common::build_test_app(pool.clone());
    let (_, token) = user_token(&test, &pool, "uploader", Role::User).await;

    let room_id = room.id.to_string();
    let parts = [
        Part::File {
            name: "video",
            filename: "Lecture.MOV",
            content_type: "video/quicktime",
            data: TEN_BYTES,
        },
        Part::Text("room_id", &room_id),
    ];
    let response = post_multipart(test.app(), "/api/videos/upload", &token, &parts).await;

    assert_eq!(response.status(), StatusCode::CREATED);
    let json = body_json(response).await;
    assert!(json["video"]["filename"].as_str().unwrap().ends_with(".mov"));
    assert_eq!(files_under(&test.upload_dir()).len(), 1);
}

#[sqlx::test(migrations = "../db/migrations")]
async fn test_upload_to_missing_room_leaves_no_file(pool: PgPool) {
    let test = common::build_test_app(pool.clone());
    let (_, token) = user_token(&test, &pool, "uploader", Role::User).await;

    let response = upload_video(test.app(), &token, "9999", TEN_BYTES).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(body_json(response).await["code"], "NOT_FOUND");

    // File part first: it is staged, then discarded when the room lookup fails.
    let parts = [
        Part::File {
            name: "video",
            filename: "clip.mp4",
            content_type: "video/mp4",
            data: TEN_BYTES,
        },
        Part::Text("room_id", "9999"),
    ];
    let response = post_multipart(test.app(), "/api/videos/upload", &token, &parts).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    assert!(files_under(&test.upload_dir()).is_empty());
}

#[sqlx::test(migrations = "../db/migrations")]
async fn test_upload_to_deleted_or_inactive_room_is_rejected(pool: PgPool) {
    let deleted = create_room(&pool, "101").await;
    RoomRepo::soft_delete(&pool, deleted.id).await.unwrap();
    let inactive = create_room(&pool, "102").await;
    RoomRepo::replace(
        &pool,
        inactive.id,
        &roomvid_db::models::room::UpdateRoom {
            room_number: "102".into(),
            is_active: false,
        },
    )
    .await
    .unwrap();
    let test = common::build_test_app(pool.clone());
    let (_, token) = user_token(&test, &pool, "uploader", Role::User).await;

    let response = upload_video(test.app(), &token, &deleted.id.to_string(), TEN_BYTES).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let response = upload_video(test.app(), &token, &inactive.id.to_string(), TEN_BYTES).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    assert!(files_under(&test.upload_dir()).is_empty());
}

#[sqlx::test(migrations = "../db/migrations")]
async fn test_upload_requires_file_and_room(pool: PgPool) {
    let room = create_room(&pool, "101").await;
    let test = common::build_test_app(pool.clone());
    let (_, token) = user_token(&test, &pool, "uploader", Role::User).await;

    let room_id = room.id.to_string();
    let response = post_multipart(
        test.app(),
        "/api/videos/upload",
        &token,
        &[Part::Text("room_id", &room_id)],
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["error"], "No video file provided");

    let parts = [Part::File {
        name: "video",
        filename: "clip.mp4",
        content_type: "video/mp4",
        data: TEN_BYTES,
    }];
    let response = post_multipart(test.app(), "/api/videos/upload", &token, &parts).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["error"], "Room ID is required");

    let response = upload_video(test.app(), &token, "abc", TEN_BYTES).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    assert!(files_under(&test.upload_dir()).is_empty());
}

#[sqlx::test(migrations = "../db/migrations")]
async fn test_oversized_upload_is_rejected_and_removed(pool: PgPool) {
    let room = create_room(&pool, "101").await;
    let test = common::build_test_app(pool.clone());
    let (_, token) = user_token(&test, &pool, "uploader", Role::User).await;

    let too_big = vec![7u8; test.config.upload.max_file_size as usize + 1];
    let response = upload_video(test.app(), &token, &room.id.to_string(), &too_big).await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["code"], "VALIDATION_ERROR");
    assert!(files_under(&test.upload_dir()).is_empty());
}

#[sqlx::test(migrations = "../db/migrations")]
async fn test_overlong_filename_is_rejected_before_writing(pool: PgPool) {
    let room = create_room(&pool, "101").await;
    let test = common::build_test_app(pool.clone());
    let (_, token) = user_token(&test, &pool, "uploader", Role::User).await;

    let filename = format!("{}.mp4", "a".repeat(300));
    let room_id = room.id.to_string();
    let parts = [
        Part::Text("room_id", &room_id),
        Part::File {
            name: "video",
            filename: &filename,
            content_type: "video/mp4",
            data: TEN_BYTES,
        },
    ];
    let response = post_multipart(test.app(), "/api/videos/upload", &token, &parts).await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["code"], "VALIDATION_ERROR");
    assert!(files_under(&test.upload_dir()).is_empty());
}

#[sqlx::test(migrations = "../db/migrations")]
async fn test_upload_body_that_is_not_multipart_is_json_400(pool: PgPool) {
    let test = common::build_test_app(pool.clone());
    let (_, token) = user_token(&test, &pool, "uploader", Role::User).await;
    let request = Request::builder()
        .method(Method::POST)
        .uri("/api/videos/upload")
        .header(header::AUTHORIZATION, format!("Bearer {token}"))
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{}"))
        .unwrap();

    let response = send(test.app(), request).await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["code"], "BAD_REQUEST");
}

#[sqlx::test(migrations = "../db/migrations")]
async fn test_deleted_or_inactive_account_cannot_upload(pool: PgPool) {
    let room = create_room(&pool, "101").await;
    let test = common::build_test_app(pool.clone());
    let (deleted, deleted_token) = user_token(&test, &pool, "gone", Role::User).await;
    let (inactive, inactive_token) = user_token(&test, &pool, "paused", Role::User).await;

    UserRepo::soft_delete(&pool, deleted.id).await.unwrap();
    UserRepo::replace(
        &pool,
        inactive.id,
        &UpdateUser {
            username: inactive.username.clone(),
            email: inactive.email.clone(),
            role: inactive.role,
            is_active: false,
        },
    )
    .await
    .unwrap();

    for token in [&deleted_token, &inactive_token] {
        let response = upload_video(test.app(), token, &room.id.to_string(), TEN_BYTES).await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(body_json(response).await["code"], "UNAUTHORIZED");
    }

    assert!(files_under(&test.upload_dir()).is_empty());
    let response = get_auth(test.app(), "/api/videos", &deleted_token).await;
    assert!(body_json(response).await["videos"].as_array().unwrap().is_empty());
}

#[sqlx::test(migrations = "../db/migrations")]
async fn test_upload_requires_authentication(pool: PgPool) {
    let test = common::build_test_app(pool);
    let request = Request::builder()
        .method(Method::POST)
        .uri("/api/videos/upload")
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={}", common::MULTIPART_BOUNDARY),
        )
        .body(Body::from(common::multipart_body(&[Part::Text("room_id", "1")])))
        .unwrap();

    let response = send(test.app(), request).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

// ---------------------------------------------------------------------------
// Listing
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../db/migrations")]
async fn test_list_is_newest_first_and_enriched(pool: PgPool) {
    let room_a = create_room(&pool, "101").await;
    let room_b = create_room(&pool, "102").await;
    let test = common::build_test_app(pool.clone());
    let (_, token) = user_token(&test, &pool, "uploader", Role::User).await;

    let first = upload_video(test.app(), &token, &room_a.id.to_string(), b"first").await;
    let first_id = body_json(first).await["video"]["id"].as_i64().unwrap();
    let second = upload_video(test.app(), &token, &room_b.id.to_string(), b"second").await;
    let second_id = body_json(second).await["video"]["id"].as_i64().unwrap();

    let response = get_auth(test.app(), "/api/videos", &token).await;
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    let videos = json["videos"].as_array().unwrap();
    assert_eq!(videos.len(), 2);
    assert_eq!(videos[0]["id"], second_id);
    assert_eq!(videos[0]["room"]["room_number"], "102");
    assert_eq!(videos[1]["id"], first_id);
    assert_eq!(videos[1]["user"]["username"], "uploader");
}

#[sqlx::test(migrations = "../db/migrations")]
async fn test_own_scope_hides_other_uploads_from_users(pool: PgPool) {
    let room = create_room(&pool, "101").await;
    let test = common::build_test_app_with(pool.clone(), |config| {
        config.access.list_scope = ListScope::Own;
    });
    let (_, alice) = user_token(&test, &pool, "alice", Role::User).await;
    let (_, bob) = user_token(&test, &pool, "bob", Role::User).await;
    let (_, manager) = user_token(&test, &pool, "mgr", Role::Manager).await;

    let response = upload_video(test.app(), &alice, &room.id.to_string(), TEN_BYTES).await;
    let id = body_json(response).await["video"]["id"].as_i64().unwrap();

    let response = get_auth(test.app(), "/api/videos", &bob).await;
    assert!(body_json(response).await["videos"].as_array().unwrap().is_empty());
    let response = get_auth(test.app(), &format!("/api/videos/{id}"), &bob).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let response = get_auth(test.app(), "/api/videos", &alice).await;
    assert_eq!(body_json(response).await["videos"].as_array().unwrap().len(), 1);
    let response = get_auth(test.app(), "/api/videos", &manager).await;
    assert_eq!(body_json(response).await["videos"].as_array().unwrap().len(), 1);
}

#[sqlx::test(migrations = "../db/migrations")]
async fn test_detail_of_missing_video_is_404(pool: PgPool) {
    let test = common::build_test_app(pool.clone());
    let (_, token) = user_token(&test, &pool, "viewer", Role::User).await;

    let response = get_auth(test.app(), "/api/videos/31337", &token).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

// ---------------------------------------------------------------------------
// Deletion
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../db/migrations")]
async fn test_only_owner_or_management_can_delete(pool: PgPool) {
    let room = create_room(&pool, "101").await;
    let test = common::build_test_app(pool.clone());
    let (_, owner) = user_token(&test, &pool, "owner", Role::User).await;
    let (_, stranger) = user_token(&test, &pool, "stranger", Role::User).await;
    let (_, manager) = user_token(&test, &pool, "mgr", Role::Manager).await;

    let response = upload_video(test.app(), &owner, &room.id.to_string(), TEN_BYTES).await;
    let first = body_json(response).await["video"]["id"].as_i64().unwrap();
    let response = upload_video(test.app(), &owner, &room.id.to_string(), TEN_BYTES).await;
    let second = body_json(response).await["video"]["id"].as_i64().unwrap();
    assert_eq!(files_under(&test.upload_dir()).len(), 2);

    let response = delete_auth(test.app(), &format!("/api/videos/{first}"), &stranger).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let response = delete_auth(test.app(), &format!("/api/videos/{first}"), &owner).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["message"], "Video deleted successfully");

    let response = delete_auth(test.app(), &format!("/api/videos/{second}"), &manager).await;
    assert_eq!(response.status(), StatusCode::OK);

    assert!(files_under(&test.upload_dir()).is_empty());
    let response = get_auth(test.app(), &format!("/api/videos/{first}"), &owner).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let response = delete_auth(test.app(), &format!("/api/videos/{first}"), &owner).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[sqlx::test(migrations = "../db/migrations")]
async fn test_delete_succeeds_when_file_already_gone(pool: PgPool) {
    let room = create_room(&pool, "101").await;
    let test = common::build_test_app(pool.clone());
    let (_, token) = user_token(&test, &pool, "owner", Role::User).await;

    let response = upload_video(test.app(), &token, &room.id.to_string(), TEN_BYTES).await;
    let id = body_json(response).await["video"]["id"].as_i64().unwrap();
    for file in files_under(&test.upload_dir()) {
        std::fs::remove_file(file).unwrap();
    }

    let response = delete_auth(test.app(), &format!("/api/videos/{id}"), &token).await;
    assert_eq!(response.status(), StatusCode::OK);
}

// ---------------------------------------------------------------------------
// Streaming
// ---------------------------------------------------------------------------

async fn uploaded_video(test: &common::TestApp, pool: &PgPool) -> (i64, String) {
    let room = create_room(pool, "101").await;
    let (_, token) = user_token(test, pool, "streamer", Role::User).await;
    let response = upload_video(test.app(), &token, &room.id.to_string(), TEN_BYTES).await;
    let id = body_json(response).await["video"]["id"].as_i64().unwrap();
    (id, token)
}

async fn get_range(test: &common::TestApp, uri: &str, range: &str) -> axum::http::Response<Body> {
    let request = Request::builder()
        .uri(uri)
        .header(header::RANGE, range)
        .body(Body::empty())
        .unwrap();
    send(test.app(), request).await
}

#[sqlx::test(migrations = "../db/migrations")]
async fn test_stream_full_file(pool: PgPool) {
    let test = common::build_test_app(pool.clone());
    let (id, _) = uploaded_video(&test, &pool).await;

    let response = get(test.app(), &format!("/api/videos/{id}/stream")).await;
    assert_eq!(response.status(), StatusCode::OK);

    let headers = response.headers();
    assert_eq!(headers[header::CONTENT_TYPE], "video/mp4");
    assert_eq!(headers[header::CONTENT_LENGTH], "10");
    assert_eq!(headers[header::ACCEPT_RANGES], "bytes");
    assert_eq!(headers[header::CACHE_CONTROL], "no-cache");
    assert_eq!(headers[header::ACCESS_CONTROL_ALLOW_ORIGIN], "*");
    assert_eq!(
        headers[header::ACCESS_CONTROL_EXPOSE_HEADERS],
        "Content-Length, Content-Range, Accept-Ranges, Content-Type"
    );
    assert_eq!(body_bytes(response).await, TEN_BYTES);
}

#[sqlx::test(migrations = "../db/migrations")]
async fn test_stream_byte_ranges(pool: PgPool) {
    let test = common::build_test_app(pool.clone());
    let (id, _) = uploaded_video(&test, &pool).await;
    let uri = format!("/api/videos/{id}/stream");

    let response = get_range(&test, &uri, "bytes=2-5").await;
    assert_eq!(response.status(), StatusCode::PARTIAL_CONTENT);
    assert_eq!(response.headers()[header::CONTENT_RANGE], "bytes 2-5/10");
    assert_eq!(response.headers()[header::CONTENT_LENGTH], "4");
    assert_eq!(body_bytes(response).await, b"2345");

    let response = get_range(&test, &uri, "bytes=7-").await;
    assert_eq!(response.status(), StatusCode::PARTIAL_CONTENT);
    assert_eq!(body_bytes(response).await, b"789");

    let response = get_range(&test, &uri, "bytes=-3").await;
    assert_eq!(response.status(), StatusCode::PARTIAL_CONTENT);
    assert_eq!(response.headers()[header::CONTENT_RANGE], "bytes 7-9/10");
    assert_eq!(body_bytes(response).await, b"789");

    let response = get_range(&test, &uri, "bytes=50-60").await;
    assert_eq!(response.status(), StatusCode::RANGE_NOT_SATISFIABLE);
    assert_eq!(response.headers()[header::CONTENT_RANGE], "bytes */10");
}

#[sqlx::test(migrations = "../db/migrations")]
async fn test_stream_with_non_numeric_id_is_json_400(pool: PgPool) {
    let test = common::build_test_app(pool);

    let response = get(test.app(), "/api/videos/abc/stream").await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["code"], "BAD_REQUEST");
}

#[sqlx::test(migrations = "../db/migrations")]
async fn test_stream_preflight(pool: PgPool) {
    let test = common::build_test_app(pool.clone());
    let (id, _) = uploaded_video(&test, &pool).await;

    let request = Request::builder()
        .method(Method::OPTIONS)
        .uri(format!("/api/videos/{id}/stream"))
        .body(Body::empty())
        .unwrap();
    let response = send(test.app(), request).await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers()[header::ACCESS_CONTROL_ALLOW_METHODS],
        "GET, HEAD, OPTIONS"
    );
    assert_eq!(
        response.headers()[header::ACCESS_CONTROL_ALLOW_HEADERS],
        "Range, Content-Range, Accept-Ranges, Authorization"
    );
    assert!(body_bytes(response).await.is_empty());
}

#[sqlx::test(migrations = "../db/migrations")]
async fn test_stream_distinguishes_missing_row_and_missing_file(pool: PgPool) {
    let test = common::build_test_app(pool.clone());
    let (id, _) = uploaded_video(&test, &pool).await;

    let response = get(test.app(), "/api/videos/777777/stream").await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(body_json(response).await["code"], "NOT_FOUND");

    for file in files_under(&test.upload_dir()) {
        std::fs::remove_file(file).unwrap();
    }
    let response = get(test.app(), &format!("/api/videos/{id}/stream")).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(body_json(response).await["code"], "FILE_MISSING");
}

#[sqlx::test(migrations = "../db/migrations")]
async fn test_stream_token_when_policy_requires_it(pool: PgPool) {
    let test = common::build_test_app_with(pool.clone(), |config| {
        config.access.stream_requires_auth = true;
    });
    let (id, token) = uploaded_video(&test, &pool).await;
    let uri = format!("/api/videos/{id}/stream");

    let response = get(test.app(), &uri).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let response = get(test.app(), &format!("{uri}?token={token}")).await;
    assert_eq!(response.status(), StatusCode::OK);

    let response = get_auth(test.app(), &uri, &token).await;
    assert_eq!(response.status(), StatusCode::OK);

    let response = get(test.app(), &format!("{uri}?token=garbage")).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}
