//! Handlers for the `/users` resource (account administration).
//!
//! All handlers require the `manager` or `supervisor` role via
//! [`RequireManagement`].

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use roomvid_core::error::CoreError;
use roomvid_core::roles::Role;
use roomvid_core::types::DbId;
use roomvid_core::validation::{validate_email, validate_username};
use roomvid_db::models::user::{CreateUser, UpdateUser, User, UserResponse};
use roomvid_db::repositories::{UserRepo, VideoRepo};
use serde::{Deserialize, Serialize};

use crate::auth::password::{hash_password, validate_password_strength, MIN_PASSWORD_LENGTH};
use crate::error::{AppError, AppResult};
use crate::extract::{JsonBody, PathParam};
use crate::middleware::rbac::RequireManagement;
use crate::response::MessageResponse;
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Request / response types
// ---------------------------------------------------------------------------

/// Request body for `POST /users`.
#[derive(Debug, Deserialize)]
pub struct CreateUserRequest {
    pub username: String,
    pub email: String,
    pub password: String,
    /// Role name; defaults to `user`.
    pub role: Option<String>,
}

/// Request body for `PUT /users/{id}`. Every field is replaced.
#[derive(Debug, Deserialize)]
pub struct UpdateUserRequest {
    pub username: String,
    pub email: String,
    pub role: String,
    pub is_active: bool,
}

#[derive(Debug, Serialize)]
pub struct UserListResponse {
    pub users: Vec<UserResponse>,
}

#[derive(Debug, Serialize)]
pub struct UserEnvelope {
    pub user: UserResponse,
}

#[derive(Debug, Serialize)]
pub struct UserMutationResponse {
    pub message: &'static str,
    pub user: UserResponse,
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// GET /api/users
pub async fn list_users(
    State(state): State<AppState>,
    RequireManagement(_admin): RequireManagement,
) -> AppResult<Json<UserListResponse>> {
    let users = UserRepo::list(&state.pool).await?;
    Ok(Json(UserListResponse {
        users: users.iter().map(UserResponse::from).collect(),
    }))
}

/// GET /api/users/{id}
pub async fn get_user(
    State(state): State<AppState>,
    RequireManagement(_admin): RequireManagement,
    PathParam(id): PathParam<DbId>,
) -> AppResult<Json<UserEnvelope>> {
    let user = find_user(&state, id).await?;
    Ok(Json(UserEnvelope {
        user: UserResponse::from(&user),
    }))
}

/// POST /api/users
///
/// Validates input, checks username/email availability, hashes the password
/// and returns the safe [`UserResponse`] with 201 Created.
pub async fn create_user(
    State(state): State<AppState>,
    RequireManagement(admin): RequireManagement,
    JsonBody(input): JsonBody<CreateUserRequest>,
) -> AppResult<(StatusCode, Json<UserMutationResponse>)> {
    let username = input.username.trim().to_string();
    let email = input.email.trim().to_string();
    let role = match input.role.as_deref().map(str::trim) {
        None | Some("") => Role::User,
        Some(name) => name.parse::<Role>()?,
    };

    validate_username(&username)?;
    validate_email(&email)?;
    validate_password_strength(&input.password, MIN_PASSWORD_LENGTH)
        .map_err(|msg| AppError::Core(CoreError::Validation(msg)))?;
    ensure_available(&state, &username, &email, None).await?;

    let password_hash = hash_password(&input.password)
        .map_err(|e| AppError::InternalError(format!("Password hashing error: {e}")))?;

    let create_dto = CreateUser {
        username,
        email,
        password_hash,
        role,
    };
    let user = UserRepo::create(&state.pool, &create_dto).await?;
    tracing::info!(user_id = user.id, role = %user.role, by = admin.user_id, "User created");

    Ok((
        StatusCode::CREATED,
        Json(UserMutationResponse {
            message: "User created successfully",
            user: UserResponse::from(&user),
        }),
    ))
}

/// PUT /api/users/{id}
///
/// Replaces username, email, role and active flag. Passwords are not
/// changed here.
pub async fn update_user(
    State(state): State<AppState>,
    RequireManagement(admin): RequireManagement,
    PathParam(id): PathParam<DbId>,
    JsonBody(input): JsonBody<UpdateUserRequest>,
) -> AppResult<Json<UserMutationResponse>> {
    find_user(&state, id).await?;

    let username = input.username.trim().to_string();
    let email = input.email.trim().to_string();
    let role: Role = input.role.trim().parse()?;

    validate_username(&username)?;
    validate_email(&email)?;
    ensure_available(&state, &username, &email, Some(id)).await?;

    let update_dto = UpdateUser {
        username,
        email,
        role,
        is_active: input.is_active,
    };
    let user = UserRepo::replace(&state.pool, id, &update_dto)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound { entity: "User", id }))?;
    tracing::info!(user_id = id, by = admin.user_id, "User updated");

    Ok(Json(UserMutationResponse {
        message: "User updated successfully",
        user: UserResponse::from(&user),
    }))
}

/// DELETE /api/users/{id}
///
/// Soft delete. Callers cannot delete themselves, and accounts that still
/// own live videos are kept.
pub async fn delete_user(
    State(state): State<AppState>,
    RequireManagement(admin): RequireManagement,
    PathParam(id): PathParam<DbId>,
) -> AppResult<Json<MessageResponse>> {
    if id == admin.user_id {
        return Err(AppError::Core(CoreError::Validation(
            "You cannot delete your own account".into(),
        )));
    }

    find_user(&state, id).await?;

    let videos = VideoRepo::count_by_uploader(&state.pool, id).await?;
    if videos > 0 {
        return Err(AppError::Core(CoreError::HasDependents(format!(
            "Cannot delete user with uploaded videos ({videos})"
        ))));
    }

    if !UserRepo::soft_delete(&state.pool, id).await? {
        return Err(AppError::Core(CoreError::NotFound { entity: "User", id }));
    }
    tracing::info!(user_id = id, by = admin.user_id, "User deleted");

    Ok(Json(MessageResponse::new("User deleted successfully")))
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

async fn find_user(state: &AppState, id: DbId) -> AppResult<User> {
    UserRepo::find_by_id(&state.pool, id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound { entity: "User", id }))
}

async fn ensure_available(
    state: &AppState,
    username: &str,
    email: &str,
    exclude_id: Option<DbId>,
) -> AppResult<()> {
    if UserRepo::exists_username(&state.pool, username, exclude_id).await? {
        return Err(AppError::Core(CoreError::Conflict(
            "Username already exists".into(),
        )));
    }
    if UserRepo::exists_email(&state.pool, email, exclude_id).await? {
        return Err(AppError::Core(CoreError::Conflict(
            "Email already exists".into(),
        )));
    }
    Ok(())
}
