//! Bearer-token authentication: route-group middleware plus the [`AuthUser`]
//! extractor handlers use to read the caller's identity.

use axum::extract::{FromRequestParts, Request, State};
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;
use axum::http::HeaderMap;
use axum::middleware::Next;
use axum::response::Response;
use roomvid_core::error::CoreError;
use roomvid_core::roles::Role;
use roomvid_core::types::DbId;

use crate::auth::jwt::{validate_token, JwtConfig};
use crate::error::AppError;
use crate::state::AppState;

/// Identity decoded from a valid access token.
#[derive(Debug, Clone)]
pub struct AuthUser {
    /// The user's internal database id (from `claims.sub`).
    pub user_id: DbId,
    pub username: String,
    pub role: Role,
}

/// Reject requests without a valid bearer token and stash the decoded
/// [`AuthUser`] in request extensions for downstream handlers.
///
/// Mounted with `axum::middleware::from_fn_with_state` on every protected
/// route group.
pub async fn require_bearer(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let user = authenticate_headers(req.headers(), &state.config.jwt)?;
    req.extensions_mut().insert(user);
    Ok(next.run(req).await)
}

/// Extract the token from an `Authorization: Bearer <token>` header.
pub fn bearer_token(headers: &HeaderMap) -> Result<&str, AppError> {
    let auth_header = headers
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| {
            AppError::Core(CoreError::Unauthorized(
                "Missing Authorization header".into(),
            ))
        })?;

    auth_header
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .ok_or_else(|| {
            AppError::Core(CoreError::Unauthorized(
                "Invalid Authorization format. Expected: Bearer <token>".into(),
            ))
        })
}

/// Validate a raw token and turn its claims into an [`AuthUser`].
pub fn decode_user(token: &str, config: &JwtConfig) -> Result<AuthUser, AppError> {
    let claims = validate_token(token, config).map_err(|e| {
        tracing::debug!(error = %e, "Rejected access token");
        AppError::Core(CoreError::Unauthorized("Invalid or expired token".into()))
    })?;

    Ok(AuthUser {
        user_id: claims.sub,
        username: claims.username,
        role: claims.role,
    })
}

pub fn authenticate_headers(headers: &HeaderMap, config: &JwtConfig) -> Result<AuthUser, AppError> {
    decode_user(bearer_token(headers)?, config)
}

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        if let Some(user) = parts.extensions.get::<AuthUser>() {
            return Ok(user.clone());
        }
        authenticate_headers(&parts.headers, &state.config.jwt)
    }
}
