//! Role-based access control.
//!
//! [`ensure_role`] is the allow-list check; [`RequireManagement`] wraps it as
//! an extractor so handlers enforce authorization at the type level.

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use roomvid_core::error::CoreError;
use roomvid_core::roles::{Role, MANAGEMENT_ROLES};

use super::auth::AuthUser;
use crate::error::AppError;
use crate::state::AppState;

/// Reject with 403 unless `user.role` is in `allowed`.
pub fn ensure_role(user: &AuthUser, allowed: &[Role]) -> Result<(), AppError> {
    if allowed.contains(&user.role) {
        return Ok(());
    }
    tracing::debug!(
        user_id = user.user_id,
        role = %user.role,
        "Role not permitted for route"
    );
    Err(AppError::Core(CoreError::Forbidden(
        "Insufficient permissions".into(),
    )))
}

/// Requires the `manager` or `supervisor` role. Rejects with 403 otherwise.
///
/// ```ignore
/// async fn admin_only(RequireManagement(user): RequireManagement) -> AppResult<Json<()>> {
///     Ok(Json(()))
/// }
/// ```
pub struct RequireManagement(pub AuthUser);

impl FromRequestParts<AppState> for RequireManagement {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let user = AuthUser::from_request_parts(parts, state).await?;
        ensure_role(&user, MANAGEMENT_ROLES)?;
        Ok(RequireManagement(user))
    }
}
