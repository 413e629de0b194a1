//! Startup preparation run once before the server accepts requests.

use roomvid_db::seed::{self, DEFAULT_ADMIN_PASSWORD};
use roomvid_db::DbPool;

use crate::auth::password::hash_password;
use crate::config::UploadConfig;
use crate::error::{AppError, AppResult};

/// Create the upload root if it does not exist yet.
pub async fn prepare_upload_dir(upload: &UploadConfig) -> std::io::Result<()> {
    tokio::fs::create_dir_all(&upload.dir).await?;
    tracing::info!(dir = %upload.dir.display(), max_file_size = upload.max_file_size, "Upload directory ready");
    Ok(())
}

/// Seed the default admin account and sample rooms into an empty database.
pub async fn seed_defaults(pool: &DbPool) -> AppResult<()> {
    if seed::needs_admin(pool).await? {
        let password_hash = hash_password(DEFAULT_ADMIN_PASSWORD)
            .map_err(|e| AppError::InternalError(format!("Password hashing error: {e}")))?;
        if seed::seed_admin(pool, password_hash).await? {
            tracing::warn!(
                username = seed::DEFAULT_ADMIN_USERNAME,
                "Default admin created with the default password; change it"
            );
        }
    }
    seed::seed_rooms(pool).await?;
    Ok(())
}
