//! Default data for a fresh database.
//!
//! Both seeds only run against an empty table, so restarting the server
//! never resurrects a deleted admin or room.

use roomvid_core::roles::Role;
use sqlx::PgPool;

use crate::models::room::CreateRoom;
use crate::models::user::CreateUser;
use crate::repositories::{RoomRepo, UserRepo};

pub const DEFAULT_ADMIN_USERNAME: &str = "admin";
pub const DEFAULT_ADMIN_PASSWORD: &str = "password";
pub const DEFAULT_ADMIN_EMAIL: &str = "admin@roomvid.local";

/// Room numbers created on first start.
pub const DEFAULT_ROOMS: &[&str] = &["101", "102", "201", "202", "301"];

/// Whether the `users` table has never held a row.
pub async fn needs_admin(pool: &PgPool) -> Result<bool, sqlx::Error> {
    Ok(UserRepo::count_all(pool).await? == 0)
}

/// Create the default supervisor account if the `users` table is empty.
///
/// `password_hash` must already be a PHC hash of [`DEFAULT_ADMIN_PASSWORD`].
/// Returns `true` if the account was created.
pub async fn seed_admin(pool: &PgPool, password_hash: String) -> Result<bool, sqlx::Error> {
    if !needs_admin(pool).await? {
        return Ok(false);
    }
    let input = CreateUser {
        username: DEFAULT_ADMIN_USERNAME.to_string(),
        email: DEFAULT_ADMIN_EMAIL.to_string(),
        password_hash,
        role: Role::Supervisor,
    };
    let user = UserRepo::create(pool, &input).await?;
    tracing::info!(user_id = user.id, username = %user.username, "Default admin user created");
    Ok(true)
}

/// Create [`DEFAULT_ROOMS`] if the `rooms` table is empty.
///
/// Returns the number of rooms created.
pub async fn seed_rooms(pool: &PgPool) -> Result<usize, sqlx::Error> {
    if RoomRepo::count_all(pool).await? > 0 {
        return Ok(0);
    }
    for room_number in DEFAULT_ROOMS {
        let input = CreateRoom {
            room_number: room_number.to_string(),
        };
        RoomRepo::create(pool, &input).await?;
    }
    tracing::info!(count = DEFAULT_ROOMS.len(), "Sample rooms created");
    Ok(DEFAULT_ROOMS.len())
}
