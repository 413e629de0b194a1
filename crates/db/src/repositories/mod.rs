//! Repository layer.
//!
//! Each repository is a zero-sized struct providing async CRUD methods
//! that accept `&PgPool` as the first argument. Reads skip soft-deleted rows
//! unless the method name says otherwise.

pub mod room_repo;
pub mod user_repo;
pub mod video_repo;

pub use room_repo::RoomRepo;
pub use user_repo::UserRepo;
pub use video_repo::VideoRepo;
