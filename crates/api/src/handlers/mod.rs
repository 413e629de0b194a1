pub mod auth;
pub mod room;
pub mod user;
pub mod video;
