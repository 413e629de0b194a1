//! Domain model structs and DTOs.
//!
//! Each submodule contains:
//! - A `FromRow` entity struct matching the database row
//! - A create DTO for inserts
//! - An update DTO carrying the full set of mutable fields (updates replace,
//!   they do not patch)

pub mod room;
pub mod user;
pub mod video;
