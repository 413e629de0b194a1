//! HTTP surface of the room video service.
//!
//! The binary in `main.rs` wires configuration, the database pool and
//! [`router::build_app_router`]; integration tests build the same router.

pub mod auth;
pub mod bootstrap;
pub mod config;
pub mod error;
pub mod extract;
pub mod handlers;
pub mod middleware;
pub mod response;
pub mod router;
pub mod routes;
pub mod state;
