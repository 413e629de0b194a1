//! Request gating: bearer-token authentication and role checks.

pub mod auth;
pub mod rbac;
