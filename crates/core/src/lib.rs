//! Domain building blocks shared by the database and HTTP layers.
//!
//! Nothing in this crate touches the network or the relational store; the
//! upload pipeline persists records through the [`upload::VideoRecordSink`]
//! trait so that callers decide where metadata lands.

pub mod access;
pub mod error;
pub mod naming;
pub mod roles;
pub mod types;
pub mod upload;
pub mod validation;
