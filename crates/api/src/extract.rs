//! Extractor wrappers whose rejections render as [`AppError`] JSON.
//!
//! axum's own `Json`, `Path` and `Query` reject with plain-text bodies
//! (and 422 for undeserializable JSON). Handlers take these wrappers instead
//! so malformed input always comes back as a 400 `{error, code}` body.

use axum::extract::{FromRequest, FromRequestParts};

use crate::error::AppError;

/// JSON request body.
#[derive(Debug, FromRequest)]
#[from_request(via(axum::Json), rejection(AppError))]
pub struct JsonBody<T>(pub T);

/// URL path parameters.
#[derive(Debug, FromRequestParts)]
#[from_request(via(axum::extract::Path), rejection(AppError))]
pub struct PathParam<T>(pub T);

/// Query string parameters.
#[derive(Debug, FromRequestParts)]
#[from_request(via(axum::extract::Query), rejection(AppError))]
pub struct QueryParams<T>(pub T);
