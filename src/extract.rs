//! Request extractors whose rejections render the failure envelope.

use axum::extract::{FromRequest, FromRequestParts};

use crate::error::AppError;

/// JSON body; malformed or mistyped bodies become a 400 envelope.
#[derive(FromRequest)]
#[from_request(via(axum::Json), rejection(AppError))]
pub struct AppJson<T>(pub T);

/// Query string; unparsable parameters become a 400 envelope.
#[derive(FromRequestParts)]
#[from_request(via(axum::extract::Query), rejection(AppError))]
pub struct AppQuery<T>(pub T);
