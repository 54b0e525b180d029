//! Uniform `{success, data | message}` response body.

use axum::Json;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Envelope<T> {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl<T> Envelope<T> {
    pub fn failure(message: impl Into<String>) -> Self {
        Envelope {
            success: false,
            data: None,
            message: Some(message.into()),
        }
    }
}

pub fn ok<T: Serialize>(data: T) -> Json<Envelope<T>> {
    Json(Envelope {
        success: true,
        data: Some(data),
        message: None,
    })
}

pub fn ok_with_message<T: Serialize>(data: T, message: impl Into<String>) -> Json<Envelope<T>> {
    Json(Envelope {
        success: true,
        data: Some(data),
        message: Some(message.into()),
    })
}

pub fn done(message: impl Into<String>) -> Json<Envelope<()>> {
    Json(Envelope {
        success: true,
        data: None,
        message: Some(message.into()),
    })
}
