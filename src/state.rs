//! Shared handler state.

use std::sync::Arc;

use chrono::{DateTime, FixedOffset, Utc};
use chrono_tz::Tz;

use crate::config::Config;
use crate::error::AppError;
use crate::store::JsonStore;

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<JsonStore>,
    pub config: Arc<Config>,
}

impl AppState {
    pub fn new(store: JsonStore, config: Config) -> Self {
        AppState {
            store: Arc::new(store),
            config: Arc::new(config),
        }
    }

    /// Zone named by the request, or the configured default.
    pub fn timezone(&self, requested: Option<&str>) -> Result<Tz, AppError> {
        match requested.map(str::trim).filter(|s| !s.is_empty()) {
            Some(name) => name
                .parse()
                .map_err(|_| AppError::BadRequest(format!("unknown timezone {name:?}"))),
            None => Ok(self.config.timezone),
        }
    }
}

pub fn now() -> DateTime<FixedOffset> {
    Utc::now().fixed_offset()
}
