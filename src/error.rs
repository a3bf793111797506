//! VoxAlarm Error Types
//!
//! Centralized error handling for the alarm core.

use thiserror::Error;

use crate::alarm::AlarmId;

/// Central error type for VoxAlarm
#[derive(Error, Debug)]
pub enum AlarmError {
    #[error("invalid alarm field: {0}")]
    InvalidAlarm(String),

    #[error("alarm {0} not found")]
    NotFound(AlarmId),

    #[error("alarm store error: {0}")]
    Store(#[from] rusqlite::Error),

    #[error("scheduler error: {0}")]
    Scheduler(String),

    #[error("configuration error: {0}")]
    Config(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

/// Result type alias for VoxAlarm operations
pub type AlarmResult<T> = Result<T, AlarmError>;
