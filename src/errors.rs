use axum::http::StatusCode;
use chrono::NaiveDate;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("storage I/O failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("storage encoding failed: {0}")]
    Json(#[from] serde_json::Error),
}

#[derive(Debug, Error)]
pub enum TrackerError {
    #[error("{date} is already finalized")]
    AlreadyFinalized { date: NaiveDate },

    /// Only the logical today accepts edits or a finalize.
    #[error("{date} is closed; only today can be edited or finalized")]
    DayClosed { date: NaiveDate },

    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),

    #[error("validation failed: {0}")]
    Validation(String),

    #[error(transparent)]
    Storage(#[from] StoreError),
}

#[derive(Debug)]
pub struct AppError {
    pub status: StatusCode,
    pub message: String,
}

impl AppError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: message.into(),
        }
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::CONFLICT,
            message: message.into(),
        }
    }

    pub fn internal(err: impl std::error::Error) -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            message: err.to_string(),
        }
    }
}

impl From<TrackerError> for AppError {
    fn from(err: TrackerError) -> Self {
        match err {
            TrackerError::Validation(_) => Self::bad_request(err.to_string()),
            TrackerError::AlreadyFinalized { .. } | TrackerError::DayClosed { .. } => {
                Self::conflict(err.to_string())
            }
            TrackerError::InvalidConfiguration(_) | TrackerError::Storage(_) => Self::internal(err),
        }
    }
}

impl axum::response::IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        (self.status, self.message).into_response()
    }
}
