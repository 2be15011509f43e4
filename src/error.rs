use actix_web::{http::StatusCode, HttpResponse, ResponseError};
use log::error;
use serde_json::json;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum BoardError {
    /// Backend could not be reached or refused the operation.
    #[error("storage unavailable: {0}")]
    StorageUnavailable(String),

    #[error("permission denied: {0}")]
    PermissionDenied(&'static str),

    #[error("invalid date range: year {year}, month {month}")]
    InvalidDateRange { year: i32, month: u32 },

    #[error("{0} not found")]
    NotFound(&'static str),

    #[error("invalid token: {0}")]
    InvalidToken(#[from] jsonwebtoken::errors::Error),

    #[error("bad request: {0}")]
    BadRequest(String),

    #[error("configuration error: {0}")]
    Config(String),
}

impl From<mongodb::error::Error> for BoardError {
    fn from(err: mongodb::error::Error) -> Self {
        BoardError::StorageUnavailable(err.to_string())
    }
}

impl ResponseError for BoardError {
    fn status_code(&self) -> StatusCode {
        match self {
            BoardError::StorageUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            BoardError::PermissionDenied(_) => StatusCode::FORBIDDEN,
            BoardError::InvalidDateRange { .. } | BoardError::BadRequest(_) => StatusCode::BAD_REQUEST,
            BoardError::NotFound(_) => StatusCode::NOT_FOUND,
            BoardError::InvalidToken(_) => StatusCode::UNAUTHORIZED,
            BoardError::Config(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let status = self.status_code();
        if status.is_server_error() {
            error!("{}", self);
        }
        HttpResponse::build(status).json(json!({ "error": self.to_string() }))
    }
}
