//! Application error type and its HTTP mapping

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;

use crate::api::responses::ErrorResponse;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Page not found")]
    PageNotFound,

    #[error("Timer not found")]
    TimerNotFound,

    #[error("Rate limit exceeded")]
    RateLimited,
}

impl AppError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::PageNotFound | AppError::TimerNotFound => StatusCode::NOT_FOUND,
            AppError::RateLimited => StatusCode::TOO_MANY_REQUESTS,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        (self.status_code(), Json(ErrorResponse::new(self.to_string()))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        assert_eq!(AppError::PageNotFound.status_code(), StatusCode::NOT_FOUND);
        assert_eq!(AppError::TimerNotFound.status_code(), StatusCode::NOT_FOUND);
        assert_eq!(AppError::RateLimited.status_code(), StatusCode::TOO_MANY_REQUESTS);
    }

    #[test]
    fn test_messages() {
        assert_eq!(AppError::PageNotFound.to_string(), "Page not found");
        assert_eq!(AppError::TimerNotFound.to_string(), "Timer not found");
    }
}
