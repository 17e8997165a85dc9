use actix_web::{http::StatusCode, HttpResponse, ResponseError};
use std::fmt;

/// Application error kinds, mapped to HTTP statuses by the `ResponseError`
/// impl below. Every handler-level failure surfaces as a `{message}` JSON body.
#[derive(Debug)]
pub enum AppError {
    Validation(String),
    Unauthenticated(String),
    Unauthorized(String),
    NotFound(String),
    UnsupportedFileType(String),
    EmptyDocument(String),
    PayloadTooLarge(String),
    ParseFailure(String),
    DatabaseError(String),
    Internal(String),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Validation(msg)
            | AppError::Unauthenticated(msg)
            | AppError::Unauthorized(msg)
            | AppError::NotFound(msg)
            | AppError::UnsupportedFileType(msg)
            | AppError::EmptyDocument(msg)
            | AppError::PayloadTooLarge(msg) => write!(f, "{}", msg),
            AppError::ParseFailure(msg) => write!(f, "Error processing spreadsheet file: {}", msg),
            AppError::DatabaseError(msg) => write!(f, "Database error: {}", msg),
            AppError::Internal(msg) => write!(f, "Internal error: {}", msg),
        }
    }
}

impl std::error::Error for AppError {}

impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::Validation(_)
            | AppError::UnsupportedFileType(_)
            | AppError::EmptyDocument(_) => StatusCode::BAD_REQUEST,
            AppError::Unauthenticated(_) => StatusCode::UNAUTHORIZED,
            AppError::Unauthorized(_) => StatusCode::FORBIDDEN,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::PayloadTooLarge(_) => StatusCode::PAYLOAD_TOO_LARGE,
            AppError::ParseFailure(_)
            | AppError::DatabaseError(_)
            | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code()).json(serde_json::json!({
            "message": self.to_string()
        }))
    }
}

impl From<mongodb::error::Error> for AppError {
    fn from(e: mongodb::error::Error) -> Self {
        AppError::DatabaseError(e.to_string())
    }
}

impl From<std::io::Error> for AppError {
    fn from(e: std::io::Error) -> Self {
        AppError::Internal(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_codes_match_error_kinds() {
        assert_eq!(
            AppError::NotFound("File not found".into()).status_code(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            AppError::Unauthenticated("Missing authorization token".into()).status_code(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            AppError::Unauthorized("Not authorized".into()).status_code(),
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            AppError::UnsupportedFileType("Please upload an Excel file".into()).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            AppError::PayloadTooLarge("File too large".into()).status_code(),
            StatusCode::PAYLOAD_TOO_LARGE
        );
    }

    #[test]
    fn parse_failure_wraps_underlying_message() {
        let err = AppError::ParseFailure("bad zip header".into());
        assert_eq!(
            err.to_string(),
            "Error processing spreadsheet file: bad zip header"
        );
    }
}
