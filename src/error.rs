use actix_web::{HttpResponse, ResponseError, http::StatusCode};
use derive_more::Display;
use serde_json::json;

use crate::rules::window::Rejection;
use crate::store::StoreError;

/// Every handler failure, rendered as
/// `{"success": false, "error": "...", "code": "..."}`.
#[derive(Debug, Display)]
pub enum AppError {
    #[display(fmt = "{}", _0)]
    Validation(String),
    #[display(fmt = "submission rejected: {}", _0)]
    Rejected(Rejection),
    #[display(fmt = "{}", _0)]
    Unauthorized(String),
    #[display(fmt = "{}", _0)]
    Forbidden(String),
    #[display(fmt = "{}", _0)]
    NotFound(String),
    #[display(fmt = "{}", _0)]
    Conflict(String),
    #[display(fmt = "{}", _0)]
    Store(StoreError),
    #[display(fmt = "{}", _0)]
    Internal(String),
}

impl std::error::Error for AppError {}

impl AppError {
    pub fn validation(msg: impl Into<String>) -> Self {
        AppError::Validation(msg.into())
    }

    pub fn unauthorized(msg: impl Into<String>) -> Self {
        AppError::Unauthorized(msg.into())
    }

    pub fn forbidden(msg: impl Into<String>) -> Self {
        AppError::Forbidden(msg.into())
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        AppError::NotFound(msg.into())
    }

    /// Localized text shown to the user. Store and internal details stay in
    /// the logs.
    pub fn user_message(&self) -> String {
        match self {
            AppError::Rejected(rejection) => rejection.message().to_string(),
            AppError::Store(StoreError::AlreadyExists) => "Data sudah ada".to_string(),
            AppError::Store(StoreError::NotFound) => "Data tidak ditemukan".to_string(),
            AppError::Store(_) | AppError::Internal(_) => "Kesalahan internal".to_string(),
            other => other.to_string(),
        }
    }

    fn code(&self) -> &str {
        match self {
            AppError::Validation(_) => "invalid-argument",
            AppError::Rejected(rejection) => rejection.as_ref(),
            AppError::Unauthorized(_) => "unauthenticated",
            AppError::Forbidden(_) => "permission-denied",
            AppError::NotFound(_) | AppError::Store(StoreError::NotFound) => "not-found",
            AppError::Conflict(_) | AppError::Store(StoreError::AlreadyExists) => "already-exists",
            AppError::Store(_) | AppError::Internal(_) => "internal",
        }
    }
}

impl From<StoreError> for AppError {
    fn from(e: StoreError) -> Self {
        AppError::Store(e)
    }
}

impl From<Rejection> for AppError {
    fn from(r: Rejection) -> Self {
        AppError::Rejected(r)
    }
}

impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::Validation(_) | AppError::Rejected(_) => StatusCode::BAD_REQUEST,
            AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AppError::Forbidden(_) => StatusCode::FORBIDDEN,
            AppError::NotFound(_) | AppError::Store(StoreError::NotFound) => StatusCode::NOT_FOUND,
            AppError::Conflict(_) | AppError::Store(StoreError::AlreadyExists) => {
                StatusCode::CONFLICT
            }
            AppError::Store(_) | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code()).json(json!({
            "success": false,
            "error": self.user_message(),
            "code": self.code(),
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejections_are_bad_requests_with_reason_code() {
        let err = AppError::from(Rejection::AlreadySubmitted);
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(err.code(), "already-submitted");
        assert_eq!(err.user_message(), "Anda sudah mengisi absensi hari ini");
    }

    #[test]
    fn store_details_are_not_leaked() {
        let err = AppError::from(StoreError::Backend("connection refused".into()));
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(err.user_message(), "Kesalahan internal");
        assert!(err.to_string().contains("connection refused"));
    }

    #[test]
    fn conflicts_map_to_409() {
        assert_eq!(
            AppError::Conflict("Email sudah digunakan".into()).status_code(),
            StatusCode::CONFLICT
        );
        assert_eq!(
            AppError::from(StoreError::AlreadyExists).status_code(),
            StatusCode::CONFLICT
        );
    }
}
