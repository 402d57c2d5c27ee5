use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};
use sea_orm::DbErr;
use serde_json::json;
use thiserror::Error;

pub type AppResult<T> = Result<T, AppError>;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Database error: {0}")]
    DatabaseError(#[from] DbErr),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Auth error: {0}")]
    AuthError(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Permission denied")]
    PermissionDenied,

    #[error("Insufficient balance")]
    InsufficientBalance,

    #[error("Insufficient miles")]
    InsufficientMiles,

    #[error("Insufficient stock")]
    InsufficientStock,

    #[error("Pack is not active")]
    PackNotActive,

    #[error("Per-user draw limit exceeded")]
    PerUserLimitExceeded,

    #[error("Terms acceptance required")]
    ConsentRequired,

    #[error("Too many requests: {0}")]
    RateLimited(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Config version {0} not found")]
    VersionNotFound(i32),

    #[error("External API error: {0}")]
    ExternalApiError(String),

    #[error("Internal server error: {0}")]
    InternalError(String),

    #[error("JWT error: {0}")]
    JwtError(#[from] jsonwebtoken::errors::Error),

    #[error("HTTP request error: {0}")]
    ReqwestError(#[from] reqwest::Error),

    #[error("JSON serialization/deserialization error: {0}")]
    SerdeJsonError(#[from] serde_json::Error),
}

impl AppError {
    /// Stable machine-readable code returned to callers
    pub fn code(&self) -> &'static str {
        match self {
            AppError::ValidationError(_) => "VALIDATION_ERROR",
            AppError::AuthError(_) | AppError::JwtError(_) => "AUTH_ERROR",
            AppError::NotFound(_) => "NOT_FOUND",
            AppError::PermissionDenied => "FORBIDDEN",
            AppError::InsufficientBalance => "INSUFFICIENT_BALANCE",
            AppError::InsufficientMiles => "INSUFFICIENT_MILES",
            AppError::InsufficientStock => "INSUFFICIENT_STOCK",
            AppError::PackNotActive => "PACK_NOT_ACTIVE",
            AppError::PerUserLimitExceeded => "PER_USER_LIMIT_EXCEEDED",
            AppError::ConsentRequired => "CONSENT_REQUIRED",
            AppError::RateLimited(_) => "RATE_LIMITED",
            AppError::Conflict(_) => "CONFLICT",
            AppError::VersionNotFound(_) => "VERSION_NOT_FOUND",
            AppError::ExternalApiError(_) => "EXTERNAL_API_ERROR",
            AppError::DatabaseError(_) => "DATABASE_ERROR",
            AppError::InternalError(_)
            | AppError::ReqwestError(_)
            | AppError::SerdeJsonError(_) => "INTERNAL_ERROR",
        }
    }
}

impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::ValidationError(_) => StatusCode::BAD_REQUEST,
            AppError::AuthError(_) | AppError::JwtError(_) => StatusCode::UNAUTHORIZED,
            AppError::NotFound(_) | AppError::VersionNotFound(_) => StatusCode::NOT_FOUND,
            AppError::PermissionDenied | AppError::ConsentRequired => StatusCode::FORBIDDEN,
            AppError::InsufficientBalance
            | AppError::InsufficientMiles
            | AppError::InsufficientStock
            | AppError::PackNotActive
            | AppError::PerUserLimitExceeded
            | AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::RateLimited(_) => StatusCode::TOO_MANY_REQUESTS,
            AppError::ExternalApiError(_) => StatusCode::BAD_GATEWAY,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let message = match self {
            AppError::ValidationError(msg)
            | AppError::AuthError(msg)
            | AppError::NotFound(msg)
            | AppError::RateLimited(msg)
            | AppError::Conflict(msg) => {
                log::warn!("{}: {msg}", self.code());
                msg.clone()
            }
            AppError::JwtError(_) => {
                log::warn!("JWT error: {self}");
                "Invalid access token".to_string()
            }
            AppError::ExternalApiError(msg) => {
                log::error!("External API error: {msg}");
                "External service unavailable".to_string()
            }
            AppError::DatabaseError(err) => {
                log::error!("Database error: {err}");
                "Database error".to_string()
            }
            AppError::InternalError(_)
            | AppError::ReqwestError(_)
            | AppError::SerdeJsonError(_) => {
                log::error!("Internal error: {self}");
                "Internal server error".to_string()
            }
            // state conflicts carry no internal detail
            _ => self.to_string(),
        };

        HttpResponse::build(self.status_code()).json(json!({
            "success": false,
            "error": {
                "code": self.code(),
                "message": message
            }
        }))
    }
}
