//! Error handling for the harvest rescue server
//!
//! Provides consistent error responses in English and Hindi

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use shared::EngineError;
use thiserror::Error;

/// Application error types
#[derive(Error, Debug)]
pub enum AppError {
    // Validation errors
    #[error("Validation error: {message}")]
    Validation {
        field: String,
        message: String,
        message_hi: String,
    },

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Resource not found: {0}")]
    NotFound(String),

    // Rescue radar errors
    #[error("Rescue lot already claimed: {0}")]
    AlreadyClaimed(String),

    #[error("Rescue lot expired: {0}")]
    RescueExpired(String),

    // External service errors
    #[error("AI grading service error: {0}")]
    AiGradingError(String),

    #[error("Configuration error: {0}")]
    Configuration(String),

    // Internal errors
    #[error("Internal server error")]
    InternalError(#[from] anyhow::Error),
}

impl From<EngineError> for AppError {
    fn from(err: EngineError) -> Self {
        match err {
            EngineError::NotFound { resource, key } => {
                AppError::NotFound(format!("{} '{}'", resource, key))
            }
            EngineError::InvalidInput { field, message } => AppError::Validation {
                message_hi: format!("अमान्य जानकारी ({}): {}", field, message),
                field,
                message,
            },
            EngineError::ConcurrencyConflict(msg) => AppError::AlreadyClaimed(msg),
            EngineError::Expired(msg) => AppError::RescueExpired(msg),
            EngineError::InvalidConfig(msg) => AppError::Configuration(msg),
            EngineError::GradingUnavailable(msg) => AppError::AiGradingError(msg),
        }
    }
}

impl From<validator::ValidationErrors> for AppError {
    fn from(errors: validator::ValidationErrors) -> Self {
        let field = errors
            .field_errors()
            .keys()
            .next()
            .map(|f| f.to_string())
            .unwrap_or_default();
        AppError::Validation {
            message: errors.to_string(),
            message_hi: format!("अमान्य जानकारी: {}", field),
            field,
        }
    }
}

/// Error response structure
#[derive(Serialize)]
pub struct ErrorResponse {
    pub error: ErrorDetail,
}

#[derive(Serialize)]
pub struct ErrorDetail {
    pub code: String,
    pub message_en: String,
    pub message_hi: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
}

impl AppError {
    fn status_and_detail(&self) -> (StatusCode, ErrorDetail) {
        match self {
            AppError::Validation {
                field,
                message,
                message_hi,
            } => (
                StatusCode::BAD_REQUEST,
                ErrorDetail {
                    code: "VALIDATION_ERROR".to_string(),
                    message_en: message.clone(),
                    message_hi: message_hi.clone(),
                    field: Some(field.clone()),
                },
            ),
            AppError::ValidationError(msg) => (
                StatusCode::BAD_REQUEST,
                ErrorDetail {
                    code: "VALIDATION_ERROR".to_string(),
                    message_en: msg.clone(),
                    message_hi: format!("अमान्य जानकारी: {}", msg),
                    field: None,
                },
            ),
            AppError::NotFound(resource) => (
                StatusCode::NOT_FOUND,
                ErrorDetail {
                    code: "NOT_FOUND".to_string(),
                    message_en: format!("{} not found", resource),
                    message_hi: format!("{} नहीं मिला", resource),
                    field: None,
                },
            ),
            AppError::AlreadyClaimed(msg) => (
                StatusCode::CONFLICT,
                ErrorDetail {
                    code: "ALREADY_CLAIMED".to_string(),
                    message_en: msg.clone(),
                    message_hi: "यह माल पहले ही किसी और खरीदार ने ले लिया है".to_string(),
                    field: None,
                },
            ),
            AppError::RescueExpired(msg) => (
                StatusCode::GONE,
                ErrorDetail {
                    code: "RESCUE_EXPIRED".to_string(),
                    message_en: msg.clone(),
                    message_hi: "इस माल की शेल्फ लाइफ समाप्त हो चुकी है".to_string(),
                    field: None,
                },
            ),
            AppError::AiGradingError(msg) => (
                StatusCode::BAD_GATEWAY,
                ErrorDetail {
                    code: "AI_GRADING_ERROR".to_string(),
                    message_en: format!("AI grading service error: {}", msg),
                    message_hi: format!("AI ग्रेडिंग सेवा में त्रुटि: {}", msg),
                    field: None,
                },
            ),
            AppError::Configuration(msg) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                ErrorDetail {
                    code: "CONFIGURATION_ERROR".to_string(),
                    message_en: format!("Configuration error: {}", msg),
                    message_hi: format!("सेटिंग में त्रुटि: {}", msg),
                    field: None,
                },
            ),
            AppError::InternalError(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                ErrorDetail {
                    code: "INTERNAL_ERROR".to_string(),
                    message_en: "An internal server error occurred".to_string(),
                    message_hi: "सर्वर में आंतरिक त्रुटि हुई".to_string(),
                    field: None,
                },
            ),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_detail) = self.status_and_detail();

        // Log the error for debugging
        tracing::error!("Error: {:?}", self);

        (status, Json(ErrorResponse { error: error_detail })).into_response()
    }
}

/// Result type alias for handlers
pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_engine_errors_map_to_statuses() {
        let cases = [
            (EngineError::crop_not_found("durian"), StatusCode::NOT_FOUND),
            (
                EngineError::invalid("total_quantity_kg", "must be positive"),
                StatusCode::BAD_REQUEST,
            ),
            (
                EngineError::ConcurrencyConflict("taken".to_string()),
                StatusCode::CONFLICT,
            ),
            (EngineError::Expired("late".to_string()), StatusCode::GONE),
            (
                EngineError::GradingUnavailable("down".to_string()),
                StatusCode::BAD_GATEWAY,
            ),
        ];
        for (engine_err, expected) in cases {
            let (status, _) = AppError::from(engine_err).status_and_detail();
            assert_eq!(status, expected);
        }
    }

    #[test]
    fn test_validation_keeps_field() {
        let err = AppError::from(EngineError::invalid("distance_km", "cannot be negative"));
        let (_, detail) = err.status_and_detail();
        assert_eq!(detail.code, "VALIDATION_ERROR");
        assert_eq!(detail.field.as_deref(), Some("distance_km"));
    }
}
