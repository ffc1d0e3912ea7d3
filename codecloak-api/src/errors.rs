use actix_web::{error::ResponseError, http::StatusCode, HttpResponse};
use codecloak_core::ObfuscationError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Invalid request: {0}")]
    BadRequest(String),

    #[error("Request body exceeds {0} bytes")]
    PayloadTooLarge(usize),

    #[error("Unsupported language: {0}")]
    UnsupportedLanguage(String),

    #[error("Obfuscation failed")]
    ObfuscationFailed(String),

    #[error("Internal server error: {0}")]
    InternalError(String),
}

impl ApiError {
    fn details(&self) -> Option<&str> {
        match self {
            ApiError::ObfuscationFailed(details) => Some(details),
            _ => None,
        }
    }
}

impl From<ObfuscationError> for ApiError {
    fn from(err: ObfuscationError) -> Self {
        match err {
            ObfuscationError::UnsupportedLanguage(language) => {
                ApiError::UnsupportedLanguage(language)
            }
            other => ApiError::ObfuscationFailed(other.to_string()),
        }
    }
}

impl ResponseError for ApiError {
    fn error_response(&self) -> HttpResponse {
        let status = self.status_code();
        let mut body = serde_json::json!({ "error": self.to_string() });
        if let Some(details) = self.details() {
            body["details"] = serde_json::Value::from(details);
        }
        HttpResponse::build(status).json(body)
    }

    fn status_code(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::PayloadTooLarge(_) => StatusCode::PAYLOAD_TOO_LARGE,
            ApiError::UnsupportedLanguage(_) => StatusCode::BAD_REQUEST,
            ApiError::ObfuscationFailed(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::InternalError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use codecloak_core::Language;

    #[test]
    fn unsupported_language_is_a_client_error() {
        let err = ApiError::from(ObfuscationError::UnsupportedLanguage("go".into()));
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(err.to_string(), "Unsupported language: go");
    }

    #[test]
    fn transform_failures_carry_details() {
        let err = ApiError::from(ObfuscationError::TransformFailure {
            language: Language::Cpp,
            stage: "restore-macros",
            message: "macro placeholder 0 was lost before restoration".into(),
        });
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        assert!(err.details().unwrap().contains("restore-macros"));
    }

    #[test]
    fn missing_delegate_is_a_server_error() {
        let err = ApiError::from(ObfuscationError::DelegateUnavailable(Language::JavaScript));
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        assert!(err.details().unwrap().contains("JavaScript"));
    }
}
