use actix_web::{http::StatusCode, HttpResponse, ResponseError};
use serde_json::json;
use thiserror::Error;
use tracing::error;

use crate::auth::AuthError;
use crate::db::StoreError;

/// Errors a handler can return. Rendered as `{"success": false, "error": "..."}`.
#[derive(Error, Debug)]
pub enum ApiError {
    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    Unauthorized(String),

    #[error("{0}")]
    Forbidden(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Internal(String),
}

impl ResponseError for ApiError {
    fn status_code(&self) -> StatusCode {
        match self {
            ApiError::Validation(_) => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden(_) => StatusCode::FORBIDDEN,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code()).json(json!({
            "success": false,
            "error": self.to_string(),
        }))
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::UserExists => ApiError::Validation(err.to_string()),
            StoreError::InvalidCredentials => ApiError::Unauthorized(err.to_string()),
            StoreError::ReviewNotFound => ApiError::NotFound(err.to_string()),
            StoreError::NotReviewOwner => ApiError::Forbidden(err.to_string()),
            StoreError::Corrupt { .. }
            | StoreError::Io(_)
            | StoreError::Json(_)
            | StoreError::Hash(_)
            | StoreError::Task(_) => {
                error!("Storage failure: {err}");
                ApiError::Internal(err.to_string())
            }
        }
    }
}

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::MissingToken
            | AuthError::Malformed
            | AuthError::BadSignature
            | AuthError::Expired => ApiError::Unauthorized(err.to_string()),
            AuthError::Encode(_) => {
                error!("Token signing failure: {err}");
                ApiError::Internal(err.to_string())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::body::to_bytes;

    #[actix_web::test]
    async fn test_error_envelope() {
        let err = ApiError::NotFound("Book not found".into());
        assert_eq!(err.status_code(), StatusCode::NOT_FOUND);

        let body = to_bytes(err.error_response().into_body()).await.unwrap();
        let body: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(body, json!({"success": false, "error": "Book not found"}));
    }

    #[test]
    fn test_store_error_mapping() {
        let status = |err: StoreError| ApiError::from(err).status_code();

        assert_eq!(status(StoreError::UserExists), StatusCode::BAD_REQUEST);
        assert_eq!(status(StoreError::InvalidCredentials), StatusCode::UNAUTHORIZED);
        assert_eq!(status(StoreError::ReviewNotFound), StatusCode::NOT_FOUND);
        assert_eq!(status(StoreError::NotReviewOwner), StatusCode::FORBIDDEN);
        assert_eq!(
            status(StoreError::Io(std::io::Error::other("disk gone"))),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            status(StoreError::Corrupt {
                file: "reviews.json",
                reason: "bad record".into(),
            }),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_auth_error_mapping() {
        assert_eq!(
            ApiError::from(AuthError::Expired).status_code(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            ApiError::from(AuthError::MissingToken).to_string(),
            "Access token required"
        );
    }
}
