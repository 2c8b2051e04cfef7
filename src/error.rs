use actix_web::{HttpResponse, ResponseError, http::StatusCode};
use derive_more::Display;
use serde_json::json;

/// Request-level failure taxonomy. Authentication and authorization
/// rejections are produced by the gate middleware and the role guards;
/// the rest come out of the handlers and the store.
#[derive(Debug, Display)]
pub enum ApiError {
    #[display(fmt = "No token, authorization denied")]
    Unauthenticated,

    #[display(fmt = "Token is not valid")]
    InvalidToken,

    #[display(fmt = "Token is not valid, user not found")]
    AccountNotFound,

    #[display(fmt = "Your account is suspended.")]
    AccountSuspended,

    #[display(fmt = "Your account is pending approval.")]
    AccountPending,

    #[display(fmt = "{}", _0)]
    Forbidden(&'static str),

    #[display(fmt = "{}", _0)]
    NotFound(&'static str),

    #[display(fmt = "{}", _0)]
    Validation(String),

    #[display(fmt = "{}", _0)]
    Duplicate(&'static str),

    #[display(fmt = "database error: {}", _0)]
    Store(sqlx::Error),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Unauthenticated | ApiError::InvalidToken | ApiError::AccountNotFound => {
                StatusCode::UNAUTHORIZED
            }
            ApiError::AccountSuspended | ApiError::AccountPending | ApiError::Forbidden(_) => {
                StatusCode::FORBIDDEN
            }
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Validation(_) | ApiError::Duplicate(_) => StatusCode::BAD_REQUEST,
            ApiError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl ResponseError for ApiError {
    fn status_code(&self) -> StatusCode {
        self.status()
    }

    fn error_response(&self) -> HttpResponse {
        // Store failures stay opaque; the detail goes to the log only.
        let msg = match self {
            ApiError::Store(e) => {
                tracing::error!(error = %e, "database error");
                "Server Error".to_string()
            }
            other => other.to_string(),
        };

        HttpResponse::build(self.status()).json(json!({ "error": msg }))
    }
}

impl From<sqlx::Error> for ApiError {
    fn from(e: sqlx::Error) -> Self {
        ApiError::Store(e)
    }
}

/// MySQL reports unique-key violations under SQLSTATE 23000.
pub fn is_duplicate(err: &sqlx::Error) -> bool {
    if let sqlx::Error::Database(db_err) = err {
        return db_err.code().as_deref() == Some("23000");
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn auth_failures_map_to_401() {
        assert_eq!(ApiError::Unauthenticated.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(ApiError::InvalidToken.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(ApiError::AccountNotFound.status(), StatusCode::UNAUTHORIZED);
    }

    #[test]
    fn blocked_accounts_map_to_403() {
        assert_eq!(ApiError::AccountSuspended.status(), StatusCode::FORBIDDEN);
        assert_eq!(ApiError::AccountPending.status(), StatusCode::FORBIDDEN);
        assert_eq!(
            ApiError::Forbidden("Access denied").status(),
            StatusCode::FORBIDDEN
        );
    }

    #[test]
    fn user_errors_map_to_4xx() {
        assert_eq!(
            ApiError::NotFound("Course not found").status(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            ApiError::Validation("bad field".into()).status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ApiError::Duplicate("already exists").status(),
            StatusCode::BAD_REQUEST
        );
    }

    #[test]
    fn store_errors_stay_opaque() {
        let err = ApiError::Store(sqlx::Error::RowNotFound);
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let resp = err.error_response();
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
