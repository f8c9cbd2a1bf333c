//! Custom error types specific to authentication failures.
//!
//! Each variant maps onto the response a browser or API client should see:
//! pages that need a login redirect to the login form, API calls get a 401 or
//! 403 JSON body.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Redirect, Response};
use axum::Json;
use thiserror::Error;

/// Path of the login form.
pub const LOGIN_PATH: &str = "/login";

#[derive(Error, Debug)]
pub enum AuthError {
    #[error("invalid email or password")]
    InvalidCredentials,

    #[error("account is disabled")]
    Inactive,

    #[error("authentication required")]
    Unauthenticated,

    #[error("login required to view {next}")]
    LoginRequired { next: String },

    #[error("permission denied: {0}")]
    PermissionDenied(String),

    #[error("session error: {0}")]
    Session(String),
}

impl AuthError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            AuthError::InvalidCredentials
            | AuthError::Inactive
            | AuthError::Unauthenticated
            | AuthError::Session(_) => StatusCode::UNAUTHORIZED,
            AuthError::LoginRequired { .. } => StatusCode::SEE_OTHER,
            AuthError::PermissionDenied(_) => StatusCode::FORBIDDEN,
        }
    }

    pub fn error_code(&self) -> &'static str {
        match self {
            AuthError::InvalidCredentials => "INVALID_CREDENTIALS",
            AuthError::Inactive => "ACCOUNT_DISABLED",
            AuthError::Unauthenticated | AuthError::LoginRequired { .. } => "UNAUTHENTICATED",
            AuthError::PermissionDenied(_) => "PERMISSION_DENIED",
            AuthError::Session(_) => "INVALID_SESSION",
        }
    }
}

/// Login URL that returns the user to `next` afterwards.
pub fn login_redirect_target(next: &str) -> String {
    format!("{LOGIN_PATH}?next={next}")
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        if let AuthError::LoginRequired { next } = &self {
            return Redirect::to(&login_redirect_target(next)).into_response();
        }
        let body = serde_json::json!({
            "code": self.error_code(),
            "message": self.to_string(),
        });
        (self.status_code(), Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn login_required_redirects() {
        let response = AuthError::LoginRequired {
            next: "/dashboard".to_string(),
        }
        .into_response();
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(
            response.headers().get("location").unwrap(),
            "/login?next=/dashboard"
        );
    }

    #[test]
    fn denial_statuses() {
        assert_eq!(
            AuthError::Unauthenticated.into_response().status(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            AuthError::PermissionDenied("admin".into()).into_response().status(),
            StatusCode::FORBIDDEN
        );
    }
}
