//! Request extractors that resolve the current principal and enforce login.
//!
//! The session token is read from the session cookie, or from an
//! `Authorization: Bearer` header for API clients. A missing, forged or
//! expired token simply means "anonymous"; only the gates (`LoginRequired`,
//! the admin views) turn that into a denial.

use std::convert::Infallible;
use std::net::SocketAddr;

use axum::extract::{ConnectInfo, FromRequestParts};
use axum::http::request::Parts;
use axum::http::{header, HeaderMap};
use cookie::Cookie;
use tracing::debug;

use crate::auth::errors::AuthError;
use crate::auth::models::{AuthenticatedUser, HasRoles};
use crate::errors::AppError;
use crate::state::AppState;

/// The authenticated principal of the request, if any.
#[derive(Debug, Clone)]
pub struct Principal(pub Option<AuthenticatedUser>);

impl Principal {
    pub fn user(&self) -> Option<&AuthenticatedUser> {
        self.0.as_ref()
    }

    pub fn is_authenticated(&self) -> bool {
        self.0.is_some()
    }

    pub fn has_role(&self, name: &str) -> bool {
        self.0.as_ref().is_some_and(|user| user.has_role(name))
    }
}

impl FromRequestParts<AppState> for Principal {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        if let Some(cached) = parts.extensions.get::<Principal>() {
            return Ok(cached.clone());
        }

        let principal = match session_token(&parts.headers, state.auth.cookie_name()) {
            None => Principal(None),
            Some(token) => match state.auth.decode_session(&token) {
                Ok(claims) => Principal(state.auth.load_principal(&claims).await?),
                Err(e) => {
                    debug!(error = %e, "ignoring invalid session token");
                    Principal(None)
                }
            },
        };

        parts.extensions.insert(principal.clone());
        Ok(principal)
    }
}

/// Gate for pages that need a logged-in user; anonymous requests are
/// redirected to the login form.
#[derive(Debug, Clone)]
pub struct LoginRequired(pub AuthenticatedUser);

impl FromRequestParts<AppState> for LoginRequired {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        match Principal::from_request_parts(parts, state).await? {
            Principal(Some(user)) => Ok(LoginRequired(user)),
            Principal(None) => Err(AuthError::LoginRequired {
                next: parts.uri.path().to_string(),
            }
            .into()),
        }
    }
}

/// Source address of the request: first `X-Forwarded-For` hop, else the peer.
#[derive(Debug, Clone)]
pub struct ClientAddr(pub Option<String>);

impl<S> FromRequestParts<S> for ClientAddr
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let forwarded = parts
            .headers
            .get("x-forwarded-for")
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.split(',').next())
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .map(str::to_string);

        let addr = forwarded.or_else(|| {
            parts
                .extensions
                .get::<ConnectInfo<SocketAddr>>()
                .map(|ConnectInfo(addr)| addr.ip().to_string())
        });
        Ok(ClientAddr(addr))
    }
}

/// Extract the session token from the cookie or a Bearer header.
pub fn session_token(headers: &HeaderMap, cookie_name: &str) -> Option<String> {
    let from_cookie = headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(Cookie::split_parse)
        .filter_map(Result::ok)
        .find(|c| c.name() == cookie_name && !c.value_trimmed().is_empty())
        .map(|c| c.value_trimmed().to_string());

    from_cookie.or_else(|| {
        headers
            .get(header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.strip_prefix("Bearer "))
            .map(|v| v.trim().to_string())
    })
}
