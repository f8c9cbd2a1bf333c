//! Handler functions for authentication-related endpoints.
//!
//! These functions serve the login form, check submitted credentials through
//! `auth::service`, set or clear the session cookie and redirect the browser.

use axum::extract::{Query, State};
use axum::http::{header, StatusCode};
use axum::response::{Html, IntoResponse, Redirect, Response};
use axum::Form;

use crate::auth::errors::AuthError;
use crate::auth::middleware::{ClientAddr, Principal};
use crate::auth::models::{LoginForm, LoginQuery};
use crate::errors::AppError;
use crate::state::AppState;
use crate::utils::{local_redirect, render};

const LOGIN_TEMPLATE: &str = include_str!("../../templates/login.html");

fn login_page(error: &str, next: &str, email: &str) -> Html<String> {
    Html(render(
        LOGIN_TEMPLATE,
        &[("error", error), ("next", next), ("email", email)],
    ))
}

/// `GET /login`
pub async fn show_login(principal: Principal, Query(query): Query<LoginQuery>) -> Response {
    let next = query.next.as_deref();
    if principal.is_authenticated() {
        return Redirect::to(local_redirect(next)).into_response();
    }
    login_page("", next.unwrap_or(""), "").into_response()
}

/// `POST /login`
pub async fn login(
    State(state): State<AppState>,
    ClientAddr(client_ip): ClientAddr,
    Form(form): Form<LoginForm>,
) -> Result<Response, AppError> {
    let next = form.next.as_deref();
    match state
        .auth
        .authenticate(&form.email, &form.password, client_ip.as_deref())
        .await
    {
        Ok(user) => {
            let token = state.auth.issue_session(&user)?;
            let cookie = state.auth.session_cookie(&token).to_string();
            Ok((
                [(header::SET_COOKIE, cookie)],
                Redirect::to(local_redirect(next)),
            )
                .into_response())
        }
        Err(AppError::Auth(e @ (AuthError::InvalidCredentials | AuthError::Inactive))) => Ok((
            StatusCode::UNAUTHORIZED,
            login_page(&e.to_string(), next.unwrap_or(""), &form.email),
        )
            .into_response()),
        Err(e) => Err(e),
    }
}

/// `GET /logout`
pub async fn logout(State(state): State<AppState>, principal: Principal) -> Response {
    if let Some(user) = principal.user() {
        tracing::info!(user_id = user.user.id, "logged out");
    }
    (
        [(header::SET_COOKIE, state.auth.clear_session_cookie().to_string())],
        Redirect::to("/"),
    )
        .into_response()
}
