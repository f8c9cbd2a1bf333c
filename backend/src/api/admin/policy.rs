//! Access rule of the administration views.
//!
//! Every model view answers one question, `is_accessible`, against the
//! current principal. The `Accessible` extractor asks it before any handler
//! body runs: anonymous requests are told to authenticate (401), signed-in
//! users without the admin role are refused (403).

use std::marker::PhantomData;

use axum::extract::FromRequestParts;
use axum::http::request::Parts;

use crate::auth::errors::AuthError;
use crate::auth::middleware::Principal;
use crate::auth::models::{AuthenticatedUser, ADMIN_ROLE};
use crate::errors::AppError;
use crate::state::AppState;

pub trait ModelView {
    /// Path segment under `/admin`.
    const NAME: &'static str;
    const LABEL: &'static str;

    fn is_accessible(principal: &Principal) -> bool {
        principal.user().is_some_and(AuthenticatedUser::is_admin)
    }

    fn guard(principal: &Principal) -> Result<(), AuthError> {
        if !principal.is_authenticated() {
            return Err(AuthError::Unauthenticated);
        }
        if !Self::is_accessible(principal) {
            return Err(AuthError::PermissionDenied(format!(
                "the {} view requires the {ADMIN_ROLE} role",
                Self::NAME
            )));
        }
        Ok(())
    }
}

/// The `/admin/` landing view.
pub struct AdminIndex;

impl ModelView for AdminIndex {
    const NAME: &'static str = "index";
    const LABEL: &'static str = "Home";
}

pub struct UserAdmin;

impl ModelView for UserAdmin {
    const NAME: &'static str = "user";
    const LABEL: &'static str = "Users";
}

pub struct RoleAdmin;

impl ModelView for RoleAdmin {
    const NAME: &'static str = "role";
    const LABEL: &'static str = "Roles";
}

/// A principal that passed `V`'s access rule.
pub struct Accessible<V> {
    pub user: AuthenticatedUser,
    view: PhantomData<fn() -> V>,
}

impl<V> FromRequestParts<AppState> for Accessible<V>
where
    V: ModelView,
{
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let principal = Principal::from_request_parts(parts, state).await?;
        if let Err(e) = V::guard(&principal) {
            tracing::info!(
                view = V::NAME,
                path = %parts.uri.path(),
                error = %e,
                "admin access denied"
            );
            return Err(e.into());
        }
        match principal.0 {
            Some(user) => Ok(Accessible {
                user,
                view: PhantomData,
            }),
            None => Err(AuthError::Unauthenticated.into()),
        }
    }
}
