//! Handler functions for the landing page and the dashboard.

use axum::response::Html;

use crate::auth::middleware::{LoginRequired, Principal};
use crate::auth::models::HasRoles;
use crate::utils::render;

const INDEX_TEMPLATE: &str = include_str!("../../../templates/index.html");
const DASHBOARD_TEMPLATE: &str = include_str!("../../../templates/dashboard.html");

/// `GET /`
pub async fn index(principal: Principal) -> Html<String> {
    let page = match principal.user() {
        Some(current) => render(
            INDEX_TEMPLATE,
            &[
                ("greeting", format!("Signed in as {}.", current.user.email).as_str()),
                ("session_link", "/logout"),
                ("session_label", "Sign out"),
            ],
        ),
        None => render(
            INDEX_TEMPLATE,
            &[
                ("greeting", "Welcome to Warden."),
                ("session_link", "/login"),
                ("session_label", "Sign in"),
            ],
        ),
    };
    Html(page)
}

/// `GET /dashboard`
pub async fn dashboard(LoginRequired(current): LoginRequired) -> Html<String> {
    let roles = current.role_names();
    let roles = if roles.is_empty() {
        "none".to_string()
    } else {
        roles.join(", ")
    };
    Html(render(
        DASHBOARD_TEMPLATE,
        &[("email", current.user.email.as_str()), ("roles", roles.as_str())],
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::models::AuthenticatedUser;
    use crate::database::models::{Role, User};

    fn signed_in(email: &str, roles: &[&str]) -> AuthenticatedUser {
        AuthenticatedUser {
            user: User {
                id: 1,
                email: email.to_string(),
                password: None,
                active: true,
                confirmed_at: None,
                last_login_at: None,
                current_login_at: None,
                last_login_ip: None,
                current_login_ip: None,
                login_count: 1,
            },
            roles: roles
                .iter()
                .map(|name| Role {
                    id: 1,
                    name: name.to_string(),
                    description: None,
                })
                .collect(),
        }
    }

    #[tokio::test]
    async fn index_offers_sign_in_to_anonymous_visitors() {
        let Html(page) = index(Principal(None)).await;
        assert!(page.contains("href=\"/login\""));
        assert!(page.contains("Welcome to Warden."));
    }

    #[tokio::test]
    async fn index_greets_the_principal() {
        let Html(page) = index(Principal(Some(signed_in("<admin>", &[])))).await;
        assert!(page.contains("Signed in as &lt;admin&gt;."));
        assert!(page.contains("href=\"/logout\""));
    }

    #[tokio::test]
    async fn dashboard_lists_roles() {
        let Html(page) = dashboard(LoginRequired(signed_in("admin", &["admin", "end-user"]))).await;
        assert!(page.contains("<strong>admin</strong>"));
        assert!(page.contains("Roles: admin, end-user"));
    }
}
