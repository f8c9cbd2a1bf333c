//! Response shapes of the administration API.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::database::models::{Role, User};

pub const DEFAULT_PAGE_SIZE: u32 = 20;
pub const MAX_PAGE_SIZE: u32 = 100;

/// A user as the admin views show it: no password hash, roles by name, login
/// tracking fields for display only.
#[derive(Debug, Clone, Serialize)]
pub struct UserView {
    pub id: i64,
    pub email: String,
    pub active: bool,
    pub confirmed_at: Option<DateTime<Utc>>,
    pub roles: Vec<String>,
    pub has_password: bool,
    pub last_login_at: Option<DateTime<Utc>>,
    pub current_login_at: Option<DateTime<Utc>>,
    pub last_login_ip: Option<String>,
    pub current_login_ip: Option<String>,
    pub login_count: i64,
}

impl UserView {
    pub fn new(user: User, roles: Vec<Role>) -> Self {
        Self {
            id: user.id,
            email: user.email,
            active: user.active,
            confirmed_at: user.confirmed_at,
            roles: roles.into_iter().map(|role| role.name).collect(),
            has_password: user.password.is_some_and(|hash| !hash.is_empty()),
            last_login_at: user.last_login_at,
            current_login_at: user.current_login_at,
            last_login_ip: user.last_login_ip,
            current_login_ip: user.current_login_ip,
            login_count: user.login_count,
        }
    }
}

#[derive(Debug, Clone, Copy, Deserialize)]
pub struct ListParams {
    #[serde(default = "first_page")]
    pub page: u32,
    #[serde(default = "default_page_size")]
    pub page_size: u32,
}

fn first_page() -> u32 {
    1
}

fn default_page_size() -> u32 {
    DEFAULT_PAGE_SIZE
}

impl Default for ListParams {
    fn default() -> Self {
        Self {
            page: first_page(),
            page_size: default_page_size(),
        }
    }
}

impl ListParams {
    /// Page and page size clamped to the accepted range.
    pub fn normalized(self) -> Self {
        Self {
            page: self.page.max(1),
            page_size: self.page_size.clamp(1, MAX_PAGE_SIZE),
        }
    }

    pub fn limit(&self) -> i64 {
        i64::from(self.page_size)
    }

    pub fn offset(&self) -> i64 {
        i64::from(self.page.saturating_sub(1)) * i64::from(self.page_size)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ListResponse<T> {
    pub items: Vec<T>,
    pub total: i64,
    pub page: u32,
    pub page_size: u32,
}

#[derive(Debug, Clone, Serialize)]
pub struct ViewLink {
    pub name: &'static str,
    pub label: &'static str,
    pub url: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct AdminIndexView {
    pub views: Vec<ViewLink>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn paging_is_clamped() {
        let params = ListParams {
            page: 0,
            page_size: 1000,
        }
        .normalized();
        assert_eq!(params.page, 1);
        assert_eq!(params.limit(), 100);
        assert_eq!(params.offset(), 0);

        let params = ListParams {
            page: 3,
            page_size: 0,
        }
        .normalized();
        assert_eq!(params.limit(), 1);
        assert_eq!(params.offset(), 2);

        let params = ListParams::default();
        assert_eq!((params.limit(), params.offset()), (20, 0));
    }

    #[test]
    fn user_view_hides_the_hash() {
        let user = User {
            id: 3,
            email: "admin".into(),
            password: Some("$argon2id$v=19$secret".into()),
            active: true,
            confirmed_at: None,
            last_login_at: None,
            current_login_at: None,
            last_login_ip: None,
            current_login_ip: Some("192.0.2.7".into()),
            login_count: 4,
        };
        let role = Role {
            id: 1,
            name: "admin".into(),
            description: None,
        };
        let json = serde_json::to_value(UserView::new(user, vec![role])).unwrap();
        assert_eq!(json["roles"], serde_json::json!(["admin"]));
        assert_eq!(json["has_password"], true);
        assert_eq!(json["login_count"], 4);
        assert!(json.get("password").is_none());
        assert!(!json.to_string().contains("argon2"));
    }
}
