//! Edit forms of the administration views.
//!
//! Each form is declared statically: the field list served by
//! `GET /admin/<view>/form` and the body accepted by create and edit are the
//! same struct. The user form never accepts a password hash; it takes an
//! optional plaintext `new_password` that is hashed on save.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::errors::AppError;

pub const EMAIL_MAX_LEN: usize = 255;
pub const ROLE_NAME_MAX_LEN: usize = 80;
pub const ROLE_DESCRIPTION_MAX_LEN: usize = 255;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldKind {
    Text,
    TextArea,
    Checkbox,
    DateTime,
    MultiSelect,
    Password,
}

#[derive(Debug, Clone, Serialize)]
pub struct FormField {
    pub name: &'static str,
    pub label: &'static str,
    pub kind: FieldKind,
    pub required: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_length: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub choices: Option<Vec<String>>,
}

impl FormField {
    fn new(name: &'static str, label: &'static str, kind: FieldKind) -> Self {
        Self {
            name,
            label,
            kind,
            required: false,
            max_length: None,
            choices: None,
        }
    }

    fn required(mut self) -> Self {
        self.required = true;
        self
    }

    fn max_length(mut self, max: usize) -> Self {
        self.max_length = Some(max);
        self
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct FormSchema {
    pub view: &'static str,
    pub fields: Vec<FormField>,
}

fn default_active() -> bool {
    true
}

/// Body of `POST /admin/user` and `PUT /admin/user/{id}`.
#[derive(Debug, Clone, Deserialize)]
pub struct UserForm {
    pub email: String,
    #[serde(default = "default_active")]
    pub active: bool,
    #[serde(default)]
    pub confirmed_at: Option<DateTime<Utc>>,
    /// Role names.
    #[serde(default)]
    pub roles: Vec<String>,
    #[serde(default)]
    pub new_password: Option<String>,
}

impl UserForm {
    pub fn schema(role_choices: Vec<String>) -> FormSchema {
        let mut roles = FormField::new("roles", "Roles", FieldKind::MultiSelect);
        roles.choices = Some(role_choices);
        FormSchema {
            view: "user",
            fields: vec![
                FormField::new("email", "Email", FieldKind::Text)
                    .required()
                    .max_length(EMAIL_MAX_LEN),
                FormField::new("active", "Active", FieldKind::Checkbox),
                FormField::new("confirmed_at", "Confirmed At", FieldKind::DateTime),
                roles,
                FormField::new("new_password", "New Password", FieldKind::Password),
            ],
        }
    }

    /// Trim and check the submitted values.
    pub fn validate(mut self) -> Result<Self, AppError> {
        self.email = self.email.trim().to_string();
        if self.email.is_empty() {
            return Err(AppError::Validation("email must not be empty".into()));
        }
        if self.email.chars().count() > EMAIL_MAX_LEN {
            return Err(AppError::Validation(format!(
                "email must be at most {EMAIL_MAX_LEN} characters"
            )));
        }
        let mut roles: Vec<String> = self
            .roles
            .iter()
            .map(|name| name.trim().to_string())
            .filter(|name| !name.is_empty())
            .collect();
        roles.sort();
        roles.dedup();
        self.roles = roles;
        Ok(self)
    }

    /// The password to hash on save. Empty means "keep the current one".
    pub fn new_password(&self) -> Option<&str> {
        self.new_password.as_deref().filter(|p| !p.is_empty())
    }
}

/// Body of `POST /admin/role` and `PUT /admin/role/{id}`.
#[derive(Debug, Clone, Deserialize)]
pub struct RoleForm {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
}

impl RoleForm {
    pub fn schema() -> FormSchema {
        FormSchema {
            view: "role",
            fields: vec![
                FormField::new("name", "Name", FieldKind::Text)
                    .required()
                    .max_length(ROLE_NAME_MAX_LEN),
                FormField::new("description", "Description", FieldKind::TextArea)
                    .max_length(ROLE_DESCRIPTION_MAX_LEN),
            ],
        }
    }

    pub fn validate(mut self) -> Result<Self, AppError> {
        self.name = self.name.trim().to_string();
        if self.name.is_empty() {
            return Err(AppError::Validation("name must not be empty".into()));
        }
        if self.name.chars().count() > ROLE_NAME_MAX_LEN {
            return Err(AppError::Validation(format!(
                "name must be at most {ROLE_NAME_MAX_LEN} characters"
            )));
        }
        self.description = self.description.filter(|d| !d.trim().is_empty());
        if let Some(description) = &self.description {
            if description.chars().count() > ROLE_DESCRIPTION_MAX_LEN {
                return Err(AppError::Validation(format!(
                    "description must be at most {ROLE_DESCRIPTION_MAX_LEN} characters"
                )));
            }
        }
        Ok(self)
    }
}
