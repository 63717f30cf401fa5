use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub const MIN_USERNAME_LEN: usize = 3;
pub const MIN_PASSWORD_LEN: usize = 8;

/// Session claims carried in the signed session cookie.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: Uuid,
    pub username: String,
    pub exp: usize,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CredentialsForm {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
}

/// Per-field messages shown next to the form inputs.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FieldErrors(BTreeMap<&'static str, String>);

impl FieldErrors {
    /// Collects unmet requirements as "Should have at least 8 characters, one number".
    pub fn require(&mut self, field: &'static str, requirement: &str) {
        self.0
            .entry(field)
            .and_modify(|msg| {
                msg.push_str(", ");
                msg.push_str(requirement);
            })
            .or_insert_with(|| format!("Should have at least {requirement}"));
    }

    pub fn set(&mut self, field: &'static str, message: impl Into<String>) {
        self.0.insert(field, message.into());
    }

    pub fn get(&self, field: &str) -> Option<&str> {
        self.0.get(field).map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl CredentialsForm {
    pub fn validate_sign_up(&self) -> Result<(), FieldErrors> {
        let mut errors = FieldErrors::default();

        if self.username.chars().count() < MIN_USERNAME_LEN {
            errors.require("username", "3 characters");
        }

        let password = &self.password;
        if password.chars().count() < MIN_PASSWORD_LEN {
            errors.require("password", "8 characters");
        }
        if !password.chars().any(|c| c.is_ascii_digit()) {
            errors.require("password", "one number");
        }
        if !password.chars().any(|c| c.is_ascii_lowercase()) {
            errors.require("password", "one lowercase letter");
        }
        if !password.chars().any(|c| c.is_ascii_uppercase()) {
            errors.require("password", "one uppercase letter");
        }

        if errors.is_empty() { Ok(()) } else { Err(errors) }
    }

    pub fn validate_sign_in(&self) -> Result<(), FieldErrors> {
        let mut errors = FieldErrors::default();
        if self.username.is_empty() {
            errors.require("username", "1 character");
        }
        if self.password.is_empty() {
            errors.require("password", "1 character");
        }
        if errors.is_empty() { Ok(()) } else { Err(errors) }
    }
}
