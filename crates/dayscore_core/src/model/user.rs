//! User identity model.
//!
//! Credentials and login live outside this crate; a user here is only the
//! owner of records and a row on the ranking board.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Storage-assigned user identifier.
pub type UserId = i64;

static EMAIL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").expect("valid email regex"));

/// Validation failures for new users.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UserValidationError {
    EmptyUsername,
    InvalidEmail(String),
}

impl Display for UserValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyUsername => write!(f, "username cannot be empty"),
            Self::InvalidEmail(value) => write!(f, "invalid email address: `{value}`"),
        }
    }
}

impl Error for UserValidationError {}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub username: String,
    pub email: String,
    pub created_at: i64,
}

/// Input for registering a user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewUser {
    pub username: String,
    pub email: String,
}

impl NewUser {
    /// Trims both fields and lowercases the email.
    pub fn new(username: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            username: username.into().trim().to_string(),
            email: email.into().trim().to_ascii_lowercase(),
        }
    }

    pub fn validate(&self) -> Result<(), UserValidationError> {
        if self.username.is_empty() {
            return Err(UserValidationError::EmptyUsername);
        }
        if !EMAIL_RE.is_match(&self.email) {
            return Err(UserValidationError::InvalidEmail(self.email.clone()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::{NewUser, UserValidationError};

    #[test]
    fn new_user_normalizes_fields() {
        let user = NewUser::new("  hana ", " Hana@Example.COM ");
        assert_eq!(user.username, "hana");
        assert_eq!(user.email, "hana@example.com");
        assert!(user.validate().is_ok());
    }

    #[test]
    fn validate_rejects_blank_username_and_bad_email() {
        assert_eq!(
            NewUser::new("   ", "a@b.jp").validate(),
            Err(UserValidationError::EmptyUsername)
        );
        assert_eq!(
            NewUser::new("taro", "taro-at-example").validate(),
            Err(UserValidationError::InvalidEmail("taro-at-example".to_string()))
        );
    }
}
