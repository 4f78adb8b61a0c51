//! User identity record.

use super::{now_epoch_ms, require_non_blank, EntityKind, EntityStatus, ModelValidationError};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub type UserId = Uuid;

static EMAIL_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").expect("valid email regex")
});

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    /// Natural key; unique across the store.
    pub username: String,
    /// Natural key; unique across the store.
    pub email: String,
    /// Display name.
    pub name: String,
    pub status: EntityStatus,
    pub created_at: i64,
    pub updated_at: i64,
}

impl User {
    /// Creates an active user with a generated id and fresh timestamps.
    pub fn new(
        username: impl Into<String>,
        email: impl Into<String>,
        name: impl Into<String>,
    ) -> Self {
        let now = now_epoch_ms();
        Self {
            id: Uuid::new_v4(),
            username: username.into(),
            email: email.into(),
            name: name.into(),
            status: EntityStatus::Active,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn validate(&self) -> Result<(), ModelValidationError> {
        require_non_blank(EntityKind::User, "username", &self.username)?;
        if self.username.chars().any(char::is_whitespace) {
            return Err(ModelValidationError::InvalidUsername(self.username.clone()));
        }
        require_non_blank(EntityKind::User, "name", &self.name)?;
        if !EMAIL_PATTERN.is_match(&self.email) {
            return Err(ModelValidationError::InvalidEmail(self.email.clone()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::User;
    use crate::model::ModelValidationError;

    #[test]
    fn new_user_is_valid_and_active() {
        let user = User::new("admin", "admin@example.com", "Admin");
        assert!(user.validate().is_ok());
        assert_eq!(user.created_at, user.updated_at);
    }

    #[test]
    fn rejects_malformed_email() {
        let user = User::new("admin", "admin.example.com", "Admin");
        assert_eq!(
            user.validate(),
            Err(ModelValidationError::InvalidEmail(
                "admin.example.com".to_string()
            ))
        );
    }

    #[test]
    fn rejects_username_with_whitespace() {
        let user = User::new("ad min", "admin@example.com", "Admin");
        assert!(matches!(
            user.validate(),
            Err(ModelValidationError::InvalidUsername(_))
        ));
    }
}
