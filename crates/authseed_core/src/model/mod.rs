//! Auth domain model: identities, organizations and access-control records.
//!
//! # Responsibility
//! - Define the records created by seeding and read back by callers.
//! - Keep field validation next to the data it guards.
//!
//! # Invariants
//! - Every entity is identified by a generated `Uuid`, never by its seed ref.
//! - `created_at`/`updated_at` are Unix epoch milliseconds.

use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};

pub mod access;
pub mod org;
pub mod user;

/// Entity kinds that can be created by seeding and referenced by name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum EntityKind {
    User,
    Org,
    Team,
    Role,
    Permission,
    Resource,
}

impl EntityKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Org => "org",
            Self::Team => "team",
            Self::Role => "role",
            Self::Permission => "permission",
            Self::Resource => "resource",
        }
    }
}

impl Display for EntityKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Lifecycle state shared by every auth entity.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityStatus {
    #[default]
    Active,
    Inactive,
    Suspended,
}

impl EntityStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Inactive => "inactive",
            Self::Suspended => "suspended",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "active" => Some(Self::Active),
            "inactive" => Some(Self::Inactive),
            "suspended" => Some(Self::Suspended),
            _ => None,
        }
    }
}

/// Field-level validation failure for an auth entity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModelValidationError {
    BlankField {
        kind: EntityKind,
        field: &'static str,
    },
    InvalidEmail(String),
    InvalidUsername(String),
}

impl Display for ModelValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::BlankField { kind, field } => write!(f, "{kind} {field} must not be blank"),
            Self::InvalidEmail(value) => write!(f, "invalid email address `{value}`"),
            Self::InvalidUsername(value) => {
                write!(f, "invalid username `{value}`; whitespace is not allowed")
            }
        }
    }
}

impl Error for ModelValidationError {}

/// Current wall clock as Unix epoch milliseconds.
pub fn now_epoch_ms() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

pub(crate) fn require_non_blank(
    kind: EntityKind,
    field: &'static str,
    value: &str,
) -> Result<(), ModelValidationError> {
    if value.trim().is_empty() {
        return Err(ModelValidationError::BlankField { kind, field });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::{EntityKind, EntityStatus};

    #[test]
    fn status_round_trips_through_storage_names() {
        for status in [
            EntityStatus::Active,
            EntityStatus::Inactive,
            EntityStatus::Suspended,
        ] {
            assert_eq!(EntityStatus::parse(status.as_str()), Some(status));
        }
        assert_eq!(EntityStatus::parse("deleted"), None);
    }

    #[test]
    fn entity_kind_display_is_lowercase() {
        assert_eq!(EntityKind::Permission.to_string(), "permission");
    }
}
