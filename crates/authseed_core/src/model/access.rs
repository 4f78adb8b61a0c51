//! Access-control records: roles, permissions and protected resources.

use super::{now_epoch_ms, require_non_blank, EntityKind, EntityStatus, ModelValidationError};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub type RoleId = Uuid;
pub type PermissionId = Uuid;
pub type ResourceId = Uuid;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Role {
    pub id: RoleId,
    pub name: String,
    pub description: String,
    pub status: EntityStatus,
    pub created_at: i64,
    pub updated_at: i64,
}

impl Role {
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        let now = now_epoch_ms();
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            description: description.into(),
            status: EntityStatus::Active,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn validate(&self) -> Result<(), ModelValidationError> {
        require_non_blank(EntityKind::Role, "name", &self.name)
    }
}

/// A grantable capability, attached to roles, users or resources.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Permission {
    pub id: PermissionId,
    /// Natural key, e.g. `orgs:write`.
    pub name: String,
    pub description: String,
    pub status: EntityStatus,
    pub created_at: i64,
    pub updated_at: i64,
}

impl Permission {
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        let now = now_epoch_ms();
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            description: description.into(),
            status: EntityStatus::Active,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn validate(&self) -> Result<(), ModelValidationError> {
        require_non_blank(EntityKind::Permission, "name", &self.name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Resource {
    pub id: ResourceId,
    pub name: String,
    pub description: String,
    pub status: EntityStatus,
    pub created_at: i64,
    pub updated_at: i64,
}

impl Resource {
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        let now = now_epoch_ms();
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            description: description.into(),
            status: EntityStatus::Active,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn validate(&self) -> Result<(), ModelValidationError> {
        require_non_blank(EntityKind::Resource, "name", &self.name)
    }
}
