//! Organization and team records.
//!
//! # Invariants
//! - A team always belongs to exactly one org.
//! - Team names are unique within their org, not globally.

use super::{now_epoch_ms, require_non_blank, EntityKind, EntityStatus, ModelValidationError};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub type OrgId = Uuid;
pub type TeamId = Uuid;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Org {
    pub id: OrgId,
    pub name: String,
    pub description: String,
    pub status: EntityStatus,
    pub created_at: i64,
    pub updated_at: i64,
}

impl Org {
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
        require_non_blank(EntityKind::Org, "name", &self.name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Team {
    pub id: TeamId,
    pub org_id: OrgId,
    pub name: String,
    pub description: String,
    pub status: EntityStatus,
    pub created_at: i64,
    pub updated_at: i64,
}

impl Team {
    pub fn new(org_id: OrgId, name: impl Into<String>, description: impl Into<String>) -> Self {
        let now = now_epoch_ms();
        Self {
            id: Uuid::new_v4(),
            org_id,
            name: name.into(),
            description: description.into(),
            status: EntityStatus::Active,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn validate(&self) -> Result<(), ModelValidationError> {
        require_non_blank(EntityKind::Team, "name", &self.name)?;
        if self.org_id.is_nil() {
            return Err(ModelValidationError::BlankField {
                kind: EntityKind::Team,
                field: "org_id",
            });
        }
        Ok(())
    }
}
