//! Seed document shape and parsing.
//!
//! # Responsibility
//! - Deserialize one raw seed document into typed entity and link lists.
//!
//! # Invariants
//! - Parsing is all-or-nothing; a document with any malformed part is rejected.
//! - Unknown keys are rejected so that misspelled sections do not vanish silently.
//! - `ref` values are document-scoped handles and are never persisted.

use crate::model::{EntityKind, EntityStatus};
use serde::Deserialize;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Seed document body failed to deserialize.
#[derive(Debug)]
pub struct ParseError(serde_json::Error);

impl ParseError {
    /// 1-based line of the failure inside the document.
    pub fn line(&self) -> usize {
        self.0.line()
    }
}

impl Display for ParseError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "malformed seed document: {}", self.0)
    }
}

impl Error for ParseError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        Some(&self.0)
    }
}

/// Typed aggregate of one seed document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SeedDocument {
    pub users: Vec<UserSeed>,
    pub orgs: Vec<NamedSeed>,
    pub teams: Vec<TeamSeed>,
    pub roles: Vec<NamedSeed>,
    pub permissions: Vec<NamedSeed>,
    pub resources: Vec<NamedSeed>,
    pub user_roles: Vec<UserRoleLink>,
    pub role_permissions: Vec<RolePermissionLink>,
    pub user_permissions: Vec<UserPermissionLink>,
    pub resource_permissions: Vec<ResourcePermissionLink>,
    pub org_owners: Vec<OrgOwnerLink>,
}

impl SeedDocument {
    /// Parses a whole document from raw bytes.
    pub fn parse(content: &[u8]) -> Result<Self, ParseError> {
        serde_json::from_slice(content).map_err(ParseError)
    }

    /// Total number of entity and link entries.
    pub fn entry_count(&self) -> usize {
        self.users.len()
            + self.orgs.len()
            + self.teams.len()
            + self.roles.len()
            + self.permissions.len()
            + self.resources.len()
            + self.user_roles.len()
            + self.role_permissions.len()
            + self.user_permissions.len()
            + self.resource_permissions.len()
            + self.org_owners.len()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UserSeed {
    #[serde(rename = "ref", alias = "Ref")]
    pub reference: String,
    pub username: String,
    pub email: String,
    /// Display name; falls back to `username` when absent.
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub status: EntityStatus,
}

/// Shape shared by orgs, roles, permissions and resources.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct NamedSeed {
    #[serde(rename = "ref", alias = "Ref")]
    pub reference: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub status: EntityStatus,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TeamSeed {
    #[serde(rename = "ref", alias = "Ref")]
    pub reference: String,
    pub org_ref: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub status: EntityStatus,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UserRoleLink {
    pub user_ref: String,
    pub role_ref: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RolePermissionLink {
    pub role_ref: String,
    pub permission_ref: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UserPermissionLink {
    pub user_ref: String,
    pub permission_ref: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ResourcePermissionLink {
    pub resource_ref: String,
    pub permission_ref: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct OrgOwnerLink {
    pub org_ref: String,
    pub user_ref: String,
}

/// Entity entry carrying its document-scoped ref.
pub trait SeedEntity {
    fn reference(&self) -> &str;
}

/// Relationship entry naming two refs of fixed kinds.
pub trait SeedLink: Display {
    const LEFT: EntityKind;
    const RIGHT: EntityKind;

    /// `(left_ref, right_ref)` in `LEFT`/`RIGHT` order.
    fn refs(&self) -> (&str, &str);
}

impl SeedEntity for UserSeed {
    fn reference(&self) -> &str {
        &self.reference
    }
}

impl SeedEntity for NamedSeed {
    fn reference(&self) -> &str {
        &self.reference
    }
}

impl SeedEntity for TeamSeed {
    fn reference(&self) -> &str {
        &self.reference
    }
}

impl SeedLink for OrgOwnerLink {
    const LEFT: EntityKind = EntityKind::Org;
    const RIGHT: EntityKind = EntityKind::User;

    fn refs(&self) -> (&str, &str) {
        (&self.org_ref, &self.user_ref)
    }
}

impl SeedLink for UserRoleLink {
    const LEFT: EntityKind = EntityKind::User;
    const RIGHT: EntityKind = EntityKind::Role;

    fn refs(&self) -> (&str, &str) {
        (&self.user_ref, &self.role_ref)
    }
}

impl SeedLink for RolePermissionLink {
    const LEFT: EntityKind = EntityKind::Role;
    const RIGHT: EntityKind = EntityKind::Permission;

    fn refs(&self) -> (&str, &str) {
        (&self.role_ref, &self.permission_ref)
    }
}

impl SeedLink for UserPermissionLink {
    const LEFT: EntityKind = EntityKind::User;
    const RIGHT: EntityKind = EntityKind::Permission;

    fn refs(&self) -> (&str, &str) {
        (&self.user_ref, &self.permission_ref)
    }
}

impl SeedLink for ResourcePermissionLink {
    const LEFT: EntityKind = EntityKind::Resource;
    const RIGHT: EntityKind = EntityKind::Permission;

    fn refs(&self) -> (&str, &str) {
        (&self.resource_ref, &self.permission_ref)
    }
}

impl Display for UserRoleLink {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "user_roles{{user_ref={}, role_ref={}}}",
            self.user_ref, self.role_ref
        )
    }
}

impl Display for RolePermissionLink {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "role_permissions{{role_ref={}, permission_ref={}}}",
            self.role_ref, self.permission_ref
        )
    }
}

impl Display for UserPermissionLink {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "user_permissions{{user_ref={}, permission_ref={}}}",
            self.user_ref, self.permission_ref
        )
    }
}

impl Display for ResourcePermissionLink {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "resource_permissions{{resource_ref={}, permission_ref={}}}",
            self.resource_ref, self.permission_ref
        )
    }
}

impl Display for OrgOwnerLink {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "org_owners{{org_ref={}, user_ref={}}}",
            self.org_ref, self.user_ref
        )
    }
}
