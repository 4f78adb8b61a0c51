//! Seed phases and their dependency plan.
//!
//! Each phase either creates one entity kind or links two kinds. A phase may
//! run only after every phase producing identities it consumes has committed.

use crate::model::EntityKind;
use std::fmt::{Display, Formatter};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Phase {
    Users,
    Orgs,
    OrgOwners,
    Teams,
    Roles,
    Permissions,
    Resources,
    UserRoles,
    RolePermissions,
    UserPermissions,
    ResourcePermissions,
}

impl Phase {
    /// Declaration order; also the tie-break order for planning.
    pub const ALL: [Phase; 11] = [
        Phase::Users,
        Phase::Orgs,
        Phase::OrgOwners,
        Phase::Teams,
        Phase::Roles,
        Phase::Permissions,
        Phase::Resources,
        Phase::UserRoles,
        Phase::RolePermissions,
        Phase::UserPermissions,
        Phase::ResourcePermissions,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Self::Users => "seed_users",
            Self::Orgs => "seed_orgs",
            Self::OrgOwners => "seed_org_owners",
            Self::Teams => "seed_teams",
            Self::Roles => "seed_roles",
            Self::Permissions => "seed_permissions",
            Self::Resources => "seed_resources",
            Self::UserRoles => "seed_user_roles",
            Self::RolePermissions => "seed_role_permissions",
            Self::UserPermissions => "seed_user_permissions",
            Self::ResourcePermissions => "seed_resource_permissions",
        }
    }

    /// Entity kind whose identities this phase creates, if any.
    pub fn creates(self) -> Option<EntityKind> {
        match self {
            Self::Users => Some(EntityKind::User),
            Self::Orgs => Some(EntityKind::Org),
            Self::Teams => Some(EntityKind::Team),
            Self::Roles => Some(EntityKind::Role),
            Self::Permissions => Some(EntityKind::Permission),
            Self::Resources => Some(EntityKind::Resource),
            Self::OrgOwners
            | Self::UserRoles
            | Self::RolePermissions
            | Self::UserPermissions
            | Self::ResourcePermissions => None,
        }
    }

    /// Entity kinds whose identities this phase resolves.
    pub fn consumes(self) -> &'static [EntityKind] {
        match self {
            Self::Users | Self::Orgs | Self::Roles | Self::Permissions | Self::Resources => &[],
            Self::Teams => &[EntityKind::Org],
            Self::OrgOwners => &[EntityKind::Org, EntityKind::User],
            Self::UserRoles => &[EntityKind::User, EntityKind::Role],
            Self::RolePermissions => &[EntityKind::Role, EntityKind::Permission],
            Self::UserPermissions => &[EntityKind::User, EntityKind::Permission],
            Self::ResourcePermissions => &[EntityKind::Resource, EntityKind::Permission],
        }
    }

    /// Phases that must commit before this one runs.
    pub fn dependencies(self) -> Vec<Phase> {
        Self::ALL
            .into_iter()
            .filter(|other| {
                other
                    .creates()
                    .is_some_and(|kind| self.consumes().contains(&kind))
            })
            .collect()
    }

    /// Topological order of all phases.
    ///
    /// Among phases whose dependencies are satisfied, the earliest declared
    /// runs first, which reproduces `Phase::ALL` exactly.
    pub fn plan() -> Vec<Phase> {
        let mut planned: Vec<Phase> = Vec::with_capacity(Self::ALL.len());
        while planned.len() < Self::ALL.len() {
            let next = Self::ALL.into_iter().find(|phase| {
                !planned.contains(phase)
                    && phase
                        .dependencies()
                        .iter()
                        .all(|dependency| planned.contains(dependency))
            });
            match next {
                Some(phase) => planned.push(phase),
                // The dependency graph is static and acyclic.
                None => break,
            }
        }
        planned
    }
}

impl Display for Phase {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}
