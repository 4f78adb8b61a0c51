//! Auth repository contract and SQLite implementation.
//!
//! # Responsibility
//! - Create users, orgs, teams, roles, permissions and resources.
//! - Link entities through the relationship tables.
//! - Read records back by generated identity.
//!
//! # Invariants
//! - Natural keys are unique in storage; a second create of the same key
//!   fails instead of upserting.
//! - Read paths reject invalid persisted state instead of masking it.

use crate::db::DbError;
use crate::model::access::{Permission, PermissionId, Resource, ResourceId, Role, RoleId};
use crate::model::org::{Org, OrgId, Team, TeamId};
use crate::model::user::{User, UserId};
use crate::model::{now_epoch_ms, EntityKind, EntityStatus, ModelValidationError};
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

pub type RepoResult<T> = Result<T, RepoError>;

/// Gateway error for auth persistence and query operations.
#[derive(Debug)]
pub enum RepoError {
    Validation(ModelValidationError),
    Db(DbError),
    NotFound { kind: EntityKind, id: Uuid },
    /// The caller raised the cancel flag before or during this call.
    Cancelled,
    InvalidData(String),
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::Db(err) => write!(f, "{err}"),
            Self::NotFound { kind, id } => write!(f, "{kind} not found: {id}"),
            Self::Cancelled => write!(f, "operation cancelled"),
            Self::InvalidData(message) => write!(f, "invalid persisted auth data: {message}"),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Db(err) => Some(err),
            Self::NotFound { .. } => None,
            Self::Cancelled => None,
            Self::InvalidData(_) => None,
        }
    }
}

impl From<ModelValidationError> for RepoError {
    fn from(value: ModelValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// Persistence contract used by the seeding orchestrator.
///
/// Object safe: the orchestrator drives phases through `&dyn AuthRepository`.
pub trait AuthRepository {
    fn create_user(&self, user: &User) -> RepoResult<UserId>;
    fn create_org(&self, org: &Org) -> RepoResult<OrgId>;
    fn create_team(&self, team: &Team) -> RepoResult<TeamId>;
    fn create_role(&self, role: &Role) -> RepoResult<RoleId>;
    fn create_permission(&self, permission: &Permission) -> RepoResult<PermissionId>;
    fn create_resource(&self, resource: &Resource) -> RepoResult<ResourceId>;

    fn add_org_owner(&self, org_id: OrgId, user_id: UserId) -> RepoResult<()>;
    fn add_role(&self, user_id: UserId, role_id: RoleId) -> RepoResult<()>;
    fn add_permission_to_role(&self, role_id: RoleId, permission: &Permission) -> RepoResult<()>;
    fn add_permission_to_user(&self, user_id: UserId, permission: &Permission) -> RepoResult<()>;
    fn add_permission_to_resource(
        &self,
        resource_id: ResourceId,
        permission: &Permission,
    ) -> RepoResult<()>;

    fn get_user(&self, id: UserId) -> RepoResult<Option<User>>;
    fn get_org(&self, id: OrgId) -> RepoResult<Option<Org>>;
    fn get_team(&self, id: TeamId) -> RepoResult<Option<Team>>;
    fn get_role(&self, id: RoleId) -> RepoResult<Option<Role>>;
    fn get_permission(&self, id: PermissionId) -> RepoResult<Option<Permission>>;
    fn get_resource(&self, id: ResourceId) -> RepoResult<Option<Resource>>;

    fn list_org_owners(&self, org_id: OrgId) -> RepoResult<Vec<UserId>>;
    fn list_user_roles(&self, user_id: UserId) -> RepoResult<Vec<RoleId>>;
    fn list_role_permissions(&self, role_id: RoleId) -> RepoResult<Vec<Permission>>;
    fn list_user_permissions(&self, user_id: UserId) -> RepoResult<Vec<Permission>>;
    fn list_resource_permissions(&self, resource_id: ResourceId) -> RepoResult<Vec<Permission>>;

    /// Number of stored entities of one kind.
    fn count(&self, kind: EntityKind) -> RepoResult<u64>;
}

/// SQLite-backed auth repository over a borrowed connection.
///
/// The connection may be a plain connection, a transaction or a savepoint;
/// transaction scoping is owned by the caller.
pub struct SqliteAuthRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteAuthRepository<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }
}

/// Columns shared by orgs, roles, permissions and resources.
struct NamedRecord {
    id: Uuid,
    name: String,
    description: String,
    status: EntityStatus,
    created_at: i64,
    updated_at: i64,
}

const NAMED_COLUMNS: &str = "id, name, description, status, created_at, updated_at";
const PERMISSION_JOIN_COLUMNS: &str =
    "p.id, p.name, p.description, p.status, p.created_at, p.updated_at";

impl AuthRepository for SqliteAuthRepository<'_> {
    fn create_user(&self, user: &User) -> RepoResult<UserId> {
        user.validate()?;

        self.conn.execute(
            "INSERT INTO users (
                id,
                username,
                email,
                name,
                status,
                created_at,
                updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7);",
            params![
                user.id.to_string(),
                user.username.as_str(),
                user.email.as_str(),
                user.name.as_str(),
                user.status.as_str(),
                user.created_at,
                user.updated_at,
            ],
        )?;

        Ok(user.id)
    }

    fn create_org(&self, org: &Org) -> RepoResult<OrgId> {
        org.validate()?;
        self.insert_named(
            "orgs",
            &NamedRecord {
                id: org.id,
                name: org.name.clone(),
                description: org.description.clone(),
                status: org.status,
                created_at: org.created_at,
                updated_at: org.updated_at,
            },
        )?;
        Ok(org.id)
    }

    fn create_team(&self, team: &Team) -> RepoResult<TeamId> {
        team.validate()?;

        self.conn.execute(
            "INSERT INTO teams (
                id,
                org_id,
                name,
                description,
                status,
                created_at,
                updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7);",
            params![
                team.id.to_string(),
                team.org_id.to_string(),
                team.name.as_str(),
                team.description.as_str(),
                team.status.as_str(),
                team.created_at,
                team.updated_at,
            ],
        )?;

        Ok(team.id)
    }

    fn create_role(&self, role: &Role) -> RepoResult<RoleId> {
        role.validate()?;
        self.insert_named(
            "roles",
            &NamedRecord {
                id: role.id,
                name: role.name.clone(),
                description: role.description.clone(),
                status: role.status,
                created_at: role.created_at,
                updated_at: role.updated_at,
            },
        )?;
        Ok(role.id)
    }

    fn create_permission(&self, permission: &Permission) -> RepoResult<PermissionId> {
        permission.validate()?;
        self.insert_named(
            "permissions",
            &NamedRecord {
                id: permission.id,
                name: permission.name.clone(),
                description: permission.description.clone(),
                status: permission.status,
                created_at: permission.created_at,
                updated_at: permission.updated_at,
            },
        )?;
        Ok(permission.id)
    }

    fn create_resource(&self, resource: &Resource) -> RepoResult<ResourceId> {
        resource.validate()?;
        self.insert_named(
            "resources",
            &NamedRecord {
                id: resource.id,
                name: resource.name.clone(),
                description: resource.description.clone(),
                status: resource.status,
                created_at: resource.created_at,
                updated_at: resource.updated_at,
            },
        )?;
        Ok(resource.id)
    }

    fn add_org_owner(&self, org_id: OrgId, user_id: UserId) -> RepoResult<()> {
        self.insert_link("org_owners", "org_id", org_id, "user_id", user_id)
    }

    fn add_role(&self, user_id: UserId, role_id: RoleId) -> RepoResult<()> {
        self.insert_link("user_roles", "user_id", user_id, "role_id", role_id)
    }

    fn add_permission_to_role(&self, role_id: RoleId, permission: &Permission) -> RepoResult<()> {
        self.insert_link(
            "role_permissions",
            "role_id",
            role_id,
            "permission_id",
            permission.id,
        )
    }

    fn add_permission_to_user(&self, user_id: UserId, permission: &Permission) -> RepoResult<()> {
        self.insert_link(
            "user_permissions",
            "user_id",
            user_id,
            "permission_id",
            permission.id,
        )
    }

    fn add_permission_to_resource(
        &self,
        resource_id: ResourceId,
        permission: &Permission,
    ) -> RepoResult<()> {
        self.insert_link(
            "resource_permissions",
            "resource_id",
            resource_id,
            "permission_id",
            permission.id,
        )
    }

    fn get_user(&self, id: UserId) -> RepoResult<Option<User>> {
        let row = self
            .conn
            .query_row(
                "SELECT id, username, email, name, status, created_at, updated_at
                 FROM users
                 WHERE id = ?1;",
                [id.to_string()],
                |row| {
                    Ok((
                        row.get::<_, String>("id")?,
                        row.get::<_, String>("username")?,
                        row.get::<_, String>("email")?,
                        row.get::<_, String>("name")?,
                        row.get::<_, String>("status")?,
                        row.get::<_, i64>("created_at")?,
                        row.get::<_, i64>("updated_at")?,
                    ))
                },
            )
            .optional()?;

        let Some((id_text, username, email, name, status_text, created_at, updated_at)) = row
        else {
            return Ok(None);
        };

        Ok(Some(User {
            id: parse_uuid(&id_text, "users.id")?,
            username,
            email,
            name,
            status: parse_status(&status_text, "users.status")?,
            created_at,
            updated_at,
        }))
    }

    fn get_org(&self, id: OrgId) -> RepoResult<Option<Org>> {
        Ok(self.select_named("orgs", id)?.map(|record| Org {
            id: record.id,
            name: record.name,
            description: record.description,
            status: record.status,
            created_at: record.created_at,
            updated_at: record.updated_at,
        }))
    }

    fn get_team(&self, id: TeamId) -> RepoResult<Option<Team>> {
        let row = self
            .conn
            .query_row(
                "SELECT id, org_id, name, description, status, created_at, updated_at
                 FROM teams
                 WHERE id = ?1;",
                [id.to_string()],
                |row| {
                    Ok((
                        row.get::<_, String>("id")?,
                        row.get::<_, String>("org_id")?,
                        row.get::<_, String>("name")?,
                        row.get::<_, String>("description")?,
                        row.get::<_, String>("status")?,
                        row.get::<_, i64>("created_at")?,
                        row.get::<_, i64>("updated_at")?,
                    ))
                },
            )
            .optional()?;

        let Some((id_text, org_text, name, description, status_text, created_at, updated_at)) =
            row
        else {
            return Ok(None);
        };

        Ok(Some(Team {
            id: parse_uuid(&id_text, "teams.id")?,
            org_id: parse_uuid(&org_text, "teams.org_id")?,
            name,
            description,
            status: parse_status(&status_text, "teams.status")?,
            created_at,
            updated_at,
        }))
    }

    fn get_role(&self, id: RoleId) -> RepoResult<Option<Role>> {
        Ok(self.select_named("roles", id)?.map(|record| Role {
            id: record.id,
            name: record.name,
            description: record.description,
            status: record.status,
            created_at: record.created_at,
            updated_at: record.updated_at,
        }))
    }

    fn get_permission(&self, id: PermissionId) -> RepoResult<Option<Permission>> {
        Ok(self.select_named("permissions", id)?.map(permission_from_record))
    }

    fn get_resource(&self, id: ResourceId) -> RepoResult<Option<Resource>> {
        Ok(self.select_named("resources", id)?.map(|record| Resource {
            id: record.id,
            name: record.name,
            description: record.description,
            status: record.status,
            created_at: record.created_at,
            updated_at: record.updated_at,
        }))
    }

    fn list_org_owners(&self, org_id: OrgId) -> RepoResult<Vec<UserId>> {
        self.list_linked_ids("org_owners", "org_id", org_id, "user_id")
    }

    fn list_user_roles(&self, user_id: UserId) -> RepoResult<Vec<RoleId>> {
        self.list_linked_ids("user_roles", "user_id", user_id, "role_id")
    }

    fn list_role_permissions(&self, role_id: RoleId) -> RepoResult<Vec<Permission>> {
        self.list_linked_permissions("role_permissions", "role_id", role_id)
    }

    fn list_user_permissions(&self, user_id: UserId) -> RepoResult<Vec<Permission>> {
        self.list_linked_permissions("user_permissions", "user_id", user_id)
    }

    fn list_resource_permissions(&self, resource_id: ResourceId) -> RepoResult<Vec<Permission>> {
        self.list_linked_permissions("resource_permissions", "resource_id", resource_id)
    }

    fn count(&self, kind: EntityKind) -> RepoResult<u64> {
        let count: i64 = self.conn.query_row(
            &format!("SELECT COUNT(*) FROM {};", table_for(kind)),
            [],
            |row| row.get(0),
        )?;
        u64::try_from(count).map_err(|_| RepoError::InvalidData(format!("negative count {count}")))
    }
}

impl SqliteAuthRepository<'_> {
    fn insert_named(&self, table: &'static str, record: &NamedRecord) -> RepoResult<()> {
        self.conn.execute(
            &format!("INSERT INTO {table} ({NAMED_COLUMNS}) VALUES (?1, ?2, ?3, ?4, ?5, ?6);"),
            params![
                record.id.to_string(),
                record.name.as_str(),
                record.description.as_str(),
                record.status.as_str(),
                record.created_at,
                record.updated_at,
            ],
        )?;
        Ok(())
    }

    fn select_named(&self, table: &'static str, id: Uuid) -> RepoResult<Option<NamedRecord>> {
        let mut stmt = self
            .conn
            .prepare(&format!("SELECT {NAMED_COLUMNS} FROM {table} WHERE id = ?1;"))?;
        let mut rows = stmt.query([id.to_string()])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_named_row(row, table)?));
        }
        Ok(None)
    }

    fn insert_link(
        &self,
        table: &'static str,
        owner_column: &'static str,
        owner_id: Uuid,
        target_column: &'static str,
        target_id: Uuid,
    ) -> RepoResult<()> {
        self.conn.execute(
            &format!(
                "INSERT INTO {table} ({owner_column}, {target_column}, created_at)
                 VALUES (?1, ?2, ?3);"
            ),
            params![owner_id.to_string(), target_id.to_string(), now_epoch_ms()],
        )?;
        Ok(())
    }

    fn list_linked_ids(
        &self,
        table: &'static str,
        owner_column: &'static str,
        owner_id: Uuid,
        target_column: &'static str,
    ) -> RepoResult<Vec<Uuid>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {target_column}
             FROM {table}
             WHERE {owner_column} = ?1
             ORDER BY created_at ASC, {target_column} ASC;"
        ))?;
        let mut rows = stmt.query([owner_id.to_string()])?;
        let mut ids = Vec::new();
        while let Some(row) = rows.next()? {
            let value: String = row.get(0)?;
            ids.push(parse_uuid(&value, table)?);
        }
        Ok(ids)
    }

    fn list_linked_permissions(
        &self,
        table: &'static str,
        owner_column: &'static str,
        owner_id: Uuid,
    ) -> RepoResult<Vec<Permission>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {PERMISSION_JOIN_COLUMNS}
             FROM {table} link
             INNER JOIN permissions p ON p.id = link.permission_id
             WHERE link.{owner_column} = ?1
             ORDER BY p.name ASC;"
        ))?;
        let mut rows = stmt.query([owner_id.to_string()])?;
        let mut permissions = Vec::new();
        while let Some(row) = rows.next()? {
            permissions.push(permission_from_record(parse_named_row(row, "permissions")?));
        }
        Ok(permissions)
    }
}

fn table_for(kind: EntityKind) -> &'static str {
    match kind {
        EntityKind::User => "users",
        EntityKind::Org => "orgs",
        EntityKind::Team => "teams",
        EntityKind::Role => "roles",
        EntityKind::Permission => "permissions",
        EntityKind::Resource => "resources",
    }
}

fn permission_from_record(record: NamedRecord) -> Permission {
    Permission {
        id: record.id,
        name: record.name,
        description: record.description,
        status: record.status,
        created_at: record.created_at,
        updated_at: record.updated_at,
    }
}

fn parse_named_row(row: &Row<'_>, table: &'static str) -> RepoResult<NamedRecord> {
    let id_text: String = row.get(0)?;
    let status_text: String = row.get(3)?;
    Ok(NamedRecord {
        id: parse_uuid(&id_text, table)?,
        name: row.get(1)?,
        description: row.get(2)?,
        status: parse_status(&status_text, table)?,
        created_at: row.get(4)?,
        updated_at: row.get(5)?,
    })
}

fn parse_uuid(value: &str, column: &str) -> RepoResult<Uuid> {
    Uuid::parse_str(value)
        .map_err(|_| RepoError::InvalidData(format!("invalid uuid value `{value}` in {column}")))
}

fn parse_status(value: &str, column: &str) -> RepoResult<EntityStatus> {
    EntityStatus::parse(value)
        .ok_or_else(|| RepoError::InvalidData(format!("invalid status `{value}` in {column}")))
}
