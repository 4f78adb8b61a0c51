//! Transactional phase scopes over the auth repository.
//!
//! # Responsibility
//! - Open one transactional scope per seed phase.
//! - Offer a run-wide transaction mode where each phase is a savepoint.
//! - Fail every call with `RepoError::Cancelled` once cancellation is raised.
//!
//! # Invariants
//! - A scope is consumed by `commit` or `rollback`; dropping an unfinished
//!   scope rolls it back.
//! - In run-wide mode nothing is durable until `SqliteSeedGateway::finish`.

use crate::model::access::{Permission, PermissionId, Resource, ResourceId, Role, RoleId};
use crate::model::org::{Org, OrgId, Team, TeamId};
use crate::model::user::{User, UserId};
use crate::model::EntityKind;
use crate::repo::auth_repo::{AuthRepository, RepoError, RepoResult, SqliteAuthRepository};
use rusqlite::{Connection, Savepoint, Transaction, TransactionBehavior};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Shared cancellation signal checked before every gateway call.
#[derive(Debug, Clone, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Adopts a flag raised elsewhere, e.g. by a signal handler.
impl From<Arc<AtomicBool>> for CancelFlag {
    fn from(value: Arc<AtomicBool>) -> Self {
        Self(value)
    }
}

/// One transactional unit of work: a phase either commits whole or not at all.
pub trait PhaseScope: AuthRepository {
    fn commit(self) -> RepoResult<()>;
    fn rollback(self) -> RepoResult<()>;
}

/// Source of phase scopes for the seeding orchestrator.
pub trait SeedGateway {
    type Scope<'s>: PhaseScope
    where
        Self: 's;

    fn begin_phase(&mut self) -> RepoResult<Self::Scope<'_>>;
}

enum GatewayTarget<'conn> {
    Connection(&'conn mut Connection),
    Transaction(Transaction<'conn>),
}

/// SQLite seed gateway.
///
/// `new` gives every phase its own durable transaction. `in_transaction`
/// nests phases as savepoints of one caller-owned transaction.
pub struct SqliteSeedGateway<'conn> {
    target: GatewayTarget<'conn>,
    cancel: CancelFlag,
}

impl<'conn> SqliteSeedGateway<'conn> {
    pub fn new(conn: &'conn mut Connection) -> Self {
        Self {
            target: GatewayTarget::Connection(conn),
            cancel: CancelFlag::new(),
        }
    }

    pub fn in_transaction(tx: Transaction<'conn>) -> Self {
        Self {
            target: GatewayTarget::Transaction(tx),
            cancel: CancelFlag::new(),
        }
    }

    pub fn with_cancel(mut self, cancel: CancelFlag) -> Self {
        self.cancel = cancel;
        self
    }

    /// Commits the run-wide transaction, if any. No-op in per-phase mode.
    pub fn finish(self) -> RepoResult<()> {
        match self.target {
            GatewayTarget::Connection(_) => Ok(()),
            GatewayTarget::Transaction(tx) => {
                if self.cancel.is_cancelled() {
                    return Err(RepoError::Cancelled);
                }
                tx.commit()?;
                Ok(())
            }
        }
    }
}

impl SeedGateway for SqliteSeedGateway<'_> {
    type Scope<'s> = SqlitePhaseScope<'s> where Self: 's;

    fn begin_phase(&mut self) -> RepoResult<SqlitePhaseScope<'_>> {
        if self.cancel.is_cancelled() {
            return Err(RepoError::Cancelled);
        }

        let handle = match &mut self.target {
            GatewayTarget::Connection(conn) => ScopeHandle::Transaction(
                conn.transaction_with_behavior(TransactionBehavior::Immediate)?,
            ),
            GatewayTarget::Transaction(tx) => ScopeHandle::Savepoint(tx.savepoint()?),
        };

        Ok(SqlitePhaseScope {
            handle,
            cancel: self.cancel.clone(),
        })
    }
}

enum ScopeHandle<'s> {
    Transaction(Transaction<'s>),
    Savepoint(Savepoint<'s>),
}

/// Phase scope backed by a SQLite transaction or savepoint.
pub struct SqlitePhaseScope<'s> {
    handle: ScopeHandle<'s>,
    cancel: CancelFlag,
}

impl SqlitePhaseScope<'_> {
    fn connection(&self) -> &Connection {
        match &self.handle {
            ScopeHandle::Transaction(tx) => &**tx,
            ScopeHandle::Savepoint(sp) => &**sp,
        }
    }

    fn repo(&self) -> RepoResult<SqliteAuthRepository<'_>> {
        if self.cancel.is_cancelled() {
            return Err(RepoError::Cancelled);
        }
        Ok(SqliteAuthRepository::new(self.connection()))
    }
}

impl PhaseScope for SqlitePhaseScope<'_> {
    fn commit(self) -> RepoResult<()> {
        if self.cancel.is_cancelled() {
            return Err(RepoError::Cancelled);
        }
        match self.handle {
            ScopeHandle::Transaction(tx) => tx.commit()?,
            ScopeHandle::Savepoint(sp) => sp.commit()?,
        }
        Ok(())
    }

    fn rollback(self) -> RepoResult<()> {
        match self.handle {
            ScopeHandle::Transaction(tx) => tx.rollback()?,
            ScopeHandle::Savepoint(mut sp) => sp.rollback()?,
        }
        Ok(())
    }
}

impl AuthRepository for SqlitePhaseScope<'_> {
    fn create_user(&self, user: &User) -> RepoResult<UserId> {
        self.repo()?.create_user(user)
    }

    fn create_org(&self, org: &Org) -> RepoResult<OrgId> {
        self.repo()?.create_org(org)
    }

    fn create_team(&self, team: &Team) -> RepoResult<TeamId> {
        self.repo()?.create_team(team)
    }

    fn create_role(&self, role: &Role) -> RepoResult<RoleId> {
        self.repo()?.create_role(role)
    }

    fn create_permission(&self, permission: &Permission) -> RepoResult<PermissionId> {
        self.repo()?.create_permission(permission)
    }

    fn create_resource(&self, resource: &Resource) -> RepoResult<ResourceId> {
        self.repo()?.create_resource(resource)
    }

    fn add_org_owner(&self, org_id: OrgId, user_id: UserId) -> RepoResult<()> {
        self.repo()?.add_org_owner(org_id, user_id)
    }

    fn add_role(&self, user_id: UserId, role_id: RoleId) -> RepoResult<()> {
        self.repo()?.add_role(user_id, role_id)
    }

    fn add_permission_to_role(&self, role_id: RoleId, permission: &Permission) -> RepoResult<()> {
        self.repo()?.add_permission_to_role(role_id, permission)
    }

    fn add_permission_to_user(&self, user_id: UserId, permission: &Permission) -> RepoResult<()> {
        self.repo()?.add_permission_to_user(user_id, permission)
    }

    fn add_permission_to_resource(
        &self,
        resource_id: ResourceId,
        permission: &Permission,
    ) -> RepoResult<()> {
        self.repo()?
            .add_permission_to_resource(resource_id, permission)
    }

    fn get_user(&self, id: UserId) -> RepoResult<Option<User>> {
        self.repo()?.get_user(id)
    }

    fn get_org(&self, id: OrgId) -> RepoResult<Option<Org>> {
        self.repo()?.get_org(id)
    }

    fn get_team(&self, id: TeamId) -> RepoResult<Option<Team>> {
        self.repo()?.get_team(id)
    }

    fn get_role(&self, id: RoleId) -> RepoResult<Option<Role>> {
        self.repo()?.get_role(id)
    }

    fn get_permission(&self, id: PermissionId) -> RepoResult<Option<Permission>> {
        self.repo()?.get_permission(id)
    }

    fn get_resource(&self, id: ResourceId) -> RepoResult<Option<Resource>> {
        self.repo()?.get_resource(id)
    }

    fn list_org_owners(&self, org_id: OrgId) -> RepoResult<Vec<UserId>> {
        self.repo()?.list_org_owners(org_id)
    }

    fn list_user_roles(&self, user_id: UserId) -> RepoResult<Vec<RoleId>> {
        self.repo()?.list_user_roles(user_id)
    }

    fn list_role_permissions(&self, role_id: RoleId) -> RepoResult<Vec<Permission>> {
        self.repo()?.list_role_permissions(role_id)
    }

    fn list_user_permissions(&self, user_id: UserId) -> RepoResult<Vec<Permission>> {
        self.repo()?.list_user_permissions(user_id)
    }

    fn list_resource_permissions(&self, resource_id: ResourceId) -> RepoResult<Vec<Permission>> {
        self.repo()?.list_resource_permissions(resource_id)
    }

    fn count(&self, kind: EntityKind) -> RepoResult<u64> {
        self.repo()?.count(kind)
    }
}
