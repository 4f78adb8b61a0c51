//! Seed orchestration use-case service.
//!
//! # Responsibility
//! - Load and parse every seed document of one feature.
//! - Apply each document phase by phase, in dependency order.
//! - Resolve relationship refs through the run's `RefTable`.
//!
//! # Invariants
//! - Each phase runs in its own gateway scope: it commits whole or not at all.
//! - Refs created by a phase become visible only after that phase commits.
//! - The first failure stops the run; earlier committed phases stay committed
//!   unless the gateway itself nests phases inside a run-wide transaction.
//! - No gateway call is made for a link entry whose refs do not resolve.

use crate::config::{RunMode, SeedConfig};
use crate::model::access::{Permission, PermissionId, Resource, Role};
use crate::model::org::{Org, Team};
use crate::model::user::User;
use crate::model::EntityKind;
use crate::repo::auth_repo::{AuthRepository, RepoError, RepoResult};
use crate::repo::gateway::{CancelFlag, PhaseScope, SeedGateway, SqliteSeedGateway};
use crate::seed::assets::{bundled_assets, AssetLoader, AssetTree, DirectoryAssets};
use crate::seed::document::{
    NamedSeed, OrgOwnerLink, ResourcePermissionLink, RolePermissionLink, SeedDocument, SeedEntity,
    SeedLink, TeamSeed, UserPermissionLink, UserRoleLink, UserSeed,
};
use crate::seed::error::{SeedError, SeedResult};
use crate::seed::phase::Phase;
use crate::seed::resolver::RefTable;
use log::{debug, error, info, warn};
use rusqlite::{Connection, TransactionBehavior};
use std::fmt::Display;
use std::time::Instant;
use uuid::Uuid;

/// Items applied by one phase of one document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PhaseReport {
    pub phase: Phase,
    pub items: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentReport {
    /// Asset path of the document.
    pub path: String,
    pub phases: Vec<PhaseReport>,
}

/// Outcome of a successful seeding run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SeedReport {
    pub documents: Vec<DocumentReport>,
}

impl SeedReport {
    /// Items applied by `phase`, summed over all documents.
    pub fn items(&self, phase: Phase) -> usize {
        self.documents
            .iter()
            .flat_map(|document| document.phases.iter())
            .filter(|report| report.phase == phase)
            .map(|report| report.items)
            .sum()
    }

    pub fn total_items(&self) -> usize {
        self.documents
            .iter()
            .flat_map(|document| document.phases.iter())
            .map(|report| report.items)
            .sum()
    }
}

/// A parsed seed document and where it came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadedDocument {
    pub path: String,
    pub document: SeedDocument,
}

/// Loads and parses all documents of `feature` under `seed/<engine>/`.
///
/// Every document is parsed before any is returned, so a malformed document
/// fails the run before the first write.
pub fn load_documents<T: AssetTree + ?Sized>(
    tree: &T,
    engine: &str,
    feature: &str,
) -> SeedResult<Vec<LoadedDocument>> {
    let mut groups = AssetLoader::new(tree, engine).load()?;
    let raw_seeds = groups
        .remove(feature)
        .filter(|seeds| !seeds.is_empty())
        .ok_or_else(|| SeedError::NoDocuments {
            engine: engine.to_string(),
            feature: feature.to_string(),
        })?;

    let mut documents = Vec::with_capacity(raw_seeds.len());
    for raw in raw_seeds {
        let document = SeedDocument::parse(&raw.content).map_err(|source| {
            error!(
                "event=seed_parse module=seed status=error path={} line={} error={source}",
                raw.path,
                source.line()
            );
            SeedError::Parse {
                path: raw.path.clone(),
                source,
            }
        })?;
        debug!(
            "event=seed_parse module=seed status=ok path={} entries={}",
            raw.path,
            document.entry_count()
        );
        documents.push(LoadedDocument {
            path: raw.path,
            document,
        });
    }

    Ok(documents)
}

/// Applies seed documents through a phase-scoped gateway.
pub struct SeedService<G: SeedGateway> {
    gateway: G,
}

impl<G: SeedGateway> SeedService<G> {
    pub fn new(gateway: G) -> Self {
        Self { gateway }
    }

    pub fn gateway(&self) -> &G {
        &self.gateway
    }

    pub fn into_gateway(self) -> G {
        self.gateway
    }

    /// Seeds every document of the configured feature, in timestamp order.
    ///
    /// One `RefTable` spans the whole run, so a later document may refer to
    /// refs created by an earlier one.
    ///
    /// # Errors
    /// - `SeedError::NoDocuments` when the feature has no seed documents.
    /// - The first load, parse, reference or persistence failure, unchanged.
    pub fn seed_all<T: AssetTree + ?Sized>(
        &mut self,
        tree: &T,
        config: &SeedConfig,
    ) -> SeedResult<SeedReport> {
        config.validate()?;
        let started_at = Instant::now();
        info!(
            "event=seed_run module=seed status=start engine={} feature={}",
            config.engine, config.feature
        );

        let result = self.seed_documents(tree, config);
        match &result {
            Ok(report) => info!(
                "event=seed_run module=seed status=ok documents={} items={} duration_ms={}",
                report.documents.len(),
                report.total_items(),
                started_at.elapsed().as_millis()
            ),
            Err(err) => error!(
                "event=seed_run module=seed status=error error_code={} phase={} duration_ms={} error={err}",
                err.error_code(),
                err.phase().map_or("none", Phase::name),
                started_at.elapsed().as_millis()
            ),
        }
        result
    }

    fn seed_documents<T: AssetTree + ?Sized>(
        &mut self,
        tree: &T,
        config: &SeedConfig,
    ) -> SeedResult<SeedReport> {
        let documents = load_documents(tree, &config.engine, &config.feature)?;
        let mut refs = RefTable::new();
        let mut report = SeedReport::default();

        for loaded in &documents {
            let phases = self.apply_document(&loaded.document, &mut refs)?;
            report.documents.push(DocumentReport {
                path: loaded.path.clone(),
                phases,
            });
        }

        Ok(report)
    }

    /// Applies one document's phases in plan order.
    ///
    /// Stops at the first failing phase; phases before it stay applied.
    pub fn apply_document(
        &mut self,
        document: &SeedDocument,
        refs: &mut RefTable,
    ) -> SeedResult<Vec<PhaseReport>> {
        let mut reports = Vec::new();
        for phase in Phase::plan() {
            let items = match phase {
                Phase::Users => self.seed_users(&document.users, refs)?,
                Phase::Orgs => self.seed_orgs(&document.orgs, refs)?,
                Phase::OrgOwners => self.seed_org_owners(&document.org_owners, refs)?,
                Phase::Teams => self.seed_teams(&document.teams, refs)?,
                Phase::Roles => self.seed_roles(&document.roles, refs)?,
                Phase::Permissions => self.seed_permissions(&document.permissions, refs)?,
                Phase::Resources => self.seed_resources(&document.resources, refs)?,
                Phase::UserRoles => self.seed_user_roles(&document.user_roles, refs)?,
                Phase::RolePermissions => {
                    self.seed_role_permissions(&document.role_permissions, refs)?
                }
                Phase::UserPermissions => {
                    self.seed_user_permissions(&document.user_permissions, refs)?
                }
                Phase::ResourcePermissions => {
                    self.seed_resource_permissions(&document.resource_permissions, refs)?
                }
            };
            reports.push(PhaseReport { phase, items });
        }
        Ok(reports)
    }

    fn seed_users(&mut self, seeds: &[UserSeed], refs: &mut RefTable) -> SeedResult<usize> {
        let phase = Phase::Users;
        self.create_phase(phase, EntityKind::User, seeds, refs, |repo, _, seed| {
            let display_name = seed.name.as_deref().unwrap_or(&seed.username);
            let mut user = User::new(&seed.username, &seed.email, display_name);
            user.status = seed.status;
            repo.create_user(&user)
                .map_err(|err| SeedError::persistence(phase, Some(seed.reference.as_str()), err))
        })
    }

    fn seed_orgs(&mut self, seeds: &[NamedSeed], refs: &mut RefTable) -> SeedResult<usize> {
        let phase = Phase::Orgs;
        self.create_phase(phase, EntityKind::Org, seeds, refs, |repo, _, seed| {
            let mut org = Org::new(&seed.name, &seed.description);
            org.status = seed.status;
            repo.create_org(&org)
                .map_err(|err| SeedError::persistence(phase, Some(seed.reference.as_str()), err))
        })
    }

    fn seed_org_owners(&mut self, links: &[OrgOwnerLink], refs: &RefTable) -> SeedResult<usize> {
        self.link_phase(Phase::OrgOwners, links, refs, |repo, org_id, user_id| {
            repo.add_org_owner(org_id, user_id)
        })
    }

    fn seed_teams(&mut self, seeds: &[TeamSeed], refs: &mut RefTable) -> SeedResult<usize> {
        let phase = Phase::Teams;
        self.create_phase(phase, EntityKind::Team, seeds, refs, |repo, resolved, seed| {
            let record = format!("teams{{ref={}, org_ref={}}}", seed.reference, seed.org_ref);
            let org_id = resolve(resolved, phase, EntityKind::Org, &seed.org_ref, &record)?;
            let mut team = Team::new(org_id, &seed.name, &seed.description);
            team.status = seed.status;
            repo.create_team(&team)
                .map_err(|err| SeedError::persistence(phase, Some(seed.reference.as_str()), err))
        })
    }

    fn seed_roles(&mut self, seeds: &[NamedSeed], refs: &mut RefTable) -> SeedResult<usize> {
        let phase = Phase::Roles;
        self.create_phase(phase, EntityKind::Role, seeds, refs, |repo, _, seed| {
            let mut role = Role::new(&seed.name, &seed.description);
            role.status = seed.status;
            repo.create_role(&role)
                .map_err(|err| SeedError::persistence(phase, Some(seed.reference.as_str()), err))
        })
    }

    fn seed_permissions(&mut self, seeds: &[NamedSeed], refs: &mut RefTable) -> SeedResult<usize> {
        let phase = Phase::Permissions;
        self.create_phase(phase, EntityKind::Permission, seeds, refs, |repo, _, seed| {
            let mut permission = Permission::new(&seed.name, &seed.description);
            permission.status = seed.status;
            repo.create_permission(&permission)
                .map_err(|err| SeedError::persistence(phase, Some(seed.reference.as_str()), err))
        })
    }

    fn seed_resources(&mut self, seeds: &[NamedSeed], refs: &mut RefTable) -> SeedResult<usize> {
        let phase = Phase::Resources;
        self.create_phase(phase, EntityKind::Resource, seeds, refs, |repo, _, seed| {
            let mut resource = Resource::new(&seed.name, &seed.description);
            resource.status = seed.status;
            repo.create_resource(&resource)
                .map_err(|err| SeedError::persistence(phase, Some(seed.reference.as_str()), err))
        })
    }

    fn seed_user_roles(&mut self, links: &[UserRoleLink], refs: &RefTable) -> SeedResult<usize> {
        self.link_phase(Phase::UserRoles, links, refs, |repo, user_id, role_id| {
            repo.add_role(user_id, role_id)
        })
    }

    fn seed_role_permissions(
        &mut self,
        links: &[RolePermissionLink],
        refs: &RefTable,
    ) -> SeedResult<usize> {
        self.link_phase(
            Phase::RolePermissions,
            links,
            refs,
            |repo, role_id, permission_id| {
                let permission = fetch_permission(repo, permission_id)?;
                repo.add_permission_to_role(role_id, &permission)
            },
        )
    }

    fn seed_user_permissions(
        &mut self,
        links: &[UserPermissionLink],
        refs: &RefTable,
    ) -> SeedResult<usize> {
        self.link_phase(
            Phase::UserPermissions,
            links,
            refs,
            |repo, user_id, permission_id| {
                let permission = fetch_permission(repo, permission_id)?;
                repo.add_permission_to_user(user_id, &permission)
            },
        )
    }

    fn seed_resource_permissions(
        &mut self,
        links: &[ResourcePermissionLink],
        refs: &RefTable,
    ) -> SeedResult<usize> {
        self.link_phase(
            Phase::ResourcePermissions,
            links,
            refs,
            |repo, resource_id, permission_id| {
                let permission = fetch_permission(repo, permission_id)?;
                repo.add_permission_to_resource(resource_id, &permission)
            },
        )
    }

    /// Creates every entry of one kind, then publishes their refs.
    ///
    /// Refs are staged until the phase commits, so a failed phase records none.
    fn create_phase<S, F>(
        &mut self,
        phase: Phase,
        kind: EntityKind,
        seeds: &[S],
        refs: &mut RefTable,
        mut create: F,
    ) -> SeedResult<usize>
    where
        S: SeedEntity,
        F: FnMut(&dyn AuthRepository, &RefTable, &S) -> SeedResult<Uuid>,
    {
        let resolved: &RefTable = refs;
        let staged = run_phase(&mut self.gateway, phase, |repo| {
            let mut staged = Vec::with_capacity(seeds.len());
            for seed in seeds {
                let id = create(repo, resolved, seed)?;
                debug!(
                    "event=seed_item module=seed status=ok phase={phase} kind={kind} ref={}",
                    seed.reference()
                );
                staged.push((seed.reference().to_string(), id));
            }
            Ok(staged)
        })?;

        let created = staged.len();
        for (reference, id) in staged {
            if refs.put(kind, reference.as_str(), id).is_some() {
                warn!(
                    "event=seed_ref module=seed status=overwrite phase={phase} kind={kind} ref={reference}"
                );
            }
        }
        Ok(created)
    }

    /// Resolves both refs of every link entry, then links them.
    fn link_phase<L, F>(
        &mut self,
        phase: Phase,
        links: &[L],
        refs: &RefTable,
        mut link: F,
    ) -> SeedResult<usize>
    where
        L: SeedLink,
        F: FnMut(&dyn AuthRepository, Uuid, Uuid) -> RepoResult<()>,
    {
        run_phase(&mut self.gateway, phase, |repo| {
            for entry in links {
                let (left_ref, right_ref) = entry.refs();
                let left = resolve(refs, phase, L::LEFT, left_ref, entry)?;
                let right = resolve(refs, phase, L::RIGHT, right_ref, entry)?;
                link(repo, left, right).map_err(|err| {
                    SeedError::persistence(phase, Some(entry.to_string().as_str()), err)
                })?;
                debug!("event=seed_item module=seed status=ok phase={phase} link={entry}");
            }
            Ok(links.len())
        })
    }
}

/// Runs `body` inside one gateway scope; commits on success, rolls back on error.
fn run_phase<G, T, F>(gateway: &mut G, phase: Phase, body: F) -> SeedResult<T>
where
    G: SeedGateway,
    F: FnOnce(&dyn AuthRepository) -> SeedResult<T>,
{
    let started_at = Instant::now();
    debug!("event=seed_phase module=seed status=start phase={phase}");

    let scope = gateway
        .begin_phase()
        .map_err(|err| SeedError::persistence(phase, None, err))?;

    match body(&scope) {
        Ok(value) => {
            scope
                .commit()
                .map_err(|err| SeedError::persistence(phase, None, err))?;
            info!(
                "event=seed_phase module=seed status=ok phase={phase} duration_ms={}",
                started_at.elapsed().as_millis()
            );
            Ok(value)
        }
        Err(err) => {
            if let Err(rollback_err) = scope.rollback() {
                warn!(
                    "event=seed_phase module=seed status=rollback_failed phase={phase} error={rollback_err}"
                );
            }
            error!(
                "event=seed_phase module=seed status=error phase={phase} error_code={} duration_ms={}",
                err.error_code(),
                started_at.elapsed().as_millis()
            );
            Err(err)
        }
    }
}

fn resolve(
    refs: &RefTable,
    phase: Phase,
    kind: EntityKind,
    reference: &str,
    record: &dyn Display,
) -> SeedResult<Uuid> {
    refs.get(kind, reference)
        .ok_or_else(|| SeedError::ReferenceNotFound {
            phase,
            kind,
            reference: reference.to_string(),
            record: record.to_string(),
        })
}

fn fetch_permission(repo: &dyn AuthRepository, id: PermissionId) -> RepoResult<Permission> {
    repo.get_permission(id)?.ok_or(RepoError::NotFound {
        kind: EntityKind::Permission,
        id,
    })
}

/// Seeds a SQLite auth store according to `config`.
///
/// Uses `config.assets_dir` when set, otherwise the bundled seed pack.
pub fn seed_database(
    conn: &mut Connection,
    config: &SeedConfig,
    cancel: CancelFlag,
) -> SeedResult<SeedReport> {
    config.validate()?;
    match &config.assets_dir {
        Some(dir) => seed_database_from(conn, &DirectoryAssets::new(dir), config, cancel),
        None => seed_database_from(conn, &bundled_assets(), config, cancel),
    }
}

/// Seeds a SQLite auth store from an explicit asset tree.
///
/// `RunMode::Atomic` runs every phase as a savepoint of one transaction that
/// commits only after the last phase; any failure rolls the whole run back.
pub fn seed_database_from<T: AssetTree + ?Sized>(
    conn: &mut Connection,
    tree: &T,
    config: &SeedConfig,
    cancel: CancelFlag,
) -> SeedResult<SeedReport> {
    info!(
        "event=seed_run module=seed status=configure run_mode={}",
        config.run_mode
    );

    match config.run_mode {
        RunMode::PerPhase => {
            let gateway = SqliteSeedGateway::new(conn).with_cancel(cancel);
            SeedService::new(gateway).seed_all(tree, config)
        }
        RunMode::Atomic => {
            let tx = conn
                .transaction_with_behavior(TransactionBehavior::Immediate)
                .map_err(|err| SeedError::Transaction(err.into()))?;
            let mut service =
                SeedService::new(SqliteSeedGateway::in_transaction(tx).with_cancel(cancel));
            let report = service.seed_all(tree, config)?;
            service
                .into_gateway()
                .finish()
                .map_err(SeedError::Transaction)?;
            Ok(report)
        }
    }
}
