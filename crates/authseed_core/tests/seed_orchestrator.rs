use authseed_core::{
    AuthRepository, EntityKind, Org, OrgId, Permission, PermissionId, Phase, PhaseScope, RefTable,
    RepoError, RepoResult, Resource, ResourceId, Role, RoleId, SeedDocument, SeedError,
    SeedGateway, SeedService, Team, TeamId, User, UserId,
};
use std::cell::RefCell;
use std::collections::HashMap;
use uuid::Uuid;

/// Gateway fake that records every call as `method:arg` and never persists.
#[derive(Default)]
struct RecordingGateway {
    calls: RefCell<Vec<String>>,
    names: RefCell<HashMap<Uuid, String>>,
    permissions: RefCell<HashMap<Uuid, Permission>>,
    fail_on: Option<String>,
}

impl RecordingGateway {
    fn failing_on(call: &str) -> Self {
        Self {
            fail_on: Some(call.to_string()),
            ..Self::default()
        }
    }

    fn calls(&self) -> Vec<String> {
        self.calls.borrow().clone()
    }

    /// Repository calls only, without scope bookkeeping.
    fn repo_calls(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter(|call| !matches!(call.as_str(), "begin" | "commit" | "rollback"))
            .collect()
    }

    fn record(&self, call: String) -> RepoResult<()> {
        let failed = self.fail_on.as_deref() == Some(call.as_str());
        self.calls.borrow_mut().push(call);
        if failed {
            return Err(RepoError::InvalidData("injected failure".to_string()));
        }
        Ok(())
    }

    fn created(&self, method: &str, id: Uuid, name: &str) -> RepoResult<Uuid> {
        self.record(format!("{method}:{name}"))?;
        self.names.borrow_mut().insert(id, name.to_string());
        Ok(id)
    }

    fn linked(&self, method: &str, left: Uuid, right: Uuid) -> RepoResult<()> {
        let names = self.names.borrow();
        let name = |id: &Uuid| names.get(id).cloned().unwrap_or_else(|| id.to_string());
        let call = format!("{method}:{}->{}", name(&left), name(&right));
        drop(names);
        self.record(call)
    }
}

struct RecordingScope<'s> {
    gateway: &'s RecordingGateway,
}

impl SeedGateway for RecordingGateway {
    type Scope<'s> = RecordingScope<'s>;

    fn begin_phase(&mut self) -> RepoResult<RecordingScope<'_>> {
        self.record("begin".to_string())?;
        Ok(RecordingScope { gateway: self })
    }
}

impl PhaseScope for RecordingScope<'_> {
    fn commit(self) -> RepoResult<()> {
        self.gateway.record("commit".to_string())
    }

    fn rollback(self) -> RepoResult<()> {
        self.gateway.record("rollback".to_string())
    }
}

impl AuthRepository for RecordingScope<'_> {
    fn create_user(&self, user: &User) -> RepoResult<UserId> {
        self.gateway.created("create_user", user.id, &user.username)
    }

    fn create_org(&self, org: &Org) -> RepoResult<OrgId> {
        self.gateway.created("create_org", org.id, &org.name)
    }

    fn create_team(&self, team: &Team) -> RepoResult<TeamId> {
        self.gateway.created("create_team", team.id, &team.name)
    }

    fn create_role(&self, role: &Role) -> RepoResult<RoleId> {
        self.gateway.created("create_role", role.id, &role.name)
    }

    fn create_permission(&self, permission: &Permission) -> RepoResult<PermissionId> {
        let id = self
            .gateway
            .created("create_permission", permission.id, &permission.name)?;
        self.gateway
            .permissions
            .borrow_mut()
            .insert(id, permission.clone());
        Ok(id)
    }

    fn create_resource(&self, resource: &Resource) -> RepoResult<ResourceId> {
        self.gateway
            .created("create_resource", resource.id, &resource.name)
    }

    fn add_org_owner(&self, org_id: OrgId, user_id: UserId) -> RepoResult<()> {
        self.gateway.linked("add_org_owner", org_id, user_id)
    }

    fn add_role(&self, user_id: UserId, role_id: RoleId) -> RepoResult<()> {
        self.gateway.linked("add_role", user_id, role_id)
    }

    fn add_permission_to_role(&self, role_id: RoleId, permission: &Permission) -> RepoResult<()> {
        self.gateway
            .linked("add_permission_to_role", role_id, permission.id)
    }

    fn add_permission_to_user(&self, user_id: UserId, permission: &Permission) -> RepoResult<()> {
        self.gateway
            .linked("add_permission_to_user", user_id, permission.id)
    }

    fn add_permission_to_resource(
        &self,
        resource_id: ResourceId,
        permission: &Permission,
    ) -> RepoResult<()> {
        self.gateway
            .linked("add_permission_to_resource", resource_id, permission.id)
    }

    fn get_user(&self, _id: UserId) -> RepoResult<Option<User>> {
        Ok(None)
    }

    fn get_org(&self, _id: OrgId) -> RepoResult<Option<Org>> {
        Ok(None)
    }

    fn get_team(&self, _id: TeamId) -> RepoResult<Option<Team>> {
        Ok(None)
    }

    fn get_role(&self, _id: RoleId) -> RepoResult<Option<Role>> {
        Ok(None)
    }

    fn get_permission(&self, id: PermissionId) -> RepoResult<Option<Permission>> {
        self.gateway.record("get_permission".to_string())?;
        Ok(self.gateway.permissions.borrow().get(&id).cloned())
    }

    fn get_resource(&self, _id: ResourceId) -> RepoResult<Option<Resource>> {
        Ok(None)
    }

    fn list_org_owners(&self, _org_id: OrgId) -> RepoResult<Vec<UserId>> {
        Ok(Vec::new())
    }

    fn list_user_roles(&self, _user_id: UserId) -> RepoResult<Vec<RoleId>> {
        Ok(Vec::new())
    }

    fn list_role_permissions(&self, _role_id: RoleId) -> RepoResult<Vec<Permission>> {
        Ok(Vec::new())
    }

    fn list_user_permissions(&self, _user_id: UserId) -> RepoResult<Vec<Permission>> {
        Ok(Vec::new())
    }

    fn list_resource_permissions(&self, _resource_id: ResourceId) -> RepoResult<Vec<Permission>> {
        Ok(Vec::new())
    }

    fn count(&self, _kind: EntityKind) -> RepoResult<u64> {
        Ok(0)
    }
}

fn apply(
    gateway: RecordingGateway,
    body: &str,
) -> (RecordingGateway, RefTable, Result<usize, SeedError>) {
    let document = SeedDocument::parse(body.as_bytes()).unwrap();
    let mut refs = RefTable::new();
    let mut service = SeedService::new(gateway);
    let result = service
        .apply_document(&document, &mut refs)
        .map(|phases| phases.len());
    (service.into_gateway(), refs, result)
}

const FULL_DOCUMENT: &str = r#"{
    "users": [{"ref": "alice", "username": "alice", "email": "alice@example.com"}],
    "orgs": [{"ref": "acme", "name": "acme"}],
    "teams": [{"ref": "core", "org_ref": "acme", "name": "core"}],
    "roles": [{"ref": "admin", "name": "admin"}],
    "permissions": [{"ref": "read", "name": "read"}],
    "resources": [{"ref": "orgs", "name": "orgs"}],
    "user_roles": [{"user_ref": "alice", "role_ref": "admin"}],
    "role_permissions": [{"role_ref": "admin", "permission_ref": "read"}],
    "user_permissions": [{"user_ref": "alice", "permission_ref": "read"}],
    "resource_permissions": [{"resource_ref": "orgs", "permission_ref": "read"}],
    "org_owners": [{"org_ref": "acme", "user_ref": "alice"}]
}"#;

#[test]
fn phases_call_gateway_in_dependency_order() {
    let (gateway, refs, result) = apply(RecordingGateway::default(), FULL_DOCUMENT);

    assert_eq!(result.unwrap(), Phase::ALL.len());
    assert_eq!(
        gateway.repo_calls(),
        vec![
            "create_user:alice",
            "create_org:acme",
            "add_org_owner:acme->alice",
            "create_team:core",
            "create_role:admin",
            "create_permission:read",
            "create_resource:orgs",
            "add_role:alice->admin",
            "get_permission",
            "add_permission_to_role:admin->read",
            "get_permission",
            "add_permission_to_user:alice->read",
            "get_permission",
            "add_permission_to_resource:orgs->read",
        ]
    );
    assert_eq!(refs.len(EntityKind::User), 1);
    assert!(refs.contains(EntityKind::Team, "core"));
}

#[test]
fn every_phase_opens_and_commits_one_scope() {
    let (gateway, _, result) = apply(RecordingGateway::default(), "{}");

    assert_eq!(result.unwrap(), Phase::ALL.len());
    let calls = gateway.calls();
    assert_eq!(calls.len(), Phase::ALL.len() * 2);
    assert!(calls
        .chunks(2)
        .all(|pair| pair[0] == "begin" && pair[1] == "commit"));
}

#[test]
fn team_with_unresolved_org_makes_no_create_call() {
    let (gateway, refs, result) = apply(
        RecordingGateway::default(),
        r#"{"teams": [{"ref": "core", "org_ref": "ghost", "name": "core"}]}"#,
    );

    assert!(matches!(
        result,
        Err(SeedError::ReferenceNotFound { phase: Phase::Teams, kind: EntityKind::Org, .. })
    ));
    assert!(gateway.repo_calls().is_empty());
    let calls = gateway.calls();
    assert_eq!(&calls[calls.len() - 2..], ["begin", "rollback"]);
    // Users, Orgs and OrgOwners committed; Teams rolled back; nothing after.
    assert_eq!(calls.len(), 3 * 2 + 2);
    assert!(refs.is_empty());
}

#[test]
fn unresolved_link_ref_skips_the_link_call() {
    let (gateway, _, result) = apply(
        RecordingGateway::default(),
        r#"{
            "roles": [{"ref": "admin", "name": "admin"}],
            "role_permissions": [{"role_ref": "admin", "permission_ref": "missing"}]
        }"#,
    );

    match result {
        Err(SeedError::ReferenceNotFound {
            phase,
            kind,
            reference,
            record,
        }) => {
            assert_eq!(phase, Phase::RolePermissions);
            assert_eq!(kind, EntityKind::Permission);
            assert_eq!(reference, "missing");
            assert_eq!(
                record,
                "role_permissions{role_ref=admin, permission_ref=missing}"
            );
        }
        other => panic!("unexpected result: {other:?}"),
    }
    assert_eq!(gateway.repo_calls(), vec!["create_role:admin"]);
    assert_eq!(gateway.calls().last().map(String::as_str), Some("rollback"));
}

#[test]
fn failing_item_stops_its_phase_and_publishes_no_refs() {
    let (gateway, refs, result) = apply(
        RecordingGateway::failing_on("create_role:b"),
        r#"{
            "roles": [
                {"ref": "a", "name": "a"},
                {"ref": "b", "name": "b"},
                {"ref": "c", "name": "c"}
            ],
            "permissions": [{"ref": "read", "name": "read"}]
        }"#,
    );

    match result {
        Err(SeedError::Persistence {
            phase,
            reference,
            source,
        }) => {
            assert_eq!(phase, Phase::Roles);
            assert_eq!(reference.as_deref(), Some("b"));
            assert!(matches!(source, RepoError::InvalidData(_)));
        }
        other => panic!("unexpected result: {other:?}"),
    }
    assert_eq!(gateway.repo_calls(), vec!["create_role:a", "create_role:b"]);
    assert_eq!(gateway.calls().last().map(String::as_str), Some("rollback"));
    assert_eq!(refs.len(EntityKind::Role), 0);
}

#[test]
fn failed_commit_reports_phase_without_item_ref() {
    let (gateway, refs, result) = apply(
        RecordingGateway::failing_on("commit"),
        r#"{"users": [{"ref": "alice", "username": "alice", "email": "alice@example.com"}]}"#,
    );

    assert!(matches!(
        result,
        Err(SeedError::Persistence { phase: Phase::Users, reference: None, .. })
    ));
    assert_eq!(gateway.repo_calls(), vec!["create_user:alice"]);
    assert!(refs.is_empty());
}

#[test]
fn refs_from_one_document_resolve_in_the_next() {
    let document_a = SeedDocument::parse(
        br#"{"users": [{"ref": "alice", "username": "alice", "email": "alice@example.com"}]}"#,
    )
    .unwrap();
    let document_b = SeedDocument::parse(
        br#"{
            "orgs": [{"ref": "acme", "name": "acme"}],
            "org_owners": [{"org_ref": "acme", "user_ref": "alice"}]
        }"#,
    )
    .unwrap();
    let mut refs = RefTable::new();
    let mut service = SeedService::new(RecordingGateway::default());

    service.apply_document(&document_a, &mut refs).unwrap();
    service.apply_document(&document_b, &mut refs).unwrap();

    assert!(service
        .gateway()
        .repo_calls()
        .contains(&"add_org_owner:acme->alice".to_string()));
}
