//! Seed-data loading and reference resolution for the auth store.
//!
//! Turns declarative seed documents (users, orgs, teams, roles, permissions,
//! resources and the links between them) into persisted records with
//! generated identities, resolving symbolic refs along the way.

pub mod config;
pub mod db;
pub mod logging;
pub mod model;
pub mod repo;
pub mod seed;
pub mod service;

pub use config::{ConfigError, RunMode, SeedConfig};
pub use logging::{default_log_level, init_logging, logging_status};
pub use model::access::{Permission, PermissionId, Resource, ResourceId, Role, RoleId};
pub use model::org::{Org, OrgId, Team, TeamId};
pub use model::user::{User, UserId};
pub use model::{EntityKind, EntityStatus, ModelValidationError};
pub use repo::auth_repo::{AuthRepository, RepoError, RepoResult, SqliteAuthRepository};
pub use repo::gateway::{
    CancelFlag, PhaseScope, SeedGateway, SqlitePhaseScope, SqliteSeedGateway,
};
pub use seed::assets::{
    bundled_assets, AssetLoader, AssetTree, DirectoryAssets, EmbeddedAssets, LoadError, LoadResult,
    RawSeed,
};
pub use seed::document::{ParseError, SeedDocument};
pub use seed::error::{SeedError, SeedResult};
pub use seed::phase::Phase;
pub use seed::resolver::RefTable;
pub use service::seed_service::{
    load_documents, seed_database, seed_database_from, DocumentReport, PhaseReport, SeedReport,
    SeedService,
};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
