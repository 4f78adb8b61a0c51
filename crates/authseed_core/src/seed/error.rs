//! Seeding error taxonomy.

use crate::config::ConfigError;
use crate::model::EntityKind;
use crate::repo::auth_repo::RepoError;
use crate::seed::assets::LoadError;
use crate::seed::document::ParseError;
use crate::seed::phase::Phase;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub type SeedResult<T> = Result<T, SeedError>;

#[derive(Debug)]
pub enum SeedError {
    Config(ConfigError),
    Load(LoadError),
    /// No seed document exists for the requested feature.
    NoDocuments { engine: String, feature: String },
    Parse { path: String, source: ParseError },
    /// A symbolic ref is absent from its kind's reference table.
    ReferenceNotFound {
        phase: Phase,
        kind: EntityKind,
        reference: String,
        /// The entry that carried the ref, rendered for diagnosis.
        record: String,
    },
    /// A gateway call failed inside a phase.
    Persistence {
        phase: Phase,
        reference: Option<String>,
        source: RepoError,
    },
    /// Beginning or committing the run-wide transaction failed.
    Transaction(RepoError),
}

impl SeedError {
    pub(crate) fn persistence(phase: Phase, reference: Option<&str>, source: RepoError) -> Self {
        Self::Persistence {
            phase,
            reference: reference.map(str::to_string),
            source,
        }
    }

    /// Phase the failure happened in, when it happened inside one.
    pub fn phase(&self) -> Option<Phase> {
        match self {
            Self::ReferenceNotFound { phase, .. } | Self::Persistence { phase, .. } => {
                Some(*phase)
            }
            Self::Config(_)
            | Self::Load(_)
            | Self::NoDocuments { .. }
            | Self::Parse { .. }
            | Self::Transaction(_) => None,
        }
    }

    pub fn error_code(&self) -> &'static str {
        match self {
            Self::Config(_) => "seed_config_invalid",
            Self::Load(_) => "seed_load_failed",
            Self::NoDocuments { .. } => "seed_no_documents",
            Self::Parse { .. } => "seed_parse_failed",
            Self::ReferenceNotFound { .. } => "seed_reference_not_found",
            Self::Persistence { .. } => "seed_persistence_failed",
            Self::Transaction(_) => "seed_transaction_failed",
        }
    }
}

impl Display for SeedError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Config(err) => write!(f, "invalid seed config: {err}"),
            Self::Load(err) => write!(f, "{err}"),
            Self::NoDocuments { engine, feature } => write!(
                f,
                "no seed documents for feature `{feature}` under seed/{engine}/"
            ),
            Self::Parse { path, source } => write!(f, "{path}: {source}"),
            Self::ReferenceNotFound {
                phase,
                kind,
                reference,
                record,
            } => write!(
                f,
                "{phase}: {kind} ref `{reference}` not found (in {record})"
            ),
            Self::Persistence {
                phase,
                reference: Some(reference),
                source,
            } => write!(f, "{phase}: ref `{reference}`: {source}"),
            Self::Persistence {
                phase,
                reference: None,
                source,
            } => write!(f, "{phase}: {source}"),
            Self::Transaction(err) => write!(f, "seed run transaction failed: {err}"),
        }
    }
}

impl Error for SeedError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Config(err) => Some(err),
            Self::Load(err) => Some(err),
            Self::Parse { source, .. } => Some(source),
            Self::Persistence { source, .. } => Some(source),
            Self::Transaction(err) => Some(err),
            Self::NoDocuments { .. } | Self::ReferenceNotFound { .. } => None,
        }
    }
}

impl From<LoadError> for SeedError {
    fn from(value: LoadError) -> Self {
        Self::Load(value)
    }
}

impl From<ConfigError> for SeedError {
    fn from(value: ConfigError) -> Self {
        Self::Config(value)
    }
}
