//! Seed asset discovery.
//!
//! # Responsibility
//! - Enumerate seed documents under `seed/<engine>/` of an asset tree.
//! - Derive `(timestamp, feature)` from `<timestamp>-<feature>.json` names.
//! - Group raw document bytes by feature, in timestamp order.
//!
//! # Invariants
//! - Asset trees are read-only; loading performs reads only.
//! - A `.json` file that violates the naming convention fails the whole load.

use log::{debug, error, info};
use rust_embed::RustEmbed;
use std::collections::BTreeMap;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::marker::PhantomData;
use std::path::PathBuf;
use std::time::Instant;
use walkdir::WalkDir;

const SEED_ROOT: &str = "seed";
const SEED_EXTENSION: &str = ".json";
const NAME_DELIMITER: char = '-';

pub type LoadResult<T> = Result<T, LoadError>;

#[derive(Debug)]
pub enum LoadError {
    /// The asset tree could not be walked.
    Walk { root: PathBuf, message: String },
    /// A listed asset could not be read.
    Io {
        path: String,
        source: std::io::Error,
    },
    /// A listed asset disappeared before it was read.
    MissingAsset(String),
    /// File name is not `<timestamp>-<feature>.json`.
    InvalidFileName(String),
}

impl Display for LoadError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Walk { root, message } => {
                write!(f, "failed to walk asset tree `{}`: {message}", root.display())
            }
            Self::Io { path, source } => write!(f, "failed to read asset `{path}`: {source}"),
            Self::MissingAsset(path) => write!(f, "asset not found: {path}"),
            Self::InvalidFileName(path) => write!(
                f,
                "seed file `{path}` does not match `<timestamp>-<feature>.json`"
            ),
        }
    }
}

impl Error for LoadError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Io { source, .. } => Some(source),
            Self::Walk { .. } | Self::MissingAsset(_) | Self::InvalidFileName(_) => None,
        }
    }
}

/// Read-only tree of assets addressed by `/`-separated relative paths.
pub trait AssetTree {
    /// Lists every file in the tree.
    fn files(&self) -> LoadResult<Vec<String>>;
    /// Reads one file listed by `files`.
    fn read(&self, path: &str) -> LoadResult<Vec<u8>>;
}

/// Seed documents compiled into the binary.
#[derive(RustEmbed)]
#[folder = "assets/"]
pub struct BundledSeeds;

/// Asset tree over any `rust-embed` folder.
pub struct EmbeddedAssets<E: RustEmbed> {
    _embed: PhantomData<E>,
}

impl<E: RustEmbed> EmbeddedAssets<E> {
    pub fn new() -> Self {
        Self {
            _embed: PhantomData,
        }
    }
}

impl<E: RustEmbed> Default for EmbeddedAssets<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E: RustEmbed> AssetTree for EmbeddedAssets<E> {
    fn files(&self) -> LoadResult<Vec<String>> {
        Ok(E::iter().map(|path| path.into_owned()).collect())
    }

    fn read(&self, path: &str) -> LoadResult<Vec<u8>> {
        E::get(path)
            .map(|file| file.data.into_owned())
            .ok_or_else(|| LoadError::MissingAsset(path.to_string()))
    }
}

/// The seed pack shipped with this crate.
pub fn bundled_assets() -> EmbeddedAssets<BundledSeeds> {
    EmbeddedAssets::new()
}

/// Asset tree rooted at a directory on disk.
#[derive(Debug, Clone)]
pub struct DirectoryAssets {
    root: PathBuf,
}

impl DirectoryAssets {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

impl AssetTree for DirectoryAssets {
    fn files(&self) -> LoadResult<Vec<String>> {
        let mut files = Vec::new();
        for entry in WalkDir::new(&self.root).follow_links(false) {
            let entry = entry.map_err(|err| LoadError::Walk {
                root: self.root.clone(),
                message: err.to_string(),
            })?;
            if entry.file_type().is_dir() {
                continue;
            }

            let relative = entry
                .path()
                .strip_prefix(&self.root)
                .map_err(|err| LoadError::Walk {
                    root: self.root.clone(),
                    message: err.to_string(),
                })?;
            let parts: Vec<String> = relative
                .components()
                .map(|component| component.as_os_str().to_string_lossy().into_owned())
                .collect();
            files.push(parts.join("/"));
        }
        Ok(files)
    }

    fn read(&self, path: &str) -> LoadResult<Vec<u8>> {
        std::fs::read(self.root.join(path)).map_err(|source| LoadError::Io {
            path: path.to_string(),
            source,
        })
    }
}

/// One seed document's raw bytes plus the metadata taken from its name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawSeed {
    pub timestamp: String,
    pub feature: String,
    /// Path inside the asset tree, for diagnostics.
    pub path: String,
    pub content: Vec<u8>,
}

/// Raw seeds grouped by feature name, each group in timestamp order.
pub type SeedGroups = BTreeMap<String, Vec<RawSeed>>;

/// Discovers seed documents for one storage engine.
pub struct AssetLoader<'a, T: AssetTree + ?Sized> {
    tree: &'a T,
    engine: &'a str,
}

impl<'a, T: AssetTree + ?Sized> AssetLoader<'a, T> {
    pub fn new(tree: &'a T, engine: &'a str) -> Self {
        Self { tree, engine }
    }

    /// Loads and groups every seed document under `seed/<engine>/`.
    ///
    /// # Errors
    /// - `LoadError` when the tree cannot be listed or read, or when a
    ///   `.json` file name is not `<timestamp>-<feature>.json`.
    pub fn load(&self) -> LoadResult<SeedGroups> {
        let started_at = Instant::now();
        let prefix = format!("{SEED_ROOT}/{}/", self.engine);

        let result = self.load_under(&prefix);
        match &result {
            Ok(groups) => info!(
                "event=seed_load module=seed status=ok engine={} features={} documents={} duration_ms={}",
                self.engine,
                groups.len(),
                groups.values().map(Vec::len).sum::<usize>(),
                started_at.elapsed().as_millis()
            ),
            Err(err) => error!(
                "event=seed_load module=seed status=error engine={} duration_ms={} error={err}",
                self.engine,
                started_at.elapsed().as_millis()
            ),
        }
        result
    }

    fn load_under(&self, prefix: &str) -> LoadResult<SeedGroups> {
        let mut groups = SeedGroups::new();

        for path in self.tree.files()? {
            if !path.starts_with(prefix) || !path.ends_with(SEED_EXTENSION) {
                debug!("event=seed_load module=seed status=skip path={path}");
                continue;
            }

            let file_name = path.rsplit('/').next().unwrap_or(path.as_str());
            let (timestamp, feature) = parse_seed_file_name(file_name)
                .ok_or_else(|| LoadError::InvalidFileName(path.clone()))?;
            let content = self.tree.read(&path)?;

            groups.entry(feature.clone()).or_default().push(RawSeed {
                timestamp,
                feature,
                path,
                content,
            });
        }

        for seeds in groups.values_mut() {
            seeds.sort_by(|a, b| {
                a.timestamp
                    .cmp(&b.timestamp)
                    .then_with(|| a.path.cmp(&b.path))
            });
        }

        Ok(groups)
    }
}

/// Splits `<timestamp>-<feature>.json` into its two parts.
///
/// The timestamp must be ASCII digits so that lexical order is time order.
pub fn parse_seed_file_name(file_name: &str) -> Option<(String, String)> {
    let stem = file_name.strip_suffix(SEED_EXTENSION)?;
    let parts: Vec<&str> = stem.split(NAME_DELIMITER).collect();
    let [timestamp, feature] = parts.as_slice() else {
        return None;
    };

    if timestamp.is_empty() || !timestamp.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    if feature.trim().is_empty() {
        return None;
    }

    Some((timestamp.to_string(), feature.to_string()))
}
