use authseed_core::db::open_db_in_memory;
use authseed_core::{
    bundled_assets, load_documents, seed_database, AssetLoader, AssetTree, CancelFlag,
    DirectoryAssets, EmbeddedAssets, LoadError, Phase, SeedConfig, SeedError,
};
use rust_embed::RustEmbed;
use std::fs;
use std::path::Path;
use tempfile::TempDir;

#[derive(RustEmbed)]
#[folder = "tests/fixtures/"]
struct FixtureSeeds;

fn write_seed(root: &Path, relative: &str, body: &str) {
    let path = root.join(relative);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, body).unwrap();
}

#[test]
fn embedded_fixtures_group_by_feature_in_timestamp_order() {
    let tree = EmbeddedAssets::<FixtureSeeds>::new();

    let groups = AssetLoader::new(&tree, "sqlite").load().unwrap();

    assert_eq!(
        groups.keys().map(String::as_str).collect::<Vec<_>>(),
        vec!["auth", "billing"]
    );
    let auth: Vec<&str> = groups["auth"]
        .iter()
        .map(|seed| seed.timestamp.as_str())
        .collect();
    assert_eq!(auth, vec!["20240101000000", "20240201000000"]);
    assert_eq!(groups["auth"][0].path, "seed/sqlite/20240101000000-auth.json");
}

#[test]
fn loader_ignores_other_engines() {
    let tree = EmbeddedAssets::<FixtureSeeds>::new();

    let groups = AssetLoader::new(&tree, "postgres").load().unwrap();

    assert_eq!(groups.len(), 1);
    assert_eq!(groups["auth"].len(), 1);
    assert!(AssetLoader::new(&tree, "mysql").load().unwrap().is_empty());
}

#[test]
fn bundled_pack_contains_one_auth_document() {
    let tree = bundled_assets();

    let documents = load_documents(&tree, "sqlite", "auth").unwrap();

    assert_eq!(documents.len(), 1);
    let document = &documents[0].document;
    assert_eq!(document.users.len(), 3);
    assert_eq!(document.org_owners.len(), 1);
    assert!(document.entry_count() > 0);
}

#[test]
fn directory_tree_lists_nested_files_with_forward_slashes() {
    let dir = TempDir::new().unwrap();
    write_seed(dir.path(), "seed/sqlite/20240101000000-auth.json", "{}");
    write_seed(dir.path(), "notes/readme.md", "ignored");

    let tree = DirectoryAssets::new(dir.path());
    let mut files = tree.files().unwrap();
    files.sort();

    assert_eq!(
        files,
        vec!["notes/readme.md", "seed/sqlite/20240101000000-auth.json"]
    );
    assert_eq!(
        tree.read("seed/sqlite/20240101000000-auth.json").unwrap(),
        b"{}"
    );
}

#[test]
fn directory_tree_reports_unreadable_asset() {
    let dir = TempDir::new().unwrap();
    let tree = DirectoryAssets::new(dir.path());

    let err = tree.read("seed/sqlite/missing.json").unwrap_err();

    assert!(matches!(err, LoadError::Io { ref path, .. } if path == "seed/sqlite/missing.json"));
}

#[test]
fn missing_directory_fails_to_walk() {
    let dir = TempDir::new().unwrap();
    let tree = DirectoryAssets::new(dir.path().join("absent"));

    assert!(matches!(tree.files(), Err(LoadError::Walk { .. })));
}

#[test]
fn malformed_seed_file_name_is_rejected() {
    let dir = TempDir::new().unwrap();
    write_seed(dir.path(), "seed/sqlite/20240101000000-auth.json", "{}");
    write_seed(dir.path(), "seed/sqlite/20240101-auth-extra.json", "{}");

    let tree = DirectoryAssets::new(dir.path());
    let err = AssetLoader::new(&tree, "sqlite").load().unwrap_err();

    assert!(matches!(
        err,
        LoadError::InvalidFileName(ref path) if path == "seed/sqlite/20240101-auth-extra.json"
    ));
}

#[test]
fn seed_database_reads_configured_directory() {
    let dir = TempDir::new().unwrap();
    write_seed(
        dir.path(),
        "seed/sqlite/20240101000000-auth.json",
        r#"{"roles": [{"ref": "viewer", "name": "viewer"}]}"#,
    );
    let config = SeedConfig {
        assets_dir: Some(dir.path().to_path_buf()),
        ..SeedConfig::default()
    };
    let mut conn = open_db_in_memory().unwrap();

    let report = seed_database(&mut conn, &config, CancelFlag::new()).unwrap();

    assert_eq!(report.items(Phase::Roles), 1);
    assert_eq!(report.items(Phase::Users), 0);
}

#[test]
fn seed_database_surfaces_load_errors() {
    let dir = TempDir::new().unwrap();
    write_seed(dir.path(), "seed/sqlite/latest-auth.json", "{}");
    let config = SeedConfig {
        assets_dir: Some(dir.path().to_path_buf()),
        ..SeedConfig::default()
    };
    let mut conn = open_db_in_memory().unwrap();

    let err = seed_database(&mut conn, &config, CancelFlag::new()).unwrap_err();

    assert!(matches!(err, SeedError::Load(LoadError::InvalidFileName(_))));
}
