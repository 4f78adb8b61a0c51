#![allow(dead_code)]

use authseed_core::{AssetTree, LoadError, LoadResult};
use std::collections::BTreeMap;

/// In-memory asset tree keyed by relative path.
#[derive(Default)]
pub struct MemoryTree {
    files: BTreeMap<String, Vec<u8>>,
}

impl MemoryTree {
    pub fn new() -> Self {
        Self::default()
    }

    /// Tree holding one `auth` document for the sqlite engine.
    pub fn auth_document(body: &str) -> Self {
        Self::new().with("seed/sqlite/20240101000000-auth.json", body)
    }

    pub fn with(mut self, path: &str, body: &str) -> Self {
        self.files
            .insert(path.to_string(), body.as_bytes().to_vec());
        self
    }
}

impl AssetTree for MemoryTree {
    fn files(&self) -> LoadResult<Vec<String>> {
        Ok(self.files.keys().cloned().collect())
    }

    fn read(&self, path: &str) -> LoadResult<Vec<u8>> {
        self.files
            .get(path)
            .cloned()
            .ok_or_else(|| LoadError::MissingAsset(path.to_string()))
    }
}

pub fn link_count(conn: &rusqlite::Connection, table: &str) -> i64 {
    conn.query_row(&format!("SELECT COUNT(*) FROM {table};"), [], |row| {
        row.get(0)
    })
    .unwrap()
}
