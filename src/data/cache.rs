// ============================================================
// Layer 4 — Feature Cache
// ============================================================
// Persists a split's encoded FeatureSet to disk so the
// tokeniser only ever runs once per configuration.
//
// The cache file is keyed by a FINGERPRINT derived from:
//   (mode, tokenizer identity, max_seq_len, task_name, fold)
//
// File naming convention:
//   {cache_dir}/cached_{mode}_{tokenizer}_{max_seq_len}_{task}_{fold}.json
//
// Lifecycle:
//   - created lazily the first time a dataset is built
//   - read thereafter without re-tokenising
//   - NEVER invalidated automatically — changing the
//     tokenizer or sequence length changes the fingerprint,
//     producing a new file instead of overwriting the old one
//
// Concurrency note: two processes building the same
// fingerprint for the first time may both write the file.
// That race is tolerated as last-writer-wins — for a fixed
// configuration both writers produce identical bytes, so the
// outcome is the same either way. No file locking is taken.
//
// Reference: Rust Book §9 (Error Handling)
//            Rust Book §12 (I/O and File Handling)

use anyhow::{Context, Result};
use std::{fs, path::PathBuf};

use crate::data::features::FeatureSet;
use crate::domain::example::Mode;

/// Everything that identifies one cache file.
#[derive(Debug, Clone)]
pub struct CacheKey {
    pub mode:           Mode,
    pub tokenizer_name: String,
    pub max_seq_len:    usize,
    pub task_name:      String,
    pub fold:           usize,
}

impl CacheKey {
    /// The file name this key fingerprints to
    pub fn fingerprint(&self) -> String {
        format!(
            "cached_{}_{}_{}_{}_{}.json",
            self.mode.as_str(),
            self.tokenizer_name,
            self.max_seq_len,
            self.task_name,
            self.fold,
        )
    }
}

/// Reads and writes FeatureSets at fingerprinted paths.
pub struct FeatureCache {
    dir: PathBuf,
}

impl FeatureCache {
    /// Create a cache rooted at `dir`.
    /// Creates the directory if it doesn't already exist.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        let dir = PathBuf::from(dir.into());
        fs::create_dir_all(&dir).ok();
        Self { dir }
    }

    pub fn path_for(&self, key: &CacheKey) -> PathBuf {
        self.dir.join(key.fingerprint())
    }

    /// Try the fast path: deserialise a previously written cache
    /// file for this key.
    ///
    /// Returns:
    ///   - Some(set) on a clean hit
    ///   - None when no file exists
    ///   - None (with a warning) when the file exists but is
    ///     corrupt or shaped wrong — the caller falls back to
    ///     rebuilding from the raw JSON and overwrites it
    pub fn load(&self, key: &CacheKey) -> Option<FeatureSet> {
        let path = self.path_for(key);
        if !path.exists() {
            return None;
        }

        let raw = match fs::read_to_string(&path) {
            Ok(raw) => raw,
            Err(e) => {
                tracing::warn!("Cannot read cache '{}': {} — rebuilding", path.display(), e);
                return None;
            }
        };

        let set: FeatureSet = match serde_json::from_str(&raw) {
            Ok(set) => set,
            Err(e) => {
                tracing::warn!(
                    "Cache '{}' failed to deserialise: {} — rebuilding",
                    path.display(),
                    e
                );
                return None;
            }
        };

        if !set.is_consistent(key.max_seq_len) {
            tracing::warn!(
                "Cache '{}' has inconsistent record shapes — rebuilding",
                path.display()
            );
            return None;
        }

        tracing::info!("Loading features from cached file '{}'", path.display());
        Some(set)
    }

    /// Persist a freshly built FeatureSet at this key's path.
    pub fn save(&self, key: &CacheKey, set: &FeatureSet) -> Result<()> {
        let path = self.path_for(key);
        let json = serde_json::to_string(set)?;

        fs::write(&path, json)
            .with_context(|| format!("Cannot write cache file '{}'", path.display()))?;

        tracing::info!("Saving features into cached file '{}'", path.display());
        Ok(())
    }
}
