// ============================================================
// Layer 2 — PrepareUseCase
// ============================================================
// Builds the tokenized feature caches ahead of time, without
// running any training. Useful when the raw corpus is large:
// tokenizing 500-token sequences is the slow part of startup,
// and doing it once up front makes every later training run
// start from the cache fast path.
//
// Workflow per requested split:
//   Step 1: Check the raw data file exists (skip with a warning
//           if it doesn't — test splits are often absent)
//   Step 2: Build the dataset, which tokenizes and writes the
//           cache file as a side effect
//
// Reference: Rust Book §9 (Error Handling)

use anyhow::Result;

use crate::data::cache::FeatureCache;
use crate::data::dataset::SymptomDataset;
use crate::data::loader::JsonRecordLoader;
use crate::domain::example::Mode;
use crate::infra::tokenizer_store::TokenizerStore;

use super::train_use_case::TrainConfig;

/// Pre-builds feature caches for the requested dataset splits.
pub struct PrepareUseCase {
    config: TrainConfig,
    modes:  Vec<Mode>,
}

impl PrepareUseCase {
    pub fn new(config: TrainConfig, modes: Vec<Mode>) -> Self {
        Self { config, modes }
    }

    /// Build the cache for every requested split.
    /// Splits whose raw data file is missing are skipped with a
    /// warning rather than aborting the whole run.
    pub fn execute(&self) -> Result<()> {
        let cfg = &self.config;

        // ── Step 1: Load + configure the tokenizer ────────────────────────────
        let tokenizer = TokenizerStore::new(&cfg.tokenizer_path).load(cfg.max_seq_len)?;
        let tok_name  = TokenizerStore::identity(&tokenizer);

        let loader = JsonRecordLoader::new(&cfg.data_dir, &cfg.task_name, cfg.fold);
        let cache  = FeatureCache::new(cfg.cache_location());

        // ── Step 2: Build each split's cache ──────────────────────────────────
        for &mode in &self.modes {
            let raw_path = loader.path_for(mode);
            if !raw_path.exists() {
                tracing::warn!(
                    "Skipping '{}' split: raw data file '{}' not found",
                    mode,
                    raw_path.display(),
                );
                continue;
            }

            let dataset = SymptomDataset::build(
                &loader,
                &cache,
                &cfg.cache_key(mode, tok_name),
                &tokenizer,
                cfg.num_labels,
            )?;
            tracing::info!(
                "Cache ready for '{}' split ({} examples)",
                mode,
                burn::data::dataset::Dataset::len(&dataset),
            );
        }

        Ok(())
    }
}
