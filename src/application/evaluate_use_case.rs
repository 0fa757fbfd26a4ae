// ============================================================
// Layer 2 — EvaluateUseCase
// ============================================================
// Restores a trained checkpoint and scores one dataset split
// without any parameter updates.
//
//   Step 1: Load the saved config         (Layer 6 - infra)
//           The architecture must match the checkpoint, so it
//           is rebuilt from train_config.json, never from CLI
//           flags.
//   Step 2: Load + configure tokenizer    (Layer 6 - infra)
//   Step 3: Build the requested split     (Layer 4 - data)
//   Step 4: Restore checkpoint + score    (Layer 5 - ml)
//
// Reference: Burn Book §5 (Records and Checkpointing)

use anyhow::Result;

use crate::data::cache::FeatureCache;
use crate::data::dataset::SymptomDataset;
use crate::data::loader::JsonRecordLoader;
use crate::domain::example::Mode;
use crate::infra::{checkpoint::CheckpointManager, tokenizer_store::TokenizerStore};
use crate::ml::trainer::run_evaluation;

/// Scores a trained checkpoint on one dataset split.
pub struct EvaluateUseCase {
    checkpoint_dir: String,
    mode:           Mode,
}

impl EvaluateUseCase {
    pub fn new(checkpoint_dir: impl Into<String>, mode: Mode) -> Self {
        Self {
            checkpoint_dir: checkpoint_dir.into(),
            mode,
        }
    }

    /// Returns (average BCE loss, accuracy) for the split.
    pub fn execute(&self) -> Result<(f64, f64)> {
        let ckpt_manager = CheckpointManager::new(&self.checkpoint_dir);

        // ── Step 1: Rebuild the exact training configuration ──────────────────
        let cfg = ckpt_manager.load_config()?;

        // ── Step 2: Tokenizer (same fingerprint inputs as training) ───────────
        let tokenizer = TokenizerStore::new(&cfg.tokenizer_path).load(cfg.max_seq_len)?;
        let tok_name  = TokenizerStore::identity(&tokenizer);

        // ── Step 3: Build the requested split (cache-aware) ───────────────────
        let loader = JsonRecordLoader::new(&cfg.data_dir, &cfg.task_name, cfg.fold);
        let cache  = FeatureCache::new(cfg.cache_location());

        let dataset = SymptomDataset::build(
            &loader,
            &cache,
            &cfg.cache_key(self.mode, tok_name),
            &tokenizer,
            cfg.num_labels,
        )?;
        tracing::info!(
            "Evaluating {} examples from the '{}' split",
            burn::data::dataset::Dataset::len(&dataset),
            self.mode,
        );

        // ── Step 4: Restore the checkpoint and score the split ────────────────
        run_evaluation(&cfg, dataset, &ckpt_manager)
    }
}
