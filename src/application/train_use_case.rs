// ============================================================
// Layer 2 — TrainUseCase
// ============================================================
// Orchestrates the full training pipeline in order:
//
//   Step 1: Load + configure tokenizer   (Layer 6 - infra)
//   Step 2: Build train dataset          (Layer 4 - data, cache-aware)
//   Step 3: Build validation dataset     (Layer 4 - data, cache-aware)
//   Step 4: Save config                  (Layer 6 - infra)
//   Step 5: Run training loop            (Layer 5 - ml)
//
// The config is one explicit, immutable value owned here and
// passed by reference into each component — no component reads
// ambient global state.
//
// Reference: Burn Book §5 (Training)

use anyhow::Result;
use serde::{Deserialize, Serialize};

use crate::data::cache::{CacheKey, FeatureCache};
use crate::data::dataset::SymptomDataset;
use crate::data::loader::JsonRecordLoader;
use crate::domain::example::Mode;
use crate::infra::{
    checkpoint::CheckpointManager,
    metrics::MetricsLogger,
    tokenizer_store::TokenizerStore,
};
use crate::ml::trainer::run_training;

// ─── Training Configuration ──────────────────────────────────────────────────
// All parameters for a training run: data locations, the cache
// fingerprint inputs, the encoder architecture, and the scoring
// head hyperparameters. Serialisable so it can be saved to disk
// and reloaded to rebuild the exact same model.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainConfig {
    // Data + cache
    pub data_dir:        String,
    /// Cache location; falls back to data_dir when None
    pub cache_dir:       Option<String>,
    pub tokenizer_path:  String,
    pub checkpoint_dir:  String,
    pub task_name:       String,
    pub fold:            usize,
    pub num_labels:      usize,
    pub max_seq_len:     usize,

    // Optimisation
    pub batch_size:      usize,
    pub epochs:          usize,
    pub lr:              f64,

    // Encoder architecture
    pub vocab_size:      usize,
    pub d_model:         usize,
    pub num_heads:       usize,
    pub num_layers:      usize,
    pub d_ff:            usize,
    pub encoder_dropout: f64,

    // Scoring head
    pub n_filters:       usize,
    pub filter_sizes:    Vec<usize>,
    pub output_dim:      usize,
    pub head_dropout:    f64,
    pub pool:            String,
    pub k:               usize,
}

impl Default for TrainConfig {
    fn default() -> Self {
        Self {
            data_dir:        "data".to_string(),
            cache_dir:       None,
            tokenizer_path:  "data/tokenizer.json".to_string(),
            checkpoint_dir:  "checkpoints".to_string(),
            task_name:       "depression".to_string(),
            fold:            0,
            num_labels:      2,
            max_seq_len:     512,
            batch_size:      8,
            epochs:          10,
            lr:              2e-5,
            vocab_size:      30522,
            d_model:         256,
            num_heads:       8,
            num_layers:      6,
            d_ff:            1024,
            encoder_dropout: 0.1,
            n_filters:       50,
            filter_sizes:    vec![2, 3, 4, 5, 6],
            output_dim:      1,
            head_dropout:    0.5,
            pool:            "k-max".to_string(),
            k:               5,
        }
    }
}

impl TrainConfig {
    /// Where cache files live: cache_dir when set, data_dir otherwise
    pub fn cache_location(&self) -> &str {
        self.cache_dir.as_deref().unwrap_or(&self.data_dir)
    }

    /// The cache key for one split under this configuration
    pub fn cache_key(&self, mode: Mode, tokenizer_name: &str) -> CacheKey {
        CacheKey {
            mode,
            tokenizer_name: tokenizer_name.to_string(),
            max_seq_len:    self.max_seq_len,
            task_name:      self.task_name.clone(),
            fold:           self.fold,
        }
    }
}

// ─── TrainUseCase ─────────────────────────────────────────────────────────────
// Owns the config and runs the full training pipeline.
pub struct TrainUseCase {
    config: TrainConfig,
}

impl TrainUseCase {
    pub fn new(config: TrainConfig) -> Self {
        Self { config }
    }

    /// Execute the full training pipeline end to end
    pub fn execute(&self) -> Result<()> {
        let cfg = &self.config;

        // ── Step 1: Load + configure the tokenizer ────────────────────────────
        let tokenizer = TokenizerStore::new(&cfg.tokenizer_path).load(cfg.max_seq_len)?;
        let tok_name  = TokenizerStore::identity(&tokenizer);

        // ── Steps 2 + 3: Build datasets (cache fast path when possible) ───────
        let loader = JsonRecordLoader::new(&cfg.data_dir, &cfg.task_name, cfg.fold);
        let cache  = FeatureCache::new(cfg.cache_location());

        let train_dataset = SymptomDataset::build(
            &loader,
            &cache,
            &cfg.cache_key(Mode::Train, tok_name),
            &tokenizer,
            cfg.num_labels,
        )?;
        let val_dataset = SymptomDataset::build(
            &loader,
            &cache,
            &cfg.cache_key(Mode::Valid, tok_name),
            &tokenizer,
            cfg.num_labels,
        )?;
        tracing::info!(
            "Datasets ready: {} train, {} validation",
            burn::data::dataset::Dataset::len(&train_dataset),
            burn::data::dataset::Dataset::len(&val_dataset),
        );

        // ── Step 4: Save config so later runs can rebuild the model ──────────
        let ckpt_manager = CheckpointManager::new(&cfg.checkpoint_dir);
        ckpt_manager.save_config(cfg)?;

        let metrics = MetricsLogger::new(&cfg.checkpoint_dir)?;

        // ── Step 5: Run training loop (Layer 5) ───────────────────────────────
        run_training(cfg, train_dataset, val_dataset, ckpt_manager, metrics)?;

        Ok(())
    }
}
