// ============================================================
// Layer 6 — Checkpoint Manager
// ============================================================
// Saves and restores model weights using Burn's CompactRecorder.
//
// What gets saved per checkpoint:
//   1. Encoder weights (encoder_epoch_N.mpk.gz)
//   2. Scoring head weights (head_epoch_N.mpk.gz)
//   3. latest_epoch.json — which epoch was last saved
//   4. best_epoch.json   — the epoch with the lowest val_loss
//   5. train_config.json — pipeline + architecture config
//
// Why save the config separately?
//   When loading later, we need the exact architecture
//   (d_model, filter_sizes, pool, ...) to rebuild both modules
//   before loading the weights into them.
//
// Burn's CompactRecorder:
//   - Serialises parameters to MessagePack format
//   - Compresses with gzip for smaller file size
//   - Type-safe: loading fails if the architecture doesn't match
//
// Reference: Burn Book §5 (Records and Checkpointing)
//            Rust Book §9 (Error Handling)

use anyhow::{Context, Result};
use std::{fs, path::PathBuf};
use burn::{
    prelude::*,
    record::{CompactRecorder, Recorder},
    tensor::backend::AutodiffBackend,
};

use crate::application::train_use_case::TrainConfig;
use crate::ml::encoder::TextEncoder;
use crate::ml::scoring::EncodedTextHead;

/// Manages saving and loading of model checkpoints.
/// All files are stored in the configured directory.
pub struct CheckpointManager {
    dir: PathBuf,
}

impl CheckpointManager {
    /// Create a new CheckpointManager.
    /// Creates the directory if it doesn't already exist.
    pub fn new(dir: impl Into<String>) -> Self {
        let dir = PathBuf::from(dir.into());
        fs::create_dir_all(&dir).ok();
        Self { dir }
    }

    /// Save encoder + head weights for a given epoch and advance
    /// the latest-epoch pointer.
    pub fn save_model<B: AutodiffBackend>(
        &self,
        encoder: &TextEncoder<B>,
        head:    &EncodedTextHead<B>,
        epoch:   usize,
    ) -> Result<()> {
        let encoder_path = self.dir.join(format!("encoder_epoch_{epoch}"));
        CompactRecorder::new()
            .record(encoder.clone().into_record(), encoder_path.clone())
            .with_context(|| {
                format!("Failed to save encoder checkpoint to '{}'", encoder_path.display())
            })?;

        let head_path = self.dir.join(format!("head_epoch_{epoch}"));
        CompactRecorder::new()
            .record(head.clone().into_record(), head_path.clone())
            .with_context(|| {
                format!("Failed to save head checkpoint to '{}'", head_path.display())
            })?;

        let latest_path = self.dir.join("latest_epoch.json");
        fs::write(&latest_path, serde_json::to_string(&epoch)?)
            .with_context(|| "Failed to write latest_epoch.json")?;

        tracing::debug!("Saved checkpoint: epoch {}", epoch);
        Ok(())
    }

    /// Record which epoch currently holds the best validation
    /// loss. load_model prefers this epoch over the latest one.
    pub fn save_best_epoch(&self, epoch: usize) -> Result<()> {
        let path = self.dir.join("best_epoch.json");
        fs::write(&path, serde_json::to_string(&epoch)?)
            .with_context(|| "Failed to write best_epoch.json")?;

        tracing::debug!("Marked epoch {} as best", epoch);
        Ok(())
    }

    /// Load encoder + head weights from the best recorded epoch,
    /// or from the latest epoch when no best marker exists.
    ///
    /// Both modules must already have the architecture the
    /// checkpoint was written with (rebuild them from the saved
    /// train_config.json first) or loading will fail.
    pub fn load_model<B: Backend>(
        &self,
        encoder: TextEncoder<B>,
        head:    EncodedTextHead<B>,
        device:  &B::Device,
    ) -> Result<(TextEncoder<B>, EncodedTextHead<B>)> {
        let epoch = self.checkpoint_epoch()?;
        tracing::info!("Loading checkpoint from epoch {}", epoch);

        let encoder_path = self.dir.join(format!("encoder_epoch_{epoch}"));
        let encoder_record = CompactRecorder::new()
            .load(encoder_path.clone(), device)
            .with_context(|| {
                format!(
                    "Cannot load encoder checkpoint '{}'. Have you trained first?",
                    encoder_path.display()
                )
            })?;

        let head_path = self.dir.join(format!("head_epoch_{epoch}"));
        let head_record = CompactRecorder::new()
            .load(head_path.clone(), device)
            .with_context(|| {
                format!(
                    "Cannot load head checkpoint '{}'. Have you trained first?",
                    head_path.display()
                )
            })?;

        Ok((encoder.load_record(encoder_record), head.load_record(head_record)))
    }

    /// Save the training configuration to JSON.
    /// Called before training starts so a later run can rebuild
    /// the exact model architecture.
    pub fn save_config(&self, cfg: &TrainConfig) -> Result<()> {
        let path = self.dir.join("train_config.json");
        let json = serde_json::to_string_pretty(cfg)?;

        fs::write(&path, json)
            .with_context(|| format!("Cannot write config to '{}'", path.display()))?;

        tracing::debug!("Saved training config to '{}'", path.display());
        Ok(())
    }

    /// Load the training configuration from JSON.
    pub fn load_config(&self) -> Result<TrainConfig> {
        let path = self.dir.join("train_config.json");

        let json = fs::read_to_string(&path)
            .with_context(|| {
                format!(
                    "Cannot read config from '{}'. \
                     Make sure you have run 'train' first.",
                    path.display()
                )
            })?;

        Ok(serde_json::from_str(&json)?)
    }

    /// The epoch load_model should restore: the recorded best
    /// epoch when one exists, the latest otherwise.
    fn checkpoint_epoch(&self) -> Result<usize> {
        match self.best_epoch() {
            Some(epoch) => Ok(epoch),
            None        => self.latest_epoch(),
        }
    }

    /// Read best_epoch.json if the trainer has recorded one.
    fn best_epoch(&self) -> Option<usize> {
        let s = fs::read_to_string(self.dir.join("best_epoch.json")).ok()?;
        serde_json::from_str::<usize>(&s).ok()
    }

    /// Read latest_epoch.json and return the epoch number.
    /// Returns an error if training hasn't been run yet.
    fn latest_epoch(&self) -> Result<usize> {
        let path = self.dir.join("latest_epoch.json");

        let s = fs::read_to_string(&path)
            .with_context(|| {
                "Cannot find 'latest_epoch.json'. \
                 Have you run 'train' first?"
            })?;

        Ok(serde_json::from_str::<usize>(&s)?)
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use crate::ml::trainer::{encoder_config, head_config};
    use burn::module::AutodiffModule;

    type TrainBackend = burn::backend::Autodiff<burn::backend::NdArray>;
    type EvalBackend  = burn::backend::NdArray;

    /// A config small enough that building the modules is cheap
    fn small_config(checkpoint_dir: &str) -> TrainConfig {
        TrainConfig {
            checkpoint_dir:  checkpoint_dir.to_string(),
            vocab_size:      32,
            max_seq_len:     8,
            d_model:         8,
            num_heads:       2,
            num_layers:      1,
            d_ff:            16,
            encoder_dropout: 0.0,
            n_filters:       2,
            filter_sizes:    vec![2],
            head_dropout:    0.0,
            k:               1,
            ..Default::default()
        }
    }

    fn fresh_dir(name: &str) -> String {
        let dir = std::env::temp_dir().join(format!("symptom-detect-ckpt-{name}"));
        let _ = std::fs::remove_dir_all(&dir);
        dir.to_string_lossy().to_string()
    }

    fn train_modules(
        cfg: &TrainConfig,
    ) -> (TextEncoder<TrainBackend>, EncodedTextHead<TrainBackend>) {
        let device = Default::default();
        let encoder = encoder_config(cfg).init(&device);
        let head    = head_config(cfg).init(&device).unwrap();
        (encoder, head)
    }

    fn eval_modules(
        cfg: &TrainConfig,
    ) -> (TextEncoder<EvalBackend>, EncodedTextHead<EvalBackend>) {
        let device = Default::default();
        let encoder = encoder_config(cfg).init(&device);
        let head    = head_config(cfg).init(&device).unwrap();
        (encoder, head)
    }

    /// Forward a fixed batch through encoder + head. Two module
    /// pairs with identical weights must agree exactly here.
    fn score(encoder: &TextEncoder<EvalBackend>, head: &EncodedTextHead<EvalBackend>) -> Vec<f32> {
        let device = Default::default();
        let row = |v: [i32; 8]| {
            Tensor::<EvalBackend, 1, Int>::from_ints(v.as_slice(), &device).reshape([1, 8])
        };

        let hidden = encoder.forward(
            row([1, 5, 9, 2, 0, 0, 0, 0]),
            row([1, 1, 1, 1, 0, 0, 0, 0]),
            row([0, 0, 0, 0, 0, 0, 0, 0]),
        );
        let (probs, _) = head.forward(hidden);
        probs.into_data().to_vec().unwrap()
    }

    #[test]
    fn test_save_then_load_restores_weights() {
        let dir     = fresh_dir("roundtrip");
        let cfg     = small_config(&dir);
        let manager = CheckpointManager::new(&dir);

        let (encoder, head) = train_modules(&cfg);
        manager.save_model(&encoder, &head, 1).unwrap();
        let expected = score(&encoder.valid(), &head.valid());

        // Loading into freshly initialised (different) modules
        // must reproduce the saved model's outputs exactly
        let (fresh_encoder, fresh_head) = eval_modules(&cfg);
        let (loaded_encoder, loaded_head) = manager
            .load_model(fresh_encoder, fresh_head, &Default::default())
            .unwrap();

        assert_eq!(score(&loaded_encoder, &loaded_head), expected);
    }

    #[test]
    fn test_load_prefers_the_recorded_best_epoch() {
        let dir     = fresh_dir("best");
        let cfg     = small_config(&dir);
        let manager = CheckpointManager::new(&dir);

        let (best_encoder, best_head) = train_modules(&cfg);
        manager.save_model(&best_encoder, &best_head, 1).unwrap();
        let expected = score(&best_encoder.valid(), &best_head.valid());

        // A later epoch advances the latest pointer past the best one
        let (later_encoder, later_head) = train_modules(&cfg);
        manager.save_model(&later_encoder, &later_head, 2).unwrap();

        manager.save_best_epoch(1).unwrap();

        let (fresh_encoder, fresh_head) = eval_modules(&cfg);
        let (loaded_encoder, loaded_head) = manager
            .load_model(fresh_encoder, fresh_head, &Default::default())
            .unwrap();

        assert_eq!(score(&loaded_encoder, &loaded_head), expected);
    }

    #[test]
    fn test_config_round_trip() {
        let dir     = fresh_dir("config");
        let manager = CheckpointManager::new(&dir);

        let mut cfg = small_config(&dir);
        cfg.task_name = "anxiety".to_string();
        cfg.fold      = 3;
        manager.save_config(&cfg).unwrap();

        let loaded = manager.load_config().unwrap();
        assert_eq!(loaded.task_name,    "anxiety");
        assert_eq!(loaded.fold,         3);
        assert_eq!(loaded.filter_sizes, cfg.filter_sizes);
        assert_eq!(loaded.max_seq_len,  cfg.max_seq_len);
    }

    #[test]
    fn test_load_without_training_is_an_error() {
        let dir     = fresh_dir("empty");
        let cfg     = small_config(&dir);
        let manager = CheckpointManager::new(&dir);

        let (encoder, head) = eval_modules(&cfg);
        assert!(manager.load_model(encoder, head, &Default::default()).is_err());
    }
}
