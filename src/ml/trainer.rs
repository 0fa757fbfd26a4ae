// ============================================================
// Layer 5 — Training Loop
// ============================================================
// Train + validation loop using Burn's DataLoader and AdamW,
// plus the checkpoint-restoring evaluation entry point.
//
// The encoder is FROZEN here: encode_batch() is called with
// trainable = false, so its hidden states are detached and the
// optimiser only ever updates the scoring head. This mirrors
// the usual probing setup — the pretrained encoder provides
// features, the head learns to score them.
//
// Backend notes:
//   - Training uses MyBackend (Autodiff<NdArray>) for gradients
//   - model.valid() returns the model on MyInnerBackend
//   - Validation and evaluation run on MyInnerBackend
//
// Reference: Burn Book §5, Loshchilov & Hutter (2019) AdamW

use anyhow::{bail, Result};
use burn::{
    data::dataloader::{DataLoader, DataLoaderBuilder},
    module::AutodiffModule,
    nn::loss::BinaryCrossEntropyLossConfig,
    optim::{AdamWConfig, GradientsParams, Optimizer},
    prelude::*,
};

use crate::application::train_use_case::TrainConfig;
use crate::data::{
    batcher::{SymptomBatch, SymptomBatcher},
    dataset::SymptomDataset,
};
use crate::infra::checkpoint::CheckpointManager;
use crate::infra::metrics::{EpochMetrics, MetricsLogger};
use crate::ml::encoder::{encode_batch, TextEncoder, TextEncoderConfig};
use crate::ml::scoring::{EncodedTextHead, EncodedTextHeadConfig};

type MyBackend      = burn::backend::Autodiff<burn::backend::NdArray>;
type MyInnerBackend = burn::backend::NdArray;

/// The encoder architecture a TrainConfig describes
pub(crate) fn encoder_config(cfg: &TrainConfig) -> TextEncoderConfig {
    TextEncoderConfig::new(
        cfg.vocab_size, cfg.max_seq_len, cfg.d_model,
        cfg.num_heads, cfg.num_layers, cfg.d_ff, cfg.encoder_dropout,
    )
}

/// The scoring head architecture a TrainConfig describes
pub(crate) fn head_config(cfg: &TrainConfig) -> EncodedTextHeadConfig {
    EncodedTextHeadConfig {
        embedding_dim: cfg.d_model,
        n_filters:     cfg.n_filters,
        filter_sizes:  cfg.filter_sizes.clone(),
        output_dim:    cfg.output_dim,
        dropout:       cfg.head_dropout,
        pool:          cfg.pool.clone(),
        k:             cfg.k,
    }
}

pub fn run_training(
    cfg:           &TrainConfig,
    train_dataset: SymptomDataset,
    val_dataset:   SymptomDataset,
    ckpt_manager:  CheckpointManager,
    metrics:       MetricsLogger,
) -> Result<()> {
    let device = burn::backend::ndarray::NdArrayDevice::default();
    tracing::info!("Using device: {:?}", device);
    train_loop(cfg, train_dataset, val_dataset, ckpt_manager, metrics, device)
}

fn train_loop(
    cfg:           &TrainConfig,
    train_dataset: SymptomDataset,
    val_dataset:   SymptomDataset,
    ckpt_manager:  CheckpointManager,
    metrics:       MetricsLogger,
    device:        burn::backend::ndarray::NdArrayDevice,
) -> Result<()> {
    if cfg.output_dim != 1 {
        bail!("the training loop uses a binary BCE objective; output_dim must be 1");
    }

    // ── Build encoder + scoring head ──────────────────────────────────────────
    let encoder: TextEncoder<MyBackend> = encoder_config(cfg).init(&device);
    let mut head: EncodedTextHead<MyBackend> = head_config(cfg).init(&device)?;
    tracing::info!(
        "Model ready: {} encoder layers, d_model={}, pool={}, concat_width={}",
        cfg.num_layers, cfg.d_model, cfg.pool, head.concat_width(),
    );

    // ── AdamW optimiser over the head only ────────────────────────────────────
    let optim_cfg = AdamWConfig::new().with_epsilon(1e-8);
    let mut optim = optim_cfg.init();

    // ── Training data loader (AutodiffBackend) ────────────────────────────────
    let train_batcher = SymptomBatcher::<MyBackend>::new(device.clone());
    let train_loader  = DataLoaderBuilder::new(train_batcher)
        .batch_size(cfg.batch_size)
        .shuffle(42)
        .num_workers(1)
        .build(train_dataset);

    // ── Validation data loader (InnerBackend — no autodiff overhead) ──────────
    let val_batcher = SymptomBatcher::<MyInnerBackend>::new(device.clone());
    let val_loader  = DataLoaderBuilder::new(val_batcher)
        .batch_size(cfg.batch_size)
        .num_workers(1)
        .build(val_dataset);

    let loss_fn = BinaryCrossEntropyLossConfig::new().init(&device);

    let mut best_val_loss = f64::INFINITY;

    // ── Epoch loop ────────────────────────────────────────────────────────────
    for epoch in 1..=cfg.epochs {

        // ── Training phase ────────────────────────────────────────────────────
        let mut train_loss_sum = 0.0f64;
        let mut train_batches  = 0usize;

        for batch in train_loader.iter() {
            // Frozen encoder: detached hidden states, no encoder gradients
            let hidden = encode_batch(
                &encoder,
                batch.input_ids,
                batch.attention_mask,
                batch.token_type_ids,
                false,
            );

            let (probs, _) = head.forward(hidden);
            let [batch_size, _] = probs.dims();
            let probs = probs.reshape([batch_size]);

            let loss = loss_fn.forward(probs, batch.labels);

            let loss_val: f64 = loss.clone().into_scalar().elem::<f64>();
            train_loss_sum += loss_val;
            train_batches  += 1;

            // Backward pass + AdamW update on the head
            let grads = loss.backward();
            let grads = GradientsParams::from_grads(grads, &head);
            head = optim.step(cfg.lr, head, grads);
        }

        let avg_train_loss = if train_batches > 0 {
            train_loss_sum / train_batches as f64
        } else { f64::NAN };

        // ── Validation phase ──────────────────────────────────────────────────
        // valid() moves both modules to the inner backend;
        // dropout is disabled there for deterministic evaluation
        let (avg_val_loss, accuracy) = validate(
            &encoder.valid(),
            &head.valid(),
            val_loader.as_ref(),
            &device,
        );

        println!(
            "Epoch {:>3}/{} | train_loss={:.4} | val_loss={:.4} | acc={:.1}%",
            epoch, cfg.epochs, avg_train_loss, avg_val_loss, accuracy * 100.0,
        );

        let epoch_metrics = EpochMetrics::new(epoch, avg_train_loss, avg_val_loss, accuracy);

        ckpt_manager.save_model(&encoder, &head, epoch)?;
        if epoch_metrics.is_improvement(best_val_loss) {
            best_val_loss = epoch_metrics.val_loss;
            ckpt_manager.save_best_epoch(epoch)?;
            tracing::info!("New best validation loss at epoch {}", epoch);
        }

        metrics.log(&epoch_metrics)?;
        tracing::info!("Checkpoint saved for epoch {}", epoch);
    }

    tracing::info!("Training complete!");
    Ok(())
}

/// Restore the best (or latest) checkpoint under the config's
/// checkpoint directory and score one dataset split.
/// Returns (average BCE loss, accuracy).
pub fn run_evaluation(
    cfg:          &TrainConfig,
    dataset:      SymptomDataset,
    ckpt_manager: &CheckpointManager,
) -> Result<(f64, f64)> {
    if cfg.output_dim != 1 {
        bail!("evaluation uses a binary BCE objective; output_dim must be 1");
    }
    let device = burn::backend::ndarray::NdArrayDevice::default();

    let encoder: TextEncoder<MyInnerBackend>    = encoder_config(cfg).init(&device);
    let head:    EncodedTextHead<MyInnerBackend> = head_config(cfg).init(&device)?;
    let (encoder, head) = ckpt_manager.load_model(encoder, head, &device)?;

    let batcher = SymptomBatcher::<MyInnerBackend>::new(device.clone());
    let loader  = DataLoaderBuilder::new(batcher)
        .batch_size(cfg.batch_size)
        .num_workers(1)
        .build(dataset);

    Ok(validate(&encoder, &head, loader.as_ref(), &device))
}

/// Score one split: average BCE loss over its batches and the
/// fraction of labels predicted correctly at the 0.5 threshold.
fn validate(
    encoder: &TextEncoder<MyInnerBackend>,
    head:    &EncodedTextHead<MyInnerBackend>,
    loader:  &dyn DataLoader<SymptomBatch<MyInnerBackend>>,
    device:  &burn::backend::ndarray::NdArrayDevice,
) -> (f64, f64) {
    let loss_fn = BinaryCrossEntropyLossConfig::new().init(device);

    let mut loss_sum      = 0.0f64;
    let mut batches       = 0usize;
    let mut correct       = 0usize;
    let mut total_samples = 0usize;

    for batch in loader.iter() {
        let hidden = encode_batch(
            encoder,
            batch.input_ids,
            batch.attention_mask,
            batch.token_type_ids,
            false,
        );
        let (probs, _) = head.forward(hidden);
        let [batch_size, _] = probs.dims();
        let probs = probs.reshape([batch_size]);

        let batch_loss: f64 = loss_fn
            .forward(probs.clone(), batch.labels.clone())
            .into_scalar()
            .elem::<f64>();
        loss_sum += batch_loss;
        batches  += 1;

        // Probability > 0.5 counts as a positive prediction
        let preds = probs.greater_elem(0.5).int();
        let hits: i64 = preds
            .equal(batch.labels)
            .int().sum().into_scalar().elem::<i64>();

        correct       += hits as usize;
        total_samples += batch_size;
    }

    let avg_loss = if batches       > 0 { loss_sum / batches as f64 } else { f64::NAN };
    let accuracy = if total_samples > 0 { correct as f64 / total_samples as f64 } else { 0.0 };
    (avg_loss, accuracy)
}
