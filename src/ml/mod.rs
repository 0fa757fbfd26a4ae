// ============================================================
// Layer 5 — ML / Model Layer (Burn)
// ============================================================
// This layer contains ALL Burn framework specific code.
// No other layer imports from burn directly — only this one
// and the data batcher.
//
// What's in this layer:
//
//   encoder.rs — BERT-style base text encoder
//                Token + position + segment embeddings,
//                stacked self-attention blocks, final norm.
//                encode_batch() exposes the trainable/frozen
//                flag that detaches the hidden states.
//
//   pooling.rs — the four pooling strategies
//                (max / avg / k-max / mix) as an enum selected
//                once at head construction time
//
//   scoring.rs — the three convolutional scoring heads
//                Conv bank over the sequence axis → ReLU →
//                pooling → concat → dropout → projection →
//                sigmoid/softmax
//
//   trainer.rs — the training loop and checkpoint evaluation
//                Frozen encoder, BCE loss on the head's
//                probabilities, AdamW updates, per-epoch
//                validation with best-epoch tracking,
//                checkpoints, and metrics rows
//
// Reference: Burn Book §3 (Building Blocks)
//            Burn Book §5 (Training)
//            Kim (2014) CNNs for Sentence Classification
//            Devlin et al. (2019) BERT

/// BERT-style base text encoder wrapper
pub mod encoder;

/// Pooling strategies for the scoring heads
pub mod pooling;

/// The three convolutional scoring head variants
pub mod scoring;

/// Training loop, checkpoint evaluation, and validation scoring
pub mod trainer;
