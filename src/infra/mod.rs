// ============================================================
// Layer 6 — Infrastructure Layer
// ============================================================
// Handles all cross-cutting concerns that don't belong in
// any specific business layer:
//
//   checkpoint.rs      — Saving and loading model weights
//                        Uses Burn's CompactRecorder to
//                        serialise encoder + head parameters,
//                        tracks the best validation epoch, and
//                        saves/loads TrainConfig as JSON so a
//                        later run can rebuild the model.
//
//   tokenizer_store.rs — Tokenizer loading
//                        Loads a tokenizer.json artifact and
//                        configures fixed-length padding and
//                        longest-first truncation once, at
//                        load time. Also exposes the tokenizer
//                        identity used in cache fingerprints.
//
//   metrics.rs         — Training metrics logging
//                        Writes epoch-level metrics (loss,
//                        accuracy) to a CSV file for later
//                        analysis and plotting.
//
// Why is this a separate layer?
//   These concerns are used by multiple other layers but
//   don't belong to any one of them. Keeping them here:
//   - Prevents duplication across layers
//   - Makes it easy to swap implementations
//   - Keeps other layers focused on their core logic
//
// Reference: Rust Book §7 (Modules)
//            Burn Book §5 (Checkpointing)

/// Model checkpoint saving and loading
pub mod checkpoint;

/// Tokenizer loading and fixed-length configuration
pub mod tokenizer_store;

/// Training metrics CSV logger
pub mod metrics;
