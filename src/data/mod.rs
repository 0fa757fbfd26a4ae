// ============================================================
// Layer 4 — Data Pipeline
// ============================================================
// This layer handles everything from raw JSON label files
// all the way to GPU-ready tensor batches.
//
// The pipeline flows in this order:
//
//   {task}_{fold}_{mode}.json
//       │
//       ▼
//   JsonRecordLoader  → reads ids → [text, label] mappings
//       │
//       ▼
//   Example Builder   → normalised (text, label) records
//       │
//       ▼
//   Tokenizer         → fixed-length id/mask/type-id encodings
//       │
//       ▼
//   FeatureCache      → persists encodings keyed by fingerprint
//       │
//       ▼
//   SymptomDataset    → implements Burn's Dataset trait
//       │
//       ▼
//   SymptomBatcher    → stacks records into tensor batches
//       │
//       ▼
//   DataLoader        → feeds batches to the training loop
//
// Each module is responsible for exactly one step.
// This makes each step independently testable and replaceable.
//
// Reference: Burn Book §4 (Datasets and Dataloaders)
//            Rust Book §13 (Iterators and Closures)

/// Loads raw id → [text, label] JSON files
pub mod loader;

/// Fixed-length encoded feature records and column storage
pub mod features;

/// Fingerprinted on-disk cache for encoded features
pub mod cache;

/// Implements Burn's Dataset trait with cache-aware construction
pub mod dataset;

/// Implements Burn's Batcher trait to create tensor batches
pub mod batcher;
