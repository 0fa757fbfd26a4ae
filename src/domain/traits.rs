// ============================================================
// Layer 3 — Core Traits (Abstractions)
// ============================================================
// Traits are Rust's way of defining shared behaviour.
// By programming against traits instead of concrete types,
// we can swap implementations without changing the code
// that uses them. For example:
//   - JsonRecordLoader implements RecordSource
//   - A future CsvLoader could also implement RecordSource
//   - The dataset only sees RecordSource and works with
//     both without any changes
//
// This is the Dependency Inversion Principle from SOLID,
// applied using Rust's trait system.
//
// Reference: Rust Book §10 (Traits: Defining Shared Behaviour)

use anyhow::Result;

use crate::domain::example::Mode;

/// The raw (text, label) columns for one split of one task/fold,
/// in file order. Both vectors must stay parallel — index i of
/// `texts` belongs with index i of `labels`.
#[derive(Debug, Clone, Default)]
pub struct RawRecords {
    pub texts:  Vec<String>,
    pub labels: Vec<String>,
}

// ─── RecordSource ─────────────────────────────────────────────────────────────
/// Any component that can produce raw (text, label) records
/// for a given split.
///
/// Implementations:
///   - JsonRecordLoader → reads the per-task/fold/mode JSON file
///   - (future) CsvLoader → reads a CSV export
pub trait RecordSource {
    /// Load all records for the given split.
    fn load(&self, mode: Mode) -> Result<RawRecords>;
}
