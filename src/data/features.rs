// ============================================================
// Layer 4 — Encoded Feature Records
// ============================================================
// The tokenised, fixed-length form of an example.
//
// Storage is column-wise (one Vec per field) rather than
// row-wise because that is the shape the batch encoder
// produces and the shape the cache file persists — a single
// serialisation round-trip covers the whole split.
//
// Invariant: input_ids, attention_mask, and token_type_ids
// all have exactly max_seq_len entries per record, and the
// same record count as labels.

use serde::{Deserialize, Serialize};

/// One tokenised sample, decoupled from the backing storage.
/// Sequence format: [CLS] text_a [SEP] (text_b [SEP]) [PAD]...
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeatureRecord {
    pub input_ids:      Vec<u32>,
    pub attention_mask: Vec<u32>,
    pub token_type_ids: Vec<u32>,
    pub label:          i64,
}

/// Column-wise storage for one split's encoded features.
/// This is the unit the cache file serialises.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct FeatureSet {
    pub input_ids:      Vec<Vec<u32>>,
    pub attention_mask: Vec<Vec<u32>>,
    pub token_type_ids: Vec<Vec<u32>>,
    pub labels:         Vec<i64>,
}

impl FeatureSet {
    /// Number of records — defined as the number of labels
    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    /// Fetch one record as an independent copy.
    /// Callers may mutate the result without touching the set.
    pub fn get(&self, index: usize) -> Option<FeatureRecord> {
        if index >= self.labels.len() {
            return None;
        }
        Some(FeatureRecord {
            input_ids:      self.input_ids[index].clone(),
            attention_mask: self.attention_mask[index].clone(),
            token_type_ids: self.token_type_ids[index].clone(),
            label:          self.labels[index],
        })
    }

    /// All three id columns must hold one row per label, each row
    /// `max_seq_len` wide. Used as a sanity gate after deserialising
    /// a cache file of unknown provenance.
    pub fn is_consistent(&self, max_seq_len: usize) -> bool {
        let n = self.labels.len();
        self.input_ids.len() == n
            && self.attention_mask.len() == n
            && self.token_type_ids.len() == n
            && self.input_ids.iter().all(|row| row.len() == max_seq_len)
            && self.attention_mask.iter().all(|row| row.len() == max_seq_len)
            && self.token_type_ids.iter().all(|row| row.len() == max_seq_len)
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;

    fn sample_set() -> FeatureSet {
        FeatureSet {
            input_ids:      vec![vec![101, 7, 102, 0], vec![101, 9, 102, 0]],
            attention_mask: vec![vec![1, 1, 1, 0], vec![1, 1, 1, 0]],
            token_type_ids: vec![vec![0, 0, 0, 0], vec![0, 0, 0, 0]],
            labels:         vec![0, 1],
        }
    }

    #[test]
    fn test_len_is_label_count() {
        assert_eq!(sample_set().len(), 2);
        assert_eq!(FeatureSet::default().len(), 0);
    }

    #[test]
    fn test_get_returns_independent_copy() {
        let set = sample_set();
        let mut record = set.get(0).unwrap();
        record.input_ids[0] = 999;

        // The backing storage must be untouched
        assert_eq!(set.input_ids[0][0], 101);
    }

    #[test]
    fn test_get_out_of_range() {
        assert!(sample_set().get(2).is_none());
    }

    #[test]
    fn test_consistency_check() {
        let set = sample_set();
        assert!(set.is_consistent(4));
        // Wrong sequence length
        assert!(!set.is_consistent(8));

        let mut broken = sample_set();
        broken.labels.push(1);
        assert!(!broken.is_consistent(4));
    }
}
