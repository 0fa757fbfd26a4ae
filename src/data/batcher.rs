// ============================================================
// Layer 4 — Symptom Batcher
// ============================================================
// Implements Burn's Batcher trait to convert a Vec<FeatureRecord>
// into GPU-ready tensors.
//
// How batching works here:
//   Input:  Vec of N FeatureRecords, each with sequences of length S
//   Output: SymptomBatch with tensors of shape [N, S]
//
//   We flatten all input_ids into one Vec, then reshape:
//   [s1_t1, s1_t2, ..., s1_tS, s2_t1, ..., sN_tS] → [N, S]
//
// Why is this easy here?
//   Because all sequences are already padded to the same length
//   in FeatureRecord. If they weren't, we'd need dynamic padding.
//
// Reference: Burn Book §4 (Batcher)
//            Rust Book §8 (Vectors)

use burn::{
    data::dataloader::batcher::Batcher,
    prelude::*,
};

use crate::data::features::FeatureRecord;

// ─── SymptomBatch ─────────────────────────────────────────────────────────────
/// A batch of encoded samples ready for the encoder forward pass.
/// All tensors have batch_size as their first dimension.
///
/// B is the Burn Backend (e.g. NdArray, Wgpu) —
/// generic so the same batcher works on any device.
#[derive(Debug, Clone)]
pub struct SymptomBatch<B: Backend> {
    /// Token ID sequences — shape: [batch_size, seq_len]
    pub input_ids: Tensor<B, 2, Int>,

    /// Attention masks — shape: [batch_size, seq_len]
    /// 1 = real token, 0 = padding
    pub attention_mask: Tensor<B, 2, Int>,

    /// Segment ids — shape: [batch_size, seq_len]
    /// 0 = text_a tokens, 1 = text_b tokens
    pub token_type_ids: Tensor<B, 2, Int>,

    /// Integer class labels — shape: [batch_size]
    pub labels: Tensor<B, 1, Int>,
}

// ─── SymptomBatcher ───────────────────────────────────────────────────────────
/// The batcher struct — holds the target device so tensors
/// are created on the correct GPU/CPU.
#[derive(Clone, Debug)]
pub struct SymptomBatcher<B: Backend> {
    pub device: B::Device,
}

impl<B: Backend> SymptomBatcher<B> {
    pub fn new(device: B::Device) -> Self {
        Self { device }
    }

    /// Flatten one id column across all records and reshape to [N, S]
    fn stack_ids(
        &self,
        items:  &[FeatureRecord],
        column: impl Fn(&FeatureRecord) -> &[u32],
    ) -> Tensor<B, 2, Int> {
        let batch_size = items.len();
        let seq_len    = items.first().map(|r| column(r).len()).unwrap_or(0);

        let flat: Vec<i32> = items
            .iter()
            .flat_map(|record| column(record).iter().map(|&x| x as i32))
            .collect();

        Tensor::<B, 1, Int>::from_ints(flat.as_slice(), &self.device)
            .reshape([batch_size, seq_len])
    }
}

impl<B: Backend> Batcher<FeatureRecord, SymptomBatch<B>> for SymptomBatcher<B> {
    fn batch(&self, items: Vec<FeatureRecord>) -> SymptomBatch<B> {
        let input_ids      = self.stack_ids(&items, |r| &r.input_ids);
        let attention_mask = self.stack_ids(&items, |r| &r.attention_mask);
        let token_type_ids = self.stack_ids(&items, |r| &r.token_type_ids);

        let labels_flat: Vec<i32> = items.iter().map(|r| r.label as i32).collect();
        let labels = Tensor::<B, 1, Int>::from_ints(labels_flat.as_slice(), &self.device);

        SymptomBatch {
            input_ids,
            attention_mask,
            token_type_ids,
            labels,
        }
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;

    type TestBackend = burn::backend::NdArray;

    fn record(ids: Vec<u32>, label: i64) -> FeatureRecord {
        let len = ids.len();
        FeatureRecord {
            input_ids:      ids,
            attention_mask: vec![1; len],
            token_type_ids: vec![0; len],
            label,
        }
    }

    #[test]
    fn test_batch_shapes() {
        let device  = Default::default();
        let batcher = SymptomBatcher::<TestBackend>::new(device);

        let batch = batcher.batch(vec![
            record(vec![101, 5, 102, 0], 1),
            record(vec![101, 7, 102, 0], 0),
            record(vec![101, 9, 102, 0], 1),
        ]);

        assert_eq!(batch.input_ids.dims(),      [3, 4]);
        assert_eq!(batch.attention_mask.dims(), [3, 4]);
        assert_eq!(batch.token_type_ids.dims(), [3, 4]);
        assert_eq!(batch.labels.dims(),         [3]);
    }

    #[test]
    fn test_batch_preserves_values() {
        let device  = Default::default();
        let batcher = SymptomBatcher::<TestBackend>::new(device);

        let batch = batcher.batch(vec![record(vec![101, 5, 102, 0], 1)]);

        let ids: Vec<i64> = batch.input_ids.into_data().to_vec().unwrap();
        assert_eq!(ids, vec![101, 5, 102, 0]);

        let labels: Vec<i64> = batch.labels.into_data().to_vec().unwrap();
        assert_eq!(labels, vec![1]);
    }
}
