// ============================================================
// Layer 4 — Symptom Dataset
// ============================================================
// Cache-aware construction of one split's encoded features.
//
// Construction has two paths:
//
//   FAST PATH (cache hit)
//     The fingerprinted cache file exists → deserialise it and
//     skip tokenisation entirely.
//
//   SLOW PATH (cache miss)
//     Load the raw JSON records, build Example records, batch
//     encode with fixed padding + longest-first truncation,
//     map string labels through the dense label map, then
//     persist the result so the next run takes the fast path.
//
// The string label list is reconstructed from the cached
// integer labels on the fast path, so raw_labels() is valid
// on both paths. The label set is "0".."num_labels-1", so the
// reconstruction is exact.
//
// Reference: Burn Book §4 (Datasets and Dataloaders)
//            Devlin et al. (2019) BERT input encoding

use anyhow::{anyhow, bail, Result};
use burn::data::dataset::Dataset;
use std::collections::HashMap;
use tokenizers::{EncodeInput, Tokenizer};

use crate::data::cache::{CacheKey, FeatureCache};
use crate::data::features::{FeatureRecord, FeatureSet};
use crate::domain::example::{build_examples, Example};
use crate::domain::traits::RecordSource;

#[derive(Debug)]
pub struct SymptomDataset {
    features:   FeatureSet,
    raw_labels: Vec<String>,
}

impl SymptomDataset {
    /// Build (or reload) the dataset for the split named by `key`.
    ///
    /// The tokenizer must already be configured for fixed-length
    /// padding and truncation to `key.max_seq_len` — the
    /// TokenizerStore does this at load time.
    pub fn build(
        source:     &dyn RecordSource,
        cache:      &FeatureCache,
        key:        &CacheKey,
        tokenizer:  &Tokenizer,
        num_labels: usize,
    ) -> Result<Self> {
        // ── Fast path: cache hit ─────────────────────────────────────────────
        if let Some(features) = cache.load(key) {
            let raw_labels = features.labels.iter().map(|l| l.to_string()).collect();
            return Ok(Self { features, raw_labels });
        }

        // ── Slow path: tokenise from raw records ─────────────────────────────
        let records = source.load(key.mode)?;
        if records.texts.len() != records.labels.len() {
            bail!(
                "the numbers of texts and labels are different ({} vs {})",
                records.texts.len(),
                records.labels.len()
            );
        }

        let examples = build_examples(key.mode, &records.texts, &records.labels);
        let labels   = map_labels(&examples, num_labels)?;
        let features = encode_examples(&examples, labels, tokenizer, key.max_seq_len)?;

        cache.save(key, &features)?;

        Ok(Self {
            features,
            raw_labels: records.labels,
        })
    }

    /// The raw string labels for this split, in record order
    pub fn raw_labels(&self) -> &[String] {
        &self.raw_labels
    }
}

impl Dataset<FeatureRecord> for SymptomDataset {
    fn get(&self, index: usize) -> Option<FeatureRecord> {
        self.features.get(index)
    }

    fn len(&self) -> usize {
        self.features.len()
    }
}

/// Map each example's string label through the dense
/// "0".."num_labels-1" label map. An unrecognised label is a
/// fatal lookup error — it means the data file and the
/// configured label count disagree.
fn map_labels(examples: &[Example], num_labels: usize) -> Result<Vec<i64>> {
    let label_map: HashMap<String, i64> = (0..num_labels)
        .map(|i| (i.to_string(), i as i64))
        .collect();

    examples
        .iter()
        .map(|example| {
            label_map.get(&example.label).copied().ok_or_else(|| {
                anyhow!(
                    "Label '{}' is outside the configured label set 0..{}",
                    example.label,
                    num_labels
                )
            })
        })
        .collect()
}

/// Batch encode all examples into column-wise fixed-length features.
fn encode_examples(
    examples:    &[Example],
    labels:      Vec<i64>,
    tokenizer:   &Tokenizer,
    max_seq_len: usize,
) -> Result<FeatureSet> {
    // Single or Dual input per example — pairs use the
    // [CLS] A [SEP] B [SEP] layout with longest-first truncation
    let inputs: Vec<EncodeInput> = examples
        .iter()
        .map(|example| match &example.text_b {
            Some(text_b) => EncodeInput::Dual(
                example.text_a.clone().into(),
                text_b.clone().into(),
            ),
            None => EncodeInput::Single(example.text_a.clone().into()),
        })
        .collect();

    let encodings = tokenizer
        .encode_batch(inputs, true)
        .map_err(|e| anyhow!("Tokenisation error: {e}"))?;

    let mut features = FeatureSet {
        labels,
        ..FeatureSet::default()
    };

    for encoding in &encodings {
        // A row of the wrong width means the tokenizer was not
        // configured for fixed-length padding — fail here with a
        // configuration error instead of a shape panic later.
        if encoding.get_ids().len() != max_seq_len {
            bail!(
                "Tokenizer produced {} ids but max_seq_len is {} — \
                 padding/truncation not configured?",
                encoding.get_ids().len(),
                max_seq_len
            );
        }

        features.input_ids.push(encoding.get_ids().to_vec());
        features.attention_mask.push(encoding.get_attention_mask().to_vec());
        features.token_type_ids.push(encoding.get_type_ids().to_vec());
    }

    Ok(features)
}
