// ============================================================
// Layer 6 — Tokenizer Store
// ============================================================
// Loads a pretrained tokenizer artifact (tokenizer.json, the
// HuggingFace format) and configures it for this pipeline:
//
//   - padding: Fixed(max_seq_len) — every encoding comes back
//     exactly max_seq_len wide, which is the invariant the
//     feature records and the cache file rely on
//   - truncation: LongestFirst — when a text pair is encoded,
//     the longer of the two is trimmed first until the pair
//     fits, the same policy BERT preprocessing uses
//
// Training a tokenizer is out of scope here; the artifact is
// produced elsewhere and treated as an input file.
//
// The identity() string names the tokenizer MODEL family
// (WordLevel, WordPiece, BPE, Unigram). It is part of the
// cache fingerprint: switching tokenizer families must never
// silently reuse features encoded by a different vocabulary.
//
// Reference: tokenizers crate documentation
//            Devlin et al. (2019) BERT

use anyhow::{anyhow, Result};
use std::path::PathBuf;
use tokenizers::{
    models::ModelWrapper, PaddingParams, PaddingStrategy, Tokenizer, TruncationParams,
    TruncationStrategy,
};

pub struct TokenizerStore {
    path: PathBuf,
}

impl TokenizerStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Load the tokenizer and configure fixed-length padding and
    /// longest-first truncation to `max_seq_len`.
    pub fn load(&self, max_seq_len: usize) -> Result<Tokenizer> {
        let mut tokenizer = Tokenizer::from_file(&self.path).map_err(|e| {
            anyhow!("Cannot load tokenizer from '{}': {}", self.path.display(), e)
        })?;

        tokenizer
            .with_truncation(Some(TruncationParams {
                max_length: max_seq_len,
                strategy:   TruncationStrategy::LongestFirst,
                ..Default::default()
            }))
            .map_err(|e| anyhow!("Cannot configure truncation: {e}"))?;

        tokenizer.with_padding(Some(PaddingParams {
            strategy: PaddingStrategy::Fixed(max_seq_len),
            ..Default::default()
        }));

        tracing::info!(
            "Loaded {} tokenizer from '{}' (max_seq_len={})",
            Self::identity(&tokenizer),
            self.path.display(),
            max_seq_len,
        );
        Ok(tokenizer)
    }

    /// The tokenizer model family name used in cache fingerprints.
    pub fn identity(tokenizer: &Tokenizer) -> &'static str {
        match tokenizer.get_model() {
            ModelWrapper::BPE(_)       => "BPE",
            ModelWrapper::WordPiece(_) => "WordPiece",
            ModelWrapper::WordLevel(_) => "WordLevel",
            ModelWrapper::Unigram(_)   => "Unigram",
        }
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;

    fn write_word_level_tokenizer(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("symptom-detect-tokstore-{name}"));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("tokenizer.json");

        let json = serde_json::json!({
            "version": "1.0",
            "truncation": null,
            "padding": null,
            "added_tokens": [
                {"id": 0, "content": "[PAD]", "single_word": false, "lstrip": false, "rstrip": false, "normalized": false, "special": true},
                {"id": 1, "content": "[UNK]", "single_word": false, "lstrip": false, "rstrip": false, "normalized": false, "special": true}
            ],
            "normalizer": null,
            "pre_tokenizer": { "type": "Whitespace" },
            "post_processor": null,
            "decoder": null,
            "model": {
                "type": "WordLevel",
                "vocab": { "[PAD]": 0, "[UNK]": 1, "hello": 2, "world": 3 },
                "unk_token": "[UNK]"
            }
        });
        std::fs::write(&path, serde_json::to_string(&json).unwrap()).unwrap();
        path
    }

    #[test]
    fn test_load_pads_to_fixed_length() {
        let path      = write_word_level_tokenizer("pad");
        let tokenizer = TokenizerStore::new(&path).load(6).unwrap();

        let encoding = tokenizer.encode("hello world", true).unwrap();
        assert_eq!(encoding.get_ids().len(), 6);
        assert_eq!(encoding.get_attention_mask(), &[1, 1, 0, 0, 0, 0]);
    }

    #[test]
    fn test_load_truncates_to_fixed_length() {
        let path      = write_word_level_tokenizer("trunc");
        let tokenizer = TokenizerStore::new(&path).load(3).unwrap();

        let encoding = tokenizer.encode("hello world hello world hello", true).unwrap();
        assert_eq!(encoding.get_ids().len(), 3);
    }

    #[test]
    fn test_identity_names_the_model_family() {
        let path      = write_word_level_tokenizer("identity");
        let tokenizer = TokenizerStore::new(&path).load(4).unwrap();
        assert_eq!(TokenizerStore::identity(&tokenizer), "WordLevel");
    }

    #[test]
    fn test_missing_file_is_an_error() {
        let store = TokenizerStore::new("/nonexistent/tokenizer.json");
        assert!(store.load(8).is_err());
    }
}
