// ============================================================
// Layer 3 — Example Domain Types
// ============================================================
// Represents one normalised training example: a piece of user
// text paired with a symptom/disease label, tagged with the
// dataset split it belongs to.
//
// The second text slot (text_b) exists because BERT-family
// encoders accept sentence PAIRS ([CLS] A [SEP] B [SEP]).
// This corpus only uses single texts, but the record and the
// encoding path both support pairs so questionnaire prompts
// can be attached later without touching the pipeline.
//
// Reference: Devlin et al. (2019) BERT
//            Rust Book §5 (Structs), §6 (Enums)

use serde::{Deserialize, Serialize};

/// Which split of the dataset an example belongs to.
/// The string form is stable — it is part of the cache
/// fingerprint and of raw data file names, so renaming a
/// variant would orphan every existing cache file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Mode {
    Train,
    Valid,
    Test,
}

impl Mode {
    /// The lowercase name used in file names and fingerprints
    pub fn as_str(&self) -> &'static str {
        match self {
            Mode::Train => "train",
            Mode::Valid => "valid",
            Mode::Test  => "test",
        }
    }
}

impl std::fmt::Display for Mode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Mode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "train" => Ok(Mode::Train),
            "valid" => Ok(Mode::Valid),
            "test"  => Ok(Mode::Test),
            other   => Err(format!("unknown mode '{other}' (expected train/valid/test)")),
        }
    }
}

/// One normalised (text, label) record.
///
/// Invariants:
///   - text_a is always present
///   - label must be a member of the configured label set
///     (enforced later by the label map in the dataset)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Example {
    /// The split this example was drawn from
    pub mode: Mode,

    /// The primary text (always present)
    pub text_a: String,

    /// Optional second text for sentence-pair encoding
    pub text_b: Option<String>,

    /// The raw string label, e.g. "0" or "1"
    pub label: String,
}

/// The Example Builder — converts parallel (text, label) vectors
/// into normalised Example records for one split.
///
/// The caller is responsible for `texts.len() == labels.len()`;
/// the dataset asserts it before calling here.
pub fn build_examples(mode: Mode, texts: &[String], labels: &[String]) -> Vec<Example> {
    texts
        .iter()
        .zip(labels.iter())
        .map(|(text, label)| Example {
            mode,
            text_a: text.clone(),
            text_b: None,
            label:  label.clone(),
        })
        .collect()
}
