// ============================================================
// Layer 4 — Raw Record Loader
// ============================================================
// Loads the raw data file for one task/fold/mode.
//
// The file is a single JSON object mapping arbitrary string
// ids to a 2-element array:
//
//   {
//     "user_001": ["i have not slept in days", 1],
//     "user_002": ["great day at the park", "0"]
//   }
//
// Two details matter here:
//   1. The label may be a JSON string OR a JSON number —
//      both are coerced to a string ("1") before the dense
//      label map is applied downstream.
//   2. File order is preserved. serde_json's preserve_order
//      feature keeps the object entries in insertion order,
//      so texts[i] and labels[i] line up with the file.
//
// Reference: Rust Book §9 (Error Handling)
//            serde_json crate documentation

use anyhow::{bail, Context, Result};
use std::{fs, path::PathBuf};

use crate::domain::example::Mode;
use crate::domain::traits::{RawRecords, RecordSource};

/// Loads id → [text, label] JSON files following the
/// `{data_dir}/{task}_{fold}_{mode}.json` naming convention.
pub struct JsonRecordLoader {
    data_dir:  PathBuf,
    task_name: String,
    fold:      usize,
}

impl JsonRecordLoader {
    pub fn new(data_dir: impl Into<PathBuf>, task_name: impl Into<String>, fold: usize) -> Self {
        Self {
            data_dir:  data_dir.into(),
            task_name: task_name.into(),
            fold,
        }
    }

    /// The raw data file path for a given split
    pub fn path_for(&self, mode: Mode) -> PathBuf {
        self.data_dir
            .join(format!("{}_{}_{}.json", self.task_name, self.fold, mode.as_str()))
    }
}

impl RecordSource for JsonRecordLoader {
    fn load(&self, mode: Mode) -> Result<RawRecords> {
        let path = self.path_for(mode);

        let raw = fs::read_to_string(&path)
            .with_context(|| format!("Cannot read data file '{}'", path.display()))?;

        let data: serde_json::Map<String, serde_json::Value> = serde_json::from_str(&raw)
            .with_context(|| format!("'{}' is not a JSON object", path.display()))?;

        let mut records = RawRecords::default();

        for (id, entry) in &data {
            let pair = entry.as_array().filter(|a| a.len() == 2);
            let Some(pair) = pair else {
                bail!(
                    "Entry '{}' in '{}' is not a 2-element [text, label] array",
                    id,
                    path.display()
                );
            };

            let text = pair[0]
                .as_str()
                .with_context(|| format!("Entry '{}': text is not a string", id))?;

            records.texts.push(text.to_string());
            records.labels.push(coerce_label(&pair[1]));
        }

        tracing::info!(
            "Loaded {} records from '{}'",
            records.texts.len(),
            path.display()
        );
        Ok(records)
    }
}

/// Coerce a JSON label value to its string form.
/// Strings pass through unchanged; numbers and booleans use
/// their canonical JSON rendering ("1", "true").
fn coerce_label(value: &serde_json::Value) -> String {
    match value.as_str() {
        Some(s) => s.to_string(),
        None    => value.to_string(),
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;

    fn write_temp_json(name: &str, body: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("symptom-detect-loader-{name}"));
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(dir.join("depr_0_train.json"), body).unwrap();
        dir
    }

    #[test]
    fn test_loads_records_in_file_order() {
        let dir = write_temp_json(
            "order",
            r#"{"b": ["second text", 1], "a": ["first text", 0]}"#,
        );
        let loader  = JsonRecordLoader::new(&dir, "depr", 0);
        let records = loader.load(Mode::Train).unwrap();

        assert_eq!(records.texts,  vec!["second text", "first text"]);
        assert_eq!(records.labels, vec!["1", "0"]);
    }

    #[test]
    fn test_coerces_numeric_and_string_labels() {
        let dir = write_temp_json(
            "coerce",
            r#"{"x": ["t1", 1], "y": ["t2", "0"]}"#,
        );
        let loader  = JsonRecordLoader::new(&dir, "depr", 0);
        let records = loader.load(Mode::Train).unwrap();

        assert_eq!(records.labels, vec!["1", "0"]);
    }

    #[test]
    fn test_rejects_malformed_entry() {
        let dir    = write_temp_json("bad", r#"{"x": ["only text"]}"#);
        let loader = JsonRecordLoader::new(&dir, "depr", 0);
        assert!(loader.load(Mode::Train).is_err());
    }

    #[test]
    fn test_missing_file_is_an_error() {
        let loader = JsonRecordLoader::new("/nonexistent/dir", "depr", 0);
        assert!(loader.load(Mode::Train).is_err());
    }
}
