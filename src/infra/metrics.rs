// ============================================================
// Layer 6 — Metrics Logger
// ============================================================
// Records training metrics to a CSV file after each epoch.
//
// Why log metrics to CSV?
//   - Easy to open in Excel or Google Sheets
//   - Can plot learning curves to diagnose training issues
//   - Provides a permanent record of each training run
//
// Metrics recorded per epoch:
//   - epoch:      the epoch number (1, 2, 3, ...)
//   - train_loss: average BCE loss on the training set
//   - val_loss:   average BCE loss on the validation set
//   - accuracy:   fraction of validation labels predicted
//                 correctly at the 0.5 threshold
//
// Output file: checkpoints/metrics.csv
//
// How to read the metrics:
//   - Loss should decrease each epoch (model is learning)
//   - If val_loss rises while train_loss falls → overfitting
//
// Reference: Rust Book §12 (I/O and File Handling)

use anyhow::Result;
use std::{
    fs::{self, OpenOptions},
    io::Write,
    path::PathBuf,
};
use serde::{Deserialize, Serialize};

/// One row of metrics data for a single training epoch
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EpochMetrics {
    /// The epoch number (starts at 1)
    pub epoch: usize,

    /// Average BCE loss over all training batches
    pub train_loss: f64,

    /// Average BCE loss on the validation set
    /// Should track train_loss — divergence indicates overfitting
    pub val_loss: f64,

    /// Fraction of validation labels predicted correctly
    /// Range: [0.0, 1.0]
    pub accuracy: f64,
}

impl EpochMetrics {
    pub fn new(epoch: usize, train_loss: f64, val_loss: f64, accuracy: f64) -> Self {
        Self { epoch, train_loss, val_loss, accuracy }
    }

    /// Returns true if this epoch improved over the previous best val_loss
    pub fn is_improvement(&self, best_val_loss: f64) -> bool {
        self.val_loss < best_val_loss
    }
}

/// Logs epoch metrics to a CSV file for later analysis.
pub struct MetricsLogger {
    csv_path: PathBuf,
}

impl MetricsLogger {
    /// Create a new MetricsLogger.
    /// Writes the CSV header if the file doesn't exist yet.
    pub fn new(dir: impl Into<String>) -> Result<Self> {
        let dir = PathBuf::from(dir.into());
        fs::create_dir_all(&dir)?;

        let csv_path = dir.join("metrics.csv");

        // Write the header only if the file is new, so runs can
        // append to an existing log
        if !csv_path.exists() {
            let mut f = fs::File::create(&csv_path)?;
            writeln!(f, "epoch,train_loss,val_loss,accuracy")?;
            tracing::debug!("Created metrics CSV: '{}'", csv_path.display());
        }

        Ok(Self { csv_path })
    }

    /// Append one epoch's metrics as a new row in the CSV.
    pub fn log(&self, m: &EpochMetrics) -> Result<()> {
        let mut f = OpenOptions::new()
            .append(true)
            .open(&self.csv_path)?;

        writeln!(
            f,
            "{},{:.6},{:.6},{:.6}",
            m.epoch, m.train_loss, m.val_loss, m.accuracy,
        )?;

        tracing::debug!(
            "Logged epoch {} metrics: train_loss={:.4}, val_loss={:.4}",
            m.epoch, m.train_loss, m.val_loss,
        );

        Ok(())
    }

    /// Return the path to the metrics CSV file
    pub fn csv_path(&self) -> &PathBuf {
        &self.csv_path
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_improvement() {
        let m = EpochMetrics::new(2, 2.5, 2.3, 0.6);
        // 2.3 < 3.0 → this is an improvement
        assert!(m.is_improvement(3.0));
        // 2.3 is NOT less than 2.0 → not an improvement
        assert!(!m.is_improvement(2.0));
    }

    #[test]
    fn test_best_epoch_tracking_over_a_run() {
        // The trainer keeps the lowest val_loss seen so far and
        // only records a new best epoch when it is beaten
        let run = [
            EpochMetrics::new(1, 0.70, 0.68, 0.55),
            EpochMetrics::new(2, 0.60, 0.61, 0.60),
            EpochMetrics::new(3, 0.55, 0.64, 0.58),
        ];

        let mut best       = f64::INFINITY;
        let mut best_epoch = 0;
        for m in &run {
            if m.is_improvement(best) {
                best       = m.val_loss;
                best_epoch = m.epoch;
            }
        }

        assert_eq!(best_epoch, 2);
        assert_eq!(best, 0.61);
    }

    #[test]
    fn test_log_appends_rows() {
        let dir = std::env::temp_dir()
            .join("symptom-detect-metrics-log")
            .to_string_lossy()
            .to_string();
        // Fresh file per run
        let _ = std::fs::remove_file(PathBuf::from(&dir).join("metrics.csv"));

        let logger = MetricsLogger::new(dir).unwrap();
        logger.log(&EpochMetrics::new(1, 0.7, 0.68, 0.55)).unwrap();
        logger.log(&EpochMetrics::new(2, 0.6, 0.62, 0.61)).unwrap();

        let contents = std::fs::read_to_string(logger.csv_path()).unwrap();
        let lines: Vec<&str> = contents.lines().collect();
        assert_eq!(lines[0], "epoch,train_loss,val_loss,accuracy");
        assert_eq!(lines.len(), 3);
        assert!(lines[1].starts_with("1,0.700000"));
    }
}
