// ============================================================
// Layer 6 — Metrics Logger
// ============================================================
// Records training losses to a CSV file after each epoch so
// learning curves can be plotted after the run.
//
// Columns:
//   epoch       the epoch number (1, 2, 3, ...)
//   train_loss  mean MSE(x) + MSE(y) over training batches
//   val_loss    same, on the validation set (NaN if empty)
//   val_loss_x  validation MSE of the x head
//   val_loss_y  validation MSE of the y head
//
// All losses are in scaled coordinate space.
//
// Output file: <checkpoint_dir>/metrics.csv, recreated per run.

use anyhow::Result;
use std::{
    fs::{self, OpenOptions},
    io::Write,
    path::{Path, PathBuf},
};
use serde::{Deserialize, Serialize};

/// One row of metrics data for a single training epoch
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EpochMetrics {
    pub epoch:      usize,
    pub train_loss: f64,
    pub val_loss:   f64,
    pub val_loss_x: f64,
    pub val_loss_y: f64,
}

impl EpochMetrics {
    pub fn new(
        epoch:      usize,
        train_loss: f64,
        val_loss:   f64,
        val_loss_x: f64,
        val_loss_y: f64,
    ) -> Self {
        Self { epoch, train_loss, val_loss, val_loss_x, val_loss_y }
    }

    /// The loss the callbacks watch: validation loss when there is a
    /// validation set, training loss otherwise.
    pub fn monitored_loss(&self) -> f64 {
        if self.val_loss.is_nan() { self.train_loss } else { self.val_loss }
    }
}

pub struct MetricsLogger {
    csv_path: PathBuf,
}

impl MetricsLogger {
    /// Create `metrics.csv` in `dir` with a fresh header row.
    pub fn new(dir: impl AsRef<Path>) -> Result<Self> {
        let dir = dir.as_ref();
        fs::create_dir_all(dir)?;

        let csv_path = dir.join("metrics.csv");
        let mut f = fs::File::create(&csv_path)?;
        writeln!(f, "epoch,train_loss,val_loss,val_loss_x,val_loss_y")?;
        tracing::debug!("Created metrics CSV: '{}'", csv_path.display());

        Ok(Self { csv_path })
    }

    /// Append one epoch's metrics as a new row in the CSV.
    pub fn log(&self, m: &EpochMetrics) -> Result<()> {
        let mut f = OpenOptions::new()
            .append(true)
            .open(&self.csv_path)?;

        writeln!(
            f,
            "{},{:.6},{:.6},{:.6},{:.6}",
            m.epoch,
            m.train_loss,
            m.val_loss,
            m.val_loss_x,
            m.val_loss_y,
        )?;

        tracing::debug!(
            "Logged epoch {} metrics: train_loss={:.4}, val_loss={:.4}",
            m.epoch,
            m.train_loss,
            m.val_loss,
        );

        Ok(())
    }

    pub fn csv_path(&self) -> &Path {
        &self.csv_path
    }
}
