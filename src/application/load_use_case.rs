// ============================================================
// Layer 2 — LoadUseCase
// ============================================================
// Runs the data pipeline on its own so a dataset can be checked
// (row counts, detected columns) before committing to a
// training run.
//
//   Step 1: Read + preprocess the CSV   (Layer 4 - data)
//   Step 2: Optionally export the splits (Layer 4 - data)

use std::path::PathBuf;

use anyhow::{Context, Result};

use crate::data::{
    dataset::DatasetSummary,
    loader::{FingerprintLoader, LoaderConfig},
};

pub struct LoadUseCase {
    config:   LoaderConfig,
    save_dir: Option<PathBuf>,
}

impl LoadUseCase {
    pub fn new(config: LoaderConfig, save_dir: Option<PathBuf>) -> Self {
        Self { config, save_dir }
    }

    pub fn execute(&self) -> Result<DatasetSummary> {
        // ── Step 1: Load and preprocess ───────────────────────────────────────
        tracing::info!("Loading fingerprints from '{}'", self.config.data_path.display());
        let data = FingerprintLoader::from_config(self.config.clone())
            .load()
            .with_context(|| format!("Failed to load '{}'", self.config.data_path.display()))?;

        // ── Step 2: Export ────────────────────────────────────────────────────
        if let Some(dir) = &self.save_dir {
            data.save(dir)
                .with_context(|| format!("Failed to save processed data to '{}'", dir.display()))?;
            tracing::info!("Processed splits written to '{}'", dir.display());
        }

        Ok(data.summary())
    }
}
