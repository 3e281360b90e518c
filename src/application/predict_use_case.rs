// ============================================================
// Layer 2 — PredictUseCase
// ============================================================
// Loads a trained checkpoint and predicts where a fingerprint
// was recorded.
//
//   Step 1: Open the checkpoint directory    (Layer 6 - infra)
//   Step 2: Rebuild model + scalers          (Layer 5 - ml)
//   Step 3: Parse the raw readings           (this file)
//   Step 4: Run inference                    (Layer 5 - ml)

use std::path::Path;

use anyhow::{Context, Result};

use crate::domain::fingerprint::Coordinate;
use crate::infra::checkpoint::CheckpointManager;
use crate::ml::inferencer::Inferencer;

pub struct PredictUseCase {
    inferencer: Inferencer,
}

impl PredictUseCase {
    pub fn new(checkpoint_dir: impl AsRef<Path>) -> Result<Self> {
        let ckpt_manager = CheckpointManager::open(checkpoint_dir)?;
        let inferencer   = Inferencer::from_checkpoint(&ckpt_manager)?;
        Ok(Self { inferencer })
    }

    /// Predict from comma separated readings. Empty entries are
    /// treated as missing.
    pub fn predict(&self, rss: &str, power: Option<&str>) -> Result<Coordinate> {
        let rss   = parse_readings(rss).context("Invalid --rss value")?;
        let power = power
            .map(parse_readings)
            .transpose()
            .context("Invalid --power value")?;

        tracing::debug!(
            "Predicting for {} readings over APs {:?}",
            rss.len(),
            self.inferencer.access_points()
        );
        let coordinate = self.inferencer.predict(&rss, power.as_deref())?;
        Ok(coordinate)
    }
}

/// Parse `"-45,,-70.5"` into `[Some(-45.0), None, Some(-70.5)]`.
pub fn parse_readings(text: &str) -> Result<Vec<Option<f64>>> {
    text.split(',')
        .map(str::trim)
        .enumerate()
        .map(|(i, field)| {
            if field.is_empty() {
                Ok(None)
            } else {
                field
                    .parse::<f64>()
                    .map(Some)
                    .with_context(|| format!("Reading {} ('{}') is not a number", i + 1, field))
            }
        })
        .collect()
}
