// ============================================================
// Layer 6 — Checkpoint Manager
// ============================================================
// Saves and restores the best model using Burn's CompactRecorder.
//
// What lives in the checkpoint directory:
//   best_model.mpk       — weights of the best epoch so far
//                          (overwritten on every improvement,
//                          removed when a new run starts)
//   model_config.json    — architecture needed to rebuild the model
//   scalers.json         — fitted scalers, sentinel, column names
//   train_config.json    — the full run configuration
//   metrics.csv          — per-epoch losses (see metrics.rs)
//
// Loading weights requires a model built from the same config;
// CompactRecorder fails if the architecture does not match.
//
// Reference: Burn Book §5 (Records and Checkpointing)

use anyhow::{Context, Result};
use burn::{
    prelude::*,
    record::{CompactRecorder, Recorder},
};
use serde::{de::DeserializeOwned, Serialize};
use std::{
    fs,
    path::{Path, PathBuf},
};

use crate::data::dataset::FittedScalers;
use crate::ml::model::{PositioningModel, PositioningModelConfig};

const MODEL_FILE:        &str = "best_model";
// CompactRecorder appends this to MODEL_FILE
const MODEL_EXTENSION:   &str = "mpk";
const MODEL_CONFIG_FILE: &str = "model_config.json";
const SCALERS_FILE:      &str = "scalers.json";
const TRAIN_CONFIG_FILE: &str = "train_config.json";

pub struct CheckpointManager {
    dir: PathBuf,
}

impl CheckpointManager {
    /// Create the manager, creating the directory if needed.
    pub fn new(dir: impl AsRef<Path>) -> Result<Self> {
        let dir = dir.as_ref().to_path_buf();
        fs::create_dir_all(&dir)
            .with_context(|| format!("Cannot create checkpoint directory '{}'", dir.display()))?;
        Ok(Self { dir })
    }

    /// Open an existing checkpoint directory without creating it.
    pub fn open(dir: impl AsRef<Path>) -> Result<Self> {
        let dir = dir.as_ref().to_path_buf();
        anyhow::ensure!(
            dir.is_dir(),
            "Checkpoint directory '{}' does not exist. Have you run 'train' first?",
            dir.display()
        );
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Overwrite the best-model checkpoint with `model`'s weights.
    pub fn save_model<B: Backend>(&self, model: &PositioningModel<B>) -> Result<()> {
        let path = self.dir.join(MODEL_FILE);
        CompactRecorder::new()
            .record(model.clone().into_record(), path.clone())
            .with_context(|| format!("Failed to save checkpoint to '{}'", path.display()))?;
        tracing::debug!("Saved best model to '{}'", path.display());
        Ok(())
    }

    /// Load the best-model weights into `model`.
    pub fn load_model<B: Backend>(
        &self,
        model:  PositioningModel<B>,
        device: &B::Device,
    ) -> Result<PositioningModel<B>> {
        let path = self.dir.join(MODEL_FILE);
        let record = CompactRecorder::new()
            .load(path.clone(), device)
            .with_context(|| {
                format!("Cannot load checkpoint '{}'. Have you trained the model first?",
                    path.display())
            })?;
        Ok(model.load_record(record))
    }

    pub fn has_model(&self) -> bool {
        self.model_path().exists()
    }

    /// Remove weights left by an earlier run so they can never be
    /// paired with this run's config and scalers.
    pub fn clear_model(&self) -> Result<()> {
        let path = self.model_path();
        if path.exists() {
            fs::remove_file(&path)
                .with_context(|| format!("Cannot remove stale checkpoint '{}'", path.display()))?;
            tracing::info!("Removed previous checkpoint '{}'", path.display());
        }
        Ok(())
    }

    fn model_path(&self) -> PathBuf {
        self.dir.join(format!("{MODEL_FILE}.{MODEL_EXTENSION}"))
    }

    pub fn save_model_config(&self, cfg: &PositioningModelConfig) -> Result<()> {
        self.write_json(MODEL_CONFIG_FILE, cfg)
    }

    pub fn load_model_config(&self) -> Result<PositioningModelConfig> {
        self.read_json(MODEL_CONFIG_FILE)
    }

    pub fn save_scalers(&self, scalers: &FittedScalers) -> Result<()> {
        self.write_json(SCALERS_FILE, scalers)
    }

    pub fn load_scalers(&self) -> Result<FittedScalers> {
        self.read_json(SCALERS_FILE)
    }

    /// Save the run configuration so a checkpoint documents how it was made.
    pub fn save_train_config<T: Serialize>(&self, cfg: &T) -> Result<()> {
        self.write_json(TRAIN_CONFIG_FILE, cfg)
    }

    pub fn load_train_config<T: DeserializeOwned>(&self) -> Result<T> {
        self.read_json(TRAIN_CONFIG_FILE)
    }

    fn write_json<T: Serialize>(&self, name: &str, value: &T) -> Result<()> {
        let path = self.dir.join(name);
        let json = serde_json::to_string_pretty(value)?;
        fs::write(&path, json)
            .with_context(|| format!("Cannot write '{}'", path.display()))?;
        tracing::debug!("Saved '{}'", path.display());
        Ok(())
    }

    fn read_json<T: DeserializeOwned>(&self, name: &str) -> Result<T> {
        let path = self.dir.join(name);
        let json = fs::read_to_string(&path)
            .with_context(|| {
                format!(
                    "Cannot read '{}'. Make sure you have run 'train' before 'predict'.",
                    path.display()
                )
            })?;
        serde_json::from_str(&json)
            .with_context(|| format!("Cannot parse '{}'", path.display()))
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::preprocessor::FittedScaler;
    use crate::ml::model::BranchLayout;

    type TestBackend = burn::backend::NdArray;

    #[test]
    fn test_model_round_trip() {
        let dir    = tempfile::tempdir().unwrap();
        let ckpt   = CheckpointManager::new(dir.path()).unwrap();
        let device = Default::default();

        let cfg = PositioningModelConfig::new(3, 0, BranchLayout::SingleBranch);
        let model: PositioningModel<TestBackend> = cfg.init(&device);
        assert!(!ckpt.has_model());
        ckpt.save_model(&model).unwrap();
        assert!(ckpt.has_model());

        ckpt.save_model_config(&cfg).unwrap();
        let cfg2 = ckpt.load_model_config().unwrap();
        assert_eq!(cfg2.rss_features, 3);
        assert_eq!(cfg2.layout, BranchLayout::SingleBranch);

        let fresh: PositioningModel<TestBackend> = cfg2.init(&device);
        let loaded = ckpt.load_model(fresh, &device).unwrap();

        let input = Tensor::<TestBackend, 2>::ones([1, 3], &device);
        let a = model.forward(input.clone(), None).x.into_data().to_vec::<f32>().unwrap();
        let b = loaded.forward(input, None).x.into_data().to_vec::<f32>().unwrap();
        // CompactRecorder stores half precision
        assert!((a[0] - b[0]).abs() < 1e-2);
    }

    #[test]
    fn test_scalers_round_trip() {
        let dir  = tempfile::tempdir().unwrap();
        let ckpt = CheckpointManager::new(dir.path()).unwrap();
        let scalers = FittedScalers {
            rss:               FittedScaler::Standard { mean: vec![-80.0], scale: vec![10.0] },
            power:             None,
            coords:            FittedScaler::MinMax { min: vec![0.0, 0.0], range: vec![5.0, 8.0] },
            missing_rss_value: -100.0,
            access_points:     vec!["AP1".into()],
            power_columns:     Vec::new(),
        };
        ckpt.save_scalers(&scalers).unwrap();
        assert_eq!(ckpt.load_scalers().unwrap(), scalers);
    }

    #[test]
    fn test_open_missing_dir_fails() {
        let dir = tempfile::tempdir().unwrap();
        assert!(CheckpointManager::open(dir.path().join("missing")).is_err());
    }

    #[test]
    fn test_load_without_model_fails() {
        let dir    = tempfile::tempdir().unwrap();
        let ckpt   = CheckpointManager::new(dir.path()).unwrap();
        let device = Default::default();
        let model: PositioningModel<TestBackend> =
            PositioningModelConfig::new(2, 0, BranchLayout::SingleBranch).init(&device);
        assert!(ckpt.load_model(model, &device).is_err());
    }

    #[test]
    fn test_saved_model_file_is_detected_and_cleared() {
        let dir    = tempfile::tempdir().unwrap();
        let ckpt   = CheckpointManager::new(dir.path()).unwrap();
        let device = Default::default();
        let model: PositioningModel<TestBackend> =
            PositioningModelConfig::new(2, 0, BranchLayout::SingleBranch).init(&device);

        ckpt.save_model(&model).unwrap();
        assert!(dir.path().join("best_model.mpk").is_file());
        assert!(ckpt.has_model());

        ckpt.clear_model().unwrap();
        assert!(!ckpt.has_model());
        assert!(ckpt.load_model(model, &device).is_err());
        // Clearing an empty directory is fine
        ckpt.clear_model().unwrap();
    }
}
