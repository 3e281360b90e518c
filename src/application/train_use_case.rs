// ============================================================
// Layer 2 — TrainUseCase
// ============================================================
// Orchestrates the full training pipeline in order:
//
//   Step 1: Load + preprocess the CSV     (Layer 4 - data)
//   Step 2: Save the run config           (Layer 6 - infra)
//   Step 3: Build the regression network  (Layer 5 - ml)
//   Step 4: Run the training loop         (Layer 5 - ml)
//   Step 5: Evaluate on the test split    (Layer 5 - ml)
//
// Reference: Burn Book §5 (Training)

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::data::loader::{FingerprintLoader, LoaderConfig};
use crate::infra::checkpoint::CheckpointManager;
use crate::ml::{
    evaluation::EvaluationReport,
    trainer::{RegressionTrainer, TrainerConfig, TrainingSummary},
};

type TrainBackend = burn::backend::Autodiff<burn::backend::NdArray>;

// ─── Training Configuration ──────────────────────────────────────────────────
// Everything a training run needs. Serialisable so it can be
// saved next to the checkpoint and inspected later.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TrainConfig {
    pub loader:  LoaderConfig,
    pub trainer: TrainerConfig,
}

/// Result of a complete training run
#[derive(Debug, Clone)]
pub struct TrainOutcome {
    pub training: TrainingSummary,
    pub report:   EvaluationReport,
}

// ─── TrainUseCase ─────────────────────────────────────────────────────────────
pub struct TrainUseCase {
    config: TrainConfig,
}

impl TrainUseCase {
    pub fn new(config: TrainConfig) -> Self {
        Self { config }
    }

    /// Execute the full training pipeline end to end
    pub fn execute(&self) -> Result<TrainOutcome> {
        let cfg = &self.config;

        // ── Step 1: Load and preprocess ───────────────────────────────────────
        tracing::info!("Loading fingerprints from '{}'", cfg.loader.data_path.display());
        let data = FingerprintLoader::from_config(cfg.loader.clone())
            .load()
            .with_context(|| format!("Failed to load '{}'", cfg.loader.data_path.display()))?;
        let summary = data.summary();
        tracing::info!(
            "Split: {} train, {} test ({} APs, {} TX power columns)",
            summary.training_rows,
            summary.testing_rows,
            summary.access_points,
            summary.power_columns,
        );

        // ── Step 2: Save config for later inspection ──────────────────────────
        let ckpt_manager = CheckpointManager::new(&cfg.trainer.checkpoint_dir)?;
        ckpt_manager.save_train_config(cfg)?;

        // ── Step 3: Build ─────────────────────────────────────────────────────
        let device = burn::backend::ndarray::NdArrayDevice::default();
        let mut trainer = RegressionTrainer::<TrainBackend>::new(data, cfg.trainer.clone(), device)
            .context("Invalid training configuration")?;
        trainer.build()?;

        // ── Step 4: Train ─────────────────────────────────────────────────────
        let training = trainer.train()?;

        // ── Step 5: Evaluate ──────────────────────────────────────────────────
        let report = trainer.evaluate().context("Evaluation failed")?;
        tracing::info!(
            "Test set: mean distance error {:.4}, R² x={:.4} y={:.4}",
            report.mean_distance_error,
            report.r2_x,
            report.r2_y,
        );

        Ok(TrainOutcome { training, report })
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use crate::ml::{evaluation::MetricSpace, model::BranchLayout};
    use std::fmt::Write as _;

    fn write_dataset(path: &std::path::Path) {
        let mut body = String::from("AP1,AP2,AP3,TX_AP1,TX_AP2,floor,xr,yr\n");
        for i in 0..30 {
            let (x, y) = ((i % 6) as f64, (i / 6) as f64);
            let ap3 = if i % 4 == 0 { String::new() } else { "-70".to_string() };
            writeln!(
                body,
                "{},{},{},20,{},1,{},{}",
                -40.0 - 4.0 * x, -40.0 - 4.0 * y, ap3, 15.0 + x, x, y
            )
            .unwrap();
        }
        std::fs::write(path, body).unwrap();
    }

    fn config(dir: &std::path::Path, layout: BranchLayout) -> TrainConfig {
        let data_path = dir.join("fingerprints.csv");
        write_dataset(&data_path);
        TrainConfig {
            loader: LoaderConfig {
                data_path,
                seed: Some(11),
                ..LoaderConfig::default()
            },
            trainer: TrainerConfig {
                epochs:         2,
                batch_size:     4,
                layout,
                checkpoint_dir: dir.join("ckpt"),
                seed:           Some(11),
                ..TrainerConfig::default()
            },
        }
    }

    #[test]
    fn test_execute_writes_complete_checkpoint() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = config(dir.path(), BranchLayout::DualBranch);
        let outcome = TrainUseCase::new(cfg.clone()).execute().unwrap();

        assert_eq!(outcome.report.samples, 6);
        assert_eq!(outcome.report.space, MetricSpace::Original);
        assert!(outcome.training.epochs_run >= 1);

        let ckpt = CheckpointManager::open(&cfg.trainer.checkpoint_dir).unwrap();
        assert!(ckpt.has_model());
        let saved: TrainConfig = ckpt.load_train_config().unwrap();
        assert_eq!(saved.trainer.epochs, 2);
        assert_eq!(saved.trainer.layout, BranchLayout::DualBranch);
        assert_eq!(ckpt.load_model_config().unwrap().power_features, 2);

        // The checkpoint alone is enough to predict
        let predictor = crate::application::predict_use_case::PredictUseCase::new(&cfg.trainer.checkpoint_dir)
            .unwrap();
        let c = predictor.predict("-44,-48,", Some("20,16")).unwrap();
        assert!(c.x.is_finite() && c.y.is_finite());
        assert!(predictor.predict("-44,-48", Some("20,16")).is_err());
    }

    #[test]
    fn test_config_defaults_match_cli() {
        let cfg = TrainConfig::default();
        assert_eq!(cfg.trainer.batch_size, 8);
        assert_eq!(cfg.trainer.epochs, 10);
        assert_eq!(cfg.trainer.patience, 10);
        assert_eq!(cfg.loader.missing_rss_value, -100.0);
        assert_eq!(cfg.loader.floor, 1);
    }
}
