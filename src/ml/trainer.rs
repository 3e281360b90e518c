// ============================================================
// Layer 5 — Regression Trainer
// ============================================================
// Owns a processed dataset and the regression network, and walks
// it through a fixed lifecycle:
//
//   Unbuilt ──build()──▶ Built ──train()──▶ Trained ──evaluate()──▶ Evaluated
//
// build() may be called again at any point to start over with
// fresh weights. predict() works as soon as a model exists.
//
// Backends:
//   - Training uses B (an AutodiffBackend) for gradients
//   - model.valid() returns the model on B::InnerBackend with
//     dropout disabled; validation, evaluation and prediction
//     all run there
//
// Callbacks (see callbacks.rs) run after every epoch: the best
// weights are checkpointed and kept in memory, and training
// stops early once the monitored loss stops improving. The best
// weights are restored when the loop ends.
//
// Reference: Burn Book §5, Kingma & Ba (2015) Adam

use std::{path::PathBuf, str::FromStr};

use anyhow::Result;
use burn::{
    data::dataloader::DataLoaderBuilder,
    module::AutodiffModule,
    optim::{AdamConfig, GradientsParams, Optimizer, SgdConfig},
    prelude::*,
    tensor::backend::AutodiffBackend,
};
use ndarray::Array2;
use serde::{Deserialize, Serialize};

use crate::data::{
    batcher::FingerprintBatcher,
    dataset::{FingerprintDataset, FittedScalers, ProcessedDataset},
    splitter::{make_rng, split_train_test},
};
use crate::domain::fingerprint::Coordinate;
use crate::error::{PipelineError, PipelineResult};
use crate::infra::{
    checkpoint::CheckpointManager,
    metrics::{EpochMetrics, MetricsLogger},
};
use crate::ml::{
    callbacks::{CallbackAction, LossMonitor},
    evaluation::{evaluate_predictions, EvaluationReport, MetricSpace},
    inferencer::{matrix_to_tensor, predict_coordinate, tensor_to_vec},
    model::{BranchLayout, PositioningModel, PositioningModelConfig},
};

// ─── Optimizer ────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OptimizerKind {
    Adam,
    Sgd,
}

impl OptimizerKind {
    pub fn name(&self) -> &'static str {
        match self {
            OptimizerKind::Adam => "adam",
            OptimizerKind::Sgd  => "sgd",
        }
    }
}

impl FromStr for OptimizerKind {
    type Err = PipelineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "adam" => Ok(OptimizerKind::Adam),
            "sgd"  => Ok(OptimizerKind::Sgd),
            other  => Err(PipelineError::UnsupportedOptimizer(other.to_string())),
        }
    }
}

impl std::fmt::Display for OptimizerKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Optimizer choice plus its learning rate
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OptimizerSettings {
    pub kind:          OptimizerKind,
    pub learning_rate: f64,
}

impl Default for OptimizerSettings {
    fn default() -> Self {
        Self { kind: OptimizerKind::Adam, learning_rate: 1e-3 }
    }
}

// ─── Configuration ────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainerConfig {
    pub batch_size:       usize,
    pub epochs:           usize,
    pub dropout:          f64,
    pub optimizer:        OptimizerSettings,
    /// Epochs without improvement before training stops
    pub patience:         usize,
    /// Fraction of the training rows held out for validation.
    /// 0 validates on the test partition instead.
    pub validation_split: f64,
    pub checkpoint_dir:   PathBuf,
    pub layout:           BranchLayout,
    pub seed:             Option<u64>,
}

impl Default for TrainerConfig {
    fn default() -> Self {
        Self {
            batch_size:       8,
            epochs:           10,
            dropout:          0.2,
            optimizer:        OptimizerSettings::default(),
            patience:         10,
            validation_split: 0.0,
            checkpoint_dir:   PathBuf::from("checkpoint"),
            layout:           BranchLayout::SingleBranch,
            seed:             None,
        }
    }
}

impl TrainerConfig {
    fn validate(&self) -> PipelineResult<()> {
        if self.batch_size == 0 {
            return Err(PipelineError::InvalidHyperparameter("batch_size must be at least 1".into()));
        }
        if !(0.0..1.0).contains(&self.dropout) {
            return Err(PipelineError::InvalidHyperparameter(format!(
                "dropout must be in [0, 1), got {}",
                self.dropout
            )));
        }
        if self.optimizer.learning_rate.is_nan() || self.optimizer.learning_rate <= 0.0 {
            return Err(PipelineError::InvalidHyperparameter(format!(
                "learning rate must be positive, got {}",
                self.optimizer.learning_rate
            )));
        }
        if !(0.0..1.0).contains(&self.validation_split) {
            return Err(PipelineError::InvalidFraction {
                name:  "validation_split",
                value: self.validation_split,
            });
        }
        Ok(())
    }
}

// ─── Lifecycle ────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrainerState {
    Unbuilt,
    Built,
    Trained,
    Evaluated,
}

/// What happened during train().
#[derive(Debug, Clone, Serialize)]
pub struct TrainingSummary {
    pub epochs_run:    usize,
    pub best_epoch:    Option<usize>,
    pub best_loss:     f64,
    pub stopped_early: bool,
}

pub struct RegressionTrainer<B: AutodiffBackend> {
    config:  TrainerConfig,
    data:    ProcessedDataset,
    scalers: FittedScalers,
    device:  B::Device,
    model:   Option<PositioningModel<B>>,
    state:   TrainerState,
}

impl<B: AutodiffBackend> RegressionTrainer<B> {
    /// Check the configuration against the data and seed the backend.
    pub fn new(data: ProcessedDataset, config: TrainerConfig, device: B::Device) -> PipelineResult<Self> {
        config.validate()?;
        if config.layout == BranchLayout::DualBranch && !data.has_power() {
            return Err(PipelineError::MissingPowerFeatures);
        }
        if let Some(seed) = config.seed {
            B::seed(seed);
        }

        let scalers = data.scalers();
        Ok(Self {
            config,
            data,
            scalers,
            device,
            model: None,
            state: TrainerState::Unbuilt,
        })
    }

    pub fn state(&self) -> TrainerState {
        self.state
    }

    pub fn data(&self) -> &ProcessedDataset {
        &self.data
    }

    pub fn scalers(&self) -> &FittedScalers {
        &self.scalers
    }

    pub fn model(&self) -> Option<&PositioningModel<B>> {
        self.model.as_ref()
    }

    pub fn model_config(&self) -> PositioningModelConfig {
        let power_features = match self.config.layout {
            BranchLayout::SingleBranch => 0,
            BranchLayout::DualBranch   => self.data.power_columns.len(),
        };
        PositioningModelConfig::new(self.data.access_points.len(), power_features, self.config.layout)
            .with_dropout(self.config.dropout)
    }

    /// Construct the network with fresh weights.
    pub fn build(&mut self) -> PipelineResult<()> {
        let model_cfg = self.model_config();
        let model: PositioningModel<B> = model_cfg.init(&self.device);
        tracing::info!(
            "Model ready: {:?}, {} RSS inputs, {} power inputs, dropout={}",
            model_cfg.layout,
            model_cfg.rss_features,
            model_cfg.power_features,
            model_cfg.dropout,
        );

        self.model = Some(model);
        self.state = TrainerState::Built;
        Ok(())
    }

    /// Fit the model, checkpointing the best epoch into
    /// `checkpoint_dir`. The in-memory model ends up holding the
    /// best weights seen.
    pub fn train(&mut self) -> Result<TrainingSummary> {
        let model = self.model.clone().ok_or(PipelineError::ModelNotBuilt)?;

        let ckpt_manager = CheckpointManager::new(&self.config.checkpoint_dir)?;
        ckpt_manager.clear_model()?;
        ckpt_manager.save_model_config(&self.model_config())?;
        ckpt_manager.save_scalers(&self.scalers)?;

        // Bind the optimiser to the model type so Adam and SGD share
        // the same loop.
        let (model, summary) = match self.config.optimizer.kind {
            OptimizerKind::Adam => {
                // m = β1*m + (1-β1)*g        (mean)
                // v = β2*v + (1-β2)*g²       (variance)
                // θ = θ - lr * m / (√v + ε)  (update)
                let optim = AdamConfig::new().with_epsilon(1e-7).init();
                self.train_loop(model, optim, &ckpt_manager)?
            }
            OptimizerKind::Sgd => {
                let optim = SgdConfig::new().init();
                self.train_loop(model, optim, &ckpt_manager)?
            }
        };

        self.model = Some(model);
        self.state = TrainerState::Trained;
        tracing::info!(
            "Training complete: {} epochs, best epoch {:?} (loss {:.6})",
            summary.epochs_run,
            summary.best_epoch,
            summary.best_loss,
        );
        Ok(summary)
    }

    fn train_loop<O>(
        &self,
        mut model:    PositioningModel<B>,
        mut optim:    O,
        ckpt_manager: &CheckpointManager,
    ) -> Result<(PositioningModel<B>, TrainingSummary)>
    where
        O: Optimizer<PositioningModel<B>, B>,
    {
        let cfg = &self.config;

        // ── Training / validation samples ─────────────────────────────────────
        let train_samples = self.data.training.samples();
        let (train_samples, val_samples) = if cfg.validation_split > 0.0 {
            let mut rng = make_rng(cfg.seed);
            split_train_test(train_samples, cfg.validation_split, &mut rng)
        } else {
            (train_samples, self.data.testing.samples())
        };
        tracing::info!(
            "Training on {} samples, validating on {}",
            train_samples.len(),
            val_samples.len()
        );

        // ── Training data loader (AutodiffBackend) ────────────────────────────
        let train_batcher = FingerprintBatcher::<B>::new(self.device.clone());
        let train_loader  = DataLoaderBuilder::new(train_batcher)
            .batch_size(cfg.batch_size)
            .shuffle(cfg.seed.unwrap_or_else(rand::random))
            .num_workers(1)
            .build(FingerprintDataset::new(train_samples));

        // ── Validation data loader (InnerBackend — no autodiff overhead) ──────
        let val_batcher = FingerprintBatcher::<B::InnerBackend>::new(self.device.clone());
        let val_loader  = DataLoaderBuilder::new(val_batcher)
            .batch_size(cfg.batch_size)
            .num_workers(1)
            .build(FingerprintDataset::new(val_samples));

        let logger      = MetricsLogger::new(ckpt_manager.dir())?;
        let mut monitor = LossMonitor::new(cfg.patience);
        let mut best    = None;
        let mut summary = TrainingSummary {
            epochs_run:    0,
            best_epoch:    None,
            best_loss:     f64::INFINITY,
            stopped_early: false,
        };

        // ── Epoch loop ────────────────────────────────────────────────────────
        for epoch in 1..=cfg.epochs {
            summary.epochs_run = epoch;

            // ── Training phase ────────────────────────────────────────────────
            let mut train_loss_sum = 0.0f64;
            let mut train_batches  = 0usize;

            for batch in train_loader.iter() {
                let (loss, _) = model.forward_loss(
                    batch.rss,
                    batch.power,
                    batch.target_x,
                    batch.target_y,
                );

                let loss_val: f64 = loss.total.clone().into_scalar().elem::<f64>();
                train_loss_sum += loss_val;
                train_batches  += 1;

                let grads = loss.total.backward();
                let grads = GradientsParams::from_grads(grads, &model);
                model = optim.step(cfg.optimizer.learning_rate, model, grads);
            }

            let avg_train_loss = if train_batches > 0 {
                train_loss_sum / train_batches as f64
            } else { f64::NAN };

            // ── Validation phase ──────────────────────────────────────────────
            // Losses are weighted by batch size so a short final batch
            // does not skew the mean.
            let model_valid = model.valid();

            let mut val_sum   = 0.0f64;
            let mut val_x_sum = 0.0f64;
            let mut val_y_sum = 0.0f64;
            let mut val_count = 0usize;

            for batch in val_loader.iter() {
                let n = batch.rss.dims()[0];
                let (loss, _) = model_valid.forward_loss(
                    batch.rss,
                    batch.power,
                    batch.target_x,
                    batch.target_y,
                );
                val_sum   += loss.total.into_scalar().elem::<f64>() * n as f64;
                val_x_sum += loss.x.into_scalar().elem::<f64>() * n as f64;
                val_y_sum += loss.y.into_scalar().elem::<f64>() * n as f64;
                val_count += n;
            }

            let mean = |sum: f64| if val_count > 0 { sum / val_count as f64 } else { f64::NAN };
            let metrics = EpochMetrics::new(
                epoch,
                avg_train_loss,
                mean(val_sum),
                mean(val_x_sum),
                mean(val_y_sum),
            );
            logger.log(&metrics)?;

            println!(
                "Epoch {:>3}/{} | train_loss={:.4} | val_loss={:.4} | val_x={:.4} | val_y={:.4}",
                epoch, cfg.epochs, metrics.train_loss, metrics.val_loss,
                metrics.val_loss_x, metrics.val_loss_y,
            );

            // ── Callbacks ─────────────────────────────────────────────────────
            match monitor.observe(epoch, metrics.monitored_loss()) {
                CallbackAction::SaveBest => {
                    ckpt_manager.save_model(&model)?;
                    tracing::info!("Epoch {}: loss improved to {:.6}, checkpoint saved", epoch, monitor.best_loss());
                    best = Some(model.clone());
                }
                CallbackAction::Continue => {}
                CallbackAction::Stop => {
                    tracing::info!(
                        "Early stopping at epoch {} (no improvement for {} epochs)",
                        epoch, cfg.patience,
                    );
                    summary.stopped_early = true;
                    break;
                }
            }
        }

        if let Some(best_model) = best {
            tracing::info!("Restoring weights from epoch {:?}", monitor.best_epoch());
            model = best_model;
        }
        summary.best_epoch = monitor.best_epoch();
        summary.best_loss  = monitor.best_loss();
        tracing::debug!("Epoch metrics written to '{}'", logger.csv_path().display());

        Ok((model, summary))
    }

    /// Score the trained model on the test partition. Metrics are in
    /// building coordinates when the coordinate scaler can be
    /// inverted, and in scaled space otherwise.
    pub fn evaluate(&mut self) -> PipelineResult<EvaluationReport> {
        match self.state {
            TrainerState::Unbuilt => return Err(PipelineError::ModelNotBuilt),
            TrainerState::Built   => return Err(PipelineError::ModelNotTrained),
            TrainerState::Trained | TrainerState::Evaluated => {}
        }
        let model  = self.model.as_ref().ok_or(PipelineError::ModelNotBuilt)?.valid();
        let test   = &self.data.testing;
        let labels = &test.labels;

        let predicted_scaled = if test.is_empty() {
            Array2::zeros((0, 2))
        } else {
            let rss    = matrix_to_tensor::<B::InnerBackend>(test.rss_scaled.view(), &self.device);
            let power  = test.power
                .as_ref()
                .filter(|_| model.has_merge())
                .map(|p| matrix_to_tensor::<B::InnerBackend>(p.power_scaled.view(), &self.device));
            let output = model.forward(rss, power);

            let xs = tensor_to_vec(output.x)?;
            let ys = tensor_to_vec(output.y)?;
            let flat: Vec<f64> = xs.iter().zip(ys.iter())
                .flat_map(|(&x, &y)| [x as f64, y as f64])
                .collect();
            Array2::from_shape_vec((test.len(), 2), flat)
                .map_err(|e| PipelineError::Tensor(e.to_string()))?
        };

        let report = if labels.coords_scaler.is_invertible() {
            let predicted = labels.coords_scaler.inverse_transform(predicted_scaled.view())?;
            evaluate_predictions(labels.coords.view(), predicted.view(), MetricSpace::Original)
        } else {
            tracing::warn!(
                "The {} preprocessor cannot be inverted; reporting metrics in scaled space",
                labels.coords_scaler.kind()
            );
            evaluate_predictions(labels.coords_scaled.view(), predicted_scaled.view(), MetricSpace::Scaled)
        };

        self.state = TrainerState::Evaluated;
        Ok(report)
    }

    /// Predict the location of one raw fingerprint.
    pub fn predict(
        &self,
        rss:   &[Option<f64>],
        power: Option<&[Option<f64>]>,
    ) -> PipelineResult<Coordinate> {
        let model = self.model.as_ref().ok_or(PipelineError::ModelNotBuilt)?.valid();
        predict_coordinate(&model, &self.scalers, rss, power, &self.device)
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::loader::{FingerprintLoader, LoaderConfig};
    use crate::data::preprocessor::PreprocessorKind;
    use crate::domain::fingerprint::FingerprintRecord;
    use crate::domain::traits::{FingerprintSchema, FingerprintSource};
    use crate::ml::inferencer::Inferencer;

    type TestBackend = burn::backend::Autodiff<burn::backend::NdArray>;

    struct MemorySource {
        with_power: bool,
        rows:       usize,
    }

    impl FingerprintSource for MemorySource {
        fn load_all(&self) -> PipelineResult<(FingerprintSchema, Vec<FingerprintRecord>)> {
            let schema = FingerprintSchema {
                access_points: vec!["AP1".into(), "AP2".into(), "AP3".into()],
                power_columns: if self.with_power { vec!["TX_AP1".into(), "TX_AP2".into()] } else { Vec::new() },
            };
            let records = (0..self.rows)
                .map(|i| {
                    let x = (i % 5) as f64;
                    let y = (i / 5) as f64;
                    FingerprintRecord {
                        rss:      vec![Some(-40.0 - 5.0 * x), Some(-40.0 - 5.0 * y), if i % 4 == 0 { None } else { Some(-60.0) }],
                        power:    if self.with_power { vec![Some(20.0), Some(15.0 + x)] } else { Vec::new() },
                        floor:    1,
                        location: Coordinate::new(x, y),
                    }
                })
                .collect();
            Ok((schema, records))
        }
    }

    fn dataset(with_power: bool, preprocessor: PreprocessorKind) -> ProcessedDataset {
        let config = LoaderConfig { preprocessor, seed: Some(7), ..LoaderConfig::default() };
        FingerprintLoader::new(MemorySource { with_power, rows: 25 }, config)
            .load()
            .unwrap()
    }

    fn config(dir: &std::path::Path, layout: BranchLayout) -> TrainerConfig {
        TrainerConfig {
            batch_size:     4,
            epochs:         3,
            checkpoint_dir: dir.to_path_buf(),
            layout,
            seed:           Some(7),
            ..TrainerConfig::default()
        }
    }

    fn trainer(data: ProcessedDataset, cfg: TrainerConfig) -> RegressionTrainer<TestBackend> {
        RegressionTrainer::new(data, cfg, Default::default()).unwrap()
    }

    #[test]
    fn test_optimizer_from_str() {
        assert_eq!("Adam".parse::<OptimizerKind>().unwrap(), OptimizerKind::Adam);
        assert_eq!("sgd".parse::<OptimizerKind>().unwrap(), OptimizerKind::Sgd);
        assert!(matches!(
            "rmsprop".parse::<OptimizerKind>(),
            Err(PipelineError::UnsupportedOptimizer(_))
        ));
    }

    #[test]
    fn test_dual_branch_without_power_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let err = RegressionTrainer::<TestBackend>::new(
            dataset(false, PreprocessorKind::StandardScaler),
            config(dir.path(), BranchLayout::DualBranch),
            Default::default(),
        )
        .err()
        .unwrap();
        assert!(matches!(err, PipelineError::MissingPowerFeatures));
    }

    #[test]
    fn test_invalid_hyperparameters_are_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let mut cfg = config(dir.path(), BranchLayout::SingleBranch);
        cfg.batch_size = 0;
        let err = RegressionTrainer::<TestBackend>::new(
            dataset(false, PreprocessorKind::StandardScaler),
            cfg,
            Default::default(),
        )
        .err()
        .unwrap();
        assert!(matches!(err, PipelineError::InvalidHyperparameter(_)));
    }

    #[test]
    fn test_lifecycle_order_is_enforced() {
        let dir = tempfile::tempdir().unwrap();
        let mut t = trainer(
            dataset(false, PreprocessorKind::StandardScaler),
            config(dir.path(), BranchLayout::SingleBranch),
        );
        assert_eq!(t.state(), TrainerState::Unbuilt);

        let err = t.train().unwrap_err();
        assert!(matches!(err.downcast_ref::<PipelineError>(), Some(PipelineError::ModelNotBuilt)));
        assert!(matches!(t.evaluate(), Err(PipelineError::ModelNotBuilt)));
        assert!(matches!(t.predict(&[None, None, None], None), Err(PipelineError::ModelNotBuilt)));

        t.build().unwrap();
        assert_eq!(t.state(), TrainerState::Built);
        assert!(matches!(t.evaluate(), Err(PipelineError::ModelNotTrained)));
        // An untrained model can still predict
        assert!(t.predict(&[Some(-50.0), Some(-45.0), None], None).is_ok());
    }

    #[test]
    fn test_train_evaluate_single_branch() {
        let dir = tempfile::tempdir().unwrap();
        let mut t = trainer(
            dataset(false, PreprocessorKind::StandardScaler),
            config(dir.path(), BranchLayout::SingleBranch),
        );
        t.build().unwrap();

        let summary = t.train().unwrap();
        assert_eq!(t.state(), TrainerState::Trained);
        assert!(summary.epochs_run >= 1 && summary.epochs_run <= 3);
        assert!(summary.best_epoch.is_some());
        assert!(summary.best_loss.is_finite());

        // Checkpoint directory holds everything predict needs
        let ckpt = CheckpointManager::open(dir.path()).unwrap();
        assert!(ckpt.has_model());
        assert_eq!(ckpt.load_scalers().unwrap(), *t.scalers());
        assert!(dir.path().join("metrics.csv").exists());

        let report = t.evaluate().unwrap();
        assert_eq!(t.state(), TrainerState::Evaluated);
        assert_eq!(report.samples, t.data().testing.len());
        assert_eq!(report.space, MetricSpace::Original);
        assert!(report.mse_x.is_finite() && report.mse_y.is_finite());
        assert!(report.mean_distance_error >= 0.0);

        // Evaluating twice is allowed
        assert!(t.evaluate().is_ok());
    }

    #[test]
    fn test_train_dual_branch_with_sgd_and_validation_split() {
        let dir = tempfile::tempdir().unwrap();
        let mut cfg = config(dir.path(), BranchLayout::DualBranch);
        cfg.optimizer        = OptimizerSettings { kind: OptimizerKind::Sgd, learning_rate: 1e-2 };
        cfg.validation_split = 0.25;

        let mut t = trainer(dataset(true, PreprocessorKind::MinMaxScaler), cfg);
        t.build().unwrap();
        assert!(t.model().unwrap().has_merge());

        t.train().unwrap();
        let report = t.evaluate().unwrap();
        assert_eq!(report.space, MetricSpace::Original);

        let c = t.predict(&[Some(-45.0), Some(-50.0), Some(-60.0)], Some(&[Some(20.0), Some(16.0)][..]));
        assert!(c.unwrap().x.is_finite());
    }

    #[test]
    fn test_normalizer_reports_scaled_metrics() {
        let dir = tempfile::tempdir().unwrap();
        let mut t = trainer(
            dataset(false, PreprocessorKind::Normalization),
            config(dir.path(), BranchLayout::SingleBranch),
        );
        t.build().unwrap();
        t.train().unwrap();

        let report = t.evaluate().unwrap();
        assert_eq!(report.space, MetricSpace::Scaled);
        assert!(matches!(
            t.predict(&[Some(-45.0), Some(-50.0), None], None),
            Err(PipelineError::NotInvertible(_))
        ));
    }

    #[test]
    fn test_zero_epochs_leaves_fresh_weights() {
        let dir = tempfile::tempdir().unwrap();
        let mut cfg = config(dir.path(), BranchLayout::SingleBranch);
        cfg.epochs = 0;

        let mut t = trainer(dataset(false, PreprocessorKind::StandardScaler), cfg);
        t.build().unwrap();
        let summary = t.train().unwrap();
        assert_eq!(summary.epochs_run, 0);
        assert_eq!(summary.best_epoch, None);
        assert!(!summary.stopped_early);
        assert_eq!(t.state(), TrainerState::Trained);
        assert!(!CheckpointManager::open(dir.path()).unwrap().has_model());
    }

    #[test]
    fn test_train_discards_weights_from_an_earlier_run() {
        let dir = tempfile::tempdir().unwrap();

        // Weights for a five-AP model left behind in the same directory
        let ckpt   = CheckpointManager::new(dir.path()).unwrap();
        let device = Default::default();
        let stale: PositioningModel<burn::backend::NdArray> =
            PositioningModelConfig::new(5, 0, BranchLayout::SingleBranch).init(&device);
        ckpt.save_model(&stale).unwrap();
        assert!(ckpt.has_model());

        let mut cfg = config(dir.path(), BranchLayout::SingleBranch);
        cfg.epochs = 0;
        let mut t = trainer(dataset(false, PreprocessorKind::StandardScaler), cfg);
        t.build().unwrap();
        t.train().unwrap();

        assert!(!ckpt.has_model());
        assert_eq!(ckpt.load_model_config().unwrap().rss_features, 3);
        assert!(Inferencer::from_checkpoint(&ckpt).is_err());
    }

    #[test]
    fn test_stalled_loss_stops_early_and_keeps_best_epoch() {
        let dir = tempfile::tempdir().unwrap();
        let mut cfg = config(dir.path(), BranchLayout::SingleBranch);
        cfg.epochs    = 20;
        cfg.patience  = 1;
        // Steps this small round away in f32, so the weights never
        // change and every epoch after the first fails to improve
        cfg.optimizer = OptimizerSettings { kind: OptimizerKind::Sgd, learning_rate: 1e-20 };

        let mut t = trainer(dataset(false, PreprocessorKind::StandardScaler), cfg);
        t.build().unwrap();
        let summary = t.train().unwrap();

        assert!(summary.stopped_early);
        assert_eq!(summary.best_epoch, Some(1));
        assert_eq!(summary.epochs_run, 2);

        let metrics = std::fs::read_to_string(dir.path().join("metrics.csv")).unwrap();
        assert_eq!(metrics.lines().count(), 3);

        // The trainer's model and a fresh load of the checkpoint agree
        let ckpt     = CheckpointManager::open(dir.path()).unwrap();
        let restored = Inferencer::from_checkpoint(&ckpt).unwrap();
        let rss      = [Some(-45.0), Some(-50.0), None];
        let live     = t.predict(&rss, None).unwrap();
        let saved    = restored.predict(&rss, None).unwrap();
        // CompactRecorder stores half precision
        assert!(live.distance(&saved) < 0.1, "live {live} vs saved {saved}");
    }

    #[test]
    fn test_diverging_run_stops_early() {
        let dir = tempfile::tempdir().unwrap();
        let mut cfg = config(dir.path(), BranchLayout::SingleBranch);
        cfg.epochs    = 30;
        cfg.patience  = 1;
        cfg.optimizer = OptimizerSettings { kind: OptimizerKind::Sgd, learning_rate: 1e3 };

        let mut t = trainer(dataset(false, PreprocessorKind::StandardScaler), cfg);
        t.build().unwrap();
        let summary = t.train().unwrap();

        assert!(summary.stopped_early);
        assert!(summary.epochs_run < 30);
        match summary.best_epoch {
            Some(best) => assert!(best < summary.epochs_run),
            // NaN from the first epoch on: nothing is ever checkpointed
            None => assert!(!CheckpointManager::open(dir.path()).unwrap().has_model()),
        }
    }
}
