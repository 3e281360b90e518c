// ============================================================
// Layer 1 — CLI Commands and Arguments
// ============================================================
// Defines the three subcommands: `load`, `train` and `predict`
// and all their configurable flags.
//
// clap's derive macros automatically generate:
//   - help text (--help)
//   - error messages for missing args
//   - type conversion (string → usize, f64, PreprocessorKind, ...)
//
// Reference: Rust Book §12 (Building a CLI Program)

use std::path::PathBuf;

use clap::{Args, Subcommand};

use crate::application::train_use_case::TrainConfig;
use crate::data::{loader::LoaderConfig, preprocessor::PreprocessorKind};
use crate::ml::{
    model::BranchLayout,
    trainer::{OptimizerKind, OptimizerSettings, TrainerConfig},
};

/// The three top-level subcommands available to the user
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Load and preprocess a fingerprint dataset, then print a summary
    Load(LoadArgs),

    /// Train the positioning model and evaluate it on the test split
    Train(TrainArgs),

    /// Predict a location from RSS readings using a trained checkpoint
    Predict(PredictArgs),
}

/// Dataset flags shared by `load` and `train`.
#[derive(Args, Debug, Clone)]
pub struct LoaderArgs {
    /// CSV file, or a directory containing data.csv
    #[arg(long, default_value = "datas")]
    pub data_path: PathBuf,

    /// standard_scaler, min_max_scaler or normalization
    #[arg(long, default_value = "standard_scaler")]
    pub preprocessor: PreprocessorKind,

    /// Fraction of each split to keep
    #[arg(long, default_value_t = 1.0)]
    pub frac: f64,

    /// Value used in place of a missing RSS reading
    #[arg(long, default_value_t = -100.0, allow_negative_numbers = true)]
    pub no_val_rss: f64,

    /// Floor whose rows are used
    #[arg(long, default_value_t = 1)]
    pub floor: i64,

    /// Fraction of rows held out for testing
    #[arg(long, default_value_t = 0.2)]
    pub test_size: f64,

    /// Seed for shuffling, sampling and weight initialisation
    #[arg(long)]
    pub seed: Option<u64>,
}

impl From<LoaderArgs> for LoaderConfig {
    fn from(a: LoaderArgs) -> Self {
        LoaderConfig {
            data_path:         a.data_path,
            floor:             a.floor,
            test_size:         a.test_size,
            frac:              a.frac,
            missing_rss_value: a.no_val_rss,
            preprocessor:      a.preprocessor,
            seed:              a.seed,
        }
    }
}

/// All arguments for the `load` command
#[derive(Args, Debug)]
pub struct LoadArgs {
    #[command(flatten)]
    pub loader: LoaderArgs,

    /// Write the processed training.csv / testing.csv here
    #[arg(long)]
    pub save_dir: Option<PathBuf>,
}

/// All arguments for the `train` command.
/// Each field becomes a --flag on the command line.
#[derive(Args, Debug, Clone)]
pub struct TrainArgs {
    #[command(flatten)]
    pub loader: LoaderArgs,

    /// Number of samples processed together in one forward pass
    #[arg(long, default_value_t = 8)]
    pub batch_size: usize,

    /// Maximum number of full passes through the training data
    #[arg(long, default_value_t = 10)]
    pub epochs: usize,

    /// Dropout probability after the first dense layer of each block
    #[arg(long, default_value_t = 0.2)]
    pub dropout: f64,

    /// adam or sgd
    #[arg(long, default_value = "adam")]
    pub optimizer: OptimizerKind,

    /// Learning rate for the optimizer
    #[arg(long, default_value_t = 1e-3)]
    pub lr: f64,

    /// Epochs without improvement before early stopping
    #[arg(long, default_value_t = 10)]
    pub patience: usize,

    /// Fraction of training rows used for validation
    /// (0 validates on the test split)
    #[arg(long, default_value_t = 0.0)]
    pub validation: f64,

    /// Directory for the best model, scalers, configs and metrics.csv
    #[arg(long, default_value = "checkpoint")]
    pub checkpoint_dir: PathBuf,

    /// Add the TX power branch (requires TX_* columns in the dataset)
    #[arg(long)]
    pub tx_power: bool,
}

/// Convert CLI TrainArgs into the application-layer TrainConfig.
/// This is the boundary between Layer 1 and Layer 2 —
/// the application layer never sees clap types.
impl From<TrainArgs> for TrainConfig {
    fn from(a: TrainArgs) -> Self {
        let seed = a.loader.seed;
        TrainConfig {
            loader:  a.loader.into(),
            trainer: TrainerConfig {
                batch_size:       a.batch_size,
                epochs:           a.epochs,
                dropout:          a.dropout,
                optimizer:        OptimizerSettings { kind: a.optimizer, learning_rate: a.lr },
                patience:         a.patience,
                validation_split: a.validation,
                checkpoint_dir:   a.checkpoint_dir,
                layout:           if a.tx_power { BranchLayout::DualBranch } else { BranchLayout::SingleBranch },
                seed,
            },
        }
    }
}

/// All arguments for the `predict` command
#[derive(Args, Debug)]
pub struct PredictArgs {
    /// Directory where the checkpoint was saved during training
    #[arg(long, default_value = "checkpoint")]
    pub checkpoint_dir: PathBuf,

    /// Comma separated RSS readings, one per access point;
    /// leave an entry empty for a missing reading
    #[arg(long, allow_hyphen_values = true)]
    pub rss: String,

    /// Comma separated TX power readings (dual-branch models only)
    #[arg(long, allow_hyphen_values = true)]
    pub power: Option<String>,
}
