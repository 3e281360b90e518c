// ============================================================
// Layer 1 — CLI / Presentation Layer
// ============================================================
// This is the entry point for all user interaction.
// It uses the `clap` crate to parse command line arguments.
// All business logic is delegated to Layer 2 (application).
//
// Three commands are supported:
//   1. `load`    — preprocess a dataset and print a summary
//   2. `train`   — train, checkpoint and evaluate the model
//   3. `predict` — load a checkpoint and locate a fingerprint
//
// Reference: Rust Book §7 (Modules), §12 (CLI programs)

// Declare the commands submodule
pub mod commands;

use anyhow::Result;
use clap::Parser;
use commands::{Commands, LoadArgs, PredictArgs, TrainArgs};

/// The main CLI struct — clap reads the fields and generates
/// argument parsing code automatically via the Parser derive macro.
#[derive(Parser, Debug)]
#[command(
    name = "wifi-positioning",
    version,
    about = "Indoor positioning from Wi-Fi RSS fingerprints with a dense regression network."
)]
pub struct Cli {
    /// The subcommand to run (load, train or predict)
    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    /// Match on the subcommand and dispatch to the correct use case.
    /// This keeps the CLI layer thin — it only routes, never computes.
    pub fn run(&self) -> Result<()> {
        match &self.command {
            Commands::Load(args)    => self.run_load(args),
            Commands::Train(args)   => self.run_train(args),
            Commands::Predict(args) => self.run_predict(args),
        }
    }

    /// Handles the `load` subcommand.
    fn run_load(&self, args: &LoadArgs) -> Result<()> {
        use crate::application::load_use_case::LoadUseCase;

        let use_case = LoadUseCase::new(args.loader.clone().into(), args.save_dir.clone());
        let summary  = use_case.execute()?;

        println!("Training rows:  {}", summary.training_rows);
        println!("Testing rows:   {}", summary.testing_rows);
        println!("Access points:  {}", summary.access_points);
        println!("Power columns:  {}", summary.power_columns);
        println!("Preprocessor:   {}", summary.preprocessor);
        Ok(())
    }

    /// Handles the `train` subcommand.
    /// Converts CLI args into a TrainConfig and hands off to Layer 2.
    fn run_train(&self, args: &TrainArgs) -> Result<()> {
        use crate::application::train_use_case::TrainUseCase;

        tracing::info!("Starting training on fingerprints in: {}", args.loader.data_path.display());

        // Convert CLI args → application config (separates presentation from domain)
        let use_case = TrainUseCase::new(args.clone().into());
        let outcome  = use_case.execute()?;

        if outcome.training.stopped_early {
            println!("Stopped early after {} epochs.", outcome.training.epochs_run);
        }
        println!("{}", outcome.report);
        println!("Training complete. Checkpoint saved.");
        Ok(())
    }

    /// Handles the `predict` subcommand.
    fn run_predict(&self, args: &PredictArgs) -> Result<()> {
        use crate::application::predict_use_case::PredictUseCase;

        let use_case   = PredictUseCase::new(&args.checkpoint_dir)?;
        let coordinate = use_case.predict(&args.rss, args.power.as_deref())?;
        println!("\nPredicted position: {}", coordinate);
        Ok(())
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_run_can_be_repeated_on_the_same_cli() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("no_checkpoint");
        let cli = Cli::try_parse_from([
            "wifi-positioning", "predict",
            "--checkpoint-dir", missing.to_str().unwrap(),
            "--rss", "-45,-50",
        ])
        .unwrap();

        // Dispatch borrows the parsed command, so it stays usable
        assert!(cli.run().is_err());
        assert!(cli.run().is_err());
        assert!(matches!(cli.command, Commands::Predict(_)));
    }

    #[test]
    fn test_load_reports_missing_dataset() {
        let dir = tempfile::tempdir().unwrap();
        let cli = Cli::try_parse_from([
            "wifi-positioning", "load",
            "--data-path", dir.path().join("absent.csv").to_str().unwrap(),
        ])
        .unwrap();
        assert!(cli.run().is_err());
    }
}
