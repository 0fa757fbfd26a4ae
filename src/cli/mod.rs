// ============================================================
// Layer 1 — CLI / Presentation Layer
// ============================================================
// This is the entry point for all user interaction.
// It uses the `clap` crate to parse command line arguments.
// All business logic is delegated to Layer 2 (application).
//
// Three commands are supported:
//   1. `train`    — trains the scoring model on a JSON corpus
//   2. `prepare`  — tokenizes the corpus into feature caches
//   3. `evaluate` — scores a trained checkpoint on one split
//
// Reference: Rust Book §7 (Modules), §12 (CLI programs)

// Declare the commands submodule
pub mod commands;

use anyhow::Result;
use clap::Parser;
use commands::{Commands, EvalArgs, PrepareArgs, TrainArgs};

use crate::domain::example::Mode;

/// The main CLI struct — clap reads the fields and generates
/// argument parsing code automatically via the Parser derive macro.
#[derive(Parser, Debug)]
#[command(
    name = "symptom-detect",
    version = "0.1.0",
    about = "Train a convolutional symptom scoring model over encoded social media text."
)]
pub struct Cli {
    /// The subcommand to run (train, prepare, or evaluate)
    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    /// Match on the subcommand and dispatch to the correct use case.
    /// This keeps the CLI layer thin — it only routes, never computes.
    pub fn run(self) -> Result<()> {
        match self.command {
            Commands::Train(args)    => Self::run_train(args),
            Commands::Prepare(args)  => Self::run_prepare(args),
            Commands::Evaluate(args) => Self::run_evaluate(args),
        }
    }

    /// Handles the `train` subcommand.
    /// Converts CLI args into a TrainConfig and hands off to Layer 2.
    fn run_train(args: TrainArgs) -> Result<()> {
        use crate::application::train_use_case::TrainUseCase;

        tracing::info!(
            "Starting training: task '{}', fold {}, data in '{}'",
            args.task_name, args.fold, args.data_dir,
        );

        // Convert CLI args → application config (separates presentation from domain)
        let use_case = TrainUseCase::new(args.into());
        use_case.execute()?;

        println!("Training complete. Checkpoint saved.");
        Ok(())
    }

    /// Handles the `prepare` subcommand.
    /// Parses the split names, then builds each cache.
    fn run_prepare(args: PrepareArgs) -> Result<()> {
        use crate::application::prepare_use_case::PrepareUseCase;

        let modes = args
            .modes
            .iter()
            .map(|s| s.parse::<Mode>().map_err(anyhow::Error::msg))
            .collect::<Result<Vec<Mode>>>()?;

        let use_case = PrepareUseCase::new(args.train.into(), modes);
        use_case.execute()?;

        println!("Feature caches are ready.");
        Ok(())
    }

    /// Handles the `evaluate` subcommand.
    /// Restores the saved checkpoint and prints split metrics.
    fn run_evaluate(args: EvalArgs) -> Result<()> {
        use crate::application::evaluate_use_case::EvaluateUseCase;

        let mode = args.split.parse::<Mode>().map_err(anyhow::Error::msg)?;

        let use_case = EvaluateUseCase::new(args.checkpoint_dir, mode);
        let (loss, accuracy) = use_case.execute()?;

        println!(
            "\n{} split: loss={:.4}, accuracy={:.1}%",
            mode, loss, accuracy * 100.0,
        );
        Ok(())
    }
}
