//! Command-line interface for building QALSH indices and estimating the
//! Chamfer distance between two point sets.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use log::error;
use qalsh_core::QalshError;

/// Build QALSH indices over a dataset directory, or estimate the Chamfer
/// distance between its two point sets.
#[derive(Parser)]
#[command(name = "qalsh-cli")]
#[command(about = "Approximate Chamfer distance via query-aware LSH")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Bulk-load `a_index/` and `b_index/` for the point sets in `--dir`.
    BuildIndex {
        #[arg(long)]
        dir: PathBuf,
        #[arg(long, default_value_t = 2.0)]
        ratio: f64,
        #[arg(long, default_value_t = 0)]
        seed: u64,
    },
    /// Estimate the Chamfer distance between `a.bin` and `b.bin` in `--dir`.
    EstimateChamfer {
        #[arg(long)]
        dir: PathBuf,
        #[arg(long)]
        samples: Option<usize>,
        #[arg(long, default_value_t = 0)]
        seed: u64,
    },
}

fn try_main(cli: Cli) -> qalsh_core::Result<()> {
    match cli.command {
        Command::BuildIndex { dir, ratio, seed } => {
            qalsh_core::build_index(&dir, ratio, seed)?;
            println!("built indices in {}", dir.display());
        }
        Command::EstimateChamfer { dir, samples, seed } => {
            let estimate = qalsh_core::estimate_chamfer(&dir, samples, seed)?;
            println!("chamfer_distance = {}", estimate.total);
            if let Some(relative_error) = estimate.relative_error {
                println!("relative_error = {relative_error}");
            }
        }
    }
    Ok(())
}

fn main() -> ExitCode {
    env_logger::Builder::from_default_env()
        .target(env_logger::Target::Stderr)
        .init();

    let cli = Cli::parse();
    if let Err(err) = try_main(cli) {
        report(&err);
        return ExitCode::FAILURE;
    }
    ExitCode::SUCCESS
}

fn report(err: &QalshError) {
    error!(target: "qalsh_cli", "{} [{}]", err, err.code().as_str());
    eprintln!("error: {err}");
}
