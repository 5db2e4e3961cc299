//! `numlpa`: Draws dislocation samples, computes their Fourier transforms,
//! fits the Wilkens model to them, and aggregates the fitted growth factors.
//!
//! **Subcommands:**
//! - `draw`: fill a sample container (share the batch with `--rank`/`--ranks`)
//! - `diffract`: Monte Carlo Fourier transforms of samples
//! - `evaluate`: Monte Carlo strain energy and cut-off radius of samples
//! - `model`: evaluate the Wilkens model for a transform
//! - `fit`: fit density and cut-off radius, write a λ file
//! - `bootstrap`: interval and hypothesis verdict of a λ file
//! - `check`: conformance audit of a sample container
//!
//! **Usage:**
//! ```text
//! numlpa [--config <file>] [-v...] draw <output> [--size N] [--seed S] [--format json|pyc] dipoles [--nsub N] ...
//! numlpa diffract <samples>... --output <dir> [--points N] [--replicate R] [--step S] [--range X] [--harmonics H,...]
//! numlpa evaluate <samples>... --output <dir> [--points N] [--replicate R] [--core C]
//! numlpa model <transform> <harmonic> --density <ρ> --cutoff <Rₑ> [--limit N]
//! numlpa fit <transform>... [--harmonic H] [--limit N] [--output <file>]
//! numlpa bootstrap <lambdas> [--alpha A] [--p-values P_LOW P_HIGH] [--output <file>]
//! numlpa check <container> [--size N]
//! ```
//!
//! Exits non-zero on any fatal error, when `draw` could not write a file, or
//! when `check` finds a failure.

#![deny(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::panic,
    missing_docs,
    clippy::missing_errors_doc
)]

use std::path::PathBuf;
use std::process;

use anyhow::Result;
use clap::{ArgAction, Parser, Subcommand};
use numlpa_clients::commands::{
    bootstrap::{self, BootstrapArgs},
    check::{self, CheckArgs},
    diffract::{self, DiffractArgs},
    draw::{self, DrawArgs},
    evaluate::{self, EvaluateArgs},
    fit::{self, FitArgs},
    model::{self, ModelArgs},
};
use numlpa_clients::config::Settings;
use numlpa_clients::logging;

/// Dislocation sample pipeline.
#[derive(Parser)]
#[command(
    name = "numlpa",
    version,
    about = "Draw dislocation samples, diffract them, fit the Wilkens model, bootstrap growth factors"
)]
struct Cli {
    /// Configuration file replacing the built-in defaults.
    #[arg(long, global = true, env = "NUMLPA_CONFIG")]
    config: Option<PathBuf>,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace).
    #[arg(short, long, global = true, action = ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Draw a batch of samples into a container.
    Draw(DrawArgs),
    /// Compute Fourier transforms of samples.
    Diffract(DiffractArgs),
    /// Evaluate the strain energy of samples.
    Evaluate(EvaluateArgs),
    /// Evaluate the Wilkens model over a transform's grid.
    Model(ModelArgs),
    /// Fit the Wilkens model to transforms and write a λ file.
    Fit(FitArgs),
    /// Bootstrap interval and hypothesis test of a λ file.
    Bootstrap(BootstrapArgs),
    /// Audit a sample container.
    Check(CheckArgs),
}

fn run(cli: &Cli) -> Result<bool> {
    let settings = Settings::load(cli.config.as_deref())?;
    match &cli.command {
        Command::Draw(args) => draw::run(args, &settings),
        Command::Diffract(args) => diffract::run(args, &settings),
        Command::Evaluate(args) => evaluate::run(args, &settings),
        Command::Model(args) => model::run(args),
        Command::Fit(args) => fit::run(args, &settings),
        Command::Bootstrap(args) => bootstrap::run(args, &settings),
        Command::Check(args) => check::run(args),
    }
}

fn main() {
    let cli = Cli::parse();
    logging::init(cli.verbose);
    match run(&cli) {
        Ok(true) => {}
        Ok(false) => process::exit(1),
        Err(e) => {
            eprintln!("error: {e:#}");
            process::exit(1);
        }
    }
}
