//! Nilgrade CLI: the `nilgrade` command.

mod cli;
mod commands;
mod support;

use clap::Parser;
use cli::{Cli, Commands};

fn main() {
    support::init_logging();
    let cli = Cli::parse();

    match cli.command {
        Commands::Catalog { json } => commands::catalog::run(json),

        Commands::Maximal { input } => commands::maximal::run(input),

        Commands::TorsionFree { input } => commands::torsion_free::run(input),

        Commands::Stratify { input } => commands::stratify::run(input),

        Commands::Positive { input, fast } => commands::positive::run(input, fast),

        Commands::Integer { input, coarsen } => commands::integer::run(input, coarsen),

        Commands::Classify {
            input,
            reduced,
            certificates,
        } => commands::classify::run(input, reduced, certificates),
    }
}
