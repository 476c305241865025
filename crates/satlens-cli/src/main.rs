// satlens: command-line front end for formula analyses.

mod cli;
mod commands;
mod types;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use crate::cli::{Cli, Commands};
use crate::commands::analyze::{run_core, run_count, run_model, run_range, run_sat};
use crate::commands::cnf::run_cnf;
use crate::commands::helpers::parse_output_format;
pub(crate) use crate::types::OutputFormat;

fn main() -> miette::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let format = parse_output_format(&cli.format)?;

    match &cli.command {
        Commands::Sat { file } => run_sat(file, &cli, format),
        Commands::Model { file } => run_model(file, &cli, format),
        Commands::Count { file } => run_count(file, &cli, format),
        Commands::Range { file, target } => run_range(file, target, &cli, format),
        Commands::Core { file } => run_core(file, &cli, format),
        Commands::Cnf { file } => run_cnf(file, &cli, format),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn global_flags_parse_after_subcommand() {
        let cli = Cli::try_parse_from([
            "satlens",
            "count",
            "model.json",
            "--assume",
            "a=true",
            "--assume",
            "Price=3",
            "--engine",
            "z3-int",
            "--max-solutions",
            "10",
        ])
        .unwrap();
        assert_eq!(cli.assumptions, vec!["a=true", "Price=3"]);
        assert_eq!(cli.engine, "z3-int");
        assert_eq!(cli.max_solutions, Some(10));
        assert!(matches!(cli.command, Commands::Count { .. }));
    }
}
