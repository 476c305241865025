//! CLI argument definitions: top-level `Cli` struct and `Commands` enum.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

pub(crate) const CLI_LONG_ABOUT: &str =
    "Satisfiability, counting, range and unsat-core analyses of formula trees, backed by Z3.\n\n\
    Formulas are read as JSON trees from a file (or '-' for stdin).\n\n\
    Examples:\n  \
    satlens count model.json\n  \
    satlens range model.json --target Price\n  \
    satlens core model.json --assume a=false --format json";

#[derive(Parser)]
#[command(name = "satlens")]
#[command(about = "Formula analyses backed by Z3")]
#[command(long_about = CLI_LONG_ABOUT)]
#[command(version)]
pub(crate) struct Cli {
    /// Backend engine: z3 | z3-int
    #[arg(long, global = true, default_value = "z3")]
    pub(crate) engine: String,

    /// Per-query solver timeout in seconds (0 waits indefinitely)
    #[arg(long, global = true, default_value_t = 0)]
    pub(crate) timeout: u64,

    /// Variables enumerated by `count`: boolean | all
    #[arg(long, global = true, default_value = "boolean")]
    pub(crate) count_support: String,

    /// Abort `count` once this many solutions have been enumerated
    #[arg(long, global = true)]
    pub(crate) max_solutions: Option<u64>,

    /// Reject an assumption that contradicts an earlier one instead of
    /// overwriting it
    #[arg(long, global = true, default_value_t = false)]
    pub(crate) reject_conflicts: bool,

    /// Fix a variable before analysis: NAME=true|false, NAME=5, NAME=-3/4
    #[arg(long = "assume", global = true, value_name = "NAME=VALUE")]
    pub(crate) assumptions: Vec<String>,

    /// Output format: text | json
    #[arg(long, global = true, default_value = "text")]
    pub(crate) format: String,

    #[command(subcommand)]
    pub(crate) command: Commands,
}

#[derive(Subcommand)]
pub(crate) enum Commands {
    /// Decide whether the formula has a solution
    Sat {
        /// Path to the formula JSON file
        file: PathBuf,
    },

    /// Print one solution of the formula
    Model {
        /// Path to the formula JSON file
        file: PathBuf,
    },

    /// Count the solutions of the formula
    Count {
        /// Path to the formula JSON file
        file: PathBuf,
    },

    /// Minimum and maximum of a numeric term over all solutions
    Range {
        /// Path to the formula JSON file
        file: PathBuf,

        /// Variable name, or a term as JSON
        #[arg(long)]
        target: String,
    },

    /// Print a minimal unsatisfiable subset of the constraints
    Core {
        /// Path to the formula JSON file
        file: PathBuf,
    },

    /// Print the formula in conjunctive normal form
    Cnf {
        /// Path to the formula JSON file
        file: PathBuf,
    },
}
