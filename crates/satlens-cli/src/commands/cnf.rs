// Command handler for: Cnf

use std::path::Path;

use miette::IntoDiagnostic;
use serde::Serialize;

use satlens_formula::Formula;

use super::helpers::{open_session, print_json};
use crate::cli::Cli;
use crate::OutputFormat;

#[derive(Debug, Serialize)]
pub(crate) struct CnfReport {
    pub(crate) clauses: usize,
    pub(crate) text: String,
    pub(crate) formula: Formula,
}

fn clause_count(cnf: &Formula) -> usize {
    match cnf {
        Formula::And { operands } => operands.len(),
        Formula::True => 0,
        _ => 1,
    }
}

pub(crate) fn run_cnf(file: &Path, cli: &Cli, format: OutputFormat) -> miette::Result<()> {
    let mut session = open_session(file, cli)?;
    let cnf = session.to_cnf().into_diagnostic()?;
    let clauses = clause_count(&cnf);
    tracing::debug!(clauses, "converted to cnf");
    match format {
        OutputFormat::Text => println!("{cnf}"),
        OutputFormat::Json => print_json(&CnfReport {
            clauses,
            text: cnf.to_string(),
            formula: cnf,
        })?,
    }
    Ok(())
}
