// Command handlers for: Sat, Model, Count, Range, Core

use std::path::Path;

use miette::IntoDiagnostic;
use serde::Serialize;
use serde_json::Value as JsonValue;

use satlens_formula::Value;
use satlens_smt::{AnalysisError, CoreOrigin, Model, Range, SmtSession};

use super::helpers::{open_session, parse_target, print_json};
use crate::cli::Cli;
use crate::OutputFormat;

#[derive(Debug, Serialize)]
pub(crate) struct SatReport {
    pub(crate) analysis: &'static str,
    pub(crate) satisfiable: bool,
}

#[derive(Debug, Serialize)]
pub(crate) struct AssignmentEntry {
    pub(crate) name: String,
    pub(crate) value: JsonValue,
}

#[derive(Debug, Serialize)]
pub(crate) struct ModelReport {
    pub(crate) analysis: &'static str,
    pub(crate) satisfiable: bool,
    pub(crate) solution: Option<Vec<AssignmentEntry>>,
}

#[derive(Debug, Serialize)]
pub(crate) struct CountReport {
    pub(crate) analysis: &'static str,
    /// Decimal string; counts are unbounded.
    pub(crate) count: String,
    /// False when `--max-solutions` stopped the enumeration.
    pub(crate) complete: bool,
}

#[derive(Debug, Serialize)]
pub(crate) struct RangeReport {
    pub(crate) analysis: &'static str,
    pub(crate) target: String,
    #[serde(flatten)]
    pub(crate) range: Range,
}

#[derive(Debug, Serialize)]
pub(crate) struct CoreMember {
    pub(crate) origin: CoreOrigin,
    pub(crate) formula: String,
}

#[derive(Debug, Serialize)]
pub(crate) struct CoreReport {
    pub(crate) analysis: &'static str,
    pub(crate) satisfiable: bool,
    pub(crate) core: Vec<CoreMember>,
}

fn json_value(value: &Value) -> JsonValue {
    match value {
        Value::Boolean(b) => JsonValue::Bool(*b),
        numeric => JsonValue::String(numeric.to_string()),
    }
}

fn assignment_entries(session: &SmtSession, model: &Model) -> Vec<AssignmentEntry> {
    session
        .registry()
        .iter()
        .filter_map(|(index, name, _)| {
            model.get(index).map(|value| AssignmentEntry {
                name: name.to_string(),
                value: json_value(value),
            })
        })
        .collect()
}

pub(crate) fn run_sat(file: &Path, cli: &Cli, format: OutputFormat) -> miette::Result<()> {
    let mut session = open_session(file, cli)?;
    let satisfiable = session.has_solution().into_diagnostic()?;
    match format {
        OutputFormat::Text => println!("{}", if satisfiable { "SAT" } else { "UNSAT" }),
        OutputFormat::Json => print_json(&SatReport {
            analysis: "sat",
            satisfiable,
        })?,
    }
    Ok(())
}

pub(crate) fn run_model(file: &Path, cli: &Cli, format: OutputFormat) -> miette::Result<()> {
    let mut session = open_session(file, cli)?;
    let model = session.find_solution().into_diagnostic()?;
    let solution = model.map(|m| assignment_entries(&session, &m));
    match format {
        OutputFormat::Text => match &solution {
            None => println!("UNSAT"),
            Some(entries) => {
                println!("SAT");
                for entry in entries {
                    let shown = match &entry.value {
                        JsonValue::String(s) => s.clone(),
                        other => other.to_string(),
                    };
                    println!("  {} = {shown}", entry.name);
                }
            }
        },
        OutputFormat::Json => print_json(&ModelReport {
            analysis: "model",
            satisfiable: solution.is_some(),
            solution,
        })?,
    }
    Ok(())
}

pub(crate) fn run_count(file: &Path, cli: &Cli, format: OutputFormat) -> miette::Result<()> {
    let mut session = open_session(file, cli)?;
    let (count, complete) = match session.count_solutions() {
        Ok(count) => (count, true),
        Err(AnalysisError::LimitReached { limit, count }) => {
            tracing::warn!(limit, "solution enumeration stopped at limit");
            (count, false)
        }
        Err(e) => return Err(e).into_diagnostic(),
    };
    match format {
        OutputFormat::Text => {
            if complete {
                println!("{count}");
            } else {
                println!("at least {count} (limit reached)");
            }
        }
        OutputFormat::Json => print_json(&CountReport {
            analysis: "count",
            count: count.to_string(),
            complete,
        })?,
    }
    Ok(())
}

pub(crate) fn run_range(
    file: &Path,
    target: &str,
    cli: &Cli,
    format: OutputFormat,
) -> miette::Result<()> {
    let mut session = open_session(file, cli)?;
    let term = parse_target(target, session.registry())?;
    let range = session.range(&term).into_diagnostic()?;
    match format {
        OutputFormat::Text => {
            println!("target: {term}");
            println!("lower:  {}", range.lower);
            println!("upper:  {}", range.upper);
        }
        OutputFormat::Json => print_json(&RangeReport {
            analysis: "range",
            target: term.to_string(),
            range,
        })?,
    }
    Ok(())
}

pub(crate) fn run_core(file: &Path, cli: &Cli, format: OutputFormat) -> miette::Result<()> {
    let mut session = open_session(file, cli)?;
    let core = session.unsat_core().into_diagnostic()?;
    let members: Vec<CoreMember> = core
        .entries()
        .iter()
        .map(|entry| CoreMember {
            origin: entry.origin,
            formula: entry.source.to_string(),
        })
        .collect();
    match format {
        OutputFormat::Text => {
            if members.is_empty() {
                println!("SAT (no unsatisfiable core)");
            }
            for member in &members {
                let origin = match member.origin {
                    CoreOrigin::Constraint(i) => format!("constraint {i}"),
                    CoreOrigin::Assumption(i) => format!("assumption {i}"),
                };
                println!("[{origin}] {}", member.formula);
            }
        }
        OutputFormat::Json => print_json(&CoreReport {
            analysis: "core",
            satisfiable: members.is_empty(),
            core: members,
        })?,
    }
    Ok(())
}
