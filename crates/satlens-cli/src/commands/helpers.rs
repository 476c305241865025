// Helpers shared by every command: input loading, assumption parsing and
// solver configuration from global flags.

use std::io::Read;
use std::path::Path;

use miette::IntoDiagnostic;
use serde::Serialize;

use satlens_formula::value::{parse_integer, parse_rational};
use satlens_formula::{ConflictPolicy, Formula, Term, Value, VariableKind, VariableRegistry};
use satlens_smt::{CountSupport, Engine, SmtSession, SolverConfig};

use crate::cli::Cli;
use crate::OutputFormat;

pub(crate) fn parse_output_format(raw: &str) -> miette::Result<OutputFormat> {
    match raw {
        "text" => Ok(OutputFormat::Text),
        "json" => Ok(OutputFormat::Json),
        other => miette::bail!("Unknown output format: {other}. Use 'text' or 'json'."),
    }
}

pub(crate) fn solver_config_from_cli(cli: &Cli) -> miette::Result<SolverConfig> {
    let engine: Engine = cli.engine.parse().into_diagnostic()?;
    let count_support: CountSupport = cli.count_support.parse().into_diagnostic()?;
    let mut config = SolverConfig::with_engine(engine).with_timeout_secs(cli.timeout);
    config.count_support = count_support;
    config.max_solutions = cli.max_solutions;
    if cli.reject_conflicts {
        config.assumption_policy = ConflictPolicy::Reject;
    }
    Ok(config)
}

/// Parse `NAME=VALUE`. Booleans are spelled `true`/`false`; numbers are
/// integers unless they carry a `/` or a decimal point.
pub(crate) fn parse_assumption(raw: &str) -> miette::Result<(String, Value)> {
    let Some((name, value)) = raw.split_once('=') else {
        miette::bail!("Invalid assumption '{raw}': expected NAME=VALUE");
    };
    let name = name.trim();
    let value = value.trim();
    if name.is_empty() {
        miette::bail!("Invalid assumption '{raw}': empty variable name");
    }
    let value = match value {
        "true" => Value::Boolean(true),
        "false" => Value::Boolean(false),
        v if v.contains('/') || v.contains('.') => {
            Value::Rational(parse_rational(v).into_diagnostic()?)
        }
        v => Value::Integer(parse_integer(v).into_diagnostic()?),
    };
    Ok((name.to_string(), value))
}

pub(crate) fn read_formula(path: &Path) -> miette::Result<Formula> {
    let source = if path.as_os_str() == "-" {
        let mut buf = String::new();
        std::io::stdin().read_to_string(&mut buf).into_diagnostic()?;
        buf
    } else {
        std::fs::read_to_string(path)
            .map_err(|e| miette::miette!("Cannot read {}: {e}", path.display()))?
    };
    serde_json::from_str(&source)
        .map_err(|e| miette::miette!("Invalid formula in {}: {e}", path.display()))
}

/// Load `path`, translate it and apply every `--assume` flag in order.
pub(crate) fn open_session(path: &Path, cli: &Cli) -> miette::Result<SmtSession> {
    let formula = read_formula(path)?;
    let config = solver_config_from_cli(cli)?;
    let mut session = SmtSession::new(&formula, config).into_diagnostic()?;
    for raw in &cli.assumptions {
        let (name, value) = parse_assumption(raw)?;
        session.assume(&name, value).into_diagnostic()?;
    }
    tracing::debug!(
        variables = session.registry().count(),
        constraints = session.constraints().len(),
        assumptions = session.assumptions().len(),
        "loaded formula"
    );
    Ok(session)
}

/// A `--target` is either a JSON term or the name of a numeric variable.
pub(crate) fn parse_target(raw: &str, registry: &VariableRegistry) -> miette::Result<Term> {
    let raw = raw.trim();
    if raw.starts_with('{') {
        return serde_json::from_str(raw)
            .map_err(|e| miette::miette!("Invalid target term: {e}"));
    }
    let index = registry.index_of(raw).into_diagnostic()?;
    match registry.kind_of(index).into_diagnostic()? {
        VariableKind::Integer => Ok(Term::int_var(raw)),
        VariableKind::Rational => Ok(Term::real_var(raw)),
        VariableKind::Boolean => {
            miette::bail!("Target '{raw}' is a boolean variable; expected a numeric one")
        }
    }
}

pub(crate) fn print_json<T: Serialize>(report: &T) -> miette::Result<()> {
    println!(
        "{}",
        serde_json::to_string_pretty(report).into_diagnostic()?
    );
    Ok(())
}
