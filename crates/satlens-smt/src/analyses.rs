//! Analyses as values, for callers that schedule them generically.

use num::bigint::BigUint;
use satlens_formula::{Formula, Term, Value};
use tracing::info;

use crate::analysis::{AnalysisError, Model, UnsatCore};
use crate::config::SolverConfig;
use crate::range::Range;
use crate::session::SmtSession;

pub trait Analysis {
    type Output;

    fn name(&self) -> &'static str;

    fn run(&self, session: &mut SmtSession) -> Result<Self::Output, AnalysisError>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct HasSolutions;

impl Analysis for HasSolutions {
    type Output = bool;

    fn name(&self) -> &'static str {
        "has-solutions"
    }

    fn run(&self, session: &mut SmtSession) -> Result<bool, AnalysisError> {
        session.has_solution()
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct FindSolution;

impl Analysis for FindSolution {
    type Output = Option<Model>;

    fn name(&self) -> &'static str {
        "find-solution"
    }

    fn run(&self, session: &mut SmtSession) -> Result<Option<Model>, AnalysisError> {
        session.find_solution()
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct CountSolutions;

impl Analysis for CountSolutions {
    type Output = BigUint;

    fn name(&self) -> &'static str {
        "count-solutions"
    }

    fn run(&self, session: &mut SmtSession) -> Result<BigUint, AnalysisError> {
        session.count_solutions()
    }
}

/// Range of a numeric attribute term.
#[derive(Debug, Clone)]
pub struct AttributeRange {
    pub target: Term,
}

impl Analysis for AttributeRange {
    type Output = Range;

    fn name(&self) -> &'static str {
        "attribute-range"
    }

    fn run(&self, session: &mut SmtSession) -> Result<Range, AnalysisError> {
        session.range(&self.target)
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct MinimalUnsatCore;

impl Analysis for MinimalUnsatCore {
    type Output = UnsatCore;

    fn name(&self) -> &'static str {
        "minimal-unsat-core"
    }

    fn run(&self, session: &mut SmtSession) -> Result<UnsatCore, AnalysisError> {
        session.unsat_core()
    }
}

/// Build a fresh session for `formula`, apply `assumptions` by variable name
/// and run `analysis` on it.
pub fn run_analysis<A: Analysis>(
    formula: &Formula,
    config: SolverConfig,
    assumptions: &[(String, Value)],
    analysis: &A,
) -> Result<A::Output, AnalysisError> {
    let mut session = SmtSession::new(formula, config)?;
    for (name, value) in assumptions {
        session.assume(name, value.clone())?;
    }
    info!(
        analysis = analysis.name(),
        assumptions = assumptions.len(),
        "running analysis"
    );
    analysis.run(&mut session)
}
