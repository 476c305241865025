//! Per-session backend context and short-lived proving scopes.

use std::ops::Deref;

use tracing::{error, trace, warn};
use z3::ast::Bool;
use z3::{Optimize, Params, SatResult, Solver};

use crate::analysis::AnalysisError;
use crate::config::SolverConfig;
use crate::engine::Engine;

/// Everything needed to open a fresh backend prover: the engine and its
/// parameters. Holds no solver state of its own.
#[derive(Debug, Clone)]
pub struct SolverContext {
    engine: Engine,
    timeout_ms: Option<u32>,
}

impl SolverContext {
    /// Build a context and check that the backend accepts its configuration.
    pub fn new(config: &SolverConfig) -> Result<Self, String> {
        let context = Self {
            engine: config.engine,
            timeout_ms: config.timeout_ms(),
        };
        if let Err(reason) = context.solver() {
            error!(engine = %context.engine, %reason, "backend configuration failed");
            return Err(reason);
        }
        Ok(context)
    }

    pub fn engine(&self) -> Engine {
        self.engine
    }

    fn params(&self) -> Option<Params> {
        let timeout_ms = self.timeout_ms?;
        let mut params = Params::new();
        params.set_u32("timeout", timeout_ms);
        Some(params)
    }

    pub(crate) fn solver(&self) -> Result<Solver, String> {
        let solver = match self.engine.logic() {
            Some(logic) => Solver::new_for_logic(logic)
                .ok_or_else(|| format!("Z3 has no solver for logic {logic}"))?,
            None => Solver::new(),
        };
        if let Some(params) = self.params() {
            solver.set_params(&params);
        }
        Ok(solver)
    }

    pub(crate) fn optimizer(&self) -> Optimize {
        let optimize = Optimize::new();
        if let Some(params) = self.params() {
            optimize.set_params(&params);
        }
        optimize
    }
}

/// A backend prover that constraints can be added to.
pub(crate) trait Prover {
    fn add_constraint(&self, constraint: &Bool);

    /// Backend explanation for the last `unknown` answer.
    fn reason_unknown(&self) -> String;
}

impl Prover for Solver {
    fn add_constraint(&self, constraint: &Bool) {
        self.assert(constraint);
    }

    fn reason_unknown(&self) -> String {
        self.get_reason_unknown()
            .unwrap_or_else(|| "Z3 returned unknown".into())
    }
}

impl Prover for Optimize {
    fn add_constraint(&self, constraint: &Bool) {
        self.assert(constraint);
    }

    fn reason_unknown(&self) -> String {
        self.get_reason_unknown()
            .unwrap_or_else(|| "Z3 returned unknown".into())
    }
}

/// A prover owned by exactly one analysis operation. Dropping the scope
/// releases the prover together with everything asserted into it.
pub(crate) struct Scope<P: Prover> {
    prover: P,
    operation: &'static str,
}

impl<P: Prover> Scope<P> {
    pub(crate) fn open(prover: P, operation: &'static str) -> Self {
        trace!(operation, "opened proving scope");
        Self { prover, operation }
    }

    /// `Ok(true)` for SAT, `Ok(false)` for UNSAT. An unknown answer (timeout,
    /// interruption, incompleteness) is an error carrying the backend reason.
    pub(crate) fn decide(&self, result: SatResult) -> Result<bool, AnalysisError> {
        match result {
            SatResult::Sat => Ok(true),
            SatResult::Unsat => Ok(false),
            SatResult::Unknown => {
                let reason = self.prover.reason_unknown();
                warn!(operation = self.operation, %reason, "backend returned unknown");
                Err(AnalysisError::Indeterminate { reason })
            }
        }
    }

    pub(crate) fn add_all<'a>(&self, constraints: impl IntoIterator<Item = &'a Bool>) {
        for constraint in constraints {
            self.prover.add_constraint(constraint);
        }
    }
}

impl<P: Prover> Deref for Scope<P> {
    type Target = P;

    fn deref(&self) -> &P {
        &self.prover
    }
}

impl<P: Prover> Drop for Scope<P> {
    fn drop(&mut self) {
        trace!(operation = self.operation, "released proving scope");
    }
}
