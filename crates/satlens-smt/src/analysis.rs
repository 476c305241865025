//! Analysis operations on a [`SmtSession`].
//!
//! Every operation opens its own proving scope holding the base constraints
//! and the current assumptions, and releases it before returning. Nothing
//! asserted inside a scope reaches the session or any other scope.

use std::collections::BTreeSet;

use num::bigint::BigUint;
use num::traits::Zero;
use satlens_formula::{Formula, FormulaError, Value, VariableIndex};
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, trace};
use z3::ast::Bool;

use crate::config::CountSupport;
use crate::engine::{Capability, Engine};
use crate::native::{read_int, read_real, NativeVariable};
use crate::session::{SessionError, SmtSession};
use crate::translate::TranslateError;

#[derive(Debug, Error)]
pub enum AnalysisError {
    #[error("Backend could not decide the query: {reason}")]
    Indeterminate { reason: String },
    #[error("Could not open a proving scope: {0}")]
    ScopeUnavailable(String),
    #[error("Backend reported a satisfiable result without a model")]
    MissingModel,
    #[error("Unreadable model value for '{name}': {text}")]
    UnreadableValue { name: String, text: String },
    #[error("Solution enumeration stopped at the limit of {limit} solutions")]
    LimitReached { limit: u64, count: BigUint },
    #[error("Engine {engine} does not support {capability}")]
    MissingCapability {
        engine: Engine,
        capability: Capability,
    },
    #[error(transparent)]
    Translate(#[from] TranslateError),
    #[error(transparent)]
    Session(#[from] SessionError),
    #[error(transparent)]
    Formula(#[from] FormulaError),
}

/// One value per registry index. Entries are `None` for variables that
/// never reached the backend.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Model {
    values: Vec<Option<Value>>,
}

impl Model {
    pub fn get(&self, index: VariableIndex) -> Option<&Value> {
        self.values.get(index)?.as_ref()
    }

    pub fn values(&self) -> &[Option<Value>] {
        &self.values
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// Where an unsat-core member came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CoreOrigin {
    /// A base constraint, by insertion position.
    Constraint(usize),
    /// An assumption, by variable index.
    Assumption(VariableIndex),
}

#[derive(Debug, Clone)]
pub struct CoreEntry {
    pub origin: CoreOrigin,
    /// The formula the native constraint encodes.
    pub source: Formula,
    pub constraint: Bool,
}

/// A minimal unsatisfiable subset of the constraints in scope. Empty when
/// they are satisfiable.
#[derive(Debug, Clone, Default)]
pub struct UnsatCore {
    entries: Vec<CoreEntry>,
}

impl UnsatCore {
    pub fn entries(&self) -> &[CoreEntry] {
        &self.entries
    }

    pub fn origins(&self) -> Vec<CoreOrigin> {
        self.entries.iter().map(|e| e.origin).collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

fn unreadable(name: &str, text: impl Into<String>) -> AnalysisError {
    AnalysisError::UnreadableValue {
        name: name.to_string(),
        text: text.into(),
    }
}

/// Read the value of `native` in `model`, completing unconstrained values.
fn read_value(model: &z3::Model, name: &str, native: &NativeVariable) -> Result<Value, AnalysisError> {
    match native {
        NativeVariable::Bool(b) => {
            let val = model
                .eval(b, true)
                .ok_or_else(|| unreadable(name, "no value"))?;
            val.as_bool()
                .map(Value::Boolean)
                .ok_or_else(|| unreadable(name, val.to_string()))
        }
        NativeVariable::Int(i) => {
            let val = model
                .eval(i, true)
                .ok_or_else(|| unreadable(name, "no value"))?;
            read_int(&val)
                .map(Value::Integer)
                .ok_or_else(|| unreadable(name, val.to_string()))
        }
        NativeVariable::Real(r) => {
            let val = model
                .eval(r, true)
                .ok_or_else(|| unreadable(name, "no value"))?;
            read_real(&val)
                .map(Value::Rational)
                .ok_or_else(|| unreadable(name, val.to_string()))
        }
    }
}

/// A constraint excluding the value `native` takes in `model`.
fn differs_from(model: &z3::Model, native: &NativeVariable) -> Result<Bool, AnalysisError> {
    let missing = || unreadable(&format!("{native:?}"), "no value");
    match native {
        NativeVariable::Bool(b) => {
            let val = model.eval(b, true).ok_or_else(missing)?;
            let flag = val.as_bool().ok_or_else(missing)?;
            Ok(if flag { b.not() } else { b.clone() })
        }
        NativeVariable::Int(i) => {
            let val = model.eval(i, true).ok_or_else(missing)?;
            Ok(i.eq(&val).not())
        }
        NativeVariable::Real(r) => {
            let val = model.eval(r, true).ok_or_else(missing)?;
            Ok(r.eq(&val).not())
        }
    }
}

impl SmtSession {
    /// Whether the base constraints and assumptions are satisfiable.
    pub fn has_solution(&mut self) -> Result<bool, AnalysisError> {
        let scope = self.open_solver("has_solution")?;
        let sat = scope.decide(scope.check())?;
        debug!(sat, "satisfiability decided");
        Ok(sat)
    }

    /// One satisfying assignment, or `None` when there is none.
    pub fn find_solution(&mut self) -> Result<Option<Model>, AnalysisError> {
        let scope = self.open_solver("find_solution")?;
        if !scope.decide(scope.check())? {
            debug!("no solution");
            return Ok(None);
        }
        let model = scope.get_model().ok_or(AnalysisError::MissingModel)?;
        let model = self.read_model(&model)?;
        debug!(values = model.len(), "solution found");
        Ok(Some(model))
    }

    fn read_model(&self, model: &z3::Model) -> Result<Model, AnalysisError> {
        let registry = self.registry();
        let natives = self.translator().variables();
        let mut values = Vec::with_capacity(registry.count());
        for (index, name, _) in registry.iter() {
            let value = match natives.get(index).and_then(Option::as_ref) {
                Some(native) => Some(read_value(model, name, native)?),
                None => None,
            };
            values.push(value);
        }
        Ok(Model { values })
    }

    /// Variables the enumeration blocks on: those occurring in the current
    /// base constraints or assumptions, restricted by the configured support.
    /// Variables only seen by cleared constraints or range targets are not
    /// part of it.
    fn count_support(&mut self) -> Result<Vec<NativeVariable>, AnalysisError> {
        let booleans_only = self.config().count_support == CountSupport::Boolean;
        let mut indices = BTreeSet::new();
        for source in self.sources() {
            for (name, kind) in source.variable_occurrences() {
                if !booleans_only || kind.is_boolean() {
                    indices.insert(self.registry().index_of(name)?);
                }
            }
        }
        for (index, _) in self.assumptions().iter() {
            if !booleans_only || self.registry().kind_of(index)?.is_boolean() {
                indices.insert(index);
            }
        }
        indices
            .into_iter()
            .map(|index| {
                self.translator_mut()
                    .variable(index)
                    .map_err(AnalysisError::from)
            })
            .collect()
    }

    /// Count satisfying assignments by enumeration with blocking clauses over
    /// the configured variable support.
    pub fn count_solutions(&mut self) -> Result<BigUint, AnalysisError> {
        let support = self.count_support()?;
        let scope = self.open_solver("count_solutions")?;
        let limit = self.config().max_solutions;

        let mut count = BigUint::zero();
        while scope.decide(scope.check())? {
            if let Some(limit) = limit {
                if count >= BigUint::from(limit) {
                    return Err(AnalysisError::LimitReached { limit, count });
                }
            }
            count += 1u32;
            let model = scope.get_model().ok_or(AnalysisError::MissingModel)?;
            let blocking = support
                .iter()
                .map(|native| differs_from(&model, native))
                .collect::<Result<Vec<_>, _>>()?;
            if blocking.is_empty() {
                break;
            }
            let refs: Vec<&Bool> = blocking.iter().collect();
            scope.assert(&Bool::or(&refs));
            trace!(%count, "enumerated solution");
        }
        debug!(%count, support = support.len(), "solutions counted");
        Ok(count)
    }

    /// A minimal unsatisfiable subset of the base constraints and
    /// assumptions, or an empty core when they are satisfiable.
    pub fn unsat_core(&mut self) -> Result<UnsatCore, AnalysisError> {
        self.require(Capability::UnsatCores)?;
        let assumptions = self.assumption_constraints()?;

        let mut candidates: Vec<CoreEntry> = Vec::new();
        for (position, (constraint, source)) in
            self.constraints().iter().zip(self.sources()).enumerate()
        {
            candidates.push(CoreEntry {
                origin: CoreOrigin::Constraint(position),
                source: source.clone(),
                constraint: constraint.clone(),
            });
        }
        for (index, constraint) in assumptions {
            candidates.push(CoreEntry {
                origin: CoreOrigin::Assumption(index),
                source: self.assumption_formula(index)?,
                constraint,
            });
        }

        let scope = self.open_bare_solver("unsat_core")?;
        let trackers: Vec<Bool> = candidates
            .iter()
            .map(|entry| {
                let tracker = Bool::fresh_const("core");
                scope.assert(&tracker.implies(&entry.constraint));
                tracker
            })
            .collect();

        if scope.decide(scope.check_assumptions(&trackers))? {
            debug!("satisfiable, empty core");
            return Ok(UnsatCore::default());
        }
        let reported = scope.get_unsat_core();
        let mut core: Vec<usize> = (0..candidates.len())
            .filter(|&i| reported.contains(&trackers[i]))
            .collect();
        let reported_len = core.len();

        // Drop every member whose removal keeps the rest unsatisfiable.
        let mut position = 0;
        while position < core.len() {
            let rest: Vec<Bool> = core
                .iter()
                .enumerate()
                .filter(|(p, _)| *p != position)
                .map(|(_, &i)| trackers[i].clone())
                .collect();
            if scope.decide(scope.check_assumptions(&rest))? {
                position += 1;
            } else {
                core.remove(position);
            }
        }
        debug!(reported = reported_len, minimal = core.len(), "unsat core extracted");

        Ok(UnsatCore {
            entries: core.into_iter().map(|i| candidates[i].clone()).collect(),
        })
    }

    /// All minimal unsatisfiable subsets. Currently the single core computed
    /// by [`SmtSession::unsat_core`].
    pub fn all_minimal_unsat_cores(&mut self) -> Result<Vec<UnsatCore>, AnalysisError> {
        Ok(vec![self.unsat_core()?])
    }
}
