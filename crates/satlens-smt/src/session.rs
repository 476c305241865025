//! The backend session: one context, the translated base constraints and the
//! current assumptions.

use satlens_formula::{
    Assignment, Formula, FormulaError, Term, Value, VariableIndex, VariableKind, VariableRegistry,
};
use thiserror::Error;
use tracing::{debug, info, warn};
use z3::ast::Bool;
use z3::{Optimize, Solver};

use crate::analysis::AnalysisError;
use crate::cnf::{self, CnfError};
use crate::config::SolverConfig;
use crate::context::{Scope, SolverContext};
use crate::engine::{Capability, Engine};
use crate::native::NativeVariable;
use crate::translate::{TranslateError, Translator};

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("Backend configuration failed for engine {engine}: {reason}")]
    Configuration { engine: Engine, reason: String },
    #[error(transparent)]
    Translate(#[from] TranslateError),
    #[error(transparent)]
    Formula(#[from] FormulaError),
}

/// Owns everything one analyzed formula needs. Not shareable across threads;
/// independent sessions do not share any backend state.
pub struct SmtSession {
    config: SolverConfig,
    context: SolverContext,
    translator: Translator,
    constraints: Vec<Bool>,
    sources: Vec<Formula>,
    assumptions: Assignment,
}

impl SmtSession {
    /// Translate `formula` into a new session. A root conjunction contributes
    /// one base constraint per conjunct, anything else a single constraint.
    pub fn new(formula: &Formula, config: SolverConfig) -> Result<Self, SessionError> {
        let registry = VariableRegistry::from_formula(formula)?;
        let mut session = Self::with_registry(registry, config)?;
        session.push(formula)?;
        info!(
            engine = %session.engine(),
            variables = session.registry().count(),
            constraints = session.constraints.len(),
            "session ready"
        );
        Ok(session)
    }

    /// A session without base constraints.
    pub fn empty(config: SolverConfig) -> Result<Self, SessionError> {
        Self::with_registry(VariableRegistry::new(), config)
    }

    fn with_registry(registry: VariableRegistry, config: SolverConfig) -> Result<Self, SessionError> {
        config
            .validate()
            .map_err(|reason| SessionError::Configuration {
                engine: config.engine,
                reason,
            })?;
        let context = SolverContext::new(&config).map_err(|reason| SessionError::Configuration {
            engine: config.engine,
            reason,
        })?;
        Ok(Self {
            translator: Translator::new(registry, config.engine),
            assumptions: Assignment::new(config.assumption_policy),
            context,
            config,
            constraints: Vec::new(),
            sources: Vec::new(),
        })
    }

    pub fn config(&self) -> &SolverConfig {
        &self.config
    }

    pub fn engine(&self) -> Engine {
        self.context.engine()
    }

    pub fn registry(&self) -> &VariableRegistry {
        self.translator.registry()
    }

    pub fn translator(&self) -> &Translator {
        &self.translator
    }

    pub fn translator_mut(&mut self) -> &mut Translator {
        &mut self.translator
    }

    /// Base constraints in insertion order.
    pub fn constraints(&self) -> &[Bool] {
        &self.constraints
    }

    /// The formula each base constraint was translated from.
    pub fn sources(&self) -> &[Formula] {
        &self.sources
    }

    /// Add `formula` to the base constraints and return the new native
    /// constraints. If any conjunct fails to translate, nothing is added and
    /// variables first seen in `formula` are not registered.
    pub fn push(&mut self, formula: &Formula) -> Result<Vec<Bool>, TranslateError> {
        let conjuncts: Vec<&Formula> = match formula {
            Formula::And { operands } => operands.iter().collect(),
            other => vec![other],
        };
        let checkpoint = self.translator.checkpoint();
        let translated = match conjuncts
            .iter()
            .map(|conjunct| self.translator.translate(conjunct))
            .collect::<Result<Vec<_>, _>>()
        {
            Ok(translated) => translated,
            Err(err) => {
                self.translator.rollback(checkpoint);
                return Err(err);
            }
        };
        self.constraints.extend(translated.iter().cloned());
        self.sources.extend(conjuncts.into_iter().cloned());
        Ok(translated)
    }

    /// Remove all base constraints. Registered variables stay registered.
    pub fn clear(&mut self) {
        self.constraints.clear();
        self.sources.clear();
    }

    pub fn assumptions(&self) -> &Assignment {
        &self.assumptions
    }

    pub fn assume(&mut self, name: &str, value: Value) -> Result<(), SessionError> {
        let index = self.registry().index_of(name)?;
        self.assume_index(index, value)
    }

    /// Record an assumption for the variable at `index`. A second value for
    /// the same index follows the configured conflict policy.
    pub fn assume_index(&mut self, index: VariableIndex, value: Value) -> Result<(), SessionError> {
        let kind = self.registry().kind_of(index)?;
        if !value.fits(kind) {
            return Err(TranslateError::ValueMismatch {
                name: self.registry().name_of(index)?.to_string(),
                kind,
                value,
            }
            .into());
        }
        match self.assumptions.assign(index, value.clone()) {
            Ok(Some(previous)) => {
                debug!(index, %previous, %value, "assumption overwritten");
                Ok(())
            }
            Ok(None) => Ok(()),
            Err(err) => {
                warn!(index, %value, "conflicting assumption rejected");
                Err(err.into())
            }
        }
    }

    pub fn clear_assumptions(&mut self) {
        self.assumptions.clear();
    }

    /// One native constraint per assumption, in index order. A boolean
    /// assumed `false` asserts the variable itself and one assumed `true`
    /// asserts its negation; numeric assumptions become equalities.
    pub(crate) fn assumption_constraints(
        &mut self,
    ) -> Result<Vec<(VariableIndex, Bool)>, TranslateError> {
        let pending: Vec<(VariableIndex, Value)> = self
            .assumptions
            .iter()
            .map(|(index, value)| (index, value.clone()))
            .collect();
        let mut out = Vec::with_capacity(pending.len());
        for (index, value) in pending {
            let constraint = match &value {
                Value::Boolean(flag) => {
                    let variable = self.boolean_variable(index, &value)?;
                    if *flag {
                        self.translator.not(&variable)
                    } else {
                        variable
                    }
                }
                numeric => self.translator.equal(index, numeric)?,
            };
            out.push((index, constraint));
        }
        Ok(out)
    }

    fn boolean_variable(&mut self, index: VariableIndex, value: &Value) -> Result<Bool, TranslateError> {
        match self.translator.variable(index)? {
            NativeVariable::Bool(b) => Ok(b),
            other => Err(TranslateError::ValueMismatch {
                name: self.registry().name_of(index)?.to_string(),
                kind: other.kind(),
                value: value.clone(),
            }),
        }
    }

    /// The assumption at `index` as a formula, matching its native encoding.
    pub(crate) fn assumption_formula(&self, index: VariableIndex) -> Result<Formula, FormulaError> {
        let name = self.registry().name_of(index)?.to_string();
        let kind = self.registry().kind_of(index)?;
        let value = self.assumptions.get(index).ok_or(FormulaError::IndexOutOfRange {
            index,
            count: self.registry().count(),
        })?;
        Ok(match (value, kind.numeric()) {
            (Value::Boolean(flag), _) => Formula::literal(name, !*flag),
            (numeric, Some(numeric_kind)) => {
                let constant = numeric
                    .to_numeral(numeric_kind)
                    .ok_or_else(|| FormulaError::InvalidNumeral(numeric.to_string()))?;
                Term::Variable {
                    name,
                    kind: numeric_kind,
                }
                .equals(Term::Constant { value: constant })
            }
            (numeric, None) => return Err(FormulaError::InvalidNumeral(numeric.to_string())),
        })
    }

    pub(crate) fn require(&self, capability: Capability) -> Result<(), AnalysisError> {
        if self.engine().capabilities().supports(capability) {
            Ok(())
        } else {
            Err(AnalysisError::MissingCapability {
                engine: self.engine(),
                capability,
            })
        }
    }

    /// Open a solver scope holding the base constraints and assumptions.
    pub(crate) fn open_solver(&mut self, operation: &'static str) -> Result<Scope<Solver>, AnalysisError> {
        let assumptions = self.assumption_constraints()?;
        let solver = self
            .context
            .solver()
            .map_err(AnalysisError::ScopeUnavailable)?;
        let scope = Scope::open(solver, operation);
        scope.add_all(&self.constraints);
        scope.add_all(assumptions.iter().map(|(_, constraint)| constraint));
        Ok(scope)
    }

    pub(crate) fn open_optimizer(
        &mut self,
        operation: &'static str,
    ) -> Result<Scope<Optimize>, AnalysisError> {
        let assumptions = self.assumption_constraints()?;
        let scope = Scope::open(self.context.optimizer(), operation);
        scope.add_all(&self.constraints);
        scope.add_all(assumptions.iter().map(|(_, constraint)| constraint));
        Ok(scope)
    }

    /// Fresh solver scope for a constraint set assembled by the caller.
    pub(crate) fn open_bare_solver(&self, operation: &'static str) -> Result<Scope<Solver>, AnalysisError> {
        let solver = self
            .context
            .solver()
            .map_err(AnalysisError::ScopeUnavailable)?;
        Ok(Scope::open(solver, operation))
    }

    /// The base constraints in CNF. Auxiliary variables introduced by the
    /// transformation are registered as booleans.
    pub fn to_cnf(&mut self) -> Result<Formula, CnfError> {
        cnf::tseitin(&mut self.translator, &self.constraints)
    }
}

impl std::fmt::Debug for SmtSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SmtSession")
            .field("engine", &self.engine())
            .field("variables", &self.registry().count())
            .field("constraints", &self.constraints.len())
            .field("assumptions", &self.assumptions.len())
            .finish()
    }
}
