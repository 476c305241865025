//! Translation of formula trees into native Z3 formulas.
//!
//! A [`Translator`] owns the variable registry of one session together with
//! a dense cache of native variable handles, indexed like the registry. A
//! variable's handle is created on first use and reused afterwards, so every
//! occurrence of a name maps to the same native constant.

use satlens_formula::{
    Comparison, Formula, FormulaError, FunctionOp, Numeral, NumericKind, Term, Value,
    VariableIndex, VariableKind, VariableRegistry,
};
use thiserror::Error;
use tracing::{debug, trace};
use z3::ast::{Bool, Int, Real};

use crate::engine::{Capabilities, Capability, Engine};
use crate::native::{int_numeral, real_numeral, NativeTerm, NativeVariable};

#[derive(Debug, Error)]
pub enum TranslateError {
    #[error("Unsupported construct: {0}")]
    UnsupportedConstruct(&'static str),
    #[error("Engine {engine} does not support {capability} (required by {node} node)")]
    UnsupportedCapability {
        engine: Engine,
        capability: Capability,
        node: &'static str,
    },
    #[error("Ill-typed {node} node: declared {declared} but an operand is {operand}")]
    IllTyped {
        node: &'static str,
        declared: NumericKind,
        operand: NumericKind,
    },
    #[error("Value {value} cannot be assigned to {kind} variable '{name}'")]
    ValueMismatch {
        name: String,
        kind: VariableKind,
        value: Value,
    },
    #[error(transparent)]
    Formula(#[from] FormulaError),
}

/// Registry size and cache contents to return to when a translation fails.
pub(crate) struct Checkpoint {
    registered: usize,
    cache: Vec<Option<NativeVariable>>,
}

pub struct Translator {
    engine: Engine,
    capabilities: Capabilities,
    registry: VariableRegistry,
    cache: Vec<Option<NativeVariable>>,
}

impl Translator {
    pub fn new(registry: VariableRegistry, engine: Engine) -> Self {
        let cache = vec![None; registry.count()];
        Self {
            engine,
            capabilities: engine.capabilities(),
            registry,
            cache,
        }
    }

    pub fn engine(&self) -> Engine {
        self.engine
    }

    pub fn registry(&self) -> &VariableRegistry {
        &self.registry
    }

    pub(crate) fn registry_mut(&mut self) -> &mut VariableRegistry {
        &mut self.registry
    }

    /// Translate a boolean formula. On failure the registry and the native
    /// cache are left as they were before the call.
    pub fn translate(&mut self, formula: &Formula) -> Result<Bool, TranslateError> {
        if !self.capabilities.rational_arithmetic {
            if let Some(node) = first_rational_in_formula(formula) {
                return Err(self.missing_rationals(node));
            }
        }
        let checkpoint = self.checkpoint();
        self.formula(formula).map_err(|err| {
            self.rollback(checkpoint);
            err
        })
    }

    /// Translate an arithmetic term, e.g. an optimization target. Fails
    /// without side effects like [`Translator::translate`].
    pub fn translate_term(&mut self, term: &Term) -> Result<NativeTerm, TranslateError> {
        if !self.capabilities.rational_arithmetic {
            if let Some(node) = first_rational_in_term(term) {
                return Err(self.missing_rationals(node));
            }
        }
        let checkpoint = self.checkpoint();
        self.term(term).map_err(|err| {
            self.rollback(checkpoint);
            err
        })
    }

    pub(crate) fn checkpoint(&self) -> Checkpoint {
        Checkpoint {
            registered: self.registry.count(),
            cache: self.cache.clone(),
        }
    }

    /// Undo every registration and materialization since `checkpoint`.
    pub(crate) fn rollback(&mut self, checkpoint: Checkpoint) {
        let dropped = self.registry.count().saturating_sub(checkpoint.registered);
        self.registry.truncate(checkpoint.registered);
        self.cache = checkpoint.cache;
        debug!(dropped, "rolled back failed translation");
    }

    fn missing_rationals(&self, node: &'static str) -> TranslateError {
        TranslateError::UnsupportedCapability {
            engine: self.engine,
            capability: Capability::RationalArithmetic,
            node,
        }
    }

    /// Native handle of the variable at `index`, created on first request.
    pub fn variable(&mut self, index: VariableIndex) -> Result<NativeVariable, TranslateError> {
        let kind = self.registry.kind_of(index)?;
        if kind == VariableKind::Rational && !self.capabilities.rational_arithmetic {
            return Err(self.missing_rationals("variable"));
        }
        if self.cache.len() <= index {
            self.cache.resize(self.registry.count(), None);
        }
        if let Some(existing) = &self.cache[index] {
            return Ok(existing.clone());
        }
        let name = self.registry.name_of(index)?;
        let native = NativeVariable::declare(name, kind);
        trace!(index, name, %kind, "materialized variable");
        self.cache[index] = Some(native.clone());
        Ok(native)
    }

    fn boolean(&mut self, name: &str) -> Result<Bool, TranslateError> {
        let index = self.registry.register(name, VariableKind::Boolean)?;
        let native = self.variable(index)?;
        native.as_bool().cloned().ok_or_else(|| {
            FormulaError::KindConflict {
                name: name.to_string(),
                existing: native.kind(),
                requested: VariableKind::Boolean,
            }
            .into()
        })
    }

    fn numeric(&mut self, name: &str, kind: NumericKind) -> Result<NativeTerm, TranslateError> {
        let index = self.registry.register(name, kind.into())?;
        let native = self.variable(index)?;
        native.as_term().ok_or_else(|| {
            FormulaError::KindConflict {
                name: name.to_string(),
                existing: native.kind(),
                requested: kind.into(),
            }
            .into()
        })
    }

    /// Native numeral of the numeral's own kind.
    pub fn constant(&self, numeral: &Numeral) -> NativeTerm {
        match numeral {
            Numeral::Integer(n) => NativeTerm::Int(int_numeral(n)),
            Numeral::Rational(r) => NativeTerm::Real(real_numeral(r)),
        }
    }

    pub fn not(&self, formula: &Bool) -> Bool {
        formula.not()
    }

    /// Constraint fixing the variable at `index` to `value`. Rational
    /// variables accept integer values.
    pub fn equal(&mut self, index: VariableIndex, value: &Value) -> Result<Bool, TranslateError> {
        let variable = self.variable(index)?;
        let name = self.registry.name_of(index)?.to_string();
        let mismatch = || TranslateError::ValueMismatch {
            name: name.clone(),
            kind: variable.kind(),
            value: value.clone(),
        };
        match (&variable, value) {
            (NativeVariable::Bool(b), Value::Boolean(v)) => Ok(b.eq(&Bool::from_bool(*v))),
            (NativeVariable::Int(i), Value::Integer(n)) => Ok(i.eq(&int_numeral(n))),
            (NativeVariable::Real(r), Value::Integer(_) | Value::Rational(_)) => {
                let q = value.to_rational().ok_or_else(mismatch)?;
                Ok(r.eq(&real_numeral(&q)))
            }
            _ => Err(mismatch()),
        }
    }

    /// The native cache, indexed like the registry. Entries are `None` for
    /// variables that were never translated.
    pub fn variables(&self) -> &[Option<NativeVariable>] {
        &self.cache
    }

    /// Materialized boolean variables with their registry indices.
    pub fn boolean_variables(&self) -> Vec<(VariableIndex, Bool)> {
        self.cache
            .iter()
            .enumerate()
            .filter_map(|(index, v)| Some((index, v.as_ref()?.as_bool()?.clone())))
            .collect()
    }

    pub fn materialized_count(&self) -> usize {
        self.cache.iter().filter(|v| v.is_some()).count()
    }

    fn formulas(&mut self, formulas: &[Formula]) -> Result<Vec<Bool>, TranslateError> {
        formulas.iter().map(|f| self.formula(f)).collect()
    }

    fn formula(&mut self, formula: &Formula) -> Result<Bool, TranslateError> {
        match formula {
            Formula::True => Ok(Bool::from_bool(true)),
            Formula::False => Ok(Bool::from_bool(false)),
            Formula::Literal { name, positive } => {
                let var = self.boolean(name)?;
                Ok(if *positive { var } else { var.not() })
            }
            Formula::Not { operand } => Ok(self.formula(operand)?.not()),
            Formula::And { operands } => {
                let bools = self.formulas(operands)?;
                let refs: Vec<&Bool> = bools.iter().collect();
                Ok(Bool::and(&refs))
            }
            Formula::Or { operands } => {
                let bools = self.formulas(operands)?;
                let refs: Vec<&Bool> = bools.iter().collect();
                Ok(Bool::or(&refs))
            }
            Formula::Implies {
                premise,
                conclusion,
            } => {
                let p = self.formula(premise)?;
                let c = self.formula(conclusion)?;
                Ok(p.implies(&c))
            }
            Formula::Biimplies { lhs, rhs } => {
                let l = self.formula(lhs)?;
                let r = self.formula(rhs)?;
                Ok(l.eq(&r))
            }
            Formula::Predicate {
                comparison,
                lhs,
                rhs,
            } => {
                let l = self.term(lhs)?;
                let r = self.term(rhs)?;
                Ok(match (l, r) {
                    (NativeTerm::Int(l), NativeTerm::Int(r)) => compare_int(*comparison, &l, &r),
                    (l, r) => compare_real(*comparison, &l.into_real(), &r.into_real()),
                })
            }
            Formula::ForAll { .. } | Formula::Exists { .. } => {
                Err(TranslateError::UnsupportedConstruct(formula.node_kind()))
            }
        }
    }

    fn term(&mut self, term: &Term) -> Result<NativeTerm, TranslateError> {
        match term {
            Term::Constant { value } => Ok(self.constant(value)),
            Term::Variable { name, kind } => self.numeric(name, *kind),
            Term::Function { op, kind, lhs, rhs } => {
                let node = term.node_kind();
                let l = self.term(lhs)?;
                let r = self.term(rhs)?;
                match kind {
                    NumericKind::Integer => {
                        let l = expect_int(node, l)?;
                        let r = expect_int(node, r)?;
                        Ok(NativeTerm::Int(match op {
                            FunctionOp::Add => &l + &r,
                            FunctionOp::Multiply => &l * &r,
                        }))
                    }
                    NumericKind::Rational => {
                        let l = l.into_real();
                        let r = r.into_real();
                        Ok(NativeTerm::Real(match op {
                            FunctionOp::Add => &l + &r,
                            FunctionOp::Multiply => &l * &r,
                        }))
                    }
                }
            }
            Term::IfThenElse { .. } | Term::Apply { .. } => {
                Err(TranslateError::UnsupportedConstruct(term.node_kind()))
            }
        }
    }
}

fn expect_int(node: &'static str, term: NativeTerm) -> Result<Int, TranslateError> {
    match term {
        NativeTerm::Int(i) => Ok(i),
        NativeTerm::Real(_) => Err(TranslateError::IllTyped {
            node,
            declared: NumericKind::Integer,
            operand: NumericKind::Rational,
        }),
    }
}

fn compare_int(comparison: Comparison, l: &Int, r: &Int) -> Bool {
    match comparison {
        Comparison::LessThan => l.lt(r),
        Comparison::LessEqual => l.le(r),
        Comparison::GreaterThan => l.gt(r),
        Comparison::GreaterEqual => l.ge(r),
        Comparison::Equals => l.eq(r),
    }
}

fn compare_real(comparison: Comparison, l: &Real, r: &Real) -> Bool {
    match comparison {
        Comparison::LessThan => l.lt(r),
        Comparison::LessEqual => l.le(r),
        Comparison::GreaterThan => l.gt(r),
        Comparison::GreaterEqual => l.ge(r),
        Comparison::Equals => l.eq(r),
    }
}

fn first_rational_in_formula(formula: &Formula) -> Option<&'static str> {
    match formula {
        Formula::True | Formula::False | Formula::Literal { .. } => None,
        Formula::Not { operand } => first_rational_in_formula(operand),
        Formula::And { operands } | Formula::Or { operands } => {
            operands.iter().find_map(first_rational_in_formula)
        }
        Formula::Implies {
            premise: lhs,
            conclusion: rhs,
        }
        | Formula::Biimplies { lhs, rhs } => {
            first_rational_in_formula(lhs).or_else(|| first_rational_in_formula(rhs))
        }
        Formula::Predicate { lhs, rhs, .. } => {
            if lhs.kind().join(rhs.kind()) == NumericKind::Rational {
                Some(formula.node_kind())
            } else {
                first_rational_in_term(lhs).or_else(|| first_rational_in_term(rhs))
            }
        }
        Formula::ForAll { body, .. } | Formula::Exists { body, .. } => {
            first_rational_in_formula(body)
        }
    }
}

fn first_rational_in_term(term: &Term) -> Option<&'static str> {
    if term.kind() == NumericKind::Rational {
        return Some(term.node_kind());
    }
    match term {
        Term::Constant { .. } | Term::Variable { .. } => None,
        Term::Function { lhs, rhs, .. } => {
            first_rational_in_term(lhs).or_else(|| first_rational_in_term(rhs))
        }
        Term::IfThenElse {
            condition,
            then,
            otherwise,
        } => first_rational_in_formula(condition)
            .or_else(|| first_rational_in_term(then))
            .or_else(|| first_rational_in_term(otherwise)),
        Term::Apply { arguments, .. } => arguments.iter().find_map(first_rational_in_term),
    }
}
