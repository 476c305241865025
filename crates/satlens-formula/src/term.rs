//! Arithmetic terms.

use std::fmt;

use num::bigint::BigInt;
use num::rational::BigRational;
use serde::{Deserialize, Serialize};

use crate::formula::{Comparison, Formula};
use crate::kind::NumericKind;
use crate::value::Numeral;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FunctionOp {
    Add,
    Multiply,
}

impl FunctionOp {
    pub fn symbol(self) -> &'static str {
        match self {
            FunctionOp::Add => "+",
            FunctionOp::Multiply => "*",
        }
    }
}

/// An arithmetic expression node.
///
/// `Function` nodes carry the numeric kind they were declared with. The
/// `IfThenElse` and `Apply` nodes exist so that upstream trees can be
/// represented faithfully; no solving backend in this workspace accepts them.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "node", rename_all = "snake_case")]
pub enum Term {
    Constant {
        value: Numeral,
    },
    Variable {
        name: String,
        kind: NumericKind,
    },
    Function {
        op: FunctionOp,
        kind: NumericKind,
        lhs: Box<Term>,
        rhs: Box<Term>,
    },
    IfThenElse {
        condition: Box<Formula>,
        then: Box<Term>,
        otherwise: Box<Term>,
    },
    Apply {
        function: String,
        kind: NumericKind,
        arguments: Vec<Term>,
    },
}

impl Term {
    pub fn int(value: i64) -> Self {
        Term::Constant {
            value: Numeral::Integer(BigInt::from(value)),
        }
    }

    /// The rational constant `numer / denom`, reduced.
    ///
    /// # Panics
    ///
    /// Panics if `denom` is zero. Use [`crate::value::parse_rational`] for
    /// untrusted input.
    pub fn rational(numer: i64, denom: i64) -> Self {
        Term::Constant {
            value: Numeral::Rational(BigRational::new(BigInt::from(numer), BigInt::from(denom))),
        }
    }

    pub fn int_var(name: impl Into<String>) -> Self {
        Term::Variable {
            name: name.into(),
            kind: NumericKind::Integer,
        }
    }

    pub fn real_var(name: impl Into<String>) -> Self {
        Term::Variable {
            name: name.into(),
            kind: NumericKind::Rational,
        }
    }

    fn function(op: FunctionOp, lhs: Term, rhs: Term) -> Self {
        Term::Function {
            op,
            kind: lhs.kind().join(rhs.kind()),
            lhs: Box::new(lhs),
            rhs: Box::new(rhs),
        }
    }

    pub fn add(lhs: Term, rhs: Term) -> Self {
        Term::function(FunctionOp::Add, lhs, rhs)
    }

    pub fn mul(lhs: Term, rhs: Term) -> Self {
        Term::function(FunctionOp::Multiply, lhs, rhs)
    }

    pub fn kind(&self) -> NumericKind {
        match self {
            Term::Constant { value } => value.kind(),
            Term::Variable { kind, .. } | Term::Function { kind, .. } | Term::Apply { kind, .. } => {
                *kind
            }
            Term::IfThenElse { then, otherwise, .. } => then.kind().join(otherwise.kind()),
        }
    }

    /// Human-readable node kind, used in error messages.
    pub fn node_kind(&self) -> &'static str {
        match self {
            Term::Constant { .. } => "constant",
            Term::Variable { .. } => "variable",
            Term::Function {
                op: FunctionOp::Add,
                ..
            } => "add",
            Term::Function {
                op: FunctionOp::Multiply,
                ..
            } => "multiply",
            Term::IfThenElse { .. } => "if-then-else",
            Term::Apply { .. } => "function application",
        }
    }

    pub fn compare(self, comparison: Comparison, rhs: Term) -> Formula {
        Formula::Predicate {
            comparison,
            lhs: self,
            rhs,
        }
    }

    pub fn lt(self, rhs: Term) -> Formula {
        self.compare(Comparison::LessThan, rhs)
    }

    pub fn le(self, rhs: Term) -> Formula {
        self.compare(Comparison::LessEqual, rhs)
    }

    pub fn gt(self, rhs: Term) -> Formula {
        self.compare(Comparison::GreaterThan, rhs)
    }

    pub fn ge(self, rhs: Term) -> Formula {
        self.compare(Comparison::GreaterEqual, rhs)
    }

    pub fn equals(self, rhs: Term) -> Formula {
        self.compare(Comparison::Equals, rhs)
    }
}

impl fmt::Display for Term {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Term::Constant { value } => write!(f, "{value}"),
            Term::Variable { name, .. } => write!(f, "{name}"),
            Term::Function { op, lhs, rhs, .. } => write!(f, "({lhs} {} {rhs})", op.symbol()),
            Term::IfThenElse {
                condition,
                then,
                otherwise,
            } => write!(f, "ite({condition}, {then}, {otherwise})"),
            Term::Apply {
                function,
                arguments,
                ..
            } => {
                write!(f, "{function}(")?;
                for (i, arg) in arguments.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{arg}")?;
                }
                write!(f, ")")
            }
        }
    }
}
