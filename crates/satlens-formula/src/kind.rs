use serde::{Deserialize, Serialize};

/// Numeric domain of an arithmetic term.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NumericKind {
    Integer,
    Rational,
}

impl NumericKind {
    /// Kind used when two operands meet in one predicate: integer only if
    /// both sides are integer.
    pub fn join(self, other: NumericKind) -> NumericKind {
        match (self, other) {
            (NumericKind::Integer, NumericKind::Integer) => NumericKind::Integer,
            _ => NumericKind::Rational,
        }
    }
}

impl std::fmt::Display for NumericKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            NumericKind::Integer => write!(f, "integer"),
            NumericKind::Rational => write!(f, "rational"),
        }
    }
}

/// Declared kind of a registered variable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VariableKind {
    Boolean,
    Integer,
    Rational,
}

impl VariableKind {
    pub fn numeric(self) -> Option<NumericKind> {
        match self {
            VariableKind::Boolean => None,
            VariableKind::Integer => Some(NumericKind::Integer),
            VariableKind::Rational => Some(NumericKind::Rational),
        }
    }

    pub fn is_boolean(self) -> bool {
        self == VariableKind::Boolean
    }
}

impl From<NumericKind> for VariableKind {
    fn from(kind: NumericKind) -> Self {
        match kind {
            NumericKind::Integer => VariableKind::Integer,
            NumericKind::Rational => VariableKind::Rational,
        }
    }
}

impl std::fmt::Display for VariableKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            VariableKind::Boolean => write!(f, "boolean"),
            VariableKind::Integer => write!(f, "integer"),
            VariableKind::Rational => write!(f, "rational"),
        }
    }
}
