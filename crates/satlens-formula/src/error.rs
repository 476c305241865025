use thiserror::Error;

use crate::kind::VariableKind;
use crate::registry::VariableIndex;
use crate::value::Value;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum FormulaError {
    #[error("Unknown variable '{0}'")]
    UnknownVariable(String),
    #[error("Variable index {index} out of range (registry holds {count} variables)")]
    IndexOutOfRange { index: VariableIndex, count: usize },
    #[error("Variable '{name}' declared as {existing} and as {requested}")]
    KindConflict {
        name: String,
        existing: VariableKind,
        requested: VariableKind,
    },
    #[error("Conflicting assumptions for variable {index}: {existing} vs {requested}")]
    AssumptionConflict {
        index: VariableIndex,
        existing: Value,
        requested: Value,
    },
    #[error("Invalid numeral '{0}'")]
    InvalidNumeral(String),
}
