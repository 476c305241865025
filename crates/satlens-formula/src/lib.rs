//! Formula trees for satisfiability and optimization analyses.
//!
//! This crate holds everything that is independent of a solving backend: the
//! boolean/arithmetic expression tree, the variable registry that assigns
//! stable indices to variable names, assumption sets, and the concrete values
//! that models are made of.

pub mod assignment;
pub mod error;
pub mod formula;
pub mod kind;
#[cfg(any(test, feature = "proptest"))]
pub mod proptest_generators;
pub mod registry;
pub mod term;
pub mod value;

pub use assignment::{Assignment, ConflictPolicy};
pub use error::FormulaError;
pub use formula::{Comparison, Formula};
pub use kind::{NumericKind, VariableKind};
pub use registry::{VariableIndex, VariableRegistry};
pub use term::{FunctionOp, Term};
pub use value::{Numeral, Value};
