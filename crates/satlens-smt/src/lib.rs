//! Satisfiability, model, counting, range and unsat-core analyses of formula
//! trees, answered by Z3.
//!
//! A [`SmtSession`] translates one formula into native Z3 constraints once
//! and then runs any number of analyses against it, each inside its own
//! short-lived proving scope. [`cnf`] converts formulas to CNF through Z3's
//! Tseitin tactic and decodes the result back into a formula tree.

pub mod analyses;
pub mod analysis;
pub mod cnf;
pub mod config;
pub mod context;
pub mod engine;
pub mod native;
pub mod range;
pub mod session;
pub mod translate;

pub use analyses::{
    run_analysis, Analysis, AttributeRange, CountSolutions, FindSolution, HasSolutions,
    MinimalUnsatCore,
};
pub use analysis::{AnalysisError, CoreEntry, CoreOrigin, Model, UnsatCore};
pub use cnf::CnfError;
pub use config::{CountSupport, SolverConfig};
pub use engine::{Capabilities, Capability, Engine};
pub use range::{Bound, Range};
pub use session::{SessionError, SmtSession};
pub use translate::{TranslateError, Translator};
