pub(crate) mod analyze;
pub(crate) mod cnf;
pub(crate) mod helpers;
