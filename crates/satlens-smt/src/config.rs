//! Tunables shared by every analysis of a session.

use std::time::Duration;

use num::bigint::BigInt;
use num::rational::BigRational;
use num::traits::Signed;
use satlens_formula::ConflictPolicy;
use thiserror::Error;

use crate::engine::Engine;

/// Which variables solution counting enumerates over.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum CountSupport {
    /// Boolean variables only. Exact when the formula's satisfiability is
    /// decided by its boolean projection.
    #[default]
    Boolean,
    /// Boolean and numeric variables. Diverges on formulas with infinitely
    /// many numeric solutions unless `max_solutions` is set.
    AllVariables,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Unknown count support '{0}'; expected one of: boolean, all")]
pub struct UnknownCountSupport(pub String);

impl std::str::FromStr for CountSupport {
    type Err = UnknownCountSupport;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "boolean" | "bool" => Ok(CountSupport::Boolean),
            "all" | "all-variables" => Ok(CountSupport::AllVariables),
            _ => Err(UnknownCountSupport(raw.to_string())),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SolverConfig {
    pub engine: Engine,
    /// Per-query backend timeout. `None` waits indefinitely.
    pub timeout: Option<Duration>,
    pub count_support: CountSupport,
    /// Stop solution enumeration with an error after this many solutions.
    pub max_solutions: Option<u64>,
    pub assumption_policy: ConflictPolicy,
    /// Precision of rational optimization bounds.
    pub tolerance: BigRational,
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self {
            engine: Engine::default(),
            timeout: None,
            count_support: CountSupport::default(),
            max_solutions: None,
            assumption_policy: ConflictPolicy::default(),
            tolerance: BigRational::new(BigInt::from(1), BigInt::from(1000)),
        }
    }
}

impl SolverConfig {
    pub fn with_engine(engine: Engine) -> Self {
        Self {
            engine,
            ..Self::default()
        }
    }

    pub fn with_timeout_secs(mut self, timeout_secs: u64) -> Self {
        self.timeout = if timeout_secs == 0 {
            None
        } else {
            Some(Duration::from_secs(timeout_secs))
        };
        self
    }

    /// Check the values no type can rule out.
    pub fn validate(&self) -> Result<(), String> {
        if !self.tolerance.is_positive() {
            return Err(format!("tolerance must be positive, got {}", self.tolerance));
        }
        Ok(())
    }

    /// Timeout in the millisecond unit Z3 expects, saturated to `u32`.
    pub(crate) fn timeout_ms(&self) -> Option<u32> {
        self.timeout
            .map(|t| u32::try_from(t.as_millis()).unwrap_or(u32::MAX))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_follow_documented_behavior() {
        let config = SolverConfig::default();
        assert_eq!(config.engine, Engine::Z3);
        assert_eq!(config.count_support, CountSupport::Boolean);
        assert_eq!(config.assumption_policy, ConflictPolicy::LastWriteWins);
        assert_eq!(config.tolerance.to_string(), "1/1000");
        assert_eq!(config.timeout_ms(), None);
    }

    #[test]
    fn zero_timeout_means_no_timeout() {
        assert_eq!(SolverConfig::default().with_timeout_secs(0).timeout, None);
        assert_eq!(
            SolverConfig::default().with_timeout_secs(3).timeout_ms(),
            Some(3000)
        );
    }

    #[test]
    fn tolerance_must_be_positive() {
        assert!(SolverConfig::default().validate().is_ok());
        for raw in [0, -1] {
            let config = SolverConfig {
                tolerance: BigRational::from_integer(BigInt::from(raw)),
                ..SolverConfig::default()
            };
            assert!(config.validate().is_err());
        }
    }

    #[test]
    fn count_support_parses_case_insensitively() {
        assert_eq!("ALL".parse::<CountSupport>(), Ok(CountSupport::AllVariables));
        assert!("some".parse::<CountSupport>().is_err());
    }
}
