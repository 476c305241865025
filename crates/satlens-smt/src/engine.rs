//! Backend engine selection and the capabilities each engine declares.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A solving backend. Every variant is a configuration of Z3.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Engine {
    /// Z3's default combined solver.
    #[default]
    Z3,
    /// Z3 restricted to quantifier-free linear integer arithmetic.
    Z3Integer,
}

/// Individual backend features that analyses may depend on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Capability {
    RationalArithmetic,
    Optimization,
    UnsatCores,
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Capability::RationalArithmetic => write!(f, "rational arithmetic"),
            Capability::Optimization => write!(f, "optimization"),
            Capability::UnsatCores => write!(f, "unsat cores"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Capabilities {
    pub rational_arithmetic: bool,
    pub optimization: bool,
    pub unsat_cores: bool,
}

impl Capabilities {
    pub fn supports(&self, capability: Capability) -> bool {
        match capability {
            Capability::RationalArithmetic => self.rational_arithmetic,
            Capability::Optimization => self.optimization,
            Capability::UnsatCores => self.unsat_cores,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Unknown engine '{0}'; expected one of: z3, z3-int")]
pub struct UnknownEngine(pub String);

impl Engine {
    pub const ALL: [Engine; 2] = [Engine::Z3, Engine::Z3Integer];

    pub fn name(self) -> &'static str {
        match self {
            Engine::Z3 => "z3",
            Engine::Z3Integer => "z3-int",
        }
    }

    pub fn capabilities(self) -> Capabilities {
        match self {
            Engine::Z3 => Capabilities {
                rational_arithmetic: true,
                optimization: true,
                unsat_cores: true,
            },
            Engine::Z3Integer => Capabilities {
                rational_arithmetic: false,
                optimization: true,
                unsat_cores: true,
            },
        }
    }

    /// SMT-LIB logic the backend solver is created for, if restricted.
    pub fn logic(self) -> Option<&'static str> {
        match self {
            Engine::Z3 => None,
            Engine::Z3Integer => Some("QF_LIA"),
        }
    }
}

impl fmt::Display for Engine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl std::str::FromStr for Engine {
    type Err = UnknownEngine;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "z3" => Ok(Engine::Z3),
            "z3-int" | "z3_int" | "z3-integer" => Ok(Engine::Z3Integer),
            _ => Err(UnknownEngine(raw.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn engine_names_round_trip_through_parsing() {
        for engine in Engine::ALL {
            assert_eq!(engine.name().parse::<Engine>(), Ok(engine));
        }
        assert_eq!(" Z3_INT ".parse::<Engine>(), Ok(Engine::Z3Integer));
    }

    #[test]
    fn unknown_engine_lists_accepted_names() {
        let err = "princess".parse::<Engine>().unwrap_err();
        assert!(err.to_string().contains("expected one of: z3, z3-int"));
    }

    #[test]
    fn integer_engine_lacks_rationals_only() {
        let caps = Engine::Z3Integer.capabilities();
        assert!(!caps.supports(Capability::RationalArithmetic));
        assert!(caps.supports(Capability::Optimization));
        assert!(caps.supports(Capability::UnsatCores));
        assert!(Engine::Z3.capabilities().supports(Capability::RationalArithmetic));
    }
}
