//! Minimum and maximum of a numeric target term.
//!
//! Z3's optimizer yields an optimal candidate; the candidate is then
//! confirmed by plain satisfiability probes. Integer targets need one probe.
//! Rational targets are approximated to the configured tolerance, since the
//! infimum or supremum of a strict constraint is never attained.

use num::bigint::BigInt;
use num::rational::BigRational;
use num::traits::Signed;
use satlens_formula::{Numeral, Term};
use serde::Serialize;
use tracing::debug;
use z3::ast::{Ast, Bool, Int, Real};
use z3::Optimize;

use crate::analysis::AnalysisError;
use crate::engine::Capability;
use crate::native::{int_numeral, read_int, read_real, real_numeral, NativeTerm};
use crate::session::SmtSession;

/// Rational probes double their step at most this many times before the
/// objective is declared unbounded.
const MAX_DOUBLINGS: usize = 60;

/// One side of a range. Absence of a finite bound always carries its reason.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", content = "value", rename_all = "snake_case")]
pub enum Bound {
    Finite(Numeral),
    Unbounded,
    /// The constraints have no solution at all.
    Infeasible,
}

impl Bound {
    pub fn finite(&self) -> Option<&Numeral> {
        match self {
            Bound::Finite(n) => Some(n),
            _ => None,
        }
    }
}

impl std::fmt::Display for Bound {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Bound::Finite(n) => write!(f, "{n}"),
            Bound::Unbounded => write!(f, "unbounded"),
            Bound::Infeasible => write!(f, "infeasible"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Range {
    pub lower: Bound,
    pub upper: Bound,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Direction {
    Minimize,
    Maximize,
}

impl Direction {
    fn operation(self) -> &'static str {
        match self {
            Direction::Minimize => "minimize",
            Direction::Maximize => "maximize",
        }
    }

    fn objective(self, optimize: &Optimize, target: &impl Ast) {
        match self {
            Direction::Minimize => optimize.minimize(target),
            Direction::Maximize => optimize.maximize(target),
        }
    }

    /// Constraint that the target is strictly better than `value`.
    fn beats_int(self, target: &Int, value: &BigInt) -> Bool {
        match self {
            Direction::Minimize => target.lt(&int_numeral(value)),
            Direction::Maximize => target.gt(&int_numeral(value)),
        }
    }

    /// Constraint that the target reaches `value` or beyond.
    fn reaches_real(self, target: &Real, value: &BigRational) -> Bool {
        match self {
            Direction::Minimize => target.le(&real_numeral(value)),
            Direction::Maximize => target.ge(&real_numeral(value)),
        }
    }

    fn advance(self, from: &BigRational, step: &BigRational) -> BigRational {
        match self {
            Direction::Minimize => from - step,
            Direction::Maximize => from + step,
        }
    }

    /// Round an achieved value onto the tolerance grid, towards the feasible side.
    fn truncate(self, value: &BigRational, tolerance: &BigRational) -> BigRational {
        let steps = value / tolerance;
        let steps = match self {
            Direction::Minimize => steps.ceil(),
            Direction::Maximize => steps.floor(),
        };
        steps * tolerance
    }
}

impl SmtSession {
    /// Lower and upper bound of `target` under the current constraints.
    pub fn range(&mut self, target: &Term) -> Result<Range, AnalysisError> {
        self.require(Capability::Optimization)?;
        if self.find_solution()?.is_none() {
            return Ok(Range {
                lower: Bound::Infeasible,
                upper: Bound::Infeasible,
            });
        }
        let lower = self.minimize(target)?;
        let upper = self.maximize(target)?;
        debug!(%target, %lower, %upper, "range computed");
        Ok(Range { lower, upper })
    }

    pub fn minimize(&mut self, target: &Term) -> Result<Bound, AnalysisError> {
        self.bound(target, Direction::Minimize)
    }

    pub fn maximize(&mut self, target: &Term) -> Result<Bound, AnalysisError> {
        self.bound(target, Direction::Maximize)
    }

    fn bound(&mut self, target: &Term, direction: Direction) -> Result<Bound, AnalysisError> {
        self.require(Capability::Optimization)?;
        let native = self.translator_mut().translate_term(target)?;
        let unreadable = |text: String| AnalysisError::UnreadableValue {
            name: target.to_string(),
            text,
        };

        let scope = self.open_optimizer(direction.operation())?;
        match &native {
            NativeTerm::Int(t) => direction.objective(&scope, t),
            NativeTerm::Real(t) => direction.objective(&scope, t),
        }
        if !scope.decide(scope.check(&[]))? {
            return Ok(Bound::Infeasible);
        }
        let model = scope.get_model().ok_or(AnalysisError::MissingModel)?;
        drop(scope);

        match native {
            NativeTerm::Int(t) => {
                let val = model
                    .eval(&t, true)
                    .ok_or_else(|| unreadable("no value".into()))?;
                let candidate = read_int(&val).ok_or_else(|| unreadable(val.to_string()))?;
                if self.probe(&direction.beats_int(&t, &candidate))? {
                    Ok(Bound::Unbounded)
                } else {
                    Ok(Bound::Finite(Numeral::Integer(candidate)))
                }
            }
            NativeTerm::Real(t) => {
                let val = model
                    .eval(&t, true)
                    .ok_or_else(|| unreadable("no value".into()))?;
                let candidate = read_real(&val).ok_or_else(|| unreadable(val.to_string()))?;
                self.approximate(&t, candidate, direction)
            }
        }
    }

    /// Gallop away from an achieved value until the target can no longer
    /// reach it, then bisect down to the tolerance.
    fn approximate(
        &mut self,
        target: &Real,
        achieved: BigRational,
        direction: Direction,
    ) -> Result<Bound, AnalysisError> {
        let tolerance = self.config().tolerance.clone();
        let mut achieved = achieved;
        let mut step = tolerance.clone();
        let mut unreachable = None;
        for _ in 0..MAX_DOUBLINGS {
            let probe = direction.advance(&achieved, &step);
            if self.probe(&direction.reaches_real(target, &probe))? {
                achieved = probe;
                step = &step + &step;
            } else {
                unreachable = Some(probe);
                break;
            }
        }
        let Some(mut unreachable) = unreachable else {
            return Ok(Bound::Unbounded);
        };

        let two = BigRational::from_integer(BigInt::from(2));
        while (&unreachable - &achieved).abs() > tolerance {
            let middle = (&achieved + &unreachable) / &two;
            if self.probe(&direction.reaches_real(target, &middle))? {
                achieved = middle;
            } else {
                unreachable = middle;
            }
        }
        Ok(Bound::Finite(Numeral::Rational(
            direction.truncate(&achieved, &tolerance),
        )))
    }

    /// Whether the constraints in scope admit `extra`.
    fn probe(&mut self, extra: &Bool) -> Result<bool, AnalysisError> {
        let scope = self.open_solver("range_probe")?;
        scope.assert(extra);
        scope.decide(scope.check())
    }
}
