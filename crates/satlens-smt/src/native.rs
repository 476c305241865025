//! Native Z3 handles and conversions between Z3 numerals and exact numbers.

use num::bigint::{BigInt, Sign};
use num::rational::BigRational;
use num::traits::{ToPrimitive, Zero};
use satlens_formula::value::parse_rational;
use satlens_formula::{NumericKind, VariableKind};
use z3::ast::{Bool, Int, Real};

/// The cached native handle of one registered variable.
#[derive(Debug, Clone, PartialEq)]
pub enum NativeVariable {
    Bool(Bool),
    Int(Int),
    Real(Real),
}

impl NativeVariable {
    pub fn declare(name: &str, kind: VariableKind) -> Self {
        match kind {
            VariableKind::Boolean => NativeVariable::Bool(Bool::new_const(name)),
            VariableKind::Integer => NativeVariable::Int(Int::new_const(name)),
            VariableKind::Rational => NativeVariable::Real(Real::new_const(name)),
        }
    }

    pub fn kind(&self) -> VariableKind {
        match self {
            NativeVariable::Bool(_) => VariableKind::Boolean,
            NativeVariable::Int(_) => VariableKind::Integer,
            NativeVariable::Real(_) => VariableKind::Rational,
        }
    }

    pub fn as_bool(&self) -> Option<&Bool> {
        match self {
            NativeVariable::Bool(b) => Some(b),
            _ => None,
        }
    }

    pub fn as_term(&self) -> Option<NativeTerm> {
        match self {
            NativeVariable::Bool(_) => None,
            NativeVariable::Int(i) => Some(NativeTerm::Int(i.clone())),
            NativeVariable::Real(r) => Some(NativeTerm::Real(r.clone())),
        }
    }
}

/// A translated arithmetic term.
#[derive(Debug, Clone, PartialEq)]
pub enum NativeTerm {
    Int(Int),
    Real(Real),
}

impl NativeTerm {
    pub fn kind(&self) -> NumericKind {
        match self {
            NativeTerm::Int(_) => NumericKind::Integer,
            NativeTerm::Real(_) => NumericKind::Rational,
        }
    }

    /// Widen to a real-sorted term. Integer terms are converted explicitly.
    pub fn into_real(self) -> Real {
        match self {
            NativeTerm::Int(i) => Real::from_int(&i),
            NativeTerm::Real(r) => r,
        }
    }

    /// Equality constraint, in rational arithmetic unless both sides are
    /// integer.
    pub fn equal_to(&self, other: &NativeTerm) -> Bool {
        match (self, other) {
            (NativeTerm::Int(l), NativeTerm::Int(r)) => l.eq(r),
            _ => self.clone().into_real().eq(&other.clone().into_real()),
        }
    }
}

pub fn int_numeral(value: &BigInt) -> Int {
    if let Some(small) = value.to_i64() {
        return Int::from_i64(small);
    }
    // Assemble from 32-bit digits, most significant first.
    let (sign, digits) = value.to_u32_digits();
    let base = Int::from_u64(1u64 << 32);
    let mut acc = Int::from_u64(0);
    for digit in digits.iter().rev() {
        acc = &(&acc * &base) + &Int::from_u64(u64::from(*digit));
    }
    if sign == Sign::Minus {
        acc = &Int::from_i64(0) - &acc;
    }
    acc
}

pub fn real_numeral(value: &BigRational) -> Real {
    let numer = Real::from_int(&int_numeral(value.numer()));
    if value.is_integer() {
        return numer;
    }
    let denom = Real::from_int(&int_numeral(value.denom()));
    &numer / &denom
}

/// Read a Z3 numeral rendered in SMT-LIB form, e.g. `12`, `4.0`, `(- 3)` or
/// `(- (/ 9.0 2.0))`. Returns `None` for anything that is not a numeral,
/// such as algebraic numbers.
pub fn parse_smt_numeral(text: &str) -> Option<BigRational> {
    let text = text.trim();
    if let Some(inner) = text.strip_prefix('(').and_then(|t| t.strip_suffix(')')) {
        let inner = inner.trim();
        if let Some(rest) = inner.strip_prefix('-') {
            return parse_smt_numeral(rest).map(|v| -v);
        }
        if let Some(rest) = inner.strip_prefix('/') {
            let (numer, denom) = split_operands(rest.trim())?;
            let numer = parse_smt_numeral(numer)?;
            let denom = parse_smt_numeral(denom)?;
            if denom.is_zero() {
                return None;
            }
            return Some(numer / denom);
        }
        return None;
    }
    if text.starts_with('-') {
        return None;
    }
    parse_rational(text).ok()
}

/// Split `a b` where either side may be a parenthesized expression.
fn split_operands(text: &str) -> Option<(&str, &str)> {
    let mut depth = 0usize;
    for (i, c) in text.char_indices() {
        match c {
            '(' => depth += 1,
            ')' => depth = depth.checked_sub(1)?,
            c if c.is_whitespace() && depth == 0 => {
                let rest = text[i..].trim();
                return (!rest.is_empty()).then_some((&text[..i], rest));
            }
            _ => {}
        }
    }
    None
}

/// Exact value of an evaluated integer numeral.
pub fn read_int(value: &Int) -> Option<BigInt> {
    if let Some(small) = value.as_i64() {
        return Some(BigInt::from(small));
    }
    let rational = parse_smt_numeral(&value.to_string())?;
    rational.is_integer().then(|| rational.to_integer())
}

pub fn read_real(value: &Real) -> Option<BigRational> {
    parse_smt_numeral(&value.to_string())
}
