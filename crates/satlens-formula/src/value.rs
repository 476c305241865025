//! Numerals and concrete variable values.
//!
//! Numerals keep arbitrary precision. In serialized form they travel as
//! strings (`"42"`, `"-3/4"`) so that JSON consumers never see them rounded
//! through a float.

use std::fmt;

use num::bigint::BigInt;
use num::rational::BigRational;
use num::traits::Zero;
use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::FormulaError;
use crate::kind::{NumericKind, VariableKind};

/// A numeric constant of a declared kind.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Numeral {
    Integer(#[serde(with = "integer_text")] BigInt),
    Rational(#[serde(with = "rational_text")] BigRational),
}

impl Numeral {
    pub fn kind(&self) -> NumericKind {
        match self {
            Numeral::Integer(_) => NumericKind::Integer,
            Numeral::Rational(_) => NumericKind::Rational,
        }
    }

    pub fn to_rational(&self) -> BigRational {
        match self {
            Numeral::Integer(n) => BigRational::from_integer(n.clone()),
            Numeral::Rational(r) => r.clone(),
        }
    }
}

impl fmt::Display for Numeral {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Numeral::Integer(n) => write!(f, "{n}"),
            Numeral::Rational(r) => write!(f, "{r}"),
        }
    }
}

/// A concrete value assigned to a variable, either by a model or by an
/// assumption.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Value {
    Boolean(bool),
    Integer(#[serde(with = "integer_text")] BigInt),
    Rational(#[serde(with = "rational_text")] BigRational),
}

impl Value {
    pub fn kind(&self) -> VariableKind {
        match self {
            Value::Boolean(_) => VariableKind::Boolean,
            Value::Integer(_) => VariableKind::Integer,
            Value::Rational(_) => VariableKind::Rational,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Boolean(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_integer(&self) -> Option<&BigInt> {
        match self {
            Value::Integer(n) => Some(n),
            _ => None,
        }
    }

    pub fn to_rational(&self) -> Option<BigRational> {
        match self {
            Value::Boolean(_) => None,
            Value::Integer(n) => Some(BigRational::from_integer(n.clone())),
            Value::Rational(r) => Some(r.clone()),
        }
    }

    /// Whether this value can be assigned to a variable of `kind`. Rational
    /// variables also accept integer values.
    pub fn fits(&self, kind: VariableKind) -> bool {
        matches!(
            (self, kind),
            (Value::Boolean(_), VariableKind::Boolean)
                | (Value::Integer(_), VariableKind::Integer)
                | (Value::Integer(_), VariableKind::Rational)
                | (Value::Rational(_), VariableKind::Rational)
        )
    }

    /// The numeral form of a numeric value, widened to `kind`.
    pub fn to_numeral(&self, kind: NumericKind) -> Option<Numeral> {
        match (self, kind) {
            (Value::Boolean(_), _) => None,
            (Value::Integer(n), NumericKind::Integer) => Some(Numeral::Integer(n.clone())),
            (Value::Rational(_), NumericKind::Integer) => None,
            (value, NumericKind::Rational) => value.to_rational().map(Numeral::Rational),
        }
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Boolean(b)
    }
}

impl From<Numeral> for Value {
    fn from(numeral: Numeral) -> Self {
        match numeral {
            Numeral::Integer(n) => Value::Integer(n),
            Numeral::Rational(r) => Value::Rational(r),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Boolean(b) => write!(f, "{b}"),
            Value::Integer(n) => write!(f, "{n}"),
            Value::Rational(r) => write!(f, "{r}"),
        }
    }
}

pub fn parse_integer(text: &str) -> Result<BigInt, FormulaError> {
    text.trim()
        .parse::<BigInt>()
        .map_err(|_| FormulaError::InvalidNumeral(text.to_string()))
}

/// Parse `"3"`, `"-3/4"` or a decimal such as `"-1.25"` into an exact rational.
pub fn parse_rational(text: &str) -> Result<BigRational, FormulaError> {
    let invalid = || FormulaError::InvalidNumeral(text.to_string());
    let trimmed = text.trim();

    if let Some((numer, denom)) = trimmed.split_once('/') {
        let numer = parse_integer(numer).map_err(|_| invalid())?;
        let denom = parse_integer(denom).map_err(|_| invalid())?;
        if denom.is_zero() {
            return Err(invalid());
        }
        return Ok(BigRational::new(numer, denom));
    }

    if let Some((whole, frac)) = trimmed.split_once('.') {
        let negative = whole.starts_with('-');
        let whole_digits = whole.trim_start_matches(['-', '+']);
        let all_digits = |s: &str| s.chars().all(|c| c.is_ascii_digit());
        if !all_digits(whole_digits) || !all_digits(frac) || whole_digits.len() + frac.len() == 0 {
            return Err(invalid());
        }
        let numer = format!("{whole_digits}{frac}")
            .parse::<BigInt>()
            .map_err(|_| invalid())?;
        let denom = num::pow(BigInt::from(10u32), frac.len());
        let value = BigRational::new(numer, denom);
        return Ok(if negative { -value } else { value });
    }

    parse_integer(trimmed)
        .map(BigRational::from_integer)
        .map_err(|_| invalid())
}

#[derive(Deserialize)]
#[serde(untagged)]
enum NumeralText {
    Integer(i64),
    Float(f64),
    Text(String),
}

mod integer_text {
    use super::*;

    pub(super) fn serialize<S: Serializer>(value: &BigInt, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(value)
    }

    pub(super) fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<BigInt, D::Error> {
        match NumeralText::deserialize(deserializer)? {
            NumeralText::Integer(n) => Ok(BigInt::from(n)),
            NumeralText::Float(f) => Err(D::Error::custom(format!(
                "expected an integer numeral, found {f}"
            ))),
            NumeralText::Text(text) => parse_integer(&text).map_err(D::Error::custom),
        }
    }
}

mod rational_text {
    use super::*;

    pub(super) fn serialize<S: Serializer>(
        value: &BigRational,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        serializer.collect_str(value)
    }

    pub(super) fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<BigRational, D::Error> {
        match NumeralText::deserialize(deserializer)? {
            NumeralText::Integer(n) => Ok(BigRational::from_integer(BigInt::from(n))),
            // A JSON float has already been rounded to f64.
            NumeralText::Float(f) => Err(D::Error::custom(format!(
                "fractional numeral {f} must be written as a string, e.g. \"1/10\" or \"0.1\""
            ))),
            NumeralText::Text(text) => parse_rational(&text).map_err(D::Error::custom),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    type TestResult = Result<(), Box<dyn std::error::Error>>;

    fn ratio(n: i64, d: i64) -> BigRational {
        BigRational::new(BigInt::from(n), BigInt::from(d))
    }

    #[test]
    fn parses_fractions_decimals_and_integers() -> TestResult {
        assert_eq!(parse_rational("3/4")?, ratio(3, 4));
        assert_eq!(parse_rational(" -6/8 ")?, ratio(-3, 4));
        assert_eq!(parse_rational("-1.25")?, ratio(-5, 4));
        assert_eq!(parse_rational("-0.5")?, ratio(-1, 2));
        assert_eq!(parse_rational("17")?, ratio(17, 1));
        Ok(())
    }

    #[test]
    fn rejects_malformed_numerals() {
        assert!(parse_rational("1/0").is_err());
        assert!(parse_rational("1.2.3").is_err());
        assert!(parse_rational("abc").is_err());
        assert!(parse_rational(".").is_err());
        assert!(parse_integer("4.5").is_err());
    }

    #[test]
    fn float_numerals_are_rejected() {
        let precise = r#"{"rational":0.1000000000000000055511151231257827}"#;
        assert!(serde_json::from_str::<Value>(precise).is_err());
        assert!(serde_json::from_str::<Value>(r#"{"integer":1.5}"#).is_err());
    }

    #[test]
    fn rational_variables_accept_integer_values() {
        assert!(Value::Integer(BigInt::from(3)).fits(VariableKind::Rational));
        assert!(!Value::Rational(ratio(1, 2)).fits(VariableKind::Integer));
        assert!(!Value::Boolean(true).fits(VariableKind::Integer));
    }

    #[test]
    fn numerals_serialize_as_strings() -> TestResult {
        let json = serde_json::to_string(&Value::Rational(ratio(-3, 4)))?;
        assert_eq!(json, r#"{"rational":"-3/4"}"#);
        let back: Value = serde_json::from_str(r#"{"rational":"0.1"}"#)?;
        assert_eq!(back, Value::Rational(ratio(1, 10)));
        let whole: Value = serde_json::from_str(r#"{"rational":2}"#)?;
        assert_eq!(whole, Value::Rational(ratio(2, 1)));
        let int: Numeral = serde_json::from_str(r#"{"integer":-17}"#)?;
        assert_eq!(int, Numeral::Integer(BigInt::from(-17)));
        Ok(())
    }
}
