//! Boolean formula trees over literals and arithmetic predicates.

use std::fmt;

use indexmap::IndexSet;
use serde::{Deserialize, Serialize};

use crate::kind::VariableKind;
use crate::term::Term;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Comparison {
    LessThan,
    LessEqual,
    GreaterThan,
    GreaterEqual,
    Equals,
}

impl Comparison {
    pub fn symbol(self) -> &'static str {
        match self {
            Comparison::LessThan => "<",
            Comparison::LessEqual => "<=",
            Comparison::GreaterThan => ">",
            Comparison::GreaterEqual => ">=",
            Comparison::Equals => "=",
        }
    }
}

/// A formula node. `True` and `False` are the two sentinel literals; every
/// other literal names a boolean variable and carries its polarity.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "node", rename_all = "snake_case")]
pub enum Formula {
    True,
    False,
    Literal {
        name: String,
        positive: bool,
    },
    Not {
        operand: Box<Formula>,
    },
    And {
        operands: Vec<Formula>,
    },
    Or {
        operands: Vec<Formula>,
    },
    Implies {
        premise: Box<Formula>,
        conclusion: Box<Formula>,
    },
    Biimplies {
        lhs: Box<Formula>,
        rhs: Box<Formula>,
    },
    Predicate {
        comparison: Comparison,
        lhs: Term,
        rhs: Term,
    },
    ForAll {
        variables: Vec<String>,
        body: Box<Formula>,
    },
    Exists {
        variables: Vec<String>,
        body: Box<Formula>,
    },
}

impl Formula {
    pub fn lit(name: impl Into<String>) -> Self {
        Formula::Literal {
            name: name.into(),
            positive: true,
        }
    }

    pub fn neg(name: impl Into<String>) -> Self {
        Formula::Literal {
            name: name.into(),
            positive: false,
        }
    }

    pub fn literal(name: impl Into<String>, positive: bool) -> Self {
        Formula::Literal {
            name: name.into(),
            positive,
        }
    }

    #[allow(clippy::should_implement_trait)]
    pub fn not(operand: Formula) -> Self {
        Formula::Not {
            operand: Box::new(operand),
        }
    }

    pub fn and(operands: Vec<Formula>) -> Self {
        Formula::And { operands }
    }

    pub fn or(operands: Vec<Formula>) -> Self {
        Formula::Or { operands }
    }

    pub fn implies(premise: Formula, conclusion: Formula) -> Self {
        Formula::Implies {
            premise: Box::new(premise),
            conclusion: Box::new(conclusion),
        }
    }

    pub fn biimplies(lhs: Formula, rhs: Formula) -> Self {
        Formula::Biimplies {
            lhs: Box::new(lhs),
            rhs: Box::new(rhs),
        }
    }

    /// Human-readable node kind, used in error messages.
    pub fn node_kind(&self) -> &'static str {
        match self {
            Formula::True => "true",
            Formula::False => "false",
            Formula::Literal { .. } => "literal",
            Formula::Not { .. } => "not",
            Formula::And { .. } => "and",
            Formula::Or { .. } => "or",
            Formula::Implies { .. } => "implies",
            Formula::Biimplies { .. } => "biimplies",
            Formula::Predicate { comparison, .. } => match comparison {
                Comparison::LessThan => "less-than",
                Comparison::LessEqual => "less-equal",
                Comparison::GreaterThan => "greater-than",
                Comparison::GreaterEqual => "greater-equal",
                Comparison::Equals => "equals",
            },
            Formula::ForAll { .. } => "forall",
            Formula::Exists { .. } => "exists",
        }
    }

    /// Every variable occurrence in depth-first, left-to-right order.
    /// Duplicates are kept; callers that need a set deduplicate.
    pub fn variable_occurrences(&self) -> Vec<(&str, VariableKind)> {
        let mut out = Vec::new();
        collect_formula(self, &mut out);
        out
    }

    /// Distinct variable names in first-encounter order.
    pub fn variable_names(&self) -> IndexSet<&str> {
        self.variable_occurrences()
            .into_iter()
            .map(|(name, _)| name)
            .collect()
    }

    /// Evaluate a purely boolean formula. Returns `None` when a literal is
    /// unassigned or the formula contains arithmetic or quantifiers.
    pub fn evaluate(&self, assignment: &dyn Fn(&str) -> Option<bool>) -> Option<bool> {
        match self {
            Formula::True => Some(true),
            Formula::False => Some(false),
            Formula::Literal { name, positive } => assignment(name).map(|v| v == *positive),
            Formula::Not { operand } => operand.evaluate(assignment).map(|v| !v),
            Formula::And { operands } => {
                for operand in operands {
                    if !operand.evaluate(assignment)? {
                        return Some(false);
                    }
                }
                Some(true)
            }
            Formula::Or { operands } => {
                for operand in operands {
                    if operand.evaluate(assignment)? {
                        return Some(true);
                    }
                }
                Some(false)
            }
            Formula::Implies {
                premise,
                conclusion,
            } => Some(!premise.evaluate(assignment)? || conclusion.evaluate(assignment)?),
            Formula::Biimplies { lhs, rhs } => {
                Some(lhs.evaluate(assignment)? == rhs.evaluate(assignment)?)
            }
            Formula::Predicate { .. } | Formula::ForAll { .. } | Formula::Exists { .. } => None,
        }
    }
}

fn collect_formula<'a>(formula: &'a Formula, out: &mut Vec<(&'a str, VariableKind)>) {
    match formula {
        Formula::True | Formula::False => {}
        Formula::Literal { name, .. } => out.push((name.as_str(), VariableKind::Boolean)),
        Formula::Not { operand } => collect_formula(operand, out),
        Formula::And { operands } | Formula::Or { operands } => {
            for operand in operands {
                collect_formula(operand, out);
            }
        }
        Formula::Implies {
            premise: lhs,
            conclusion: rhs,
        }
        | Formula::Biimplies { lhs, rhs } => {
            collect_formula(lhs, out);
            collect_formula(rhs, out);
        }
        Formula::Predicate { lhs, rhs, .. } => {
            collect_term(lhs, out);
            collect_term(rhs, out);
        }
        Formula::ForAll { body, .. } | Formula::Exists { body, .. } => collect_formula(body, out),
    }
}

fn collect_term<'a>(term: &'a Term, out: &mut Vec<(&'a str, VariableKind)>) {
    match term {
        Term::Constant { .. } => {}
        Term::Variable { name, kind } => out.push((name.as_str(), VariableKind::from(*kind))),
        Term::Function { lhs, rhs, .. } => {
            collect_term(lhs, out);
            collect_term(rhs, out);
        }
        Term::IfThenElse {
            condition,
            then,
            otherwise,
        } => {
            collect_formula(condition, out);
            collect_term(then, out);
            collect_term(otherwise, out);
        }
        Term::Apply { arguments, .. } => {
            for argument in arguments {
                collect_term(argument, out);
            }
        }
    }
}

fn write_joined(f: &mut fmt::Formatter<'_>, operands: &[Formula], separator: &str) -> fmt::Result {
    write!(f, "(")?;
    for (i, operand) in operands.iter().enumerate() {
        if i > 0 {
            write!(f, " {separator} ")?;
        }
        write!(f, "{operand}")?;
    }
    write!(f, ")")
}

impl fmt::Display for Formula {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Formula::True => write!(f, "true"),
            Formula::False => write!(f, "false"),
            Formula::Literal { name, positive } => {
                if *positive {
                    write!(f, "{name}")
                } else {
                    write!(f, "-{name}")
                }
            }
            Formula::Not { operand } => write!(f, "-{operand}"),
            Formula::And { operands } if operands.is_empty() => write!(f, "true"),
            Formula::Or { operands } if operands.is_empty() => write!(f, "false"),
            Formula::And { operands } => write_joined(f, operands, "&"),
            Formula::Or { operands } => write_joined(f, operands, "|"),
            Formula::Implies {
                premise,
                conclusion,
            } => write!(f, "({premise} => {conclusion})"),
            Formula::Biimplies { lhs, rhs } => write!(f, "({lhs} <=> {rhs})"),
            Formula::Predicate {
                comparison,
                lhs,
                rhs,
            } => write!(f, "({lhs} {} {rhs})", comparison.symbol()),
            Formula::ForAll { variables, body } => {
                write!(f, "forall {}. {body}", variables.join(" "))
            }
            Formula::Exists { variables, body } => {
                write!(f, "exists {}. {body}", variables.join(" "))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    type TestResult = Result<(), Box<dyn std::error::Error>>;

    fn counting_example() -> Formula {
        Formula::implies(
            Formula::or(vec![
                Formula::implies(Formula::lit("a"), Formula::lit("b")),
                Formula::lit("c"),
            ]),
            Formula::and(vec![
                Formula::biimplies(Formula::lit("a"), Formula::lit("b")),
                Formula::lit("c"),
            ]),
        )
    }

    #[test]
    fn variable_names_follow_first_encounter() {
        let formula = Formula::and(vec![
            Formula::neg("b"),
            Term::int_var("x").gt(Term::int(1)),
            Formula::lit("a"),
            Formula::lit("b"),
        ]);
        let names: Vec<_> = formula.variable_names().into_iter().collect();
        assert_eq!(names, vec!["b", "x", "a"]);
        assert_eq!(formula.variable_occurrences().len(), 4);
    }

    #[test]
    fn brute_force_count_of_example_is_three() {
        let formula = counting_example();
        let mut count = 0;
        for bits in 0..8u8 {
            let env = move |name: &str| match name {
                "a" => Some(bits & 1 != 0),
                "b" => Some(bits & 2 != 0),
                "c" => Some(bits & 4 != 0),
                _ => None,
            };
            if formula.evaluate(&env) == Some(true) {
                count += 1;
            }
        }
        assert_eq!(count, 3);
    }

    #[test]
    fn evaluation_is_unknown_for_arithmetic() {
        let formula = Term::int_var("x").gt(Term::int(0));
        assert_eq!(formula.evaluate(&|_| Some(true)), None);
        assert_eq!(Formula::lit("z").evaluate(&|_| None), None);
    }

    #[test]
    fn display_uses_infix_connectives() {
        let formula = Formula::and(vec![
            Formula::neg("a"),
            Formula::implies(Formula::lit("b"), Term::real_var("y").le(Term::rational(1, 2))),
        ]);
        assert_eq!(formula.to_string(), "(-a & (b => (y <= 1/2)))");
        assert_eq!(Formula::and(vec![]).to_string(), "true");
    }

    #[test]
    fn json_form_is_tagged_by_node() -> TestResult {
        let formula = Formula::and(vec![
            Formula::lit("a"),
            Term::add(Term::int_var("Price"), Term::int(233)).gt(Term::int(-17)),
        ]);
        let json = serde_json::to_value(&formula)?;
        assert_eq!(json["node"], "and");
        assert_eq!(json["operands"][0]["node"], "literal");
        assert_eq!(json["operands"][1]["comparison"], "greater_than");
        assert_eq!(json["operands"][1]["rhs"]["value"]["integer"], "-17");
        let back: Formula = serde_json::from_value(json)?;
        assert_eq!(back, formula);
        Ok(())
    }
}
