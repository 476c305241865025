//! Tseitin CNF conversion through Z3 and decoding of the result back into a
//! formula tree.
//!
//! Decoding walks the native formula at three levels. The formula level
//! accepts a conjunction, the clause level a disjunction and the literal level
//! an atom or a negated atom. Each level also accepts the degenerate forms of
//! the levels below it. Any other shape is reported, so a result of
//! [`decode`] is always exactly `And(Or(Literal...)...)`.

use std::fmt;

use satlens_formula::{Formula, FormulaError, VariableKind, VariableRegistry};
use thiserror::Error;
use tracing::debug;
use z3::ast::{Ast, Bool};
use z3::{AstKind, DeclKind, Goal, Tactic};

use crate::translate::{TranslateError, Translator};

/// The decoding level at which a shape was encountered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Level {
    Formula,
    Clause,
    Literal,
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Level::Formula => write!(f, "formula"),
            Level::Clause => write!(f, "clause"),
            Level::Literal => write!(f, "literal"),
        }
    }
}

#[derive(Debug, Error)]
pub enum CnfError {
    #[error("Unexpected {shape} at {level} level of CNF")]
    Unexpected { level: Level, shape: String },
    #[error("CNF tactic failed: {0}")]
    Tactic(String),
    #[error(transparent)]
    Translate(#[from] TranslateError),
    #[error(transparent)]
    Registry(#[from] FormulaError),
}

/// Structural view of a native boolean formula node.
#[derive(Debug, Clone, PartialEq)]
pub enum Shape<N> {
    And(Vec<N>),
    Or(Vec<N>),
    Not(N),
    /// A boolean atom and the name it is known by.
    Atom(String),
    Constant(bool),
    Quantifier,
    IfThenElse,
    Equivalence,
    Implication,
    BoundVariable,
    Other(String),
}

impl<N> Shape<N> {
    pub fn describe(&self) -> String {
        match self {
            Shape::And(_) => "conjunction".into(),
            Shape::Or(_) => "disjunction".into(),
            Shape::Not(_) => "negation".into(),
            Shape::Atom(name) => format!("atom {name}"),
            Shape::Constant(value) => format!("constant {value}"),
            Shape::Quantifier => "quantifier".into(),
            Shape::IfThenElse => "if-then-else".into(),
            Shape::Equivalence => "equivalence".into(),
            Shape::Implication => "implication".into(),
            Shape::BoundVariable => "bound variable".into(),
            Shape::Other(name) => name.clone(),
        }
    }
}

/// A node that can be inspected by the decoder.
pub trait CnfNode: Sized {
    fn shape(&self) -> Shape<Self>;
}

impl CnfNode for Bool {
    fn shape(&self) -> Shape<Self> {
        match self.kind() {
            AstKind::App => {}
            AstKind::Quantifier => return Shape::Quantifier,
            AstKind::Var => return Shape::BoundVariable,
            other => return Shape::Other(format!("{other:?}")),
        }
        let decl = self.decl();
        let children = || -> Vec<Bool> {
            self.children()
                .into_iter()
                .filter_map(|child| child.as_bool())
                .collect()
        };
        match decl.kind() {
            DeclKind::AND => Shape::And(children()),
            DeclKind::OR => Shape::Or(children()),
            DeclKind::NOT => match children().into_iter().next() {
                Some(operand) => Shape::Not(operand),
                None => Shape::Other("malformed negation".into()),
            },
            DeclKind::TRUE => Shape::Constant(true),
            DeclKind::FALSE => Shape::Constant(false),
            DeclKind::ITE => Shape::IfThenElse,
            DeclKind::IFF => Shape::Equivalence,
            DeclKind::EQ if self.children().iter().all(|c| c.as_bool().is_some()) => {
                Shape::Equivalence
            }
            DeclKind::IMPLIES => Shape::Implication,
            DeclKind::XOR => Shape::Other("exclusive or".into()),
            DeclKind::UNINTERPRETED if self.children().is_empty() => Shape::Atom(decl.name()),
            // Arithmetic predicates are opaque atoms named by their rendering.
            _ => Shape::Atom(self.to_string()),
        }
    }
}

fn unexpected<N>(level: Level, shape: &Shape<N>) -> CnfError {
    CnfError::Unexpected {
        level,
        shape: shape.describe(),
    }
}

/// Decode a CNF-shaped native formula. Atom names not yet in `registry`
/// (typically auxiliary variables introduced by the transformation) are
/// registered as boolean variables.
pub fn decode<N: CnfNode>(node: &N, registry: &mut VariableRegistry) -> Result<Formula, CnfError> {
    let clauses = match node.shape() {
        Shape::And(conjuncts) => conjuncts
            .iter()
            .map(|clause| decode_clause(clause, registry))
            .collect::<Result<Vec<_>, _>>()?,
        Shape::Or(disjuncts) => vec![clause_of(&disjuncts, registry)?],
        shape @ (Shape::Not(_) | Shape::Atom(_)) => {
            vec![Formula::or(vec![literal_of(shape, registry)?])]
        }
        shape => return Err(unexpected(Level::Formula, &shape)),
    };
    Ok(Formula::and(clauses))
}

fn decode_clause<N: CnfNode>(node: &N, registry: &mut VariableRegistry) -> Result<Formula, CnfError> {
    match node.shape() {
        Shape::Or(disjuncts) => clause_of(&disjuncts, registry),
        shape @ (Shape::Not(_) | Shape::Atom(_)) => {
            Ok(Formula::or(vec![literal_of(shape, registry)?]))
        }
        shape => Err(unexpected(Level::Clause, &shape)),
    }
}

fn clause_of<N: CnfNode>(disjuncts: &[N], registry: &mut VariableRegistry) -> Result<Formula, CnfError> {
    let literals = disjuncts
        .iter()
        .map(|literal| literal_of(literal.shape(), registry))
        .collect::<Result<Vec<_>, _>>()?;
    Ok(Formula::or(literals))
}

fn literal_of<N: CnfNode>(shape: Shape<N>, registry: &mut VariableRegistry) -> Result<Formula, CnfError> {
    match shape {
        Shape::Atom(name) => atom(name, true, registry),
        Shape::Not(operand) => match operand.shape() {
            Shape::Atom(name) => atom(name, false, registry),
            inner => Err(CnfError::Unexpected {
                level: Level::Literal,
                shape: format!("negated {}", inner.describe()),
            }),
        },
        shape => Err(unexpected(Level::Literal, &shape)),
    }
}

fn atom(name: String, positive: bool, registry: &mut VariableRegistry) -> Result<Formula, CnfError> {
    registry.register(&name, VariableKind::Boolean)?;
    Ok(Formula::literal(name, positive))
}

/// Convert native constraints to CNF with Z3's `tseitin-cnf` tactic and
/// decode the result. New auxiliary names are added to the translator's
/// registry.
pub fn tseitin(translator: &mut Translator, constraints: &[Bool]) -> Result<Formula, CnfError> {
    let goal = Goal::new(false, false, false);
    for constraint in constraints {
        goal.assert(constraint);
    }
    let applied = Tactic::new("tseitin-cnf")
        .apply(&goal, None)
        .map_err(CnfError::Tactic)?;

    let mut formulas = Vec::new();
    for subgoal in applied.list_subgoals() {
        for formula in subgoal.get_formulas::<Bool>() {
            match formula.shape() {
                Shape::Constant(true) => {}
                // An unsatisfiable goal collapses to the empty clause.
                Shape::Constant(false) => return Ok(Formula::and(vec![Formula::or(vec![])])),
                _ => formulas.push(formula),
            }
        }
    }

    let registry = translator.registry_mut();
    let before = registry.count();
    let cnf = match formulas.as_slice() {
        [] => Formula::and(vec![]),
        [single] => decode(single, registry)?,
        many => {
            let refs: Vec<&Bool> = many.iter().collect();
            decode(&Bool::and(&refs), registry)?
        }
    };
    debug!(
        clauses = formulas.len(),
        auxiliary = registry.count() - before,
        "decoded tseitin cnf"
    );
    Ok(cnf)
}

/// Translate `formula` and convert it to CNF.
pub fn formula_to_cnf(translator: &mut Translator, formula: &Formula) -> Result<Formula, CnfError> {
    let native = translator.translate(formula)?;
    tseitin(translator, &[native])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::Engine;
    type TestResult = Result<(), Box<dyn std::error::Error>>;

    /// Hand-built shapes for exercising the decoder without a backend.
    #[derive(Debug, Clone)]
    enum Node {
        And(Vec<Node>),
        Or(Vec<Node>),
        Not(Box<Node>),
        Atom(&'static str),
        Constant(bool),
        Implies,
        Ite,
    }

    impl CnfNode for Node {
        fn shape(&self) -> Shape<Self> {
            match self {
                Node::And(children) => Shape::And(children.clone()),
                Node::Or(children) => Shape::Or(children.clone()),
                Node::Not(inner) => Shape::Not((**inner).clone()),
                Node::Atom(name) => Shape::Atom((*name).to_string()),
                Node::Constant(value) => Shape::Constant(*value),
                Node::Implies => Shape::Implication,
                Node::Ite => Shape::IfThenElse,
            }
        }
    }

    fn not(node: Node) -> Node {
        Node::Not(Box::new(node))
    }

    #[test]
    fn decodes_two_level_cnf() -> TestResult {
        let node = Node::And(vec![
            Node::Or(vec![Node::Atom("a"), not(Node::Atom("b"))]),
            not(Node::Atom("c")),
            Node::Atom("a"),
        ]);
        let mut registry = VariableRegistry::new();
        let cnf = decode(&node, &mut registry)?;
        assert_eq!(
            cnf,
            Formula::and(vec![
                Formula::or(vec![Formula::lit("a"), Formula::neg("b")]),
                Formula::or(vec![Formula::neg("c")]),
                Formula::or(vec![Formula::lit("a")]),
            ])
        );
        assert_eq!(registry.count(), 3);
        Ok(())
    }

    #[test]
    fn degenerate_top_levels_are_wrapped() -> TestResult {
        let mut registry = VariableRegistry::new();
        assert_eq!(
            decode(&Node::Or(vec![Node::Atom("a"), Node::Atom("b")]), &mut registry)?,
            Formula::and(vec![Formula::or(vec![Formula::lit("a"), Formula::lit("b")])])
        );
        assert_eq!(
            decode(&not(Node::Atom("a")), &mut registry)?,
            Formula::and(vec![Formula::or(vec![Formula::neg("a")])])
        );
        assert_eq!(
            decode(&Node::Atom("k!1"), &mut registry)?,
            Formula::and(vec![Formula::or(vec![Formula::lit("k!1")])])
        );
        assert_eq!(registry.index_of("k!1")?, 2);
        Ok(())
    }

    #[test]
    fn each_level_rejects_foreign_shapes() {
        let mut registry = VariableRegistry::new();
        let cases = [
            (Node::Implies, Level::Formula, "implication"),
            (Node::Constant(true), Level::Formula, "constant true"),
            (Node::And(vec![Node::Ite]), Level::Clause, "if-then-else"),
            (Node::And(vec![Node::And(vec![])]), Level::Clause, "conjunction"),
            (Node::Or(vec![Node::Or(vec![])]), Level::Literal, "disjunction"),
            (
                Node::Or(vec![not(not(Node::Atom("a")))]),
                Level::Literal,
                "negated negation",
            ),
        ];
        for (node, expected_level, expected_shape) in cases {
            match decode(&node, &mut registry) {
                Err(CnfError::Unexpected { level, shape }) => {
                    assert_eq!(level, expected_level);
                    assert_eq!(shape, expected_shape);
                }
                other => panic!("expected rejection of {node:?}, got {other:?}"),
            }
        }
    }

    #[test]
    fn tseitin_output_is_two_level_over_known_names() -> TestResult {
        let formula = Formula::biimplies(
            Formula::lit("a"),
            Formula::and(vec![Formula::lit("b"), Formula::or(vec![Formula::lit("c"), Formula::neg("a")])]),
        );
        let mut translator = Translator::new(VariableRegistry::from_formula(&formula)?, Engine::Z3);
        let cnf = formula_to_cnf(&mut translator, &formula)?;
        let Formula::And { operands } = &cnf else {
            panic!("expected a conjunction, got {cnf}");
        };
        assert!(!operands.is_empty());
        for clause in operands {
            let Formula::Or { operands: literals } = clause else {
                panic!("expected a clause, got {clause}");
            };
            for literal in literals {
                let Formula::Literal { name, .. } = literal else {
                    panic!("expected a literal, got {literal}");
                };
                assert!(translator.registry().get_index(name).is_some());
            }
        }
        Ok(())
    }

    #[test]
    fn trivial_goals_become_trivial_cnf() -> TestResult {
        let mut translator = Translator::new(VariableRegistry::new(), Engine::Z3);
        assert_eq!(formula_to_cnf(&mut translator, &Formula::True)?, Formula::and(vec![]));
        assert_eq!(
            formula_to_cnf(&mut translator, &Formula::False)?,
            Formula::and(vec![Formula::or(vec![])])
        );
        Ok(())
    }
}
