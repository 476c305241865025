//! End-to-end properties of the analyses against a live Z3.

use num::bigint::{BigInt, BigUint};
use satlens_formula::{Formula, Numeral, Term, Value};
use satlens_smt::{
    AnalysisError, Bound, CoreOrigin, Engine, SessionError, SmtSession, SolverConfig,
    TranslateError,
};

type TestResult = Result<(), Box<dyn std::error::Error>>;

fn session(formula: &Formula) -> Result<SmtSession, SessionError> {
    SmtSession::new(formula, SolverConfig::default())
}

#[test]
fn implication_example_has_three_solutions() -> TestResult {
    let formula = Formula::implies(
        Formula::or(vec![
            Formula::implies(Formula::lit("a"), Formula::lit("b")),
            Formula::lit("c"),
        ]),
        Formula::and(vec![
            Formula::biimplies(Formula::lit("a"), Formula::lit("b")),
            Formula::lit("c"),
        ]),
    );
    let mut session = session(&formula)?;
    assert_eq!(session.count_solutions()?, BigUint::from(3u32));
    Ok(())
}

#[test]
fn empty_conjunction_is_satisfiable() -> TestResult {
    let mut session = session(&Formula::and(vec![]))?;
    assert!(session.constraints().is_empty());
    assert!(session.has_solution()?);
    assert_eq!(session.count_solutions()?, BigUint::from(1u32));
    Ok(())
}

#[test]
fn literal_and_its_negation_are_unsatisfiable() -> TestResult {
    let formula = Formula::and(vec![Formula::lit("a"), Formula::lit("b"), Formula::neg("a")]);
    let mut session = session(&formula)?;
    assert!(!session.has_solution()?);
    assert_eq!(session.count_solutions()?, BigUint::from(0u32));
    Ok(())
}

#[test]
fn lower_bounded_attribute_has_no_maximum() -> TestResult {
    let price = Term::int_var("Price");
    let formula = Term::add(price.clone(), Term::int(233)).gt(Term::int(-17));
    let mut session = session(&formula)?;
    let range = session.range(&price)?;
    assert_eq!(range.lower, Bound::Finite(Numeral::Integer(BigInt::from(-249))));
    assert_eq!(range.upper, Bound::Unbounded);
    Ok(())
}

#[test]
fn rational_attribute_bound_is_near_the_infimum() -> TestResult {
    let weight = Term::real_var("Weight");
    let formula = weight.clone().gt(Term::int(-17));
    let mut session = session(&formula)?;
    let range = session.range(&weight)?;
    let lower = range
        .lower
        .finite()
        .ok_or("expected a finite lower bound")?
        .to_rational();
    let infimum = num::rational::BigRational::from_integer(BigInt::from(-17));
    let slack = num::rational::BigRational::new(BigInt::from(1), BigInt::from(100));
    assert!(lower > infimum);
    assert!(lower - infimum < slack);
    assert_eq!(range.upper, Bound::Unbounded);
    Ok(())
}

#[test]
fn core_of_two_contradictory_literals_ignores_redundant_conjuncts() -> TestResult {
    let formula = Formula::and(vec![
        Formula::lit("b"),
        Formula::lit("a"),
        Formula::or(vec![Formula::lit("b"), Formula::lit("c")]),
        Term::int_var("x").ge(Term::int(0)),
        Formula::neg("a"),
    ]);
    let mut session = session(&formula)?;
    let core = session.unsat_core()?;
    assert_eq!(
        core.origins(),
        vec![CoreOrigin::Constraint(1), CoreOrigin::Constraint(4)]
    );
    assert_eq!(core.entries()[0].source, Formula::lit("a"));
    assert_eq!(core.entries()[1].source, Formula::neg("a"));
    Ok(())
}

#[test]
fn repeating_an_assumption_changes_nothing() -> TestResult {
    let formula = Formula::or(vec![Formula::lit("a"), Formula::lit("b"), Formula::lit("c")]);

    let mut once = session(&formula)?;
    once.assume("b", Value::Boolean(false))?;
    let mut twice = session(&formula)?;
    twice.assume("b", Value::Boolean(false))?;
    twice.assume("b", Value::Boolean(false))?;

    assert_eq!(once.assumptions(), twice.assumptions());
    assert_eq!(once.count_solutions()?, twice.count_solutions()?);
    assert_eq!(once.has_solution()?, twice.has_solution()?);
    Ok(())
}

#[test]
fn boolean_assumption_values_use_inverted_encoding() -> TestResult {
    let mut session = session(&Formula::lit("a"))?;
    // `false` asserts the variable, which agrees with the formula
    session.assume("a", Value::Boolean(false))?;
    assert!(session.has_solution()?);
    // `true` asserts the negation
    session.assume("a", Value::Boolean(true))?;
    assert!(!session.has_solution()?);
    session.clear_assumptions();
    assert!(session.has_solution()?);
    Ok(())
}

#[test]
fn numeric_assumptions_fix_model_values() -> TestResult {
    let formula = Formula::and(vec![
        Term::int_var("x").ge(Term::int(0)),
        Term::real_var("y").gt(Term::int_var("x")),
    ]);
    let mut session = session(&formula)?;
    session.assume("x", Value::Integer(BigInt::from(7)))?;
    let model = session.find_solution()?.ok_or("expected a model")?;
    assert_eq!(model.get(0), Some(&Value::Integer(BigInt::from(7))));
    let Some(Value::Rational(y)) = model.get(1) else {
        panic!("expected a rational value for y");
    };
    assert!(*y > num::rational::BigRational::from_integer(BigInt::from(7)));
    Ok(())
}

#[test]
fn scopes_do_not_leak_into_the_session() -> TestResult {
    let formula = Formula::or(vec![Formula::lit("a"), Formula::lit("b")]);
    let mut session = session(&formula)?;
    // Counting asserts blocking clauses; a later count must start over.
    assert_eq!(session.count_solutions()?, BigUint::from(3u32));
    assert_eq!(session.count_solutions()?, BigUint::from(3u32));
    assert_eq!(session.constraints().len(), 1);
    assert!(session.has_solution()?);
    Ok(())
}

#[test]
fn failed_translation_keeps_the_session_usable() -> TestResult {
    let mut session = session(&Formula::lit("a"))?;
    let err = session.range(&Term::Apply {
        function: "f".into(),
        kind: satlens_formula::NumericKind::Integer,
        arguments: vec![],
    });
    assert!(matches!(
        err,
        Err(AnalysisError::Translate(TranslateError::UnsupportedConstruct(
            "function application"
        )))
    ));
    assert!(session.has_solution()?);
    Ok(())
}

#[test]
fn integer_engine_handles_linear_integer_formulas() -> TestResult {
    let formula = Formula::and(vec![
        Term::int_var("x").ge(Term::int(1)),
        Term::add(Term::int_var("x"), Term::int_var("y")).equals(Term::int(4)),
        Term::int_var("y").ge(Term::int(1)),
    ]);
    let mut session = SmtSession::new(&formula, SolverConfig::with_engine(Engine::Z3Integer))?;
    assert!(session.has_solution()?);
    let range = session.range(&Term::int_var("y"))?;
    assert_eq!(range.lower, Bound::Finite(Numeral::Integer(BigInt::from(1))));
    assert_eq!(range.upper, Bound::Finite(Numeral::Integer(BigInt::from(3))));
    Ok(())
}

#[test]
fn integer_engine_refuses_rational_formulas_at_construction() {
    let formula = Term::real_var("y").le(Term::rational(1, 2));
    assert!(matches!(
        SmtSession::new(&formula, SolverConfig::with_engine(Engine::Z3Integer)),
        Err(SessionError::Translate(
            TranslateError::UnsupportedCapability { .. }
        ))
    ));
}
