use std::path::Path;
use std::process::{Command, Output};

use satlens_formula::{Formula, Term};
use serde_json::Value;

fn write_formula(dir: &Path, name: &str, formula: &Formula) -> String {
    let path = dir.join(name);
    std::fs::write(&path, serde_json::to_string(formula).unwrap()).unwrap();
    path.to_string_lossy().into_owned()
}

fn satlens(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_satlens"))
        .args(args)
        .env("RUST_LOG", "off")
        .output()
        .expect("failed to execute satlens")
}

fn json_stdout(output: &Output) -> Value {
    assert!(
        output.status.success(),
        "satlens failed: status={:?}, stderr={}",
        output.status.code(),
        String::from_utf8_lossy(&output.stderr)
    );
    serde_json::from_slice(&output.stdout).unwrap_or_else(|e| {
        panic!(
            "output should be JSON (stderr={}). parse error: {e}",
            String::from_utf8_lossy(&output.stderr)
        )
    })
}

fn disjunction() -> Formula {
    Formula::or(vec![Formula::lit("a"), Formula::lit("b")])
}

#[test]
fn count_reports_three_solutions_for_disjunction() {
    let dir = tempfile::tempdir().unwrap();
    let file = write_formula(dir.path(), "or.json", &disjunction());

    let report = json_stdout(&satlens(&["count", &file, "--format", "json"]));
    assert_eq!(report["analysis"], "count");
    assert_eq!(report["count"], "3");
    assert_eq!(report["complete"], true);

    let text = satlens(&["count", &file]);
    assert!(text.status.success());
    assert_eq!(String::from_utf8_lossy(&text.stdout).trim(), "3");
}

#[test]
fn count_limit_marks_report_incomplete() {
    let dir = tempfile::tempdir().unwrap();
    let file = write_formula(dir.path(), "or.json", &disjunction());

    let report = json_stdout(&satlens(&[
        "count",
        &file,
        "--max-solutions",
        "2",
        "--format",
        "json",
    ]));
    assert_eq!(report["count"], "2");
    assert_eq!(report["complete"], false);
}

#[test]
fn boolean_assumption_true_asserts_negation() {
    let dir = tempfile::tempdir().unwrap();
    let file = write_formula(dir.path(), "lit.json", &Formula::lit("a"));

    let report = json_stdout(&satlens(&["sat", &file, "--assume", "a=true", "--format", "json"]));
    assert_eq!(report["satisfiable"], false);

    let report = json_stdout(&satlens(&["sat", &file, "--assume", "a=false", "--format", "json"]));
    assert_eq!(report["satisfiable"], true);
}

#[test]
fn model_lists_every_variable_in_registry_order() {
    let dir = tempfile::tempdir().unwrap();
    let formula = Formula::and(vec![
        Formula::lit("a"),
        Term::int_var("x").equals(Term::int(7)),
    ]);
    let file = write_formula(dir.path(), "model.json", &formula);

    let report = json_stdout(&satlens(&["model", &file, "--format", "json"]));
    assert_eq!(report["satisfiable"], true);
    let solution = report["solution"].as_array().expect("solution should be a list");
    assert_eq!(solution[0]["name"], "a");
    assert_eq!(solution[0]["value"], true);
    assert_eq!(solution[1]["name"], "x");
    assert_eq!(solution[1]["value"], "7");
}

#[test]
fn range_of_price_has_lower_bound_only() {
    let dir = tempfile::tempdir().unwrap();
    let formula = Term::add(Term::int_var("Price"), Term::int(233)).gt(Term::int(-17));
    let file = write_formula(dir.path(), "price.json", &formula);

    let report = json_stdout(&satlens(&[
        "range", &file, "--target", "Price", "--format", "json",
    ]));
    assert_eq!(report["lower"]["status"], "finite");
    assert_eq!(report["lower"]["value"]["integer"], "-249");
    assert_eq!(report["upper"]["status"], "unbounded");
}

#[test]
fn core_names_conflicting_constraints() {
    let dir = tempfile::tempdir().unwrap();
    let formula = Formula::and(vec![
        Formula::lit("c"),
        Formula::lit("a"),
        Formula::lit("b"),
        Formula::neg("a"),
    ]);
    let file = write_formula(dir.path(), "conflict.json", &formula);

    let report = json_stdout(&satlens(&["core", &file, "--format", "json"]));
    assert_eq!(report["satisfiable"], false);
    let origins: Vec<&Value> = report["core"]
        .as_array()
        .unwrap()
        .iter()
        .map(|m| &m["origin"])
        .collect();
    assert_eq!(origins.len(), 2);
    assert_eq!(origins[0]["constraint"], 1);
    assert_eq!(origins[1]["constraint"], 3);
}

#[test]
fn cnf_output_is_a_conjunction_of_clauses() {
    let dir = tempfile::tempdir().unwrap();
    let formula = Formula::implies(Formula::lit("a"), Formula::lit("b"));
    let file = write_formula(dir.path(), "impl.json", &formula);

    let report = json_stdout(&satlens(&["cnf", &file, "--format", "json"]));
    assert_eq!(report["formula"]["node"], "and");
    assert!(report["clauses"].as_u64().unwrap() >= 1);
}

#[test]
fn invalid_inputs_fail_with_diagnostics() {
    let dir = tempfile::tempdir().unwrap();
    let bad = dir.path().join("bad.json");
    std::fs::write(&bad, "{\"node\": \"nonsense\"}").unwrap();
    let output = satlens(&["sat", &bad.to_string_lossy()]);
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("Invalid formula"));

    let file = write_formula(dir.path(), "lit.json", &Formula::lit("a"));
    let output = satlens(&["sat", &file, "--assume", "zz=true"]);
    assert!(!output.status.success());

    let output = satlens(&["sat", &file, "--engine", "cvc5"]);
    assert!(!output.status.success());
}
