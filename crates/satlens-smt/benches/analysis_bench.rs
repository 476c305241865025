use criterion::{black_box, criterion_group, criterion_main, Criterion};
use satlens_formula::{Formula, Term, VariableRegistry};
use satlens_smt::{Engine, SmtSession, SolverConfig, Translator};

/// A chain of implications `x0 => x1 => ... => xn` plus an attribute sum.
fn implication_chain(n: usize) -> Formula {
    let mut conjuncts: Vec<Formula> = (0..n)
        .map(|i| Formula::implies(Formula::lit(format!("x{i}")), Formula::lit(format!("x{}", i + 1))))
        .collect();
    let cost = (0..n).fold(Term::int(0), |acc, i| Term::add(acc, Term::int_var(format!("c{i}"))));
    conjuncts.push(cost.le(Term::int(100)));
    Formula::and(conjuncts)
}

fn bench_translate_chain_64(c: &mut Criterion) {
    let formula = implication_chain(64);
    c.bench_function("translate_chain_64", |b| {
        b.iter(|| {
            let registry = VariableRegistry::from_formula(&formula).unwrap();
            let mut translator = Translator::new(registry, Engine::Z3);
            translator.translate(black_box(&formula)).unwrap()
        })
    });
}

fn bench_count_chain_12(c: &mut Criterion) {
    let formula = implication_chain(12);
    c.bench_function("count_chain_12", |b| {
        b.iter(|| {
            let mut session = SmtSession::new(black_box(&formula), SolverConfig::default()).unwrap();
            session.count_solutions().unwrap()
        })
    });
}

fn bench_range_chain_12(c: &mut Criterion) {
    let formula = implication_chain(12);
    c.bench_function("range_chain_12", |b| {
        b.iter(|| {
            let mut session = SmtSession::new(black_box(&formula), SolverConfig::default()).unwrap();
            session.range(&Term::int_var("c0")).unwrap()
        })
    });
}

criterion_group!(
    benches,
    bench_translate_chain_64,
    bench_count_chain_12,
    bench_range_chain_12
);
criterion_main!(benches);
