//! Proptest strategies for boolean formula trees.

use proptest::prelude::*;

use crate::formula::Formula;

/// Literal names used by [`arb_boolean_formula`].
pub const LITERAL_NAMES: [&str; 4] = ["a", "b", "c", "d"];

/// Strategy for a literal over [`LITERAL_NAMES`] with either polarity.
pub fn arb_literal() -> impl Strategy<Value = Formula> {
    (0..LITERAL_NAMES.len(), any::<bool>())
        .prop_map(|(i, positive)| Formula::literal(LITERAL_NAMES[i], positive))
}

/// Strategy for a boolean formula built from `Not`, `And`, `Or`, `Implies`,
/// `Biimplies` and literals. Connectives have 1-3 operands and trees stay
/// shallow enough for exhaustive evaluation in tests.
pub fn arb_boolean_formula() -> impl Strategy<Value = Formula> {
    arb_literal().prop_recursive(4, 24, 3, |inner| {
        prop_oneof![
            inner.clone().prop_map(Formula::not),
            proptest::collection::vec(inner.clone(), 1..=3).prop_map(Formula::and),
            proptest::collection::vec(inner.clone(), 1..=3).prop_map(Formula::or),
            (inner.clone(), inner.clone()).prop_map(|(p, c)| Formula::implies(p, c)),
            (inner.clone(), inner).prop_map(|(l, r)| Formula::biimplies(l, r)),
        ]
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    proptest! {
        #[test]
        fn generated_formulas_are_boolean(formula in arb_boolean_formula()) {
            // Every literal is drawn from the fixed name set
            for name in formula.variable_names() {
                prop_assert!(LITERAL_NAMES.contains(&name));
            }
            // Fully assigned evaluation is always defined
            prop_assert!(formula.evaluate(&|_| Some(true)).is_some());
        }
    }
}
