//! Property Test: Reconciliation Idempotence
//!
//! This property test verifies that:
//! - Reconciling identical updates twice against the same existing
//!   collection yields byte-identical typed and string-coerced output
//! - The string-coerced list always holds text values

use fleetbridge_backend::domain::PropertyVal;
use fleetbridge_backend::reconcile::reconcile;
use fleetbridge_backend::test_utils::{generators, standard_catalog};
use fleetbridge_backend::{catalog, LogicalKey};
use proptest::prelude::*;

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    /// Property: reconciliation is a pure function of its inputs
    #[test]
    fn prop_reconcile_twice_is_byte_identical(
        existing in generators::existing_collection(),
        updates in generators::update_set(),
    ) {
        let resolved = catalog::resolve(&standard_catalog());

        let first = reconcile(&existing, &updates, &resolved);
        let second = reconcile(&existing, &updates, &resolved);

        prop_assert_eq!(
            serde_json::to_string(&first.typed).unwrap(),
            serde_json::to_string(&second.typed).unwrap()
        );
        prop_assert_eq!(
            serde_json::to_string(&first.coerced).unwrap(),
            serde_json::to_string(&second.coerced).unwrap()
        );
    }

    /// Property: the coerced list is all text, parallel to the typed list
    #[test]
    fn prop_coerced_list_is_parallel_and_textual(
        existing in generators::existing_collection(),
        updates in generators::update_set(),
    ) {
        let resolved = catalog::resolve(&standard_catalog());
        let out = reconcile(&existing, &updates, &resolved);

        prop_assert_eq!(out.typed.len(), out.coerced.len());
        for (typed, coerced) in out.typed.iter().zip(out.coerced.iter()) {
            prop_assert_eq!(&typed.property, &coerced.property);
            prop_assert!(matches!(coerced.value, PropertyVal::Text(_)));
        }
    }

    /// Property: with a full catalog every update key lands in the output
    #[test]
    fn prop_full_catalog_resolves_every_key(updates in generators::update_set()) {
        let resolved = catalog::resolve(&standard_catalog());
        let out = reconcile(&[], &updates, &resolved);

        prop_assert_eq!(out.typed.len(), updates.len());
        prop_assert!(out.skipped.is_empty());
    }
}

#[cfg(test)]
mod additional_tests {
    use super::*;
    use std::collections::BTreeMap;

    #[test]
    fn test_reconcile_against_empty_catalog_skips_everything() {
        let resolved = catalog::resolve(&[]);
        let mut updates = BTreeMap::new();
        updates.insert(LogicalKey::Bookable, PropertyVal::Bool(true));
        updates.insert(LogicalKey::Language, PropertyVal::Text("en-US".to_string()));

        let out = reconcile(&[], &updates, &resolved);

        assert!(out.typed.is_empty());
        assert!(out.coerced.is_empty());
        assert_eq!(out.skipped.len(), 2);
    }
}
