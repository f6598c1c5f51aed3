//! Property Test: Value Canonicalization and String Coercion
//!
//! This property test verifies the two write encodings of a property value:
//! - Canonicalization maps the empty string to null and nothing else
//! - String coercion is total and matches the documented forms

use fleetbridge_backend::domain::PropertyVal;
use fleetbridge_backend::test_utils::generators;
use proptest::prelude::*;

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    /// Property: canonicalization only rewrites the empty string
    #[test]
    fn prop_canonicalize_touches_only_empty_string(value in generators::property_val()) {
        let canonical = value.clone().canonicalize();
        match &value {
            PropertyVal::Text(s) if s.is_empty() => {
                prop_assert_eq!(canonical, PropertyVal::Null)
            }
            _ => prop_assert_eq!(canonical, value),
        }
    }

    /// Property: canonicalization is idempotent
    #[test]
    fn prop_canonicalize_is_idempotent(value in generators::property_val()) {
        let once = value.canonicalize();
        let twice = once.clone().canonicalize();
        prop_assert_eq!(once, twice);
    }

    /// Property: coercion of a coerced value is the identity on text
    #[test]
    fn prop_coercion_stabilizes(value in generators::property_val()) {
        let coerced = PropertyVal::Text(value.coerce_string());
        prop_assert_eq!(coerced.coerce_string(), value.coerce_string());
    }

    /// Property: integer coercion is the decimal form
    #[test]
    fn prop_int_coercion_is_decimal(n in -100_000i64..100_000) {
        prop_assert_eq!(PropertyVal::Int(n).coerce_string(), n.to_string());
    }
}

#[cfg(test)]
mod additional_tests {
    use super::*;

    #[test]
    fn test_documented_coercion_forms() {
        assert_eq!(PropertyVal::Bool(true).coerce_string(), "true");
        assert_eq!(PropertyVal::Bool(false).coerce_string(), "false");
        assert_eq!(PropertyVal::Int(0).coerce_string(), "0");
        assert_eq!(PropertyVal::Int(-7).coerce_string(), "-7");
        // Float-literal inputs keep their fractional point even when whole
        assert_eq!(PropertyVal::Float(2.0).coerce_string(), "2.0");
        assert_eq!(PropertyVal::Float(2.5).coerce_string(), "2.5");
        assert_eq!(PropertyVal::Null.coerce_string(), "");
        assert_eq!(
            PropertyVal::Text("en-US".to_string()).coerce_string(),
            "en-US"
        );
    }

    #[test]
    fn test_empty_string_encodings_diverge() {
        // Typed encoding stores null, coerced encoding stores ""
        let incoming = PropertyVal::Text(String::new());
        let typed = incoming.clone().canonicalize();
        let coerced = PropertyVal::Text(typed.coerce_string());

        assert_eq!(typed, PropertyVal::Null);
        assert_eq!(coerced, PropertyVal::Text(String::new()));
    }
}
