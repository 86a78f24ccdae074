//! Property-based tests for cat-facts configuration and fact helpers.

use cat_facts::{CatFact, ServiceConfig, ServiceError};
use proptest::prelude::*;

fn lookup(rate: String) -> impl Fn(&str) -> Option<String> {
    move |name| (name == "LATENCY_INJECTION_RATE").then(|| rate.clone())
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    #[test]
    fn prop_rates_in_unit_interval_accepted(rate in 0.0f64..=1.0) {
        let config = ServiceConfig::from_lookup(lookup(rate.to_string())).unwrap();
        prop_assert!((config.latency.rate - rate).abs() < 1e-12);
    }

    #[test]
    fn prop_rates_above_one_rejected(rate in 1.0001f64..1000.0) {
        let result = ServiceConfig::from_lookup(lookup(rate.to_string()));
        prop_assert!(matches!(result, Err(ServiceError::Config(_))));
    }

    #[test]
    fn prop_preview_is_bounded(fact in "\\PC{0,200}", length in 0u32..500) {
        let fact = CatFact { fact, length };
        let preview = fact.preview();

        let body = preview.strip_suffix("...").unwrap();
        prop_assert!(body.chars().count() <= 50);
        prop_assert!(fact.fact.starts_with(body));
    }

    #[test]
    fn prop_length_category(length in 0u32..500) {
        let fact = CatFact { fact: String::new(), length };
        let expected = if length > 100 { "long" } else { "short" };
        prop_assert_eq!(fact.length_category(), expected);
    }
}
