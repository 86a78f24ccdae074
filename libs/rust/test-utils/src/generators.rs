//! Shared proptest generators for logger tests.

use proptest::prelude::*;
use structured_logger::{Attributes, ErrorValue, MetricTags, MetricUnit};

/// Generate context labels such as `API` or `Performance`.
pub fn context_strategy() -> impl Strategy<Value = String> {
    prop_oneof![
        Just("API".to_string()),
        Just("UI".to_string()),
        Just("Performance".to_string()),
        "[A-Z][A-Za-z]{1,15}",
    ]
}

/// Generate log messages.
pub fn message_strategy() -> impl Strategy<Value = String> {
    "[a-zA-Z0-9 ]{1,80}"
}

/// Generate span and metric names.
pub fn metric_name_strategy() -> impl Strategy<Value = String> {
    "[a-z][a-z_]{1,15}(\\.[a-z][a-z_]{1,15}){0,2}"
}

/// Generate attribute sets with unique keys.
pub fn attributes_strategy() -> impl Strategy<Value = Attributes> {
    prop::collection::btree_map(
        "[a-z][a-z_]{0,12}",
        prop_oneof![
            any::<i64>().prop_map(serde_json::Value::from),
            any::<bool>().prop_map(serde_json::Value::from),
            "[a-zA-Z0-9 /.-]{0,30}".prop_map(serde_json::Value::from),
        ],
        0..6,
    )
    .prop_map(|map| map.into_iter().collect())
}

/// Generate metric tag sets.
pub fn tags_strategy() -> impl Strategy<Value = MetricTags> {
    prop::collection::btree_map("[a-z][a-z_]{0,12}", "[a-zA-Z0-9/._-]{1,20}", 0..4)
}

/// Generate raw (non-error) values passed to `error`.
pub fn raw_error_strategy() -> impl Strategy<Value = ErrorValue> {
    prop_oneof![
        "[a-zA-Z0-9 ]{0,40}".prop_map(ErrorValue::raw),
        any::<i64>().prop_map(ErrorValue::raw),
        Just(ErrorValue::raw(serde_json::Value::Null)),
    ]
}

/// Generate finite metric values.
pub fn metric_value_strategy() -> impl Strategy<Value = f64> {
    prop_oneof![0.0f64..10_000.0, -10_000.0f64..0.0]
}

/// Generate metric units.
pub fn metric_unit_strategy() -> impl Strategy<Value = MetricUnit> {
    prop_oneof![
        Just(MetricUnit::None),
        Just(MetricUnit::Millisecond),
        Just(MetricUnit::Second),
        Just(MetricUnit::Byte),
        Just(MetricUnit::Character),
        "[a-z]{3,10}".prop_map(MetricUnit::Custom),
    ]
}

/// Generate valid HTTP status codes.
pub fn http_status_code_strategy() -> impl Strategy<Value = u16> {
    prop_oneof![
        Just(200u16),
        Just(201u16),
        Just(204u16),
        Just(400u16),
        Just(404u16),
        Just(429u16),
        Just(500u16),
        Just(502u16),
        Just(503u16),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::strategy::ValueTree;
    use proptest::test_runner::TestRunner;

    #[test]
    fn test_metric_name_format() {
        let mut runner = TestRunner::default();
        for _ in 0..10 {
            let value = metric_name_strategy()
                .new_tree(&mut runner)
                .unwrap()
                .current();
            assert!(!value.is_empty());
            assert!(value.chars().next().unwrap().is_ascii_lowercase());
        }
    }

    #[test]
    fn test_context_never_blank() {
        let mut runner = TestRunner::default();
        for _ in 0..10 {
            let value = context_strategy().new_tree(&mut runner).unwrap().current();
            assert!(!value.trim().is_empty());
        }
    }

    #[test]
    fn test_raw_errors_are_not_structured() {
        let mut runner = TestRunner::default();
        for _ in 0..10 {
            let value = raw_error_strategy().new_tree(&mut runner).unwrap().current();
            assert!(!value.is_structured());
        }
    }
}
