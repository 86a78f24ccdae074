//! Property-based tests for structured-logger.
//!
//! These tests verify routing and metric invariants across generated inputs.

use proptest::prelude::*;
use std::sync::Arc;
use structured_logger::{Attributes, Environment, MetricTags, StructuredLogger};
use test_utils::fixtures::SampleRequestError;
use test_utils::{
    FailingMetrics, Journal, RecordingConsole, RecordingMetrics, RecordingSink, attributes_strategy,
    context_strategy, message_strategy, metric_name_strategy, metric_unit_strategy,
    metric_value_strategy, raw_error_strategy, tags_strategy,
};

fn recording_logger(context: &str, environment: Environment) -> (StructuredLogger, Journal, RecordingSink) {
    let journal = Journal::new();
    let sink = RecordingSink::with_journal(journal.clone());
    let logger = StructuredLogger::builder(context)
        .environment(environment)
        .console(Arc::new(RecordingConsole::with_journal(journal.clone())))
        .sink(Arc::new(sink.clone()))
        .build()
        .unwrap();
    (logger, journal, sink)
}

#[derive(Debug, Clone, Copy)]
enum Call {
    Debug,
    Info,
    Warn,
    Error,
}

fn call_strategy() -> impl Strategy<Value = Call> {
    prop_oneof![
        Just(Call::Debug),
        Just(Call::Info),
        Just(Call::Warn),
        Just(Call::Error),
    ]
}

fn environment_strategy() -> impl Strategy<Value = Environment> {
    prop_oneof![
        Just(Environment::Development),
        Just(Environment::Production),
        Just(Environment::Test),
    ]
}

// Every non-debug call yields one console write and one breadcrumb; warn and
// error add exactly one captured message; debug is silent outside development.
proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    #[test]
    fn prop_level_routing(
        context in context_strategy(),
        environment in environment_strategy(),
        call in call_strategy(),
        message in message_strategy(),
        attributes in attributes_strategy(),
    ) {
        let (logger, journal, _) = recording_logger(&context, environment);

        match call {
            Call::Debug => logger.debug(message.clone(), Some(attributes)),
            Call::Info => logger.info(message.clone(), Some(attributes)),
            Call::Warn => logger.warn(message.clone(), Some(attributes)),
            Call::Error => logger.error(message.clone(), None, Some(attributes)),
        }

        let expected: Vec<&str> = match call {
            Call::Debug if !environment.is_development() => vec![],
            Call::Debug | Call::Info => vec!["console", "breadcrumb"],
            Call::Warn | Call::Error => vec!["console", "breadcrumb", "message"],
        };
        prop_assert_eq!(journal.kinds(), expected);
    }

    #[test]
    fn prop_caller_attributes_reach_breadcrumb(
        context in context_strategy(),
        message in message_strategy(),
        attributes in attributes_strategy(),
    ) {
        let (logger, _, sink) = recording_logger(&context, Environment::Production);

        logger.info(message.clone(), Some(attributes.clone()));

        let crumb = &sink.breadcrumbs()[0];
        prop_assert_eq!(&crumb.category, &context.to_lowercase());
        prop_assert_eq!(&crumb.message, &message);
        for (key, value) in attributes.iter() {
            prop_assert_eq!(crumb.data.get(key), Some(value));
        }
    }
}

// Exceptions are captured if and only if the error value is structured.
proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    #[test]
    fn prop_raw_values_never_capture_exceptions(
        message in message_strategy(),
        raw in raw_error_strategy(),
    ) {
        let (logger, _, sink) = recording_logger("API", Environment::Production);

        logger.error(message, Some(raw), None);

        prop_assert_eq!(sink.messages().len(), 1);
        prop_assert!(sink.exceptions().is_empty());
    }

    #[test]
    fn prop_structured_errors_capture_one_exception(
        message in message_strategy(),
        status in 400u16..600,
    ) {
        let (logger, _, sink) = recording_logger("API", Environment::Production);
        let err = SampleRequestError::new(status);

        logger.error(message, Some(structured_logger::ErrorValue::from_error(&err)), Some(Attributes::new()));

        prop_assert_eq!(sink.messages().len(), 1);
        prop_assert_eq!(sink.exceptions().len(), 1);
        prop_assert_eq!(&sink.exceptions()[0].error.message, &err.to_string());
    }
}

// Metric names are namespaced by the lowercased context and tagged with it;
// a failing backend never surfaces.
proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    #[test]
    fn prop_metric_namespacing(
        context in context_strategy(),
        metric in metric_name_strategy(),
        value in metric_value_strategy(),
        tags in tags_strategy(),
    ) {
        let metrics = RecordingMetrics::new();
        let logger = StructuredLogger::builder(&context)
            .environment(Environment::Production)
            .sink(Arc::new(RecordingSink::new()))
            .metrics(Arc::new(metrics.clone()))
            .build()
            .unwrap();

        logger.track_gauge(&metric, value, Some(tags.clone()));

        let sample = &metrics.samples()[0];
        prop_assert_eq!(&sample.name, &format!("{}.{}", context.to_lowercase(), metric));
        prop_assert_eq!(sample.tags.get("context"), Some(&context));
        for (key, value) in tags.iter().filter(|(k, _)| k.as_str() != "context") {
            prop_assert_eq!(sample.tags.get(key), Some(value));
        }
    }

    #[test]
    fn prop_failing_metrics_never_panic(
        metric in metric_name_strategy(),
        value in metric_value_strategy(),
        unit in metric_unit_strategy(),
        tags in tags_strategy(),
    ) {
        let logger = StructuredLogger::builder("API")
            .environment(Environment::Production)
            .sink(Arc::new(RecordingSink::new()))
            .metrics(Arc::new(FailingMetrics))
            .build()
            .unwrap();

        logger.track_counter(&metric, value, Some(tags.clone()));
        logger.track_gauge(&metric, value, Some(tags.clone()));
        logger.track_distribution(&metric, value, Some(unit), Some(tags));
        logger.track_counter(&metric, value, Some(MetricTags::new()));
    }
}

// A failing span hands back the original error, whatever its status.
proptest! {
    #![proptest_config(ProptestConfig::with_cases(50))]

    #[test]
    fn prop_span_failure_preserves_error(status in 400u16..600) {
        let rt = tokio::runtime::Runtime::new().unwrap();
        rt.block_on(async {
            let (logger, _, sink) = recording_logger("API", Environment::Production);

            let result: Result<(), SampleRequestError> = logger
                .start_span("op", "task", || async move { Err(SampleRequestError::new(status)) })
                .await;

            prop_assert_eq!(result, Err(SampleRequestError::new(status)));
            prop_assert_eq!(sink.exceptions().len(), 1);
            Ok(())
        })?;
    }
}
