//! Collaborator traits injected into the analysis engine.

pub mod sinks;

pub use sinks::{
    ErrorSink, InMemoryErrorSink, InMemoryMetricsSink, MetricsSink, NoopErrorSink,
    NoopMetricsSink, ReportedError,
};
