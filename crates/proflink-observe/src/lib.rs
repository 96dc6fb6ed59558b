//! Observability setup for ProfLink: tracing subscriber and OpenTelemetry export.

pub mod tracing_setup;
