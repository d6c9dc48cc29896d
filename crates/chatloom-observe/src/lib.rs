//! Observability setup for Chatloom: structured logging and optional
//! OpenTelemetry export.

pub mod tracing_setup;
