//! Observability: metrics definitions and HTTP instrumentation.

pub mod metrics;
