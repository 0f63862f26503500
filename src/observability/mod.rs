//! # Observability
//!
//! Prometheus metrics for the provider. Logging goes through `tracing` and
//! is configured in [`crate::runtime::initialization`].

pub mod metrics;

// Re-export for convenience
pub use metrics::*;
