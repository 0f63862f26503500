//! # Runtime
//!
//! Startup, the per-kind watch loops, and the requeue policy for failures.

pub mod error_policy;
pub mod initialization;
pub mod rate_limiter;
pub mod watch_loop;

pub use initialization::{init_tracing, initialize, InitializationResult};
pub use rate_limiter::GlobalRateLimiter;
pub use watch_loop::run_watch_loop;
