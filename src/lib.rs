//! Magento Provider Library
//!
//! Reconciles Kubernetes managed resources in `magento.web7.md` against the
//! Magento REST API. Kinds are discovered at startup and each gets its own
//! reconciliation loop; payloads stay untyped so new kinds need no code.
//!
//! ## Quick Start
//!
//! ```rust
//! use provider_magento::prelude::*;
//! ```

pub mod client;
pub mod config;
pub mod connector;
pub mod constants;
pub mod controller;
pub mod crd;
pub mod error;
pub mod external;
pub mod observability;
pub mod prelude;
pub mod runtime;
pub mod server;
pub mod translator;
