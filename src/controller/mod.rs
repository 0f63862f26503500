//! # Controller
//!
//! Core controller modules for the Magento provider.
//!
//! - `backoff`: Fibonacci backoff for failed reconciles
//! - `discovery`: selection of the kinds that get a reconciliation loop
//! - `reconciler`: per-object reconciliation against the Magento API

pub mod backoff;
pub mod discovery;
pub mod reconciler;
