//! # Types
//!
//! Shared state for every kind controller.

use crate::config::ControllerConfig;
use crate::connector::Connector;
use crate::controller::backoff::FibonacciBackoff;
use crate::controller::discovery::ManagedKind;
use crate::error::ProviderError;
use crate::external::AdapterRegistry;
use crate::runtime::rate_limiter::GlobalRateLimiter;
use kube::runtime::events::Recorder;
use kube::Client;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ReconcilerError {
    #[error(transparent)]
    Provider(#[from] ProviderError),
}

impl ReconcilerError {
    /// Short label used as the `reason` metric dimension
    #[must_use]
    pub fn reason(&self) -> &'static str {
        match self {
            ReconcilerError::Provider(e) => e.reason(),
        }
    }
}

/// Backoff state for a specific managed resource
#[derive(Debug, Clone)]
pub struct BackoffState {
    pub backoff: FibonacciBackoff,
    pub error_count: u32,
}

impl BackoffState {
    #[must_use]
    pub fn new(config: &ControllerConfig) -> Self {
        Self {
            backoff: FibonacciBackoff::new(config.backoff_min_secs, config.backoff_max_secs),
            error_count: 0,
        }
    }

    pub fn increment_error(&mut self) {
        self.error_count = self.error_count.saturating_add(1);
    }

    pub fn reset(&mut self) {
        self.error_count = 0;
        self.backoff.reset();
    }
}

/// Per-object backoff states, keyed by `kind/name`
#[derive(Debug, Clone, Default)]
pub struct BackoffStates {
    states: Arc<Mutex<HashMap<String, BackoffState>>>,
}

impl BackoffStates {
    /// Count one more error for `key` and return `(delay_secs, error_count)`
    ///
    /// `None` when the map is poisoned.
    #[must_use]
    pub fn record_error(&self, key: &str, config: &ControllerConfig) -> Option<(u64, u32)> {
        let mut states = self.states.lock().ok()?;
        let state = states
            .entry(key.to_string())
            .or_insert_with(|| BackoffState::new(config));
        state.increment_error();
        Some((state.backoff.next_backoff_seconds(), state.error_count))
    }

    /// Forget the error history of `key` but keep tracking it
    pub fn reset(&self, key: &str) {
        if let Ok(mut states) = self.states.lock() {
            if let Some(state) = states.get_mut(key) {
                state.reset();
            }
        }
    }

    /// Drop `key` entirely once its object is gone
    pub fn remove(&self, key: &str) {
        if let Ok(mut states) = self.states.lock() {
            states.remove(key);
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.states.lock().map_or(0, |states| states.len())
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// State shared by the controllers of all kinds
#[derive(Clone)]
pub struct Reconciler {
    pub client: Client,
    pub connector: Connector,
    pub adapters: AdapterRegistry,
    pub config: ControllerConfig,
    pub recorder: Recorder,
    pub rate_limiter: Arc<GlobalRateLimiter>,
    pub backoff_states: BackoffStates,
}

impl std::fmt::Debug for Reconciler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Reconciler")
            .field("config", &self.config)
            .field("adapters", &self.adapters)
            .finish_non_exhaustive()
    }
}

impl Reconciler {
    #[must_use]
    pub fn new(
        client: Client,
        connector: Connector,
        adapters: AdapterRegistry,
        config: ControllerConfig,
        recorder: Recorder,
    ) -> Self {
        let rate_limiter = Arc::new(GlobalRateLimiter::new(config.max_reconcile_rate));
        Self {
            client,
            connector,
            adapters,
            config,
            recorder,
            rate_limiter,
            backoff_states: BackoffStates::default(),
        }
    }

    /// Forget the error history of a resource after a successful reconcile
    pub fn reset_backoff(&self, key: &str) {
        self.backoff_states.reset(key);
    }

    /// Stop tracking a resource whose object is being removed
    pub fn forget_backoff(&self, key: &str) {
        self.backoff_states.remove(key);
    }
}

/// Context handed to the controller of one kind
#[derive(Debug, Clone)]
pub struct KindContext {
    pub reconciler: Arc<Reconciler>,
    pub kind: ManagedKind,
}

impl KindContext {
    /// Backoff key of the object `name` of this kind
    #[must_use]
    pub fn backoff_key(&self, name: &str) -> String {
        format!("{}/{}", self.kind.kind(), name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_errors_grow_backoff_until_reset() {
        let config = ControllerConfig::default();
        let states = BackoffStates::default();

        let (_, first_count) = states.record_error("Category/shoes", &config).unwrap();
        let (_, second_count) = states.record_error("Category/shoes", &config).unwrap();
        assert_eq!((first_count, second_count), (1, 2));

        states.reset("Category/shoes");
        let (_, count) = states.record_error("Category/shoes", &config).unwrap();
        assert_eq!(count, 1);
        assert_eq!(states.len(), 1);
    }

    #[test]
    fn test_removed_objects_are_not_retained() {
        let config = ControllerConfig::default();
        let states = BackoffStates::default();
        let _ = states.record_error("Category/shoes", &config);
        let _ = states.record_error("Category/boots", &config);

        states.remove("Category/shoes");

        assert_eq!(states.len(), 1);
        states.remove("Category/boots");
        assert!(states.is_empty());
    }
}
