//! # Constants
//!
//! Shared constants used throughout the provider.
//!
//! These values represent reasonable defaults and can be overridden via
//! configuration or environment variables where applicable.

/// API group every managed kind and provider config lives in
pub const API_GROUP: &str = "magento.web7.md";

/// API version of the managed kinds reconciled by this provider
pub const API_VERSION: &str = "v1alpha1";

/// Annotation holding the identifier the Magento API assigned to a resource
pub const EXTERNAL_ID_ANNOTATION: &str = "external-id";

/// Finalizer that keeps a managed resource around until its external
/// counterpart has been deleted
pub const FINALIZER: &str = "finalizer.managedresource.magento.web7.md";

/// Field manager used for every patch the provider sends
pub const FIELD_MANAGER: &str = "provider-magento";

/// Name of the ProviderConfig used when a managed resource does not reference one
pub const DEFAULT_PROVIDER_CONFIG_NAME: &str = "default";

/// Prefix of every REST collection path
pub const REST_PREFIX: &str = "/rest";

/// Kind name fragments that mark structural or ancillary types
pub const EXCLUDED_KIND_FRAGMENTS: [&str; 4] = ["List", "Event", "Options", "Config"];

/// Default HTTP server port for metrics and health probes
pub const DEFAULT_METRICS_PORT: u16 = 8080;

/// Default HTTP server startup timeout (how long to wait for server to be ready)
pub const DEFAULT_SERVER_STARTUP_TIMEOUT_SECS: u64 = 10;

/// Default HTTP server readiness poll interval
pub const DEFAULT_SERVER_POLL_INTERVAL_MS: u64 = 50;

/// Default interval between forced re-observations of a managed resource (seconds)
pub const DEFAULT_POLL_INTERVAL_SECS: u64 = 60;

/// Default global cap on reconciles started per second, across all kinds
pub const DEFAULT_MAX_RECONCILE_RATE: u32 = 10;

/// Default number of reconciles a single kind controller may run at once
pub const DEFAULT_MAX_CONCURRENT_RECONCILIATIONS: u16 = 10;

/// Default Fibonacci backoff floor after a failed reconcile (seconds)
pub const DEFAULT_BACKOFF_MIN_SECS: u64 = 1;

/// Default Fibonacci backoff ceiling after a failed reconcile (seconds)
pub const DEFAULT_BACKOFF_MAX_SECS: u64 = 300;
