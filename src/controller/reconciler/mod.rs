//! # Reconciler
//!
//! Reconciliation of managed resources of any discovered kind.
//!
//! Each kind controller hands objects to [`reconcile`], which connects to the
//! Magento API with the object's ProviderConfig, picks the kind's adapter and
//! runs the [`ManagedReconciler`] state machine.

pub mod managed;
pub mod reconcile;
pub mod status;
pub mod types;

pub use managed::{ExternalObservation, ManagedReconciler, ReconcileOutcome};
pub use reconcile::reconcile;
pub use status::{persist_changes, KubeStatusWriter, StatusWriter};
pub use types::{BackoffState, BackoffStates, KindContext, Reconciler, ReconcilerError};
