//! # Conditions
//!
//! Status conditions written onto managed resources.
//!
//! Two condition types are maintained: `Ready` reports the lifecycle of the
//! external resource, `Synced` reports the outcome of the last reconcile.

use serde::{Deserialize, Serialize};

pub const TYPE_READY: &str = "Ready";
pub const TYPE_SYNCED: &str = "Synced";

pub const REASON_AVAILABLE: &str = "Available";
pub const REASON_CREATING: &str = "Creating";
pub const REASON_DELETING: &str = "Deleting";
pub const REASON_UNAVAILABLE: &str = "Unavailable";
pub const REASON_RECONCILE_SUCCESS: &str = "ReconcileSuccess";
pub const REASON_RECONCILE_ERROR: &str = "ReconcileError";

/// Condition represents a condition of a resource
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize, schemars::JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct Condition {
    /// Type of condition
    pub r#type: String,
    /// Status of the condition (True, False, Unknown)
    pub status: String,
    /// Last transition time
    #[serde(default)]
    pub last_transition_time: Option<String>,
    /// Reason for the condition
    #[serde(default)]
    pub reason: Option<String>,
    /// Message describing the condition
    #[serde(default)]
    pub message: Option<String>,
}

impl Condition {
    fn new(r#type: &str, status: bool, reason: &str, message: Option<String>) -> Self {
        Self {
            r#type: r#type.to_string(),
            status: if status { "True" } else { "False" }.to_string(),
            last_transition_time: Some(chrono::Utc::now().to_rfc3339()),
            reason: Some(reason.to_string()),
            message,
        }
    }

    /// The external resource exists and was observed
    #[must_use]
    pub fn available() -> Self {
        Self::new(TYPE_READY, true, REASON_AVAILABLE, None)
    }

    /// The external resource is being created
    #[must_use]
    pub fn creating() -> Self {
        Self::new(TYPE_READY, false, REASON_CREATING, None)
    }

    /// The external resource is being deleted
    #[must_use]
    pub fn deleting() -> Self {
        Self::new(TYPE_READY, false, REASON_DELETING, None)
    }

    /// The external resource could not be observed
    #[must_use]
    pub fn unavailable() -> Self {
        Self::new(TYPE_READY, false, REASON_UNAVAILABLE, None)
    }

    #[must_use]
    pub fn reconcile_success() -> Self {
        Self::new(TYPE_SYNCED, true, REASON_RECONCILE_SUCCESS, None)
    }

    #[must_use]
    pub fn reconcile_error(message: impl Into<String>) -> Self {
        Self::new(TYPE_SYNCED, false, REASON_RECONCILE_ERROR, Some(message.into()))
    }

    /// Whether two conditions carry the same observation, ignoring the timestamp
    #[must_use]
    pub fn equivalent(&self, other: &Condition) -> bool {
        self.r#type == other.r#type
            && self.status == other.status
            && self.reason == other.reason
            && self.message == other.message
    }

    #[must_use]
    pub fn is_true(&self) -> bool {
        self.status == "True"
    }
}

/// Set a condition by type, keeping one entry per type
///
/// The previous `lastTransitionTime` is kept when the status did not flip.
/// Returns `true` when the stored conditions changed.
pub fn set_condition(conditions: &mut Vec<Condition>, mut condition: Condition) -> bool {
    match conditions.iter_mut().find(|c| c.r#type == condition.r#type) {
        Some(existing) => {
            if existing.equivalent(&condition) {
                return false;
            }
            if existing.status == condition.status {
                condition
                    .last_transition_time
                    .clone_from(&existing.last_transition_time);
            }
            *existing = condition;
            true
        }
        None => {
            conditions.push(condition);
            true
        }
    }
}

/// Find a condition by type
#[must_use]
pub fn find_condition<'a>(conditions: &'a [Condition], r#type: &str) -> Option<&'a Condition> {
    conditions.iter().find(|c| c.r#type == r#type)
}
