//! # Managed Reconciler
//!
//! Drives one managed resource toward its desired state:
//!
//! 1. Being deleted: mark `Deleting`, delete the external resource unless the
//!    deletion policy is `Orphan`, release the finalizer.
//! 2. Otherwise add the finalizer and observe the external resource.
//! 3. No `external-id`: adopt a same-named external resource if the adapter
//!    finds one, otherwise create it. Either way the id lands in the
//!    `external-id` annotation and nothing else is sent this pass.
//! 4. Present but drifted: update it with the full `forProvider`.
//!
//! The outcome of every pass is reported as the `Synced` condition.

use super::status::{persist_changes, StatusWriter};
use crate::crd::{Condition, DeletionPolicy, ManagedResource};
use crate::error::Result;
use crate::external::ExternalAdapter;
use crate::translator::{external_id_of, ExternalResource};
use tracing::{debug, info};

/// What Observe learned about the external resource
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExternalObservation {
    pub resource_exists: bool,
    pub resource_up_to_date: bool,
    /// The id was just learned from a name lookup
    pub adopted: bool,
}

/// What a reconcile pass did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReconcileOutcome {
    /// External resource exists and matches
    Observed,
    Created,
    /// `external-id` recovered from an existing external resource
    Adopted,
    Updated,
    /// External resource deleted and finalizer released
    Deleted,
    /// Finalizer released without touching the external resource
    Orphaned,
}

impl ReconcileOutcome {
    /// The managed resource is about to disappear
    #[must_use]
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Deleted | Self::Orphaned)
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Observed => "observed",
            Self::Created => "created",
            Self::Adopted => "adopted",
            Self::Updated => "updated",
            Self::Deleted => "deleted",
            Self::Orphaned => "orphaned",
        }
    }
}

pub struct ManagedReconciler<'a> {
    adapter: &'a dyn ExternalAdapter,
    writer: &'a dyn StatusWriter,
}

impl std::fmt::Debug for ManagedReconciler<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ManagedReconciler")
            .field("adapter", &self.adapter)
            .finish_non_exhaustive()
    }
}

impl<'a> ManagedReconciler<'a> {
    #[must_use]
    pub fn new(adapter: &'a dyn ExternalAdapter, writer: &'a dyn StatusWriter) -> Self {
        Self { adapter, writer }
    }

    /// Run one reconcile pass over `mr`
    ///
    /// `mr` is updated in place with everything that was persisted.
    ///
    /// # Errors
    ///
    /// Returns the first adapter or persistence error; `Synced=False` carrying
    /// its message has been written by then when possible.
    pub async fn reconcile(&self, mr: &mut ManagedResource) -> Result<ReconcileOutcome> {
        let mut persisted = mr.clone();
        let result = self.drive(mr, &mut persisted).await;

        match result {
            Ok(outcome) if outcome.is_terminal() => Ok(outcome),
            Ok(outcome) => {
                mr.set_condition(Condition::reconcile_success());
                persist_changes(self.writer, mr, &mut persisted).await?;
                Ok(outcome)
            }
            Err(e) => {
                mr.set_condition(Condition::reconcile_error(e.to_string()));
                if let Err(persist_error) = persist_changes(self.writer, mr, &mut persisted).await {
                    debug!(error = %persist_error, "Could not record reconcile error");
                }
                Err(e)
            }
        }
    }

    async fn drive(
        &self,
        mr: &mut ManagedResource,
        persisted: &mut ManagedResource,
    ) -> Result<ReconcileOutcome> {
        if mr.is_being_deleted() {
            return self.delete(mr, persisted).await;
        }

        if mr.add_finalizer() {
            persist_changes(self.writer, mr, persisted).await?;
        }

        let observation = self.observe(mr).await?;
        if !observation.resource_exists {
            self.create(mr, persisted).await?;
            return Ok(ReconcileOutcome::Created);
        }

        // Drift on an adopted resource is handled once the id is persisted
        if observation.adopted {
            persist_changes(self.writer, mr, persisted).await?;
            return Ok(ReconcileOutcome::Adopted);
        }

        if !observation.resource_up_to_date {
            info!(resource = %mr.display_ref(), external_id = %mr.external_id(), "Updating external resource");
            self.adapter.update(mr.external_id(), mr).await?;
            persist_changes(self.writer, mr, persisted).await?;
            return Ok(ReconcileOutcome::Updated);
        }

        persist_changes(self.writer, mr, persisted).await?;
        Ok(ReconcileOutcome::Observed)
    }

    /// Look at the external resource behind `mr`
    ///
    /// On success `atProvider` holds the observed attributes and `Ready` is
    /// `Available`. A resource without `external-id` is adopted when the
    /// adapter finds one with the same name; the observation is then marked
    /// `adopted` and never reports drift.
    ///
    /// # Errors
    ///
    /// Any `get` failure, with `Ready` set to `Unavailable`.
    pub async fn observe(&self, mr: &mut ManagedResource) -> Result<ExternalObservation> {
        if mr.external_id().is_empty() {
            return match self.adapter.find_by_name(mr).await? {
                Some(found) => {
                    let id = external_id_of(&found)?;
                    info!(resource = %mr.display_ref(), external_id = %id, "Adopting existing external resource");
                    mr.set_external_id(id);
                    mr.at_provider = found;
                    mr.set_condition(Condition::available());
                    Ok(ExternalObservation {
                        resource_exists: true,
                        resource_up_to_date: true,
                        adopted: true,
                    })
                }
                None => {
                    debug!(resource = %mr.display_ref(), "No external resource yet");
                    Ok(ExternalObservation::default())
                }
            };
        }

        let observed = match self.adapter.get(mr.external_id()).await {
            Ok(found) => found,
            Err(e) => {
                mr.set_condition(Condition::unavailable());
                return Err(e);
            }
        };

        let up_to_date = self.adapter.is_up_to_date(Some(&observed), Some(&*mr))?;
        mr.at_provider = observed;
        mr.set_condition(Condition::available());
        Ok(ExternalObservation {
            resource_exists: true,
            resource_up_to_date: up_to_date,
            adopted: false,
        })
    }

    async fn create(&self, mr: &mut ManagedResource, persisted: &mut ManagedResource) -> Result<()> {
        mr.set_condition(Condition::creating());
        persist_changes(self.writer, mr, persisted).await?;

        let created: ExternalResource = self.adapter.create(mr).await?;
        let id = external_id_of(&created)?;
        info!(resource = %mr.display_ref(), external_id = %id, "Created external resource");

        mr.set_external_id(id);
        mr.at_provider = created;
        mr.set_condition(Condition::available());
        persist_changes(self.writer, mr, persisted).await
    }

    async fn delete(
        &self,
        mr: &mut ManagedResource,
        persisted: &mut ManagedResource,
    ) -> Result<ReconcileOutcome> {
        if !mr.has_finalizer() {
            return Ok(ReconcileOutcome::Orphaned);
        }

        mr.set_condition(Condition::deleting());
        persist_changes(self.writer, mr, persisted).await?;

        let external_id = mr.external_id().to_string();
        let outcome = if mr.deletion_policy == DeletionPolicy::Orphan {
            info!(resource = %mr.display_ref(), external_id = %external_id, "Orphaning external resource");
            ReconcileOutcome::Orphaned
        } else {
            if !external_id.is_empty() {
                info!(resource = %mr.display_ref(), external_id = %external_id, "Deleting external resource");
                self.adapter.delete(&external_id).await?;
            }
            ReconcileOutcome::Deleted
        };

        mr.remove_finalizer();
        persist_changes(self.writer, mr, persisted).await?;
        Ok(outcome)
    }
}
