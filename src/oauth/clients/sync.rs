//! Startup reconciliation of configured OAuth clients against the client registry.
//!
//! A run upserts every valid definition in input order, then removes every
//! registry record whose client id was not part of the run. The final
//! registry contents depend only on the definition list, so repeated runs
//! with the same list converge on the same state.

use crate::errors::{DefinitionError, StorageError, SyncError};
use crate::oauth::clients::descriptor::build_descriptor;
use crate::oauth::clients::validation::validate_client_definition;
use crate::oauth::types::{ClientDefinition, ClientDescriptor, RegisteredClient};
use crate::storage::traits::ClientRegistry;
use futures::TryStreamExt;
use std::collections::HashSet;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// How a sync run ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SyncStatus {
    #[default]
    Completed,
    /// Shutdown was requested; the run stopped between registry operations
    Cancelled,
}

/// A definition that was left out of the run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedClient {
    /// Position of the definition in the input list
    pub index: usize,
    /// Configured client id, possibly blank
    pub client_id: String,
    pub reason: DefinitionError,
}

/// Per-item outcome of a sync run
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SyncReport {
    pub status: SyncStatus,
    pub created: Vec<String>,
    pub updated: Vec<String>,
    pub skipped: Vec<SkippedClient>,
    pub removed: Vec<String>,
}

impl SyncReport {
    pub fn is_cancelled(&self) -> bool {
        self.status == SyncStatus::Cancelled
    }

    fn cancelled(mut self) -> Self {
        self.status = SyncStatus::Cancelled;
        self
    }
}

/// Converges the client registry onto a list of client definitions.
pub struct ClientSyncService {
    registry: Arc<dyn ClientRegistry>,
}

impl ClientSyncService {
    /// Create a new sync service over the given registry
    pub fn new(registry: Arc<dyn ClientRegistry>) -> Self {
        Self { registry }
    }

    /// Run one reconciliation pass.
    ///
    /// Invalid definitions and definitions requesting unsupported grants are
    /// skipped and reported. Any registry failure aborts the run, since the
    /// registry state is then unknown. The cancellation token is checked
    /// between registry operations; an operation already started is awaited.
    pub async fn run(
        &self,
        definitions: &[ClientDefinition],
        cancel: &CancellationToken,
    ) -> Result<SyncReport, SyncError> {
        let mut report = SyncReport::default();
        let mut desired: HashSet<String> = HashSet::new();

        for (index, definition) in definitions.iter().enumerate() {
            if cancel.is_cancelled() {
                tracing::warn!(processed = index, "client sync cancelled");
                return Ok(report.cancelled());
            }

            let descriptor = match validate_client_definition(definition)
                .and_then(|()| build_descriptor(definition))
            {
                Ok(descriptor) => descriptor,
                Err(reason) => {
                    match &reason {
                        DefinitionError::UnsupportedGrantType { .. } => tracing::error!(
                            index,
                            client_id = %definition.client_id,
                            error = %reason,
                            "skipping OAuth client"
                        ),
                        _ => tracing::warn!(
                            index,
                            client_id = %definition.client_id,
                            error = %reason,
                            "skipping OAuth client with missing client id or client secret"
                        ),
                    }
                    report.skipped.push(SkippedClient {
                        index,
                        client_id: definition.client_id.clone(),
                        reason,
                    });
                    continue;
                }
            };

            desired.insert(descriptor.client_id.clone());
            self.upsert_client(&descriptor, &mut report).await?;
        }

        if cancel.is_cancelled() {
            tracing::warn!("client sync cancelled before orphan removal");
            return Ok(report.cancelled());
        }

        if !self.remove_orphaned_clients(&desired, cancel, &mut report).await? {
            tracing::warn!("client sync cancelled during orphan removal");
            return Ok(report.cancelled());
        }

        tracing::info!(
            created = report.created.len(),
            updated = report.updated.len(),
            skipped = report.skipped.len(),
            removed = report.removed.len(),
            "client sync complete"
        );

        Ok(report)
    }

    async fn upsert_client(
        &self,
        descriptor: &ClientDescriptor,
        report: &mut SyncReport,
    ) -> Result<(), SyncError> {
        let existing = self
            .registry
            .find_by_client_id(&descriptor.client_id)
            .await
            .map_err(registry_error("find_by_client_id"))?;

        match existing {
            Some(existing) => {
                self.registry
                    .update(&existing, descriptor)
                    .await
                    .map_err(registry_error("update"))?;
                tracing::info!(client_id = %descriptor.client_id, "updated OAuth client");
                report.updated.push(descriptor.client_id.clone());
            }
            None => {
                self.registry
                    .create(descriptor)
                    .await
                    .map_err(registry_error("create"))?;
                tracing::info!(client_id = %descriptor.client_id, "created OAuth client");
                report.created.push(descriptor.client_id.clone());
            }
        }

        Ok(())
    }

    /// Delete every record outside the desired set. Returns `false` when the
    /// run was cancelled part way through.
    async fn remove_orphaned_clients(
        &self,
        desired: &HashSet<String>,
        cancel: &CancellationToken,
        report: &mut SyncReport,
    ) -> Result<bool, SyncError> {
        // Drain the listing first so no cursor stays open across deletes.
        let orphans: Vec<RegisteredClient> = self
            .registry
            .list_all()
            .try_filter(|client| futures::future::ready(!desired.contains(&client.client_id)))
            .try_collect()
            .await
            .map_err(registry_error("list_all"))?;

        for orphan in orphans {
            if cancel.is_cancelled() {
                return Ok(false);
            }

            self.registry
                .delete(&orphan)
                .await
                .map_err(registry_error("delete"))?;
            tracing::info!(client_id = %orphan.client_id, "removed OAuth client");
            report.removed.push(orphan.client_id);
        }

        Ok(true)
    }
}

fn registry_error(operation: &'static str) -> impl FnOnce(StorageError) -> SyncError {
    move |source| SyncError::Registry { operation, source }
}
