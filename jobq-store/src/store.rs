//! The persistence capability the enqueue path depends on.

use async_trait::async_trait;
use uuid::Uuid;

use crate::error::JobStoreError;
use crate::types::NewJob;

/// Something that can durably record a new pending job.
///
/// Implementations must insert atomically: either the row exists with a
/// fresh identifier, or nothing was written. Identifiers are always chosen
/// by the store, never by the caller.
#[async_trait]
pub trait JobStore: Send + Sync {
    /// Persist `job` with status `pending` and the store's current time,
    /// returning the generated identifier.
    async fn insert_job(&self, job: &NewJob) -> Result<Uuid, JobStoreError>;

    /// Cheap reachability check used by readiness probes.
    async fn ping(&self) -> Result<(), JobStoreError> {
        Ok(())
    }
}
