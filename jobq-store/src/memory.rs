//! In-process job store.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::error::JobStoreError;
use crate::store::JobStore;
use crate::types::{Job, NewJob};

/// Internal storage optimized for both ordered iteration and lookup by ID.
#[derive(Debug, Default)]
struct MemoryState {
    /// Job IDs in insertion order (oldest first).
    order: Vec<Uuid>,
    jobs: HashMap<Uuid, Job>,
}

impl MemoryState {
    fn insert(&mut self, job: Job) {
        self.order.push(job.job_id);
        self.jobs.insert(job.job_id, job);
    }

    fn fresh_id(&self) -> Uuid {
        loop {
            let id = Uuid::new_v4();
            if !self.jobs.contains_key(&id) {
                return id;
            }
        }
    }
}

/// A [`JobStore`] that keeps jobs in memory.
///
/// Honors the same contract as the SQL store (store-assigned identifiers,
/// `pending` status, store-side timestamps), which makes it a drop-in fake
/// for handler tests. Nothing survives a restart.
#[derive(Clone, Default)]
pub struct MemoryJobStore {
    state: Arc<RwLock<MemoryState>>,
}

impl fmt::Debug for MemoryJobStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MemoryJobStore")
            .field("state", &"<RwLock<MemoryState>>")
            .finish()
    }
}

impl MemoryJobStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Get a stored job by ID.
    pub async fn get(&self, job_id: Uuid) -> Option<Job> {
        let state = self.state.read().await;
        state.jobs.get(&job_id).cloned()
    }

    /// Snapshot of every stored job, oldest first.
    pub async fn jobs(&self) -> Vec<Job> {
        let state = self.state.read().await;
        state
            .order
            .iter()
            .filter_map(|id| state.jobs.get(id))
            .cloned()
            .collect()
    }

    pub async fn len(&self) -> usize {
        self.state.read().await.jobs.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

#[async_trait]
impl JobStore for MemoryJobStore {
    async fn insert_job(&self, job: &NewJob) -> Result<Uuid, JobStoreError> {
        let mut state = self.state.write().await;
        let job_id = state.fresh_id();
        state.insert(Job::pending(job_id, job, Utc::now()));
        Ok(job_id)
    }
}
