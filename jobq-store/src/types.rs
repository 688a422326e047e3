//! Core types for job submission.

use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::error::{JobStoreError, JobValidationError};

/// Priority recorded when the submitter does not supply one.
pub const DEFAULT_PRIORITY: i32 = 0;

/// Lifecycle state of a job.
///
/// Submission only ever writes [`JobStatus::Pending`]; the remaining states
/// belong to downstream consumers and exist so their rows still decode.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    Pending,
    Running,
    Completed,
    Failed,
}

impl JobStatus {
    #[inline]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Running => "running",
            Self::Completed => "completed",
            Self::Failed => "failed",
        }
    }
}

impl std::fmt::Display for JobStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for JobStatus {
    type Err = JobStoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            "running" => Ok(Self::Running),
            "completed" => Ok(Self::Completed),
            "failed" => Ok(Self::Failed),
            other => Err(JobStoreError::InvalidStatus(other.to_owned())),
        }
    }
}

/// A validated job that has not been persisted yet.
///
/// The only way to obtain one is [`NewJob::new`], so every value handed to a
/// [`JobStore`](crate::JobStore) carries all required fields.
#[derive(Debug, Clone, PartialEq)]
pub struct NewJob {
    queue_name: String,
    job_type: String,
    payload: Value,
    job_priority: i32,
}

impl NewJob {
    /// Validate the required fields together.
    ///
    /// Any empty name or blank payload yields the same combined error; callers
    /// are not told which field was at fault.
    pub fn new(
        queue_name: impl Into<String>,
        job_type: impl Into<String>,
        payload: Value,
    ) -> Result<Self, JobValidationError> {
        let queue_name = queue_name.into();
        let job_type = job_type.into();

        if queue_name.is_empty() || job_type.is_empty() || is_blank_payload(&payload) {
            return Err(JobValidationError::MissingRequiredFields);
        }

        Ok(Self {
            queue_name,
            job_type,
            payload,
            job_priority: DEFAULT_PRIORITY,
        })
    }

    #[inline]
    #[must_use]
    pub fn with_priority(mut self, job_priority: i32) -> Self {
        self.job_priority = job_priority;
        self
    }

    #[inline]
    pub fn queue_name(&self) -> &str {
        &self.queue_name
    }

    #[inline]
    pub fn job_type(&self) -> &str {
        &self.job_type
    }

    #[inline]
    pub fn payload(&self) -> &Value {
        &self.payload
    }

    #[inline]
    pub fn job_priority(&self) -> i32 {
        self.job_priority
    }
}

/// A persisted job row.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Job {
    pub job_id: Uuid,
    pub queue_name: String,
    pub job_type: String,
    pub payload: Value,
    pub job_priority: i32,
    pub job_status: JobStatus,
    pub job_created_at: DateTime<Utc>,
}

impl Job {
    /// Materialise a freshly inserted job: always `pending`.
    pub(crate) fn pending(job_id: Uuid, job: &NewJob, job_created_at: DateTime<Utc>) -> Self {
        Self {
            job_id,
            queue_name: job.queue_name.clone(),
            job_type: job.job_type.clone(),
            payload: job.payload.clone(),
            job_priority: job.job_priority,
            job_status: JobStatus::Pending,
            job_created_at,
        }
    }
}

/// A payload counts as missing when it is absent, `null`, `false`, zero or
/// the empty string. Empty objects and arrays are real payloads.
pub fn is_blank_payload(payload: &Value) -> bool {
    match payload {
        Value::Null => true,
        Value::Bool(b) => !b,
        Value::Number(n) => n.as_f64() == Some(0.0),
        Value::String(s) => s.is_empty(),
        Value::Array(_) | Value::Object(_) => false,
    }
}
