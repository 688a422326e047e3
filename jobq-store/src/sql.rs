//! SQLx-backed job store.

use async_trait::async_trait;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use jobq_db_connection::{verify_connection, DbPool};
use serde_json::Value;
use sqlx::types::Json;
use tokio::sync::OnceCell;
use uuid::Uuid;

use crate::error::JobStoreError;
use crate::store::JobStore;
use crate::types::{Job, JobStatus, NewJob};

// Status and timestamp come from the statement itself; only client fields are bound.
#[cfg(feature = "postgres")]
const INSERT_JOB: &str = "INSERT INTO jobs (queue_name, job_type, payload, job_priority, job_status, job_created_at) \
     VALUES ($1, $2, $3, $4, 'pending', NOW()) \
     RETURNING job_id::text";
#[cfg(feature = "sqlite")]
const INSERT_JOB: &str = "INSERT INTO jobs (queue_name, job_type, payload, job_priority, job_status, job_created_at) \
     VALUES (?, ?, ?, ?, 'pending', strftime('%Y-%m-%dT%H:%M:%fZ', 'now')) \
     RETURNING job_id";

#[cfg(feature = "postgres")]
const FIND_JOB: &str = "SELECT CAST(job_id AS TEXT) AS job_id, queue_name, job_type, payload, job_priority, job_status, job_created_at \
     FROM jobs WHERE job_id = $1::uuid";
#[cfg(feature = "sqlite")]
const FIND_JOB: &str = "SELECT CAST(job_id AS TEXT) AS job_id, queue_name, job_type, payload, job_priority, job_status, job_created_at \
     FROM jobs WHERE job_id = ?";

const COUNT_JOBS: &str = "SELECT COUNT(*) FROM jobs";

#[derive(Debug, sqlx::FromRow)]
struct JobRow {
    job_id: String,
    queue_name: String,
    job_type: String,
    payload: Json<Value>,
    job_priority: i32,
    job_status: String,
    job_created_at: DateTime<Utc>,
}

impl TryFrom<JobRow> for Job {
    type Error = JobStoreError;

    fn try_from(row: JobRow) -> Result<Self, Self::Error> {
        Ok(Self {
            job_id: parse_job_id(&row.job_id)?,
            queue_name: row.queue_name,
            job_type: row.job_type,
            payload: row.payload.0,
            job_priority: row.job_priority,
            job_status: row.job_status.parse::<JobStatus>()?,
            job_created_at: row.job_created_at,
        })
    }
}

fn parse_job_id(raw: &str) -> Result<Uuid, JobStoreError> {
    Uuid::parse_str(raw).map_err(|_| JobStoreError::InvalidIdentifier(raw.to_owned()))
}

/// A [`JobStore`] writing to the `jobs` table through a connection pool.
///
/// With [`SqlJobStore::with_auto_migrate`] the schema is applied on the first
/// call that reaches the database, so a store that was down at boot becomes
/// usable once it answers. Clones share that state.
#[derive(Debug, Clone)]
pub struct SqlJobStore {
    pool: DbPool,
    auto_migrate: bool,
    schema: Arc<OnceCell<()>>,
}

impl SqlJobStore {
    pub fn new(pool: DbPool) -> Self {
        Self {
            pool,
            auto_migrate: false,
            schema: Arc::new(OnceCell::new()),
        }
    }

    pub fn with_auto_migrate(mut self, enabled: bool) -> Self {
        self.auto_migrate = enabled;
        self
    }

    pub fn pool(&self) -> &DbPool {
        &self.pool
    }

    /// Apply the embedded migrations for the compiled-in backend.
    ///
    /// Runs at most once successfully per store; a failed attempt is retried
    /// on the next call.
    pub async fn migrate(&self) -> Result<(), JobStoreError> {
        self.schema
            .get_or_try_init(|| async {
                #[cfg(feature = "postgres")]
                let migrator = jobq_migrations::postgres_migrator();
                #[cfg(feature = "sqlite")]
                let migrator = jobq_migrations::sqlite_migrator();

                migrator.run(&self.pool).await?;
                tracing::info!("database migrations applied successfully");
                Ok::<(), JobStoreError>(())
            })
            .await?;
        Ok(())
    }

    pub fn is_migrated(&self) -> bool {
        self.schema.initialized()
    }

    async fn ensure_schema(&self) -> Result<(), JobStoreError> {
        if self.auto_migrate && !self.schema.initialized() {
            self.migrate().await?;
        }
        Ok(())
    }

    /// Load one job by identifier.
    pub async fn find_job(&self, job_id: Uuid) -> Result<Option<Job>, JobStoreError> {
        let row = sqlx::query_as::<_, JobRow>(FIND_JOB)
            .bind(job_id.to_string())
            .fetch_optional(&self.pool)
            .await?;
        row.map(Job::try_from).transpose()
    }

    pub async fn count_jobs(&self) -> Result<i64, JobStoreError> {
        let count = sqlx::query_scalar::<_, i64>(COUNT_JOBS)
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }
}

#[async_trait]
impl JobStore for SqlJobStore {
    #[tracing::instrument(
        skip_all,
        fields(queue_name = %job.queue_name(), job_type = %job.job_type(), job_priority = job.job_priority())
    )]
    async fn insert_job(&self, job: &NewJob) -> Result<Uuid, JobStoreError> {
        self.ensure_schema().await?;
        let raw_id = sqlx::query_scalar::<_, String>(INSERT_JOB)
            .bind(job.queue_name())
            .bind(job.job_type())
            .bind(Json(job.payload()))
            .bind(job.job_priority())
            .fetch_one(&self.pool)
            .await?;

        let job_id = parse_job_id(&raw_id)?;
        tracing::debug!(%job_id, "job inserted");
        Ok(job_id)
    }

    async fn ping(&self) -> Result<(), JobStoreError> {
        verify_connection(&self.pool).await?;
        self.ensure_schema().await
    }
}
