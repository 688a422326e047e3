//! Job model and persistence for the submission service.
//!
//! A job enters the system exactly once: a validated [`NewJob`] is handed to
//! a [`JobStore`], which records it as `pending` and returns the identifier
//! it generated. Nothing in this crate mutates or deletes jobs afterwards.
//!
//! # Architecture
//!
//! - [`JobStore`] - The insert capability injected into request handlers
//! - [`SqlJobStore`] - Store backed by the `jobs` table (Postgres or SQLite)
//! - [`MemoryJobStore`] - In-process store for tests and local experiments
//! - [`NewJob`] - A job that passed validation
//! - [`Job`] - A persisted job row
//!
//! # Example
//!
//! ```rust,no_run
//! use jobq_store::{JobStore, MemoryJobStore, NewJob};
//! use serde_json::json;
//!
//! #[tokio::main]
//! async fn main() {
//!     let store = MemoryJobStore::new();
//!
//!     let job = NewJob::new("emails", "welcome", json!({ "to": "a@x.com" }))
//!         .expect("valid job")
//!         .with_priority(5);
//!     let job_id = store.insert_job(&job).await.unwrap();
//!     println!("Enqueued job: {job_id}");
//! }
//! ```

#[cfg(not(any(feature = "postgres", feature = "sqlite")))]
compile_error!("Enable exactly one of the `postgres` or `sqlite` features for jobq-store.");

#[cfg(all(feature = "postgres", feature = "sqlite"))]
compile_error!("Activate only one backend feature (`postgres` or `sqlite`) for jobq-store.");

mod error;
mod memory;
mod sql;
mod store;
mod types;

pub use error::{JobStoreError, JobValidationError};
pub use memory::MemoryJobStore;
pub use sql::SqlJobStore;
pub use store::JobStore;
pub use types::{is_blank_payload, Job, JobStatus, NewJob, DEFAULT_PRIORITY};

pub use jobq_db_connection::{create_lazy_pool, create_pool, DbConnectionConfig, DbPool};

// Re-export async_trait for convenience when implementing JobStore
pub use async_trait::async_trait;
