use std::fmt;
use std::sync::Arc;

use jobq_store::JobStore;

/// Shared application state passed to every route handler.
///
/// Holds no mutable data of its own; all shared state lives behind the
/// injected store.
#[derive(Clone)]
pub struct AppState {
    job_store: Arc<dyn JobStore>,
}

impl fmt::Debug for AppState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AppState")
            .field("job_store", &"<Arc<dyn JobStore>>")
            .finish()
    }
}

impl AppState {
    pub fn new(job_store: Arc<dyn JobStore>) -> Self {
        Self { job_store }
    }

    /// Convenience constructor taking ownership of a concrete store.
    pub fn from_store<S: JobStore + 'static>(store: S) -> Self {
        Self::new(Arc::new(store))
    }

    pub fn job_store(&self) -> &dyn JobStore {
        self.job_store.as_ref()
    }
}
