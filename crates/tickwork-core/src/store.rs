//! Job descriptor store.

use std::sync::Arc;

use dashmap::DashMap;

use crate::descriptor::JobDescriptor;

/// Store of registered job descriptors, keyed by job ID.
///
/// Implementations must be safe to read while another thread saves.
pub trait JobStore: Send + Sync {
    /// Insert or replace the descriptor with the same ID.
    fn save(&self, descriptor: Arc<JobDescriptor>);

    /// Snapshot of every stored descriptor. Order is unspecified.
    fn get_all(&self) -> Vec<Arc<JobDescriptor>>;

    /// Look up a descriptor by ID.
    fn get(&self, id: &str) -> Option<Arc<JobDescriptor>>;

    /// Number of stored descriptors.
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// In-memory job store. Contents are lost when it is dropped.
#[derive(Debug)]
pub struct InMemoryJobStore {
    jobs: DashMap<String, Arc<JobDescriptor>>,
}

impl InMemoryJobStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self {
            jobs: DashMap::new(),
        }
    }
}

impl Default for InMemoryJobStore {
    fn default() -> Self {
        Self::new()
    }
}

impl JobStore for InMemoryJobStore {
    fn save(&self, descriptor: Arc<JobDescriptor>) {
        self.jobs.insert(descriptor.id().to_string(), descriptor);
    }

    fn get_all(&self) -> Vec<Arc<JobDescriptor>> {
        self.jobs.iter().map(|entry| entry.value().clone()).collect()
    }

    fn get(&self, id: &str) -> Option<Arc<JobDescriptor>> {
        self.jobs.get(id).map(|entry| entry.value().clone())
    }

    fn len(&self) -> usize {
        self.jobs.len()
    }
}

#[cfg(test)]
#[path = "store_tests.rs"]
mod tests;
