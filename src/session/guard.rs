//! Ownership of the remote resources a session creates.

use std::sync::Arc;

use tracing::{debug, warn};

use crate::error::ResourceCleanupError;
use crate::service::AgentService;

/// Identifiers of every remote resource a session allocated.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct SessionResources {
    pub agent_id: Option<String>,
    pub thread_id: Option<String>,
    pub file_ids: Vec<String>,
    pub vector_store_ids: Vec<String>,
}

impl SessionResources {
    pub fn is_empty(&self) -> bool {
        self.agent_id.is_none()
            && self.thread_id.is_none()
            && self.file_ids.is_empty()
            && self.vector_store_ids.is_empty()
    }

    /// Delete everything, dependents first. Failures are logged and returned,
    /// never raised.
    pub async fn release(self, service: &dyn AgentService) -> Vec<ResourceCleanupError> {
        let mut failures = Vec::new();

        for id in self.vector_store_ids {
            let result = service.delete_vector_store(&id).await;
            record(&mut failures, "vector store", id, result);
        }
        for id in self.file_ids {
            let result = service.delete_file(&id).await;
            record(&mut failures, "file", id, result);
        }
        if let Some(id) = self.thread_id {
            let result = service.delete_thread(&id).await;
            record(&mut failures, "thread", id, result);
        }
        if let Some(id) = self.agent_id {
            let result = service.delete_agent(&id).await;
            record(&mut failures, "agent", id, result);
        }

        failures
    }
}

fn record(
    failures: &mut Vec<ResourceCleanupError>,
    resource: &'static str,
    id: String,
    result: crate::error::Result<()>,
) {
    match result {
        Ok(()) => debug!(resource, id = %id, "released"),
        Err(source) => {
            let err = ResourceCleanupError { resource, id, source };
            warn!(error = %err, "cleanup failed");
            failures.push(err);
        }
    }
}

/// Releases the tracked resources exactly once.
///
/// [`release`](Self::release) is the normal path. If the guard is dropped
/// while still holding resources (a session dropped unused, or the future
/// running it dropped mid-await), the release is spawned onto the current
/// Tokio runtime instead.
pub struct ResourceGuard {
    service: Arc<dyn AgentService>,
    resources: Option<SessionResources>,
}

impl ResourceGuard {
    pub fn new(service: Arc<dyn AgentService>) -> Self {
        Self {
            service,
            resources: Some(SessionResources::default()),
        }
    }

    /// Tracked resources; `None` once released.
    pub fn resources(&self) -> Option<&SessionResources> {
        self.resources.as_ref()
    }

    pub fn track(&mut self, f: impl FnOnce(&mut SessionResources)) {
        if let Some(resources) = self.resources.as_mut() {
            f(resources);
        }
    }

    /// Release now. Later calls (and the drop) do nothing.
    pub async fn release(&mut self) -> Vec<ResourceCleanupError> {
        match self.resources.take() {
            Some(resources) => resources.release(self.service.as_ref()).await,
            None => Vec::new(),
        }
    }
}

impl Drop for ResourceGuard {
    fn drop(&mut self) {
        let Some(resources) = self.resources.take() else {
            return;
        };
        if resources.is_empty() {
            return;
        }
        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                let service = self.service.clone();
                debug!(?resources, "session dropped; releasing in background");
                handle.spawn(async move {
                    resources.release(service.as_ref()).await;
                });
            }
            Err(_) => warn!(?resources, "session dropped outside a runtime; resources not released"),
        }
    }
}
