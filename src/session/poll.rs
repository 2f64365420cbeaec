//! Waiting on remote state transitions.

use std::time::Duration;

use tracing::debug;

use crate::error::Result;
use crate::service::AgentService;
use crate::types::{Run, VectorStore};

/// Poll until the run reaches a terminal status.
pub async fn wait_for_run(
    service: &dyn AgentService,
    mut run: Run,
    interval: Duration,
) -> Result<Run> {
    while !run.status.is_terminal() {
        tokio::time::sleep(interval).await;
        run = service.get_run(&run.thread_id, &run.id).await?;
        debug!(run_id = %run.id, status = %run.status, "polled run");
    }
    Ok(run)
}

/// Poll until the vector store has finished ingesting its files.
pub async fn wait_for_vector_store(
    service: &dyn AgentService,
    mut store: VectorStore,
    interval: Duration,
) -> Result<VectorStore> {
    while store.status.as_deref() == Some("in_progress") {
        tokio::time::sleep(interval).await;
        store = service.get_vector_store(&store.id).await?;
        debug!(vector_store_id = %store.id, status = ?store.status, "polled vector store");
    }
    Ok(store)
}
