//! Bounded-concurrency executor for batch work.
//!
//! A semaphore caps the number of in-flight operations; excess work queues
//! until a permit frees up. With an acquire timeout configured, work that
//! waits too long is rejected instead of queued forever. Results come back
//! in input order.
//!
//! This is for read-only batches (file reads, per-file checks). Anything that
//! mutates the git index must stay on the orchestrator's sequential path.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use futures::future::join_all;
use serde::{Deserialize, Serialize};
use tokio::sync::Semaphore;
use tracing::debug;

/// Configuration for a [`BoundedExecutor`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutorConfig {
    /// Maximum number of concurrent operations.
    pub max_concurrent: usize,

    /// Reject work that waits longer than this for a permit.
    pub acquire_timeout_ms: Option<u64>,
}

impl Default for ExecutorConfig {
    fn default() -> Self {
        Self {
            max_concurrent: 8,
            acquire_timeout_ms: None,
        }
    }
}

/// Errors produced by the executor itself (not by the work it runs).
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ExecutorError {
    #[error("timed out after {waited_ms}ms waiting for an execution slot")]
    QueueTimeout { waited_ms: u64 },

    #[error("executor is closed")]
    Closed,
}

/// Semaphore-bounded executor. Cheap to clone; clones share the bound.
#[derive(Debug, Clone)]
pub struct BoundedExecutor {
    semaphore: Arc<Semaphore>,
    config: ExecutorConfig,
}

impl BoundedExecutor {
    pub fn new(config: ExecutorConfig) -> Self {
        let permits = config.max_concurrent.max(1);
        Self {
            semaphore: Arc::new(Semaphore::new(permits)),
            config,
        }
    }

    /// Executor allowing `max_concurrent` operations with no queue timeout.
    pub fn with_limit(max_concurrent: usize) -> Self {
        Self::new(ExecutorConfig {
            max_concurrent,
            ..Default::default()
        })
    }

    /// Run one operation once a slot is free.
    pub async fn run<F, Fut, T>(&self, op: F) -> Result<T, ExecutorError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = T>,
    {
        let _permit = match self.config.acquire_timeout_ms {
            Some(ms) => {
                let limit = Duration::from_millis(ms);
                match tokio::time::timeout(limit, self.semaphore.acquire()).await {
                    Ok(permit) => permit.map_err(|_| ExecutorError::Closed)?,
                    Err(_) => {
                        debug!(waited_ms = ms, "executor queue timeout");
                        return Err(ExecutorError::QueueTimeout { waited_ms: ms });
                    }
                }
            }
            None => self
                .semaphore
                .acquire()
                .await
                .map_err(|_| ExecutorError::Closed)?,
        };
        Ok(op().await)
    }

    /// Run `op` over every item, at most `max_concurrent` at a time.
    ///
    /// The returned vector lines up with `items`.
    pub async fn run_all<I, F, Fut, T>(&self, items: I, op: F) -> Vec<Result<T, ExecutorError>>
    where
        I: IntoIterator,
        F: Fn(I::Item) -> Fut,
        Fut: Future<Output = T>,
    {
        let op = &op;
        let futures = items
            .into_iter()
            .map(|item| async move { self.run(|| op(item)).await });
        join_all(futures).await
    }
}

impl Default for BoundedExecutor {
    fn default() -> Self {
        Self::new(ExecutorConfig::default())
    }
}
