use std::future::Future;
use std::sync::{Mutex, MutexGuard};

use futures_util::future::join_all;
use remote_core::{RemoteError, RemoteFileOps, Resource, ResourceRef, paths};

use crate::config::EngineConfig;
use crate::queue::{BatchOperation, OperationKind, OperationQueue, QueuedOperation};
use crate::retry::LockRetryPolicy;

pub const DEFAULT_CONCURRENCY: usize = 4;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SucceededOperation {
    pub operation: BatchOperation,
    pub resource: Resource,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FailedOperation {
    pub operation: BatchOperation,
    pub error: RemoteError,
}

impl FailedOperation {
    pub fn resource_name(&self) -> &str {
        self.operation.resource_name()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchResult {
    pub succeeded: Vec<SucceededOperation>,
    pub failed: Vec<FailedOperation>,
}

impl BatchResult {
    pub fn succeeded_resources(&self) -> impl Iterator<Item = &Resource> {
        self.succeeded.iter().map(|entry| &entry.resource)
    }

    pub fn has_failures(&self) -> bool {
        !self.failed.is_empty()
    }

    pub fn total(&self) -> usize {
        self.succeeded.len() + self.failed.len()
    }
}

#[derive(Debug, Clone)]
pub struct BatchExecutor {
    concurrency: usize,
    lock_retry: LockRetryPolicy,
}

impl Default for BatchExecutor {
    fn default() -> Self {
        Self::new(DEFAULT_CONCURRENCY)
    }
}

impl BatchExecutor {
    pub fn new(concurrency: usize) -> Self {
        Self {
            concurrency: concurrency.max(1),
            lock_retry: LockRetryPolicy::unbounded(),
        }
    }

    pub fn from_config(config: &EngineConfig) -> Self {
        Self::new(config.concurrency).with_lock_retry(config.lock_retry_policy())
    }

    pub fn with_lock_retry(mut self, policy: LockRetryPolicy) -> Self {
        self.lock_retry = policy;
        self
    }

    pub fn concurrency(&self) -> usize {
        self.concurrency
    }

    // Locked failures go to the back of the queue; any other failure is final.
    pub async fn execute<F, Fut>(&self, operations: Vec<BatchOperation>, perform: F) -> BatchResult
    where
        F: Fn(BatchOperation) -> Fut,
        Fut: Future<Output = Result<Resource, RemoteError>>,
    {
        let queue = Mutex::new(OperationQueue::from_operations(operations));
        let result = Mutex::new(BatchResult::default());
        let workers = self.concurrency.min(lock(&queue).len());
        tracing::debug!(workers, concurrency = self.concurrency, "batch started");

        join_all((0..workers).map(|worker| self.run_worker(worker, &queue, &result, &perform)))
            .await;

        let result = result.into_inner().unwrap_or_else(|poisoned| poisoned.into_inner());
        tracing::info!(
            succeeded = result.succeeded.len(),
            failed = result.failed.len(),
            "batch finished"
        );
        result
    }

    async fn run_worker<F, Fut>(
        &self,
        worker: usize,
        queue: &Mutex<OperationQueue>,
        result: &Mutex<BatchResult>,
        perform: &F,
    ) where
        F: Fn(BatchOperation) -> Fut,
        Fut: Future<Output = Result<Resource, RemoteError>>,
    {
        loop {
            let Some(mut queued) = lock(queue).next() else {
                break;
            };
            queued.attempts += 1;
            tracing::debug!(
                worker,
                kind = ?queued.operation.kind,
                source = %queued.operation.source_path,
                attempt = queued.attempts,
                "operation start"
            );

            match perform(queued.operation.clone()).await {
                Ok(resource) => {
                    lock(result).succeeded.push(SucceededOperation {
                        operation: queued.operation,
                        resource,
                    });
                }
                Err(err) if err.is_locked() && self.lock_retry.allows_retry(queued.attempts) => {
                    tracing::warn!(
                        source = %queued.operation.source_path,
                        attempt = queued.attempts,
                        "resource locked, operation requeued"
                    );
                    self.requeue(queue, queued).await;
                }
                Err(err) => {
                    tracing::warn!(
                        kind = ?queued.operation.kind,
                        source = %queued.operation.source_path,
                        error = %err,
                        "operation failed"
                    );
                    lock(result).failed.push(FailedOperation {
                        operation: queued.operation,
                        error: err,
                    });
                }
            }
        }
    }

    async fn requeue(&self, queue: &Mutex<OperationQueue>, queued: QueuedOperation) {
        if let Some(delay) = self.lock_retry.delay_after(queued.attempts) {
            tokio::time::sleep(delay).await;
        }
        lock(queue).requeue(queued);
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

pub async fn perform_remote<R>(remote: &R, operation: BatchOperation) -> Result<Resource, RemoteError>
where
    R: RemoteFileOps,
{
    match operation.kind {
        OperationKind::Move => {
            remote
                .move_resource(&operation.source_path, &operation.target_path, operation.overwrite)
                .await
        }
        OperationKind::Copy => {
            remote
                .copy_resource(&operation.source_path, &operation.target_path, operation.overwrite)
                .await
        }
        OperationKind::Delete => {
            remote.delete_resource(&operation.resource.id).await?;
            Ok(operation.resource)
        }
        OperationKind::Restore => {
            remote
                .restore_resource(
                    &operation.source_path,
                    &operation.resource.id,
                    &operation.target_path,
                    operation.overwrite,
                )
                .await?;
            let parent = restored_parent_id(remote, &operation.target_path).await;
            let mut restored = operation.resource;
            restored.relocate(&operation.target_path, parent);
            restored.original_location = None;
            Ok(restored)
        }
    }
}

async fn restored_parent_id<R>(remote: &R, restore_path: &str) -> Option<String>
where
    R: RemoteFileOps,
{
    let parent_path = paths::parent_path(restore_path)?;
    match remote.get_resource(ResourceRef::Path(&parent_path)).await {
        Ok(parent) => Some(parent.id),
        Err(err) => {
            tracing::warn!(path = %parent_path, error = %err, "restore target parent not resolved");
            None
        }
    }
}
