use std::collections::VecDeque;

use remote_core::Resource;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OperationKind {
    Move,
    Copy,
    Delete,
    Restore,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchOperation {
    pub kind: OperationKind,
    pub resource: Resource,
    pub source_path: String,
    // empty for deletes
    pub target_path: String,
    pub overwrite: bool,
}

impl BatchOperation {
    pub fn transfer(
        kind: OperationKind,
        resource: Resource,
        target_path: impl Into<String>,
        overwrite: bool,
    ) -> Self {
        Self {
            kind,
            source_path: resource.path.clone(),
            resource,
            target_path: target_path.into(),
            overwrite,
        }
    }

    pub fn delete(resource: Resource) -> Self {
        Self {
            kind: OperationKind::Delete,
            source_path: resource.path.clone(),
            resource,
            target_path: String::new(),
            overwrite: false,
        }
    }

    pub fn restore(resource: Resource, restore_path: impl Into<String>) -> Self {
        Self {
            kind: OperationKind::Restore,
            source_path: resource.path.clone(),
            resource,
            target_path: restore_path.into(),
            overwrite: false,
        }
    }

    pub fn source_id(&self) -> &str {
        &self.resource.id
    }

    pub fn resource_name(&self) -> &str {
        &self.resource.name
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct QueuedOperation {
    pub operation: BatchOperation,
    pub attempts: u32,
}

#[derive(Debug, Default)]
pub(crate) struct OperationQueue {
    inner: VecDeque<QueuedOperation>,
}

impl OperationQueue {
    pub fn from_operations(operations: Vec<BatchOperation>) -> Self {
        Self {
            inner: operations
                .into_iter()
                .map(|operation| QueuedOperation {
                    operation,
                    attempts: 0,
                })
                .collect(),
        }
    }

    pub fn requeue(&mut self, queued: QueuedOperation) {
        self.inner.push_back(queued);
    }

    pub fn next(&mut self) -> Option<QueuedOperation> {
        self.inner.pop_front()
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    #[cfg(test)]
    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }
}
