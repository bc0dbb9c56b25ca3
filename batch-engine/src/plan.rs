use std::collections::HashMap;

use remote_core::{Resource, paths};
use thiserror::Error;

use crate::conflict::Conflict;
use crate::executor::BatchResult;
use crate::prompt::ConflictStrategy;
use crate::queue::{BatchOperation, OperationKind};
use crate::store::ResourceStore;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TransferKind {
    Move,
    Copy,
}

impl From<TransferKind> for OperationKind {
    fn from(kind: TransferKind) -> Self {
        match kind {
            TransferKind::Move => OperationKind::Move,
            TransferKind::Copy => OperationKind::Copy,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum RejectReason {
    #[error("cannot place a folder inside itself")]
    IntoItself,
    #[error("original location is unknown")]
    NoOriginalLocation,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rejection {
    pub resource: Resource,
    pub reason: RejectReason,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OperationPlan {
    pub operations: Vec<BatchOperation>,
    pub skipped: Vec<Resource>,
    pub rejected: Vec<Rejection>,
}

impl OperationPlan {
    pub fn is_empty(&self) -> bool {
        self.operations.is_empty()
    }

    fn reject(&mut self, resource: &Resource, reason: RejectReason) {
        tracing::warn!(resource = %resource.path, reason = %reason, "operation rejected");
        self.rejected.push(Rejection {
            resource: resource.clone(),
            reason,
        });
    }
}

pub fn plan_transfer(
    kind: TransferKind,
    sources: &[Resource],
    destination: &Resource,
    conflicts: &[Conflict],
) -> OperationPlan {
    let resolved: HashMap<&str, &Conflict> = conflicts
        .iter()
        .map(|conflict| (conflict.resource.id.as_str(), conflict))
        .collect();
    let mut plan = OperationPlan::default();

    for source in sources {
        if source.is_folder() && paths::is_same_or_descendant(&destination.path, &source.path) {
            plan.reject(source, RejectReason::IntoItself);
            continue;
        }

        let (name, overwrite) = match resolved.get(source.id.as_str()) {
            None => (source.name.as_str(), false),
            Some(conflict) => match conflict.strategy {
                Some(ConflictStrategy::Replace) => (source.name.as_str(), true),
                Some(ConflictStrategy::KeepBoth) => (
                    conflict.target_name.as_deref().unwrap_or(source.name.as_str()),
                    false,
                ),
                Some(ConflictStrategy::Skip) | None => {
                    plan.skipped.push(source.clone());
                    continue;
                }
            },
        };

        plan.operations.push(BatchOperation::transfer(
            kind.into(),
            source.clone(),
            paths::join(&destination.path, name),
            overwrite,
        ));
    }
    plan
}

pub fn plan_delete(resources: &[Resource]) -> OperationPlan {
    OperationPlan {
        operations: resources.iter().cloned().map(BatchOperation::delete).collect(),
        ..OperationPlan::default()
    }
}

pub fn plan_restore(trash_items: &[Resource]) -> OperationPlan {
    let mut plan = OperationPlan::default();
    for item in trash_items {
        match item.original_location.as_deref() {
            Some(location) if !location.trim().is_empty() => {
                plan.operations
                    .push(BatchOperation::restore(item.clone(), paths::normalize(location)));
            }
            _ => plan.reject(item, RejectReason::NoOriginalLocation),
        }
    }
    plan
}

pub fn apply_batch_result(store: &mut ResourceStore, result: &BatchResult) {
    let mut removed = Vec::new();
    for entry in &result.succeeded {
        match entry.operation.kind {
            OperationKind::Move | OperationKind::Copy => {
                store.upsert(entry.resource.clone());
            }
            OperationKind::Delete | OperationKind::Restore => {
                removed.push(entry.operation.source_id());
            }
        }
    }
    if !removed.is_empty() {
        store.remove(removed);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::executor::{FailedOperation, SucceededOperation};
    use remote_core::{RemoteError, ResourceType};

    fn file(id: &str, path: &str) -> Resource {
        Resource::new(id, path, ResourceType::File, "personal").with_parent("src")
    }

    fn folder(id: &str, path: &str) -> Resource {
        Resource::new(id, path, ResourceType::Folder, "personal")
    }

    fn resolved(resource: &Resource, strategy: ConflictStrategy, target_name: Option<&str>) -> Conflict {
        Conflict {
            resource: resource.clone(),
            strategy: Some(strategy),
            target_name: target_name.map(str::to_string),
        }
    }

    #[test]
    fn transfer_targets_follow_resolved_strategies() {
        let a = file("a", "/Src/a.txt");
        let b = file("b", "/Src/b.txt");
        let c = file("c", "/Src/c.txt");
        let d = file("d", "/Src/d.txt");
        let dest = folder("dest", "/Dest");
        let conflicts = vec![
            resolved(&a, ConflictStrategy::KeepBoth, Some("a copy.txt")),
            resolved(&b, ConflictStrategy::Replace, None),
            resolved(&c, ConflictStrategy::Skip, None),
        ];

        let plan = plan_transfer(TransferKind::Copy, &[a, b, c.clone(), d], &dest, &conflicts);

        let targets: Vec<_> = plan
            .operations
            .iter()
            .map(|op| (op.kind, op.target_path.as_str(), op.overwrite))
            .collect();
        assert_eq!(
            targets,
            vec![
                (OperationKind::Copy, "/Dest/a copy.txt", false),
                (OperationKind::Copy, "/Dest/b.txt", true),
                (OperationKind::Copy, "/Dest/d.txt", false),
            ]
        );
        assert_eq!(plan.skipped, vec![c]);
        assert!(plan.rejected.is_empty());
    }

    #[test]
    fn folder_cannot_move_into_itself_or_below() {
        let photos = folder("photos", "/Photos");
        let notes = file("n", "/Photos/notes.txt");

        let into_self = plan_transfer(TransferKind::Move, &[photos.clone()], &photos, &[]);
        assert!(into_self.is_empty());
        assert_eq!(into_self.rejected[0].reason, RejectReason::IntoItself);

        let below = folder("2024", "/Photos/2024");
        let plan = plan_transfer(TransferKind::Move, &[photos, notes], &below, &[]);
        assert_eq!(plan.rejected.len(), 1);
        assert_eq!(plan.operations.len(), 1);
        assert_eq!(plan.operations[0].target_path, "/Photos/2024/notes.txt");
    }

    #[test]
    fn restore_requires_original_location() {
        let known = file("t1", "/Trash/a.txt").with_original_location("/Docs/a.txt");
        let unknown = file("t2", "/Trash/b.txt");

        let plan = plan_restore(&[known, unknown]);
        assert_eq!(plan.operations.len(), 1);
        assert_eq!(plan.operations[0].kind, OperationKind::Restore);
        assert_eq!(plan.operations[0].source_path, "/Trash/a.txt");
        assert_eq!(plan.operations[0].target_path, "/Docs/a.txt");
        assert_eq!(plan.rejected[0].reason, RejectReason::NoOriginalLocation);
    }

    #[test]
    fn batch_result_updates_the_store() {
        let mut store = ResourceStore::new();
        store.replace_listing(
            folder("src", "/Src"),
            vec![file("gone", "/Src/gone.txt"), file("kept", "/Src/kept.txt")],
        );
        let copied = Resource::new("new", "/Src/kept copy.txt", ResourceType::File, "personal")
            .with_parent("src");
        let result = BatchResult {
            succeeded: vec![
                SucceededOperation {
                    operation: BatchOperation::delete(file("gone", "/Src/gone.txt")),
                    resource: file("gone", "/Src/gone.txt"),
                },
                SucceededOperation {
                    operation: BatchOperation::transfer(
                        OperationKind::Copy,
                        file("kept", "/Src/kept.txt"),
                        "/Src/kept copy.txt",
                        false,
                    ),
                    resource: copied,
                },
            ],
            failed: vec![FailedOperation {
                operation: BatchOperation::delete(file("kept", "/Src/kept.txt")),
                error: RemoteError::Transport("reset".into()),
            }],
        };

        apply_batch_result(&mut store, &result);

        assert!(!store.contains("gone"));
        assert!(store.contains("kept"));
        assert_eq!(store.find_by_parent_and_name(Some("src"), "kept copy.txt").unwrap().id, "new");
    }
}
