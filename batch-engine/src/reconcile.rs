use std::future::Future;
use std::sync::Arc;

use remote_core::{RemoteError, RemoteFileOps, Resource, ResourceRef};

use crate::event::{EventKind, ReconciliationEvent};
use crate::store::{SharedStore, lock_store};

pub trait ResourceFetcher: Send + Sync {
    fn fetch_resource(
        &self,
        storage_id: &str,
        item_id: &str,
    ) -> impl Future<Output = Result<Resource, RemoteError>> + Send;
}

pub struct RemoteFetcher<R> {
    remote: Arc<R>,
}

impl<R> RemoteFetcher<R> {
    pub fn new(remote: Arc<R>) -> Self {
        Self { remote }
    }
}

impl<R: RemoteFileOps> ResourceFetcher for RemoteFetcher<R> {
    async fn fetch_resource(&self, _storage_id: &str, item_id: &str) -> Result<Resource, RemoteError> {
        self.remote.get_resource(ResourceRef::Id(item_id)).await
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ViewSignal {
    FollowPath(String),
    CurrentFolderGone,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReconcileOutcome {
    SelfEcho,
    Ignored,
    FollowPath { path: String },
    CurrentFolderGone,
    CurrentFolderRefreshed,
    Inserted,
    Refreshed,
    Touched,
    Removed,
    FetchFailed,
}

impl ReconcileOutcome {
    pub fn view_signal(&self) -> Option<ViewSignal> {
        match self {
            ReconcileOutcome::FollowPath { path } => Some(ViewSignal::FollowPath(path.clone())),
            ReconcileOutcome::CurrentFolderGone => Some(ViewSignal::CurrentFolderGone),
            _ => None,
        }
    }
}

pub struct EventReconciler<F> {
    client_id: String,
    fetcher: F,
}

impl<F: ResourceFetcher> EventReconciler<F> {
    pub fn new(client_id: impl Into<String>, fetcher: F) -> Self {
        Self {
            client_id: client_id.into(),
            fetcher,
        }
    }

    pub fn client_id(&self) -> &str {
        &self.client_id
    }

    pub fn fetcher(&self) -> &F {
        &self.fetcher
    }

    pub async fn handle(&self, event: &ReconciliationEvent, store: &SharedStore) -> ReconcileOutcome {
        if event.is_initiated_by(&self.client_id) {
            tracing::trace!(item = %event.item_id, kind = ?event.kind, "ignoring self-echo");
            return ReconcileOutcome::SelfEcho;
        }

        let (current_id, cached_etag) = {
            let store = lock_store(store);
            (
                store.current_folder_id().map(str::to_string),
                store.find(&event.item_id).map(|resource| resource.etag.clone()),
            )
        };
        let Some(current_id) = current_id else {
            return ReconcileOutcome::Ignored;
        };

        if current_id == event.item_id {
            return self.handle_current_folder(event, store).await;
        }

        let parent_matches = event.parent_item_id.as_deref() == Some(current_id.as_str());
        match cached_etag {
            None if parent_matches && event.kind != EventKind::ItemTrashed => {
                self.fetch_into_view(event, &current_id, store, ReconcileOutcome::Inserted)
                    .await
            }
            None => ReconcileOutcome::Ignored,
            Some(cached_etag) => self.handle_cached(event, &current_id, &cached_etag, store).await,
        }
    }

    async fn handle_current_folder(
        &self,
        event: &ReconciliationEvent,
        store: &SharedStore,
    ) -> ReconcileOutcome {
        if event.kind == EventKind::ItemTrashed {
            tracing::info!(folder = %event.item_id, "current folder was trashed");
            lock_store(store).set_current_folder(None);
            return ReconcileOutcome::CurrentFolderGone;
        }

        let Some(folder) = self.fetch(event).await else {
            return ReconcileOutcome::FetchFailed;
        };
        let path = folder.path.clone();
        {
            let mut store = lock_store(store);
            if store.current_folder_id() != Some(event.item_id.as_str()) {
                return ReconcileOutcome::Ignored;
            }
            store.set_current_folder(Some(folder));
        }

        match event.kind {
            EventKind::ItemRenamed | EventKind::ItemMoved => {
                tracing::info!(folder = %event.item_id, path = %path, "current folder relocated");
                ReconcileOutcome::FollowPath { path }
            }
            _ => ReconcileOutcome::CurrentFolderRefreshed,
        }
    }

    async fn handle_cached(
        &self,
        event: &ReconciliationEvent,
        current_id: &str,
        cached_etag: &str,
        store: &SharedStore,
    ) -> ReconcileOutcome {
        let left_view = event
            .parent_item_id
            .as_deref()
            .is_some_and(|parent| parent != current_id);

        match event.kind {
            EventKind::ItemTrashed => {
                lock_store(store).remove([&event.item_id]);
                return ReconcileOutcome::Removed;
            }
            EventKind::ItemMoved if left_view => {
                lock_store(store).remove([&event.item_id]);
                return ReconcileOutcome::Removed;
            }
            _ if left_view => return ReconcileOutcome::Ignored,
            _ => {}
        }

        if event.etag.as_deref() == Some(cached_etag) {
            let mut store = lock_store(store);
            match event.kind {
                EventKind::PostprocessingFinished => {
                    store.set_processing(&event.item_id, false);
                }
                EventKind::FileLocked => {
                    store.set_locked(&event.item_id, true);
                }
                EventKind::FileUnlocked => {
                    store.set_locked(&event.item_id, false);
                }
                _ => {}
            }
            return ReconcileOutcome::Touched;
        }

        self.fetch_into_view(event, current_id, store, ReconcileOutcome::Refreshed)
            .await
    }

    async fn fetch_into_view(
        &self,
        event: &ReconciliationEvent,
        current_id: &str,
        store: &SharedStore,
        outcome: ReconcileOutcome,
    ) -> ReconcileOutcome {
        let Some(resource) = self.fetch(event).await else {
            return ReconcileOutcome::FetchFailed;
        };

        let mut store = lock_store(store);
        if store.current_folder_id() != Some(current_id) {
            return ReconcileOutcome::Ignored;
        }
        if resource.parent_folder_id.as_deref() != Some(current_id) {
            store.remove([&resource.id]);
            return if outcome == ReconcileOutcome::Inserted {
                ReconcileOutcome::Ignored
            } else {
                ReconcileOutcome::Removed
            };
        }
        store.upsert(resource);
        outcome
    }

    async fn fetch(&self, event: &ReconciliationEvent) -> Option<Resource> {
        match self
            .fetcher
            .fetch_resource(&event.storage_id, &event.item_id)
            .await
        {
            Ok(resource) => Some(resource),
            Err(err) => {
                tracing::warn!(
                    item = %event.item_id,
                    kind = ?event.kind,
                    error = %err,
                    "failed to fetch resource for push notification"
                );
                None
            }
        }
    }
}
