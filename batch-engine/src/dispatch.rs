use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TryRecvError;
use tokio::task::JoinHandle;

use crate::event::{ReconciliationEvent, parse_payload};
use crate::reconcile::{EventReconciler, ResourceFetcher, ViewSignal};
use crate::store::SharedStore;

type Lanes = Arc<Mutex<HashMap<String, mpsc::UnboundedSender<ReconciliationEvent>>>>;

// One lane task per item id; a lane exits once its backlog is drained.
pub struct EventDispatcher<F> {
    reconciler: Arc<EventReconciler<F>>,
    store: SharedStore,
    signals: Option<mpsc::UnboundedSender<ViewSignal>>,
    lanes: Lanes,
    tasks: Mutex<Vec<JoinHandle<()>>>,
}

impl<F> EventDispatcher<F>
where
    F: ResourceFetcher + 'static,
{
    pub fn new(reconciler: EventReconciler<F>, store: SharedStore) -> Self {
        Self {
            reconciler: Arc::new(reconciler),
            store,
            signals: None,
            lanes: Arc::new(Mutex::new(HashMap::new())),
            tasks: Mutex::new(Vec::new()),
        }
    }

    pub fn with_signals(mut self, signals: mpsc::UnboundedSender<ViewSignal>) -> Self {
        self.signals = Some(signals);
        self
    }

    pub async fn run(self, mut payloads: mpsc::Receiver<String>) {
        while let Some(payload) = payloads.recv().await {
            if let Some(event) = parse_payload(&payload) {
                self.dispatch(event);
            }
        }
        self.drain().await;
    }

    pub async fn run_events(self, mut events: mpsc::Receiver<ReconciliationEvent>) {
        while let Some(event) = events.recv().await {
            self.dispatch(event);
        }
        self.drain().await;
    }

    pub fn dispatch(&self, event: ReconciliationEvent) {
        let mut lanes = lock(&self.lanes);
        let event = match lanes.get(&event.item_id) {
            Some(lane) => match lane.send(event) {
                Ok(()) => return,
                Err(mpsc::error::SendError(event)) => event,
            },
            None => event,
        };

        let item_id = event.item_id.clone();
        let (sender, receiver) = mpsc::unbounded_channel();
        if sender.send(event).is_err() {
            return;
        }
        lanes.insert(item_id.clone(), sender);
        drop(lanes);

        let handle = tokio::spawn(run_lane(
            item_id,
            receiver,
            Arc::clone(&self.reconciler),
            Arc::clone(&self.store),
            self.signals.clone(),
            Arc::clone(&self.lanes),
        ));
        let mut tasks = lock(&self.tasks);
        tasks.retain(|task| !task.is_finished());
        tasks.push(handle);
    }

    pub async fn drain(&self) {
        let tasks = std::mem::take(&mut *lock(&self.tasks));
        for task in tasks {
            if let Err(err) = task.await {
                tracing::error!(error = %err, "reconciliation lane panicked");
            }
        }
    }
}

async fn run_lane<F>(
    item_id: String,
    mut receiver: mpsc::UnboundedReceiver<ReconciliationEvent>,
    reconciler: Arc<EventReconciler<F>>,
    store: SharedStore,
    signals: Option<mpsc::UnboundedSender<ViewSignal>>,
    lanes: Lanes,
) where
    F: ResourceFetcher,
{
    loop {
        let event = match receiver.try_recv() {
            Ok(event) => event,
            Err(TryRecvError::Disconnected) => return,
            Err(TryRecvError::Empty) => {
                let mut lanes = lock(&lanes);
                match receiver.try_recv() {
                    Ok(event) => event,
                    Err(_) => {
                        lanes.remove(&item_id);
                        return;
                    }
                }
            }
        };

        let outcome = reconciler.handle(&event, &store).await;
        tracing::debug!(item = %item_id, kind = ?event.kind, outcome = ?outcome, "push notification handled");
        if let (Some(signal), Some(signals)) = (outcome.view_signal(), signals.as_ref()) {
            let _ = signals.send(signal);
        }
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::EventKind;
    use crate::store::{ResourceStore, lock_store, shared};
    use remote_core::{RemoteError, Resource, ResourceType};
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;
    use tokio::sync::Notify;

    struct GatedFetcher {
        gate: Notify,
        gated_item: &'static str,
        fetches: AtomicUsize,
    }

    impl GatedFetcher {
        fn new(gated_item: &'static str) -> Self {
            Self {
                gate: Notify::new(),
                gated_item,
                fetches: AtomicUsize::new(0),
            }
        }
    }

    impl ResourceFetcher for GatedFetcher {
        async fn fetch_resource(&self, _storage_id: &str, item_id: &str) -> Result<Resource, RemoteError> {
            let call = self.fetches.fetch_add(1, Ordering::SeqCst);
            if item_id == self.gated_item {
                self.gate.notified().await;
            }
            Ok(Resource::new(
                item_id,
                format!("/Docs/{item_id}.txt"),
                ResourceType::File,
                "personal",
            )
            .with_parent("docs")
            .with_etag(format!("fetch-{call}")))
        }
    }

    fn docs_store() -> SharedStore {
        let mut store = ResourceStore::new();
        store.replace_listing(
            Resource::new("docs", "/Docs", ResourceType::Folder, "personal"),
            vec![],
        );
        shared(store)
    }

    fn created(item_id: &str) -> ReconciliationEvent {
        ReconciliationEvent::new(EventKind::FolderCreated, item_id, "personal").with_parent("docs")
    }

    async fn wait_until<P: Fn() -> bool>(predicate: P) {
        tokio::time::timeout(Duration::from_secs(5), async {
            while !predicate() {
                tokio::time::sleep(Duration::from_millis(5)).await;
            }
        })
        .await
        .expect("condition not reached in time");
    }

    #[tokio::test]
    async fn slow_item_does_not_block_unrelated_items() {
        let store = docs_store();
        let fetcher = GatedFetcher::new("slow");
        let dispatcher =
            EventDispatcher::new(EventReconciler::new("me", fetcher), Arc::clone(&store));

        dispatcher.dispatch(created("slow"));
        dispatcher.dispatch(created("fast"));

        wait_until(|| lock_store(&store).contains("fast")).await;
        assert!(!lock_store(&store).contains("slow"));

        dispatcher.reconciler.fetcher().gate.notify_one();
        dispatcher.drain().await;
        assert!(lock_store(&store).contains("slow"));
    }

    #[tokio::test]
    async fn events_for_one_item_apply_in_arrival_order() {
        let store = docs_store();
        let dispatcher = EventDispatcher::new(
            EventReconciler::new("me", GatedFetcher::new("none")),
            Arc::clone(&store),
        );

        dispatcher.dispatch(created("a"));
        dispatcher.dispatch(
            ReconciliationEvent::new(EventKind::FileTouched, "a", "personal")
                .with_parent("docs")
                .with_etag("changed"),
        );
        dispatcher.dispatch(
            ReconciliationEvent::new(EventKind::ItemTrashed, "a", "personal").with_parent("docs"),
        );
        dispatcher.drain().await;

        assert!(!lock_store(&store).contains("a"));
        assert_eq!(dispatcher.reconciler.fetcher().fetches.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn run_parses_payloads_and_forwards_view_signals() {
        let store = docs_store();
        let (signal_tx, mut signal_rx) = mpsc::unbounded_channel();
        let dispatcher = EventDispatcher::new(
            EventReconciler::new("me", GatedFetcher::new("none")),
            Arc::clone(&store),
        )
        .with_signals(signal_tx);

        let (tx, rx) = mpsc::channel(8);
        tx.send(json!({"type": "folder-created", "itemId": "n", "parentItemId": "docs", "storageId": "personal"}).to_string())
            .await
            .unwrap();
        tx.send("{ not json".to_string()).await.unwrap();
        tx.send(json!({"type": "file-touched", "itemId": "echo", "parentItemId": "docs", "storageId": "personal", "initiatorId": "me"}).to_string())
            .await
            .unwrap();
        tx.send(json!({"type": "item-trashed", "itemId": "docs", "storageId": "personal"}).to_string())
            .await
            .unwrap();
        drop(tx);

        dispatcher.run(rx).await;

        assert!(!lock_store(&store).contains("echo"));
        assert_eq!(signal_rx.recv().await, Some(ViewSignal::CurrentFolderGone));
    }
}
