mod config;
mod conflict;
mod dispatch;
mod event;
mod executor;
mod plan;
mod prompt;
mod queue;
mod reconcile;
mod retry;
mod store;
mod summary;

pub use config::{EngineConfig, generate_client_id};
pub use conflict::{
    Conflict, ConflictError, find_conflicts, keep_both_name, resolve_conflicts,
    resolve_with_listing,
};
pub use dispatch::EventDispatcher;
pub use event::{EventError, EventKind, ReconciliationEvent, parse_payload};
pub use executor::{
    BatchExecutor, BatchResult, DEFAULT_CONCURRENCY, FailedOperation, SucceededOperation,
    perform_remote,
};
pub use plan::{
    OperationPlan, RejectReason, Rejection, TransferKind, apply_batch_result, plan_delete,
    plan_restore, plan_transfer,
};
pub use prompt::{
    ChannelPrompt, ConflictPrompt, ConflictStrategy, PromptError, PromptRequest, ResolveDecision,
};
pub use queue::{BatchOperation, OperationKind};
pub use reconcile::{EventReconciler, ReconcileOutcome, RemoteFetcher, ResourceFetcher, ViewSignal};
pub use retry::{LockRetryPolicy, RetryDelay};
pub use store::{ResourceStore, SharedStore, lock_store, shared};
pub use summary::{Notification, NotificationLevel, summarize};
