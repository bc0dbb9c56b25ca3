use std::future::Future;

use remote_core::Resource;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::{Mutex, mpsc, oneshot};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum ConflictStrategy {
    Skip,
    Replace,
    KeepBoth,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolveDecision {
    pub strategy: ConflictStrategy,
    pub apply_to_all: bool,
}

impl ResolveDecision {
    pub fn once(strategy: ConflictStrategy) -> Self {
        Self {
            strategy,
            apply_to_all: false,
        }
    }

    pub fn for_all(strategy: ConflictStrategy) -> Self {
        Self {
            strategy,
            apply_to_all: true,
        }
    }
}

#[derive(Debug, Error)]
pub enum PromptError {
    #[error("conflict prompt was closed before answering")]
    Closed,
}

// `conflicts_remaining` includes the conflict being asked about.
pub trait ConflictPrompt: Send + Sync {
    fn ask(
        &self,
        resource: &Resource,
        conflicts_remaining: usize,
        is_single: bool,
    ) -> impl Future<Output = Result<ResolveDecision, PromptError>> + Send;
}

#[derive(Debug)]
pub struct PromptRequest {
    pub resource: Resource,
    pub conflicts_remaining: usize,
    pub is_single: bool,
    reply: oneshot::Sender<ResolveDecision>,
}

impl PromptRequest {
    pub fn respond(self, decision: ResolveDecision) -> bool {
        self.reply.send(decision).is_ok()
    }
}

pub struct ChannelPrompt {
    requests: mpsc::Sender<PromptRequest>,
    outstanding: Mutex<()>,
}

impl ChannelPrompt {
    pub fn new(buffer: usize) -> (Self, mpsc::Receiver<PromptRequest>) {
        let (requests, receiver) = mpsc::channel(buffer.max(1));
        (
            Self {
                requests,
                outstanding: Mutex::new(()),
            },
            receiver,
        )
    }
}

impl ConflictPrompt for ChannelPrompt {
    async fn ask(
        &self,
        resource: &Resource,
        conflicts_remaining: usize,
        is_single: bool,
    ) -> Result<ResolveDecision, PromptError> {
        let _open_prompt = self.outstanding.lock().await;
        let (reply, answer) = oneshot::channel();
        self.requests
            .send(PromptRequest {
                resource: resource.clone(),
                conflicts_remaining,
                is_single,
                reply,
            })
            .await
            .map_err(|_| PromptError::Closed)?;
        answer.await.map_err(|_| PromptError::Closed)
    }
}
