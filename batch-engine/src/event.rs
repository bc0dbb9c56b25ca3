use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum EventError {
    #[error("malformed event payload: {0}")]
    Malformed(#[from] serde_json::Error),
    #[error("event payload is missing {0}")]
    MissingField(&'static str),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum EventKind {
    PostprocessingFinished,
    FileTouched,
    FolderCreated,
    ItemRenamed,
    ItemMoved,
    ItemTrashed,
    ItemRestored,
    FileLocked,
    FileUnlocked,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReconciliationEvent {
    pub kind: EventKind,
    pub item_id: String,
    pub parent_item_id: Option<String>,
    pub storage_id: String,
    // None for server-side changes
    pub initiator_id: Option<String>,
    pub etag: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawEvent {
    #[serde(rename = "type")]
    kind: EventKind,
    #[serde(default)]
    item_id: Option<String>,
    #[serde(default)]
    parent_item_id: Option<String>,
    #[serde(default, alias = "spaceId")]
    storage_id: Option<String>,
    #[serde(default)]
    initiator_id: Option<String>,
    #[serde(default)]
    etag: Option<String>,
}

impl ReconciliationEvent {
    pub fn new(kind: EventKind, item_id: impl Into<String>, storage_id: impl Into<String>) -> Self {
        Self {
            kind,
            item_id: item_id.into(),
            parent_item_id: None,
            storage_id: storage_id.into(),
            initiator_id: None,
            etag: None,
        }
    }

    pub fn with_parent(mut self, parent_item_id: impl Into<String>) -> Self {
        self.parent_item_id = Some(parent_item_id.into());
        self
    }

    pub fn with_initiator(mut self, initiator_id: impl Into<String>) -> Self {
        self.initiator_id = Some(initiator_id.into());
        self
    }

    pub fn with_etag(mut self, etag: impl Into<String>) -> Self {
        self.etag = Some(etag.into());
        self
    }

    pub fn from_json(payload: &str) -> Result<Self, EventError> {
        let raw: RawEvent = serde_json::from_str(payload)?;
        Ok(Self {
            kind: raw.kind,
            item_id: non_empty(raw.item_id).ok_or(EventError::MissingField("itemId"))?,
            parent_item_id: non_empty(raw.parent_item_id),
            storage_id: non_empty(raw.storage_id).ok_or(EventError::MissingField("storageId"))?,
            initiator_id: non_empty(raw.initiator_id),
            etag: non_empty(raw.etag),
        })
    }

    pub fn is_initiated_by(&self, client_id: &str) -> bool {
        self.initiator_id.as_deref() == Some(client_id)
    }
}

pub fn parse_payload(payload: &str) -> Option<ReconciliationEvent> {
    match ReconciliationEvent::from_json(payload) {
        Ok(event) => Some(event),
        Err(err) => {
            tracing::warn!(error = %err, "dropping push notification");
            None
        }
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|value| !value.trim().is_empty())
}
