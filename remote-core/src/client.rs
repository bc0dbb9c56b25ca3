use std::future::Future;

use thiserror::Error;

use crate::resource::Resource;

const STATUS_LOCKED: u16 = 423;
const STATUS_NOT_FOUND: u16 = 404;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RemoteError {
    #[error("resource is locked: {path}")]
    Locked { path: String },
    #[error("resource not found: {0}")]
    NotFound(String),
    #[error("remote returned {status}: {message}")]
    Api { status: u16, message: String },
    #[error("transport failed: {0}")]
    Transport(String),
}

impl RemoteError {
    pub fn from_status(status: u16, path: &str, message: impl Into<String>) -> Self {
        match status {
            STATUS_LOCKED => RemoteError::Locked {
                path: path.to_string(),
            },
            STATUS_NOT_FOUND => RemoteError::NotFound(path.to_string()),
            status => RemoteError::Api {
                status,
                message: message.into(),
            },
        }
    }

    pub fn is_locked(&self) -> bool {
        matches!(self, RemoteError::Locked { .. })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResourceRef<'a> {
    Id(&'a str),
    Path(&'a str),
}

pub trait RemoteFileOps: Send + Sync {
    fn move_resource(
        &self,
        source_path: &str,
        target_path: &str,
        overwrite: bool,
    ) -> impl Future<Output = Result<Resource, RemoteError>> + Send;

    fn copy_resource(
        &self,
        source_path: &str,
        target_path: &str,
        overwrite: bool,
    ) -> impl Future<Output = Result<Resource, RemoteError>> + Send;

    fn delete_resource(&self, id: &str) -> impl Future<Output = Result<(), RemoteError>> + Send;

    fn restore_resource(
        &self,
        trash_path: &str,
        id: &str,
        restore_path: &str,
        overwrite: bool,
    ) -> impl Future<Output = Result<(), RemoteError>> + Send;

    // Immediate children only, without the folder itself.
    fn list_directory(
        &self,
        path: &str,
        depth: u32,
    ) -> impl Future<Output = Result<Vec<Resource>, RemoteError>> + Send;

    fn get_resource(
        &self,
        target: ResourceRef<'_>,
    ) -> impl Future<Output = Result<Resource, RemoteError>> + Send;
}
