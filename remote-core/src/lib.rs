mod client;
pub mod paths;
mod resource;

pub use client::{RemoteError, RemoteFileOps, ResourceRef};
pub use resource::{Resource, ResourceType};
