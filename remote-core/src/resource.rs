use serde::{Deserialize, Serialize};

use crate::paths;

#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum ResourceType {
    File,
    Folder,
    Space,
}

impl ResourceType {
    pub fn is_container(self) -> bool {
        matches!(self, ResourceType::Folder | ResourceType::Space)
    }
}

// `name` mirrors the last segment of `path`; rewrite paths via `relocate`.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Resource {
    pub id: String,
    pub path: String,
    pub name: String,
    #[serde(rename = "type")]
    pub resource_type: ResourceType,
    #[serde(default)]
    pub parent_folder_id: Option<String>,
    pub storage_id: String,
    #[serde(default)]
    pub etag: String,
    #[serde(default)]
    pub processing: bool,
    #[serde(default)]
    pub locked: bool,
    #[serde(default)]
    pub original_location: Option<String>,
}

impl Resource {
    pub fn new(
        id: impl Into<String>,
        path: impl Into<String>,
        resource_type: ResourceType,
        storage_id: impl Into<String>,
    ) -> Self {
        let path = paths::normalize(&path.into());
        Self {
            id: id.into(),
            name: paths::name_of(&path).to_string(),
            path,
            resource_type,
            parent_folder_id: None,
            storage_id: storage_id.into(),
            etag: String::new(),
            processing: false,
            locked: false,
            original_location: None,
        }
    }

    pub fn with_parent(mut self, parent_folder_id: impl Into<String>) -> Self {
        self.parent_folder_id = Some(parent_folder_id.into());
        self
    }

    pub fn with_etag(mut self, etag: impl Into<String>) -> Self {
        self.etag = etag.into();
        self
    }

    pub fn with_original_location(mut self, location: impl Into<String>) -> Self {
        self.original_location = Some(paths::normalize(&location.into()));
        self
    }

    pub fn is_folder(&self) -> bool {
        self.resource_type.is_container()
    }

    pub fn relocate(&mut self, path: &str, parent_folder_id: Option<String>) {
        self.path = paths::normalize(path);
        self.name = paths::name_of(&self.path).to_string();
        self.parent_folder_id = parent_folder_id;
    }
}
