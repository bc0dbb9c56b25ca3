use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex, MutexGuard};

use remote_core::Resource;

// Never hold the guard across an `.await`.
pub type SharedStore = Arc<Mutex<ResourceStore>>;

pub fn shared(store: ResourceStore) -> SharedStore {
    Arc::new(Mutex::new(store))
}

pub fn lock_store(store: &SharedStore) -> MutexGuard<'_, ResourceStore> {
    store.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct SiblingKey {
    parent: Option<String>,
    name: String,
}

impl SiblingKey {
    fn of(resource: &Resource) -> Self {
        Self {
            parent: resource.parent_folder_id.clone(),
            name: resource.name.clone(),
        }
    }
}

// `by_parent_and_name` is derived from `by_id` on every mutation.
#[derive(Debug, Default, Clone)]
pub struct ResourceStore {
    by_id: HashMap<String, Resource>,
    by_parent_and_name: HashMap<SiblingKey, String>,
    current_folder: Option<Resource>,
}

impl ResourceStore {
    pub fn new() -> Self {
        Self::default()
    }

    // A different id holding the same (parent, name) slot is evicted.
    pub fn upsert(&mut self, resource: Resource) -> bool {
        let inserted = match self.by_id.get(&resource.id) {
            Some(previous) => {
                let old_key = SiblingKey::of(previous);
                if self.by_parent_and_name.get(&old_key) == Some(&resource.id) {
                    self.by_parent_and_name.remove(&old_key);
                }
                false
            }
            None => true,
        };

        let key = SiblingKey::of(&resource);
        if let Some(stale_id) = self.by_parent_and_name.get(&key).cloned()
            && stale_id != resource.id
        {
            tracing::debug!(
                stale = %stale_id,
                replacement = %resource.id,
                name = %resource.name,
                "evicting sibling with the same name"
            );
            self.by_id.remove(&stale_id);
        }
        self.by_parent_and_name.insert(key, resource.id.clone());

        if let Some(current) = self.current_folder.as_mut()
            && current.id == resource.id
        {
            *current = resource.clone();
        }
        self.by_id.insert(resource.id.clone(), resource);
        inserted
    }

    pub fn remove<I, S>(&mut self, ids: I) -> usize
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let ids: HashSet<String> = ids.into_iter().map(|id| id.as_ref().to_string()).collect();
        let mut removed = 0;
        for id in &ids {
            if let Some(resource) = self.by_id.remove(id) {
                let key = SiblingKey::of(&resource);
                if self.by_parent_and_name.get(&key) == Some(id) {
                    self.by_parent_and_name.remove(&key);
                }
                removed += 1;
            }
        }
        removed
    }

    pub fn find(&self, id: &str) -> Option<&Resource> {
        self.by_id.get(id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.by_id.contains_key(id)
    }

    pub fn find_by_parent_and_name(&self, parent_id: Option<&str>, name: &str) -> Option<&Resource> {
        let key = SiblingKey {
            parent: parent_id.map(str::to_string),
            name: name.to_string(),
        };
        self.by_parent_and_name
            .get(&key)
            .and_then(|id| self.by_id.get(id))
    }

    pub fn list_children(&self, parent_id: &str) -> Vec<&Resource> {
        self.by_id
            .values()
            .filter(|resource| resource.parent_folder_id.as_deref() == Some(parent_id))
            .collect()
    }

    pub fn set_current_folder(&mut self, folder: Option<Resource>) {
        self.current_folder = folder;
    }

    pub fn current_folder(&self) -> Option<&Resource> {
        self.current_folder.as_ref()
    }

    pub fn current_folder_id(&self) -> Option<&str> {
        self.current_folder.as_ref().map(|folder| folder.id.as_str())
    }

    pub fn replace_listing(&mut self, folder: Resource, children: Vec<Resource>) {
        self.by_id.clear();
        self.by_parent_and_name.clear();
        self.current_folder = Some(folder);
        for child in children {
            self.upsert(child);
        }
    }

    pub fn set_processing(&mut self, id: &str, processing: bool) -> bool {
        self.patch_flag(id, |resource| resource.processing = processing)
    }

    pub fn set_locked(&mut self, id: &str, locked: bool) -> bool {
        self.patch_flag(id, |resource| resource.locked = locked)
    }

    // Only for fields that take no part in either lookup key.
    fn patch_flag(&mut self, id: &str, apply: impl FnOnce(&mut Resource)) -> bool {
        match self.by_id.get_mut(id) {
            Some(resource) => {
                apply(resource);
                true
            }
            None => false,
        }
    }

    pub fn len(&self) -> usize {
        self.by_id.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_id.is_empty()
    }

    pub fn resources(&self) -> impl Iterator<Item = &Resource> {
        self.by_id.values()
    }
}
