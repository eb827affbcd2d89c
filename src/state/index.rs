//! Link-keyed lookup index over shared pages

use std::{
    collections::HashMap,
    sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard},
};

use tokio::sync::Mutex;

use super::Page;

/// A page shared between the indices and in-flight requests
pub type SharedPage = Arc<Mutex<Page>>;

/// Non-owning routing table from a link to the value it addresses
///
/// The map lock is never held across an await point; callers that need to
/// inspect values iterate over a snapshot of the entries.
#[derive(Debug)]
pub struct PageIndex<V = Page> {
    entries: RwLock<HashMap<String, Arc<Mutex<V>>>>,
}

impl<V> PageIndex<V> {
    pub fn new() -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
        }
    }

    // A poisoned map is still structurally valid, so keep serving it
    fn read(&self) -> RwLockReadGuard<'_, HashMap<String, Arc<Mutex<V>>>> {
        self.entries.read().unwrap_or_else(|e| e.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, HashMap<String, Arc<Mutex<V>>>> {
        self.entries.write().unwrap_or_else(|e| e.into_inner())
    }

    pub fn get(&self, link: &str) -> Option<Arc<Mutex<V>>> {
        self.read().get(link).cloned()
    }

    pub fn insert(&self, link: impl Into<String>, value: Arc<Mutex<V>>) {
        self.write().insert(link.into(), value);
    }

    pub fn remove(&self, link: &str) -> Option<Arc<Mutex<V>>> {
        self.write().remove(link)
    }

    pub fn contains(&self, link: &str) -> bool {
        self.read().contains_key(link)
    }

    pub fn len(&self) -> usize {
        self.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.read().is_empty()
    }

    /// Remove `link` only if it still maps to `value`
    pub fn remove_if_same(&self, link: &str, value: &Arc<Mutex<V>>) -> bool {
        let mut entries = self.write();
        let unchanged = entries
            .get(link)
            .map_or(false, |current| Arc::ptr_eq(current, value));
        if unchanged {
            entries.remove(link);
        }
        unchanged
    }

    /// Copy of the current entries
    pub fn snapshot(&self) -> Vec<(String, Arc<Mutex<V>>)> {
        self.read()
            .iter()
            .map(|(link, value)| (link.clone(), Arc::clone(value)))
            .collect()
    }
}

impl<V> Default for PageIndex<V> {
    fn default() -> Self {
        Self::new()
    }
}
