//! In-memory store of autoscaler snapshots
//!
//! The watcher writes into the store while scrapes read from it. Snapshots
//! are immutable once stored; an update replaces the whole `Arc`.

use crate::models::{object_key, Autoscaler};
use dashmap::DashMap;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;

/// Registry of observed autoscalers, keyed by `namespace/name`
#[derive(Debug, Default)]
pub struct AutoscalerStore {
    autoscalers: DashMap<String, Arc<Autoscaler>>,
}

impl AutoscalerStore {
    pub fn new() -> Self {
        Self {
            autoscalers: DashMap::new(),
        }
    }

    /// Insert or replace a snapshot
    pub fn apply(&self, autoscaler: Autoscaler) {
        let key = autoscaler.key();
        debug!(key = %key, "Storing autoscaler snapshot");
        self.autoscalers.insert(key, Arc::new(autoscaler));
    }

    /// Remove a snapshot
    pub fn delete(&self, namespace: &str, name: &str) -> Option<Arc<Autoscaler>> {
        let key = object_key(namespace, name);
        debug!(key = %key, "Removing autoscaler snapshot");
        self.autoscalers.remove(&key).map(|(_, v)| v)
    }

    /// Replace the whole content, as after a fresh list
    pub fn replace_all(&self, autoscalers: impl IntoIterator<Item = Autoscaler>) {
        let fresh: HashMap<String, Arc<Autoscaler>> = autoscalers
            .into_iter()
            .map(|a| (a.key(), Arc::new(a)))
            .collect();

        self.autoscalers.retain(|key, _| fresh.contains_key(key));
        debug!(count = fresh.len(), "Replacing autoscaler snapshots");
        for (key, autoscaler) in fresh {
            self.autoscalers.insert(key, autoscaler);
        }
    }

    pub fn get(&self, namespace: &str, name: &str) -> Option<Arc<Autoscaler>> {
        self.autoscalers
            .get(&object_key(namespace, name))
            .map(|r| Arc::clone(r.value()))
    }

    /// All snapshots, sorted by key
    pub fn list(&self) -> Vec<Arc<Autoscaler>> {
        let mut entries: Vec<(String, Arc<Autoscaler>)> = self
            .autoscalers
            .iter()
            .map(|r| (r.key().clone(), Arc::clone(r.value())))
            .collect();
        entries.sort_by(|a, b| a.0.cmp(&b.0));
        entries.into_iter().map(|(_, v)| v).collect()
    }

    pub fn len(&self) -> usize {
        self.autoscalers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.autoscalers.is_empty()
    }
}
