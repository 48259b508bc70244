//! Process-scoped in-memory store

use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;

use crate::{KeyValueStore, Result};

/// Values live only as long as the process. Clones share the same map.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    values: Arc<RwLock<HashMap<String, String>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.values.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.read().is_empty()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.values.read().get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        self.values
            .write()
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        self.values.write().remove(key);
        Ok(())
    }

    fn set_many(&self, entries: &[(&str, &str)]) -> Result<()> {
        let mut values = self.values.write();
        for (key, value) in entries {
            values.insert(key.to_string(), value.to_string());
        }
        Ok(())
    }

    fn remove_many(&self, keys: &[&str]) -> Result<()> {
        let mut values = self.values.write();
        for key in keys {
            values.remove(*key);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_store() {
        let store = MemoryStore::new();
        assert!(store.is_empty());

        store.set("refreshToken", "R1").unwrap();
        assert_eq!(store.get("refreshToken").unwrap(), Some("R1".to_string()));
        assert_eq!(store.len(), 1);

        store.remove("refreshToken").unwrap();
        assert_eq!(store.get("refreshToken").unwrap(), None);
    }

    #[test]
    fn test_clones_share_values() {
        let store = MemoryStore::new();
        let handle = store.clone();

        handle.set("tenantId", "acme").unwrap();
        assert_eq!(store.get("tenantId").unwrap(), Some("acme".to_string()));
    }

    #[test]
    fn test_batch_writes() {
        let store = MemoryStore::new();

        store.set_many(&[("tenantId", "acme"), ("tenant_id", "acme")]).unwrap();
        assert_eq!(store.len(), 2);

        store.remove_many(&["tenantId", "tenant_id", "token"]).unwrap();
        assert!(store.is_empty());
    }
}
