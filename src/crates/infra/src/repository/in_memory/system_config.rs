use application::shared::SystemConfigStore;
use async_trait::async_trait;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use std::sync::Arc;

#[derive(Clone, Default)]
pub struct InMemorySystemConfigStore {
    store: Arc<DashMap<String, String>>,
}

impl InMemorySystemConfigStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SystemConfigStore for InMemorySystemConfigStore {
    async fn get_string(&self, key: &str) -> anyhow::Result<Option<String>> {
        Ok(self.store.get(key).map(|v| v.clone()))
    }

    async fn insert_if_absent(&self, key: &str, value: &str) -> anyhow::Result<bool> {
        match self.store.entry(key.to_string()) {
            Entry::Occupied(_) => Ok(false),
            Entry::Vacant(slot) => {
                slot.insert(value.to_string());
                Ok(true)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn existing_value_is_not_overwritten() {
        let store = InMemorySystemConfigStore::new();
        assert!(store.insert_if_absent("first_time", "false").await.unwrap());
        assert!(!store.insert_if_absent("first_time", "true").await.unwrap());
        assert_eq!(
            store.get_string("first_time").await.unwrap().as_deref(),
            Some("false")
        );
    }
}
