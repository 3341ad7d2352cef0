use async_trait::async_trait;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use domain::user::{User, UserError, UserRepository};
use std::sync::Arc;

#[derive(Clone, Default)]
pub struct InMemoryUserRepository {
    store: Arc<DashMap<String, User>>,
}

impl InMemoryUserRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserRepository for InMemoryUserRepository {
    async fn count(&self) -> Result<u64, UserError> {
        Ok(self.store.len() as u64)
    }

    async fn find_by_username(&self, username: &str) -> Result<Option<User>, UserError> {
        Ok(self.store.get(username).map(|v| v.clone()))
    }

    async fn save(&self, user: &User) -> Result<(), UserError> {
        match self.store.entry(user.username.clone()) {
            Entry::Occupied(_) => Err(UserError::UserExists(user.username.clone())),
            Entry::Vacant(entry) => {
                entry.insert(user.clone());
                Ok(())
            }
        }
    }
}
