use std::collections::HashMap;

use parking_lot::Mutex;
use tracelogs_common::caps::TOKEN_CACHE_KEY;

use crate::{error::StoreError, types::AuthToken};

/// Session-scoped string store the auth token is cached in.
pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError>;
    fn set(&self, key: &str, value: &str) -> Result<(), StoreError>;
    fn delete(&self, key: &str) -> Result<(), StoreError>;
}

#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<String, String>>,
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        Ok(self.entries.lock().get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        self.entries.lock().insert(key.to_owned(), value.to_owned());
        Ok(())
    }

    fn delete(&self, key: &str) -> Result<(), StoreError> {
        self.entries.lock().remove(key);
        Ok(())
    }
}

impl<S: KeyValueStore + ?Sized> KeyValueStore for &S {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        (**self).get(key)
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        (**self).set(key, value)
    }

    fn delete(&self, key: &str) -> Result<(), StoreError> {
        (**self).delete(key)
    }
}

/// Typed access to the auth token kept under [`TOKEN_CACHE_KEY`].
#[derive(Debug)]
pub struct TokenCache<S> {
    store: S,
}

impl<S: KeyValueStore> TokenCache<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub fn get(&self) -> Result<Option<AuthToken>, StoreError> {
        Ok(self
            .store
            .get(TOKEN_CACHE_KEY)?
            .filter(|value| !value.is_empty())
            .map(AuthToken::new))
    }

    pub fn set(&self, token: &AuthToken) -> Result<(), StoreError> {
        self.store.set(TOKEN_CACHE_KEY, token.expose())
    }

    pub fn clear(&self) -> Result<(), StoreError> {
        self.store.delete(TOKEN_CACHE_KEY)
    }

    pub fn store(&self) -> &S {
        &self.store
    }
}
