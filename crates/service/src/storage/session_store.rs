use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::{Arc, Mutex, PoisonError};

use async_trait::async_trait;

use super::json_map_store::JsonMapStore;
use crate::errors::ServiceError;

pub const TOKEN_KEY: &str = "token";
pub const USER_KEY: &str = "user";

/// Key-value slot holding the persisted session.
///
/// Only the session manager writes here; everything else reads session
/// state through the manager.
#[async_trait]
pub trait SessionStore: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>, ServiceError>;
    async fn set_many(&self, entries: &[(&str, String)]) -> Result<(), ServiceError>;
    async fn remove_many(&self, keys: &[&str]) -> Result<(), ServiceError>;

    async fn set(&self, key: &str, value: String) -> Result<(), ServiceError> {
        self.set_many(&[(key, value)]).await
    }

    async fn remove(&self, key: &str) -> Result<(), ServiceError> {
        self.remove_many(&[key]).await
    }
}

/// Session entries kept in a JSON file on disk.
pub struct JsonFileSessionStore {
    map: Arc<JsonMapStore<String, String>>,
}

impl JsonFileSessionStore {
    pub async fn open<P: Into<PathBuf>>(path: P) -> Result<Arc<Self>, ServiceError> {
        let map = JsonMapStore::open(path).await?;
        Ok(Arc::new(Self { map }))
    }

    pub fn path(&self) -> &std::path::Path {
        self.map.path()
    }
}

#[async_trait]
impl SessionStore for JsonFileSessionStore {
    async fn get(&self, key: &str) -> Result<Option<String>, ServiceError> {
        Ok(self.map.get(&key.to_string()).await)
    }

    async fn set_many(&self, entries: &[(&str, String)]) -> Result<(), ServiceError> {
        let owned = entries.iter().map(|(k, v)| (k.to_string(), v.clone())).collect();
        self.map.insert_many(owned).await
    }

    async fn remove_many(&self, keys: &[&str]) -> Result<(), ServiceError> {
        let owned: Vec<String> = keys.iter().map(|k| k.to_string()).collect();
        self.map.remove_many(&owned).await.map(|_| ())
    }
}

/// In-process store for tests and throwaway sessions.
#[derive(Default)]
pub struct MemorySessionStore {
    entries: Mutex<HashMap<String, String>>,
}

impl MemorySessionStore {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Seed raw entries, bypassing any validation.
    pub fn with_entries<I, K, V>(entries: I) -> Arc<Self>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let map = entries.into_iter().map(|(k, v)| (k.into(), v.into())).collect();
        Arc::new(Self { entries: Mutex::new(map) })
    }

    pub fn snapshot(&self) -> HashMap<String, String> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }
}

#[async_trait]
impl SessionStore for MemorySessionStore {
    async fn get(&self, key: &str) -> Result<Option<String>, ServiceError> {
        Ok(self.entries.lock().unwrap_or_else(PoisonError::into_inner).get(key).cloned())
    }

    async fn set_many(&self, entries: &[(&str, String)]) -> Result<(), ServiceError> {
        let mut map = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        for (k, v) in entries {
            map.insert(k.to_string(), v.clone());
        }
        Ok(())
    }

    async fn remove_many(&self, keys: &[&str]) -> Result<(), ServiceError> {
        let mut map = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        for k in keys {
            map.remove(*k);
        }
        Ok(())
    }
}
