use std::{collections::HashMap, hash::Hash, path::{Path, PathBuf}, sync::Arc};
use tokio::{fs, sync::RwLock};
use tracing::{debug, warn};

use crate::errors::ServiceError;

/// Generic JSON file-backed key-value map.
///
/// The whole map is rewritten on every mutation (write to a sibling temp
/// file, then rename) so a crash never leaves a half-written file behind.
/// An unparseable file is treated as empty and immediately rewritten as such.
pub struct JsonMapStore<K, V> {
    inner: RwLock<HashMap<K, V>>,
    file_path: PathBuf,
}

impl<K, V> JsonMapStore<K, V>
where
    K: Eq + Hash + serde::Serialize + serde::de::DeserializeOwned + Clone,
    V: serde::Serialize + serde::de::DeserializeOwned + Clone,
{
    /// Open the store at `path`, creating parent directories as needed.
    pub async fn open<P: Into<PathBuf>>(path: P) -> Result<Arc<Self>, ServiceError> {
        let file_path = path.into();
        common::env::ensure_parent_dir(&file_path).await.map_err(ServiceError::storage)?;

        let (map, corrupted) = match fs::read(&file_path).await {
            Ok(bytes) => match serde_json::from_slice::<HashMap<K, V>>(&bytes) {
                Ok(map) => (map, false),
                Err(e) => {
                    warn!(path = %file_path.display(), error = %e, "state file unreadable; clearing it");
                    (HashMap::new(), true)
                }
            },
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => (HashMap::new(), false),
            Err(e) => return Err(ServiceError::storage(format!("{}: {e}", file_path.display()))),
        };

        let store = Self { inner: RwLock::new(map), file_path };
        if corrupted {
            store.save(&HashMap::new()).await?;
        }
        Ok(Arc::new(store))
    }

    pub fn path(&self) -> &Path {
        &self.file_path
    }

    async fn save(&self, map: &HashMap<K, V>) -> Result<(), ServiceError> {
        let data = serde_json::to_vec_pretty(map).map_err(ServiceError::storage)?;
        let tmp = self.file_path.with_extension("json.tmp");
        fs::write(&tmp, data).await.map_err(ServiceError::storage)?;
        fs::rename(&tmp, &self.file_path).await.map_err(ServiceError::storage)?;
        debug!(path = %self.file_path.display(), entries = map.len(), "state file written");
        Ok(())
    }

    pub async fn get(&self, key: &K) -> Option<V> {
        self.inner.read().await.get(key).cloned()
    }

    pub async fn len(&self) -> usize {
        self.inner.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.inner.read().await.is_empty()
    }

    /// Insert all pairs and persist once.
    pub async fn insert_many(&self, entries: Vec<(K, V)>) -> Result<(), ServiceError> {
        let mut map = self.inner.write().await;
        for (k, v) in entries {
            map.insert(k, v);
        }
        self.save(&map).await
    }

    /// Remove all keys and persist once; returns how many existed.
    pub async fn remove_many(&self, keys: &[K]) -> Result<usize, ServiceError> {
        let mut map = self.inner.write().await;
        let removed = keys.iter().filter(|k| map.remove(*k).is_some()).count();
        self.save(&map).await?;
        Ok(removed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_file(tag: &str) -> PathBuf {
        std::env::temp_dir().join(format!("brainjar_{tag}_{}", uuid::Uuid::new_v4())).join("state.json")
    }

    #[tokio::test]
    async fn writes_survive_reopen() -> Result<(), anyhow::Error> {
        let path = temp_file("reopen");
        let store = JsonMapStore::<String, String>::open(&path).await?;
        assert!(store.is_empty().await);

        store.insert_many(vec![("a".into(), "1".into()), ("b".into(), "2".into())]).await?;
        assert_eq!(store.remove_many(&["b".into(), "zzz".into()]).await?, 1);

        let reopened = JsonMapStore::<String, String>::open(&path).await?;
        assert_eq!(reopened.len().await, 1);
        assert_eq!(reopened.get(&"a".into()).await.as_deref(), Some("1"));
        assert!(fs::metadata(path.with_extension("json.tmp")).await.is_err());

        let _ = fs::remove_dir_all(path.parent().unwrap()).await;
        Ok(())
    }

    #[tokio::test]
    async fn garbage_file_opens_empty_and_is_replaced() -> Result<(), anyhow::Error> {
        let path = temp_file("garbage");
        fs::create_dir_all(path.parent().unwrap()).await?;
        fs::write(&path, b"{\"token\": ").await?;

        let store = JsonMapStore::<String, String>::open(&path).await?;
        assert!(store.is_empty().await);
        let cleared: HashMap<String, String> = serde_json::from_str(&fs::read_to_string(&path).await?)?;
        assert!(cleared.is_empty());

        store.insert_many(vec![("k".into(), "v".into())]).await?;

        let raw = fs::read_to_string(&path).await?;
        let parsed: HashMap<String, String> = serde_json::from_str(&raw)?;
        assert_eq!(parsed.get("k").map(String::as_str), Some("v"));

        let _ = fs::remove_dir_all(path.parent().unwrap()).await;
        Ok(())
    }
}
