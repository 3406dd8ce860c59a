use std::{collections::HashMap, sync::Arc};

use async_trait::async_trait;
use serde::{de::DeserializeOwned, Serialize};
use tokio::sync::Mutex;

use crate::DataManagerError;

/// Persistence port: opaque values under named keys. No transactions.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, DataManagerError>;
    async fn set(&self, key: &str, value: Vec<u8>) -> Result<(), DataManagerError>;
}

/// In-process store, used by tests and when nothing should touch disk.
#[derive(Clone, Default)]
pub struct MemoryStore {
    values: Arc<Mutex<HashMap<String, Vec<u8>>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl KeyValueStore for MemoryStore {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, DataManagerError> {
        Ok(self.values.lock().await.get(key).cloned())
    }

    async fn set(&self, key: &str, value: Vec<u8>) -> Result<(), DataManagerError> {
        self.values.lock().await.insert(key.to_string(), value);
        Ok(())
    }
}

/// Reads a JSON record, `T::default()` when the key was never written.
pub(crate) async fn read_json<T>(store: &dyn KeyValueStore, key: &str) -> Result<T, DataManagerError>
where
    T: DeserializeOwned + Default,
{
    let Some(bytes) = store.get(key).await? else {
        return Ok(T::default());
    };

    serde_json::from_slice(&bytes).map_err(|err| {
        tracing::error!("Failed to parse {key} from store: {err}");
        DataManagerError::Serialization { key: key.to_string(), reason: err.to_string() }
    })
}

pub(crate) async fn write_json<T>(store: &dyn KeyValueStore, key: &str, value: &T) -> Result<(), DataManagerError>
where
    T: Serialize + ?Sized,
{
    let bytes = serde_json::to_vec(value)
        .map_err(|err| DataManagerError::Serialization { key: key.to_string(), reason: err.to_string() })?;

    store.set(key, bytes).await.inspect_err(|err| {
        tracing::error!("Failed to save {key}: {err}");
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn missing_key_reads_default() {
        let store = MemoryStore::new();
        let values: Vec<String> = read_json(&store, "nothing").await.unwrap();
        assert!(values.is_empty());
    }

    #[tokio::test]
    async fn corrupt_value_is_an_error() {
        let store = MemoryStore::new();
        store.set("journeys", b"{not json".to_vec()).await.unwrap();
        let result: Result<Vec<String>, _> = read_json(&store, "journeys").await;
        assert!(matches!(result, Err(DataManagerError::Serialization { .. })));
    }

    #[tokio::test]
    async fn json_round_trip_through_store() {
        let store = MemoryStore::new();
        write_json(&store, "k", &vec![1, 2, 3]).await.unwrap();
        let back: Vec<i32> = read_json(&store, "k").await.unwrap();
        assert_eq!(back, vec![1, 2, 3]);
    }
}
