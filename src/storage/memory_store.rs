// In-memory key/value store for development and testing
use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::RwLock;

use crate::common::{BatchOp, KeyValueStore};
use crate::primitives::Result;

#[derive(Clone, Default)]
pub struct MemoryStore {
    entries: Arc<RwLock<HashMap<Vec<u8>, Vec<u8>>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }
}

#[async_trait::async_trait]
impl KeyValueStore for MemoryStore {
    async fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>> {
        Ok(self.entries.read().await.get(key).cloned())
    }

    async fn put(&self, key: &[u8], value: Vec<u8>) -> Result<()> {
        self.entries.write().await.insert(key.to_vec(), value);
        Ok(())
    }

    async fn delete(&self, key: &[u8]) -> Result<()> {
        self.entries.write().await.remove(key);
        Ok(())
    }

    async fn write_batch(&self, ops: Vec<BatchOp>) -> Result<()> {
        // Single write guard, so readers never see half a batch
        let mut entries = self.entries.write().await;
        for op in ops {
            match op {
                BatchOp::Put(key, value) => {
                    entries.insert(key, value);
                }
                BatchOp::Delete(key) => {
                    entries.remove(&key);
                }
            }
        }
        Ok(())
    }
}
