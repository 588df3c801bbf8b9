// Sled-backed key/value store with durable batched writes
use std::path::Path;
use std::time::Duration;

use sled::{Batch, Db, Tree};
use tracing::debug;

use crate::common::{BatchOp, KeyValueStore};
use crate::primitives::{ChainViewError, Result};

const TREE_NAME: &str = "chain_view";

const OPEN_ATTEMPTS: u32 = 20;
const OPEN_RETRY_DELAY: Duration = Duration::from_millis(50);

pub struct SledStore {
    db: Db,
    tree: Tree,
}

impl SledStore {
    pub fn open(path: &Path) -> Result<Self> {
        std::fs::create_dir_all(path)
            .map_err(|e| ChainViewError::Storage(format!("Failed to create directory: {}", e)))?;

        // A handle dropped moments ago may still hold the file lock
        let mut attempt = 1;
        let db = loop {
            match sled::open(path) {
                Ok(db) => break db,
                Err(sled::Error::Io(e)) if attempt < OPEN_ATTEMPTS => {
                    debug!("Sled open attempt {} at {} failed: {}", attempt, path.display(), e);
                    attempt += 1;
                    std::thread::sleep(OPEN_RETRY_DELAY);
                }
                Err(e) => {
                    return Err(ChainViewError::Storage(format!(
                        "Failed to open sled database: {}",
                        e
                    )))
                }
            }
        };

        let tree = db
            .open_tree(TREE_NAME)
            .map_err(|e| ChainViewError::Storage(format!("Failed to open tree: {}", e)))?;

        Ok(Self { db, tree })
    }

    pub fn entry_count(&self) -> usize {
        self.tree.len()
    }
}

#[async_trait::async_trait]
impl KeyValueStore for SledStore {
    async fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>> {
        let tree = self.tree.clone();
        let key = key.to_vec();

        // Run database operation in blocking task to avoid blocking async runtime
        tokio::task::spawn_blocking(move || {
            tree.get(&key)
                .map(|value| value.map(|ivec| ivec.to_vec()))
                .map_err(|e| ChainViewError::Storage(format!("Failed to get data: {}", e)))
        })
        .await
        .map_err(|e| ChainViewError::Storage(format!("Task join error: {}", e)))?
    }

    async fn put(&self, key: &[u8], value: Vec<u8>) -> Result<()> {
        self.write_batch(vec![BatchOp::Put(key.to_vec(), value)]).await
    }

    async fn delete(&self, key: &[u8]) -> Result<()> {
        self.write_batch(vec![BatchOp::Delete(key.to_vec())]).await
    }

    async fn write_batch(&self, ops: Vec<BatchOp>) -> Result<()> {
        let tree = self.tree.clone();

        tokio::task::spawn_blocking(move || {
            let mut batch = Batch::default();
            for op in ops {
                match op {
                    BatchOp::Put(key, value) => batch.insert(key, value),
                    BatchOp::Delete(key) => batch.remove(key),
                }
            }

            tree.apply_batch(batch)
                .map_err(|e| ChainViewError::Storage(format!("Failed to apply batch: {}", e)))?;
            tree.flush()
                .map_err(|e| ChainViewError::Storage(format!("Failed to flush: {}", e)))?;
            Ok(())
        })
        .await
        .map_err(|e| ChainViewError::Storage(format!("Task join error: {}", e)))?
    }

    async fn flush(&self) -> Result<()> {
        let db = self.db.clone();

        tokio::task::spawn_blocking(move || {
            db.flush()
                .map_err(|e| ChainViewError::Storage(format!("Failed to sync database: {}", e)))?;
            Ok(())
        })
        .await
        .map_err(|e| ChainViewError::Storage(format!("Task join error: {}", e)))?
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_sled_store_basic_operations() {
        let temp_dir = tempfile::tempdir().unwrap();
        let store = SledStore::open(temp_dir.path()).unwrap();

        store.put(b"key", b"value".to_vec()).await.unwrap();
        assert_eq!(store.get(b"key").await.unwrap(), Some(b"value".to_vec()));

        store.delete(b"key").await.unwrap();
        assert_eq!(store.get(b"key").await.unwrap(), None);

        store
            .write_batch(vec![
                BatchOp::Put(b"a".to_vec(), vec![1]),
                BatchOp::Put(b"b".to_vec(), vec![2]),
                BatchOp::Delete(b"a".to_vec()),
            ])
            .await
            .unwrap();
        assert_eq!(store.get(b"a").await.unwrap(), None);
        assert_eq!(store.get(b"b").await.unwrap(), Some(vec![2]));
        assert_eq!(store.entry_count(), 1);

        store.flush().await.unwrap();
    }

    #[tokio::test]
    async fn test_sled_store_persistence() {
        let temp_dir = tempfile::tempdir().unwrap();

        {
            let store = SledStore::open(temp_dir.path()).unwrap();
            store.put(b"persistent", b"value".to_vec()).await.unwrap();
        }

        let reopened = SledStore::open(temp_dir.path()).unwrap();
        assert_eq!(
            reopened.get(b"persistent").await.unwrap(),
            Some(b"value".to_vec())
        );
    }

    #[tokio::test]
    async fn test_sled_store_reopens_right_after_drop() {
        let temp_dir = tempfile::tempdir().unwrap();

        for round in 0u8..5 {
            let store = SledStore::open(temp_dir.path()).unwrap();
            store.put(&[round], vec![round]).await.unwrap();
        }

        let reopened = SledStore::open(temp_dir.path()).unwrap();
        assert_eq!(reopened.entry_count(), 5);
        assert_eq!(reopened.get(&[4]).await.unwrap(), Some(vec![4]));
    }
}
