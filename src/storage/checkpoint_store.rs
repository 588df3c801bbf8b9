// Durable mirror of the chain view's peak state
use std::collections::BTreeMap;
use std::sync::Arc;

use serde::de::DeserializeOwned;

use crate::blockchain::{HeaderBlock, PeakState};
use crate::common::{BatchOp, KeyValueStore};
use crate::primitives::{ChainViewError, Height, Result, Timestamp, Weight};

const PEAK_HEADER_KEY: &[u8] = b"peak_header";
const PEAK_HEIGHT_KEY: &[u8] = b"peak_height";
const PEAK_WEIGHT_KEY: &[u8] = b"peak_weight";
const LATEST_TIMESTAMP_KEY: &[u8] = b"latest_timestamp";
const CHECKPOINTS_KEY: &[u8] = b"checkpoints";

const ALL_KEYS: [&[u8]; 5] = [
    PEAK_HEADER_KEY,
    PEAK_HEIGHT_KEY,
    PEAK_WEIGHT_KEY,
    LATEST_TIMESTAMP_KEY,
    CHECKPOINTS_KEY,
];

/// Maps `PeakState` onto fixed keys of a `KeyValueStore`.
///
/// Every field is written in one batch so a reader never finds a new peak
/// next to a stale checkpoint set.
#[derive(Clone)]
pub struct CheckpointStore {
    db: Arc<dyn KeyValueStore>,
}

impl CheckpointStore {
    pub fn new(db: Arc<dyn KeyValueStore>) -> Self {
        Self { db }
    }

    /// Load the persisted peak state, `None` if no peak was ever committed
    pub async fn load(&self) -> Result<Option<PeakState>> {
        let peak_header: HeaderBlock = match self.get_value(PEAK_HEADER_KEY).await? {
            Some(header) => header,
            None => return Ok(None),
        };

        let peak_height: Height = self.require(PEAK_HEIGHT_KEY).await?;
        let peak_weight: Weight = self.require(PEAK_WEIGHT_KEY).await?;
        let latest_timestamp: Timestamp = self.require(LATEST_TIMESTAMP_KEY).await?;
        let checkpoints: BTreeMap<Height, HeaderBlock> = self.require(CHECKPOINTS_KEY).await?;

        if peak_header.height != peak_height {
            return Err(ChainViewError::Storage(format!(
                "stored peak header at height {} disagrees with stored height {}",
                peak_header.height, peak_height
            )));
        }

        Ok(Some(PeakState {
            peak_header: Some(peak_header),
            peak_height,
            peak_weight,
            latest_timestamp,
            checkpoints,
        }))
    }

    /// Persist the whole state atomically
    pub async fn commit(&self, state: &PeakState) -> Result<()> {
        let peak_header = state.peak_header.as_ref().ok_or_else(|| {
            ChainViewError::Storage("refusing to commit a state without a peak".to_string())
        })?;

        let ops = vec![
            BatchOp::Put(PEAK_HEADER_KEY.to_vec(), bincode::serialize(peak_header)?),
            BatchOp::Put(PEAK_HEIGHT_KEY.to_vec(), bincode::serialize(&state.peak_height)?),
            BatchOp::Put(PEAK_WEIGHT_KEY.to_vec(), bincode::serialize(&state.peak_weight)?),
            BatchOp::Put(
                LATEST_TIMESTAMP_KEY.to_vec(),
                bincode::serialize(&state.latest_timestamp)?,
            ),
            BatchOp::Put(CHECKPOINTS_KEY.to_vec(), bincode::serialize(&state.checkpoints)?),
        ];

        self.db.write_batch(ops).await
    }

    /// Remove every persisted field
    pub async fn clear(&self) -> Result<()> {
        let ops = ALL_KEYS.iter().map(|key| BatchOp::Delete(key.to_vec())).collect();
        self.db.write_batch(ops).await
    }

    async fn get_value<T: DeserializeOwned>(&self, key: &[u8]) -> Result<Option<T>> {
        match self.db.get(key).await? {
            Some(bytes) => Ok(Some(bincode::deserialize(&bytes)?)),
            None => Ok(None),
        }
    }

    async fn require<T: DeserializeOwned>(&self, key: &[u8]) -> Result<T> {
        self.get_value(key).await?.ok_or_else(|| {
            ChainViewError::Storage(format!(
                "incomplete peak state: missing {}",
                String::from_utf8_lossy(key)
            ))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStore;
    use crate::tests::fixtures::{build_chain, synced_state};

    #[tokio::test]
    async fn test_empty_store_loads_none() {
        let store = CheckpointStore::new(Arc::new(MemoryStore::new()));
        assert_eq!(store.load().await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_commit_then_load() {
        let chain = build_chain(80);
        let state = synced_state(&chain, 70);
        let store = CheckpointStore::new(Arc::new(MemoryStore::new()));

        store.commit(&state).await.unwrap();
        assert_eq!(store.load().await.unwrap(), Some(state));
    }

    #[tokio::test]
    async fn test_clear() {
        let chain = build_chain(80);
        let db = Arc::new(MemoryStore::new());
        let store = CheckpointStore::new(db.clone());

        store.commit(&synced_state(&chain, 70)).await.unwrap();
        store.clear().await.unwrap();

        assert_eq!(store.load().await.unwrap(), None);
        assert!(db.is_empty().await);
    }

    #[tokio::test]
    async fn test_commit_requires_peak() {
        let store = CheckpointStore::new(Arc::new(MemoryStore::new()));
        assert!(matches!(
            store.commit(&PeakState::new()).await,
            Err(ChainViewError::Storage(_))
        ));
    }

    #[tokio::test]
    async fn test_missing_field_is_an_error() {
        let chain = build_chain(80);
        let db = Arc::new(MemoryStore::new());
        let store = CheckpointStore::new(db.clone());

        store.commit(&synced_state(&chain, 70)).await.unwrap();
        db.delete(CHECKPOINTS_KEY).await.unwrap();

        assert!(matches!(store.load().await, Err(ChainViewError::Storage(_))));
    }
}
