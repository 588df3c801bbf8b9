// Storage interface abstraction
use crate::primitives::Result;

/// One write inside an atomic batch
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BatchOp {
    Put(Vec<u8>, Vec<u8>),
    Delete(Vec<u8>),
}

/// Byte-oriented key/value store consumed by the checkpoint store.
///
/// `write_batch` must apply every operation or none of them.
#[async_trait::async_trait]
pub trait KeyValueStore: Send + Sync {
    async fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>>;
    async fn put(&self, key: &[u8], value: Vec<u8>) -> Result<()>;
    async fn delete(&self, key: &[u8]) -> Result<()>;
    async fn write_batch(&self, ops: Vec<BatchOp>) -> Result<()>;

    /// Wait until previous writes are durable
    async fn flush(&self) -> Result<()> {
        Ok(())
    }
}
