// Storage layer: key/value backends and the checkpoint store
pub mod checkpoint_store;
pub mod memory_store;
pub mod sled_store;

pub use checkpoint_store::*;
pub use memory_store::*;
pub use sled_store::*;
