// Light-client chain view
// Tracks a trusted peak from weight proofs and validates incremental headers

pub mod primitives;
pub mod blockchain;
pub mod common;
pub mod config;
pub mod storage;
pub mod chain_view;
pub mod cli;

#[cfg(test)]
mod tests;

// Re-export key types for easy access
pub use primitives::{
    primitives::*,
    error::*,
};

pub use blockchain::{
    ChainInfo, Decision, HeaderBlock, HeaderChainValidator, PeakState, SubEpochSummary,
    VerifiedProof, WeightProof, WeightProofVerifier,
};

pub use common::{BatchOp, ConsensusRules, DifficultyRules, KeyValueStore};

pub use config::ChainViewConfig;

pub use storage::{CheckpointStore, MemoryStore, SledStore};

pub use chain_view::{BlocksOutcome, ChainView, ProofOutcome, SyncStatus};
