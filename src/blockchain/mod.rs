// Light-client chain primitives: headers, weight proofs, fork choice and
// header-chain validation

pub mod header;
pub mod chain;
pub mod weight_proof;
pub mod fork_choice;
pub mod validator;

pub use header::HeaderBlock;
pub use chain::{ChainInfo, PeakState};
pub use weight_proof::{SubEpochSummary, VerifiedProof, WeightProof, WeightProofVerifier};
pub use fork_choice::{select, Decision};
pub use validator::HeaderChainValidator;
