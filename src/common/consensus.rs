// Pluggable per-header consensus predicate
use crate::blockchain::header::HeaderBlock;
use crate::primitives::Policy;

/// Protocol-specific validity check for a single header.
///
/// `parent` is the header's direct predecessor when it is known. Sampled
/// checkpoints inside a weight proof are checked with `parent == None`.
pub trait ConsensusRules: Send + Sync {
    fn validate_header(&self, header: &HeaderBlock, parent: Option<&HeaderBlock>) -> bool;
}

/// Weight-accounting rules: every block contributes at least
/// `min_difficulty` and the cumulative weight must add up exactly.
#[derive(Debug, Clone)]
pub struct DifficultyRules {
    pub min_difficulty: u64,
}

impl DifficultyRules {
    pub fn new(min_difficulty: u64) -> Self {
        Self { min_difficulty }
    }
}

impl Default for DifficultyRules {
    fn default() -> Self {
        Self::new(Policy::MIN_DIFFICULTY)
    }
}

impl ConsensusRules for DifficultyRules {
    fn validate_header(&self, header: &HeaderBlock, parent: Option<&HeaderBlock>) -> bool {
        if header.consensus_proof.is_empty() || header.difficulty < self.min_difficulty {
            return false;
        }
        if header.weight < header.difficulty as u128 {
            return false;
        }

        match parent {
            Some(parent) => {
                parent.weight.checked_add(header.difficulty as u128) == Some(header.weight)
                    && header.timestamp >= parent.timestamp
            }
            None => true,
        }
    }
}
