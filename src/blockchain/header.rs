// Header blocks: block metadata without the transaction payload
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::primitives::{Hash256, Height, Timestamp, Weight};

/// A block header as seen by a light client.
///
/// The header hash is always recomputed from the fields, so a header cannot
/// carry a hash that disagrees with its own content.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HeaderBlock {
    pub height: Height,
    pub prev_hash: Hash256,
    pub timestamp: Timestamp,
    /// Weight contributed by this block
    pub difficulty: u64,
    /// Cumulative chain weight up to and including this block
    pub weight: Weight,
    /// Consensus-specific proof, opaque to the chain view
    #[serde(with = "hex::serde")]
    pub consensus_proof: Vec<u8>,
}

impl HeaderBlock {
    pub fn hash(&self) -> Hash256 {
        let mut hasher = Sha256::new();
        hasher.update(self.height.to_le_bytes());
        hasher.update(self.prev_hash.as_bytes());
        hasher.update(self.timestamp.to_le_bytes());
        hasher.update(self.difficulty.to_le_bytes());
        hasher.update(self.weight.to_le_bytes());
        hasher.update((self.consensus_proof.len() as u64).to_le_bytes());
        hasher.update(&self.consensus_proof);
        Hash256(hasher.finalize().into())
    }

    /// True if `self` is the direct successor of `parent`
    pub fn extends(&self, parent: &HeaderBlock) -> bool {
        parent.height.checked_add(1) == Some(self.height) && self.prev_hash == parent.hash()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn header(height: Height, prev_hash: Hash256) -> HeaderBlock {
        HeaderBlock {
            height,
            prev_hash,
            timestamp: 1_600_000_000 + height as u64,
            difficulty: 4,
            weight: 4 * (height as Weight + 1),
            consensus_proof: vec![height as u8; 8],
        }
    }

    #[test]
    fn test_hash_covers_every_field() {
        let base = header(7, Hash256::from_data(b"parent"));
        let mut other = base.clone();
        other.consensus_proof.push(0);
        assert_ne!(base.hash(), other.hash());

        let mut other = base.clone();
        other.weight += 1;
        assert_ne!(base.hash(), other.hash());

        assert_eq!(base.hash(), base.clone().hash());
    }

    #[test]
    fn test_extends() {
        let genesis = header(0, Hash256::zero());
        let child = header(1, genesis.hash());
        assert!(child.extends(&genesis));
        assert!(!genesis.extends(&child));

        let orphan = header(2, genesis.hash());
        assert!(!orphan.extends(&genesis));
    }
}
