// Weight proofs and their structural verification
use std::collections::BTreeMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tracing::debug;

use crate::blockchain::header::HeaderBlock;
use crate::common::ConsensusRules;
use crate::config::ChainViewConfig;
use crate::primitives::{Hash256, Height, ProofError, Weight};

/// Commitment to the boundary header of one sub-epoch.
///
/// Summaries are hash-chained through `prev_summary_hash`, which gives the
/// chain of custody between sampled checkpoints that are not adjacent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubEpochSummary {
    pub prev_summary_hash: Hash256,
    pub height: Height,
    pub weight: Weight,
    pub header_hash: Hash256,
}

impl SubEpochSummary {
    pub fn hash(&self) -> Hash256 {
        let mut hasher = Sha256::new();
        hasher.update(self.prev_summary_hash.as_bytes());
        hasher.update(self.height.to_le_bytes());
        hasher.update(self.weight.to_le_bytes());
        hasher.update(self.header_hash.as_bytes());
        Hash256(hasher.finalize().into())
    }
}

/// Succinct claim that the chain ending at the recent chain's tip has
/// `claimed_weight`. Produced by a full node, never trusted as-is.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WeightProof {
    pub sub_epochs: Vec<SubEpochSummary>,
    /// Sampled sub-epoch boundary headers, ascending by height
    pub checkpoints: Vec<HeaderBlock>,
    /// Contiguous headers from the last sub-epoch boundary to the tip
    pub recent_chain: Vec<HeaderBlock>,
    pub claimed_height: Height,
    pub claimed_weight: Weight,
}

impl WeightProof {
    pub fn tip(&self) -> Option<&HeaderBlock> {
        self.recent_chain.last()
    }
}

/// Result of a successful verification. Every field is derived from
/// verified proof content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerifiedProof {
    pub tip: HeaderBlock,
    pub height: Height,
    pub weight: Weight,
    pub checkpoints: BTreeMap<Height, HeaderBlock>,
}

/// Stateless weight-proof verifier
#[derive(Clone)]
pub struct WeightProofVerifier {
    max_sample_gap: u32,
    min_checkpoint_samples: usize,
    min_difficulty: u64,
    rules: Arc<dyn ConsensusRules>,
}

impl WeightProofVerifier {
    pub fn new(config: &ChainViewConfig, rules: Arc<dyn ConsensusRules>) -> Self {
        Self {
            max_sample_gap: config.max_sample_gap,
            min_checkpoint_samples: config.min_checkpoint_samples,
            min_difficulty: config.min_difficulty,
            rules,
        }
    }

    pub fn verify(&self, proof: &WeightProof) -> Result<VerifiedProof, ProofError> {
        let (last_summary, tip) = match (proof.sub_epochs.last(), proof.tip()) {
            (Some(summary), Some(tip)) => (summary, tip),
            (None, _) => {
                return Err(ProofError::InsufficientSamples(
                    "proof carries no sub-epoch summaries".to_string(),
                ))
            }
            (_, None) => {
                return Err(ProofError::InsufficientSamples(
                    "proof carries no recent chain".to_string(),
                ))
            }
        };

        // The peak must sit above genesis
        if tip.height == 0 {
            return Err(ProofError::InsufficientSamples(
                "proof does not extend past genesis".to_string(),
            ));
        }

        self.verify_summaries(&proof.sub_epochs)?;
        self.verify_sampling(proof, tip.height)?;
        let mut checkpoints = self.verify_checkpoints(&proof.sub_epochs, &proof.checkpoints)?;
        self.verify_recent_chain(last_summary, &proof.recent_chain)?;

        if proof.claimed_height != tip.height || proof.claimed_weight != tip.weight {
            return Err(ProofError::Malformed(format!(
                "claims height {} weight {} but tip is height {} weight {}",
                proof.claimed_height, proof.claimed_weight, tip.height, tip.weight
            )));
        }

        for header in &proof.recent_chain {
            checkpoints.insert(header.height, header.clone());
        }

        debug!(
            "Verified weight proof: height={}, weight={}, checkpoints={}",
            tip.height,
            tip.weight,
            checkpoints.len()
        );

        Ok(VerifiedProof {
            tip: tip.clone(),
            height: tip.height,
            weight: tip.weight,
            checkpoints,
        })
    }

    fn verify_summaries(&self, summaries: &[SubEpochSummary]) -> Result<(), ProofError> {
        let first = &summaries[0];
        if first.height != 0 || !first.prev_summary_hash.is_zero() {
            return Err(ProofError::Malformed(
                "first sub-epoch summary must commit to genesis".to_string(),
            ));
        }

        for pair in summaries.windows(2) {
            let (prev, next) = (&pair[0], &pair[1]);
            if next.prev_summary_hash != prev.hash() {
                return Err(ProofError::Malformed(format!(
                    "summary at height {} does not link to summary at height {}",
                    next.height, prev.height
                )));
            }
            if next.height <= prev.height || next.weight <= prev.weight {
                return Err(ProofError::Malformed(format!(
                    "summary at height {} does not advance height and weight",
                    next.height
                )));
            }

            let min_gain = (next.height - prev.height) as u128 * self.min_difficulty as u128;
            if next.weight - prev.weight < min_gain {
                return Err(ProofError::Malformed(format!(
                    "weight gained before height {} is below the difficulty floor",
                    next.height
                )));
            }
        }

        Ok(())
    }

    fn verify_sampling(&self, proof: &WeightProof, tip_height: Height) -> Result<(), ProofError> {
        let boundaries = proof
            .sub_epochs
            .iter()
            .map(|summary| summary.height)
            .chain(std::iter::once(tip_height));

        let mut prev: Option<Height> = None;
        for height in boundaries {
            if let Some(prev) = prev {
                let gap = height.checked_sub(prev).ok_or_else(|| {
                    ProofError::Malformed(format!(
                        "tip at height {} sits below the last summary at height {}",
                        height, prev
                    ))
                })?;
                if gap > self.max_sample_gap {
                    return Err(ProofError::InsufficientSamples(format!(
                        "{} blocks unsampled between heights {} and {} (max {})",
                        gap, prev, height, self.max_sample_gap
                    )));
                }
            }
            prev = Some(height);
        }

        let required = self.min_checkpoint_samples.min(proof.sub_epochs.len()).max(1);
        if proof.checkpoints.len() < required {
            return Err(ProofError::InsufficientSamples(format!(
                "{} checkpoint headers sampled, {} required",
                proof.checkpoints.len(),
                required
            )));
        }

        Ok(())
    }

    fn verify_checkpoints(
        &self,
        summaries: &[SubEpochSummary],
        checkpoints: &[HeaderBlock],
    ) -> Result<BTreeMap<Height, HeaderBlock>, ProofError> {
        let by_height: BTreeMap<Height, &SubEpochSummary> =
            summaries.iter().map(|summary| (summary.height, summary)).collect();

        let mut verified = BTreeMap::new();
        let mut prev: Option<&HeaderBlock> = None;

        for header in checkpoints {
            let summary = by_height.get(&header.height).ok_or_else(|| {
                ProofError::Malformed(format!(
                    "checkpoint at height {} has no sub-epoch summary",
                    header.height
                ))
            })?;

            if header.hash() != summary.header_hash || header.weight != summary.weight {
                return Err(ProofError::Malformed(format!(
                    "checkpoint at height {} does not match its summary",
                    header.height
                )));
            }

            if let Some(prev) = prev {
                if header.height <= prev.height {
                    return Err(ProofError::Malformed(
                        "checkpoints are not in ascending height order".to_string(),
                    ));
                }
                if header.height == prev.height + 1 && !header.extends(prev) {
                    return Err(ProofError::Malformed(format!(
                        "adjacent checkpoint at height {} does not link to its predecessor",
                        header.height
                    )));
                }
            }

            if !self.rules.validate_header(header, None) {
                return Err(ProofError::Malformed(format!(
                    "checkpoint at height {} fails consensus rules",
                    header.height
                )));
            }

            verified.insert(header.height, header.clone());
            prev = Some(header);
        }

        Ok(verified)
    }

    fn verify_recent_chain(
        &self,
        last_summary: &SubEpochSummary,
        recent_chain: &[HeaderBlock],
    ) -> Result<(), ProofError> {
        let first = &recent_chain[0];
        if first.height != last_summary.height
            || first.hash() != last_summary.header_hash
            || first.weight != last_summary.weight
        {
            return Err(ProofError::Malformed(
                "recent chain does not start at the last sub-epoch boundary".to_string(),
            ));
        }
        if !self.rules.validate_header(first, None) {
            return Err(ProofError::Malformed(format!(
                "recent chain header at height {} fails consensus rules",
                first.height
            )));
        }

        for pair in recent_chain.windows(2) {
            let (parent, header) = (&pair[0], &pair[1]);
            if !header.extends(parent) {
                return Err(ProofError::Malformed(format!(
                    "recent chain breaks linkage at height {}",
                    header.height
                )));
            }
            if !self.rules.validate_header(header, Some(parent)) {
                return Err(ProofError::Malformed(format!(
                    "recent chain header at height {} fails consensus rules",
                    header.height
                )));
            }
        }

        Ok(())
    }
}
