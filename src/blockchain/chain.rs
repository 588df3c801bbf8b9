// Peak state owned by the chain view
use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::blockchain::header::HeaderBlock;
use crate::primitives::{Hash256, Height, Policy, Timestamp, Weight};

/// The chain view's single mutable record.
///
/// `peak_header` is `None` and `peak_height` is 0 until a weight proof has
/// been accepted. Every checkpoint belongs to the lineage of the peak.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PeakState {
    pub peak_header: Option<HeaderBlock>,
    pub peak_height: Height,
    pub peak_weight: Weight,
    pub latest_timestamp: Timestamp,
    pub checkpoints: BTreeMap<Height, HeaderBlock>,
}

impl PeakState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_synced(&self) -> bool {
        self.peak_header.is_some()
    }

    pub fn peak_hash(&self) -> Option<Hash256> {
        self.peak_header.as_ref().map(HeaderBlock::hash)
    }

    /// Trusted header at `height`, either the peak or a checkpoint
    pub fn known_header(&self, height: Height) -> Option<&HeaderBlock> {
        match &self.peak_header {
            Some(peak) if peak.height == height => Some(peak),
            _ => self.checkpoints.get(&height),
        }
    }

    /// True if `header` is exactly the trusted header at its height
    pub fn is_known(&self, header: &HeaderBlock) -> bool {
        self.known_header(header.height)
            .map(|known| known.hash() == header.hash())
            .unwrap_or(false)
    }

    /// Drop checkpoints more than `window` heights below the peak unless
    /// they sit on a sub-epoch boundary
    pub fn prune_checkpoints(&mut self, window: Height) {
        let floor = self.peak_height.saturating_sub(window);
        self.checkpoints
            .retain(|height, _| *height >= floor || height % Policy::SUB_EPOCH_BLOCKS == 0);
    }
}

/// Short summary of the peak for logging and CLI output
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChainInfo {
    pub peak_hash: Option<Hash256>,
    pub peak_height: Height,
    pub peak_weight: Weight,
    pub latest_timestamp: Timestamp,
    pub checkpoint_count: usize,
}

impl From<&PeakState> for ChainInfo {
    fn from(state: &PeakState) -> Self {
        Self {
            peak_hash: state.peak_hash(),
            peak_height: state.peak_height,
            peak_weight: state.peak_weight,
            latest_timestamp: state.latest_timestamp,
            checkpoint_count: state.checkpoints.len(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tests::fixtures::{build_chain, synced_state};

    #[test]
    fn test_prune_keeps_boundaries_and_recent_window() {
        let chain = build_chain(400);
        let mut state = synced_state(&chain, 100);
        for header in &chain[101..=300] {
            state.checkpoints.insert(header.height, header.clone());
        }
        state.peak_header = Some(chain[300].clone());
        state.peak_height = 300;

        state.prune_checkpoints(50);

        assert!(state.checkpoints.keys().all(|h| *h >= 250 || h % 32 == 0));
        assert_eq!(state.checkpoints.range(250..).count(), 51);
        assert_eq!(state.checkpoints.range(..250).count(), 8);
        assert!(state.is_known(&chain[300]));
        assert!(state.is_known(&chain[224]));
        assert!(!state.is_known(&chain[225]));
    }
}
