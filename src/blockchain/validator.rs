// Header-chain validation against the trusted peak and checkpoints
use std::sync::Arc;

use tracing::debug;

use crate::blockchain::chain::PeakState;
use crate::blockchain::header::HeaderBlock;
use crate::common::ConsensusRules;
use crate::primitives::{ChainViewError, Result};

/// Read-only checks for header sequences delivered by untrusted peers
#[derive(Clone)]
pub struct HeaderChainValidator {
    rules: Arc<dyn ConsensusRules>,
}

impl HeaderChainValidator {
    pub fn new(rules: Arc<dyn ConsensusRules>) -> Self {
        Self { rules }
    }

    /// Returns true if the sequence reconciles with a trusted header and is
    /// contiguous and valid from that anchor on.
    ///
    /// The sequence may start anywhere. Headers before the anchor are not
    /// checked.
    pub fn validate(&self, headers: &[HeaderBlock], state: &PeakState) -> bool {
        let anchor = match self.find_anchor(headers, state) {
            Some(anchor) => anchor,
            None => {
                debug!("No trusted anchor in {} headers", headers.len());
                return false;
            }
        };

        for pair in headers[anchor..].windows(2) {
            let (parent, header) = (&pair[0], &pair[1]);
            if !header.extends(parent) {
                debug!("Header sequence breaks linkage at height {}", header.height);
                return false;
            }
            if !self.rules.validate_header(header, Some(parent)) {
                debug!("Header at height {} fails consensus rules", header.height);
                return false;
            }
            if let Some(known) = state.known_header(header.height) {
                if known.hash() != header.hash() {
                    debug!("Header at height {} conflicts with a checkpoint", header.height);
                    return false;
                }
            }
        }

        true
    }

    /// Checks that `headers` extend `parent` directly and contiguously
    pub fn validate_extension(&self, parent: &HeaderBlock, headers: &[HeaderBlock]) -> Result<()> {
        let mut parent = parent;
        for header in headers {
            if !header.extends(parent) {
                return Err(ChainViewError::Linkage(format!(
                    "header at height {} does not extend {} at height {}",
                    header.height,
                    parent.hash(),
                    parent.height
                )));
            }
            if !self.rules.validate_header(header, Some(parent)) {
                return Err(ChainViewError::InvalidHeader {
                    height: header.height,
                    reason: "fails consensus rules".to_string(),
                });
            }
            parent = header;
        }
        Ok(())
    }

    fn find_anchor(&self, headers: &[HeaderBlock], state: &PeakState) -> Option<usize> {
        headers
            .iter()
            .position(|header| state.is_known(header) || self.attaches(header, state))
    }

    fn attaches(&self, header: &HeaderBlock, state: &PeakState) -> bool {
        header
            .height
            .checked_sub(1)
            .and_then(|height| state.known_header(height))
            .map(|parent| header.extends(parent) && self.rules.validate_header(header, Some(parent)))
            .unwrap_or(false)
    }
}
