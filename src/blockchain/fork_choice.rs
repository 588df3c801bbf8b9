// Fork choice between the trusted peak and a verified weight proof
use crate::blockchain::chain::PeakState;
use crate::blockchain::weight_proof::VerifiedProof;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Adopt,
    Reject,
}

/// Adopt only a strictly heavier candidate. Equal weight keeps the
/// current peak.
pub fn select(current: &PeakState, candidate: &VerifiedProof) -> Decision {
    if candidate.weight > current.peak_weight {
        Decision::Adopt
    } else {
        Decision::Reject
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tests::fixtures::{build_chain, build_weight_proof, test_verifier};

    #[test]
    fn test_uninitialized_adopts_any_proof() {
        let chain = build_chain(40);
        let proof = test_verifier().verify(&build_weight_proof(&chain, 10)).unwrap();
        assert_eq!(select(&PeakState::new(), &proof), Decision::Adopt);
    }

    #[test]
    fn test_equal_and_lighter_rejected() {
        let chain = build_chain(120);
        let verifier = test_verifier();
        let proof = verifier.verify(&build_weight_proof(&chain, 100)).unwrap();

        let current = PeakState {
            peak_header: Some(proof.tip.clone()),
            peak_height: proof.height,
            peak_weight: proof.weight,
            latest_timestamp: proof.tip.timestamp,
            checkpoints: proof.checkpoints.clone(),
        };

        assert_eq!(select(&current, &proof), Decision::Reject);

        let lighter = verifier.verify(&build_weight_proof(&chain, 90)).unwrap();
        assert_eq!(select(&current, &lighter), Decision::Reject);

        let heavier = verifier.verify(&build_weight_proof(&chain, 110)).unwrap();
        assert_eq!(select(&current, &heavier), Decision::Adopt);
    }
}
