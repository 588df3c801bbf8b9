// Light-client chain view: the only owner of the trusted peak
use std::sync::Arc;

use tokio::sync::{Mutex, OwnedMutexGuard, RwLock};
use tracing::{debug, info, warn};

use crate::blockchain::{
    select, ChainInfo, Decision, HeaderBlock, HeaderChainValidator, PeakState, WeightProof,
    WeightProofVerifier,
};
use crate::common::{ConsensusRules, KeyValueStore};
use crate::primitives::{ChainViewError, Height, Policy, Result, Timestamp, Weight};
use crate::storage::CheckpointStore;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncStatus {
    Uninitialized,
    Synced,
}

/// What `new_weight_proof` did with a verified proof
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProofOutcome {
    Adopted { height: Height, weight: Weight },
    Rejected { height: Height, weight: Weight, peak_weight: Weight },
}

/// What `new_blocks` did with a header batch
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlocksOutcome {
    Extended { from: Height, to: Height },
    AlreadyKnown,
}

/// Maintains the trusted peak of a light client.
///
/// Mutating operations are serialised by `write_lock` and publish a new
/// `PeakState` only after the checkpoint store confirmed the write. Once a
/// commit has started it runs to completion in its own task, holding the
/// writer lock, so memory and disk agree even if the caller goes away.
/// Readers clone the current `Arc<PeakState>` and never see a partial update.
pub struct ChainView {
    store: CheckpointStore,
    validator: HeaderChainValidator,
    state: Arc<RwLock<Arc<PeakState>>>,
    write_lock: Arc<Mutex<()>>,
    recent_window: Height,
}

impl ChainView {
    /// Open a chain view over `db`, loading any previously committed peak
    pub async fn open(db: Arc<dyn KeyValueStore>, rules: Arc<dyn ConsensusRules>) -> Result<Self> {
        let store = CheckpointStore::new(db);
        let state = match store.load().await? {
            Some(state) => {
                info!(
                    "Loaded peak at height {} (weight {}, {} checkpoints)",
                    state.peak_height,
                    state.peak_weight,
                    state.checkpoints.len()
                );
                state
            }
            None => {
                debug!("No stored peak, starting uninitialized");
                PeakState::new()
            }
        };

        Ok(Self {
            store,
            validator: HeaderChainValidator::new(rules),
            state: Arc::new(RwLock::new(Arc::new(state))),
            write_lock: Arc::new(Mutex::new(())),
            recent_window: Policy::RECENT_WINDOW,
        })
    }

    /// Number of heights below the peak whose headers all stay checkpoints
    pub fn with_recent_window(mut self, window: Height) -> Self {
        self.recent_window = window;
        self
    }

    /// Verify `proof` and adopt it if it is strictly heavier than the peak.
    ///
    /// A lighter or equally heavy proof is not an error and leaves the state
    /// untouched.
    pub async fn new_weight_proof(
        &self,
        proof: &WeightProof,
        verifier: &WeightProofVerifier,
    ) -> Result<ProofOutcome> {
        let verified = verifier.verify(proof).map_err(|e| {
            warn!("Weight proof failed verification: {}", e);
            ChainViewError::from(e)
        })?;

        let guard = self.write_lock.clone().lock_owned().await;
        let current = self.snapshot().await;

        if select(&current, &verified) == Decision::Reject {
            debug!(
                "Rejected weight proof at height {} (weight {} <= peak weight {})",
                verified.height, verified.weight, current.peak_weight
            );
            return Ok(ProofOutcome::Rejected {
                height: verified.height,
                weight: verified.weight,
                peak_weight: current.peak_weight,
            });
        }

        let (height, weight) = (verified.height, verified.weight);
        let next = PeakState {
            latest_timestamp: verified.tip.timestamp,
            peak_header: Some(verified.tip),
            peak_height: height,
            peak_weight: weight,
            checkpoints: verified.checkpoints,
        };
        self.publish(guard, next).await?;

        info!(
            "Adopted weight proof: peak {} -> {} (weight {})",
            current.peak_height, height, weight
        );
        Ok(ProofOutcome::Adopted { height, weight })
    }

    /// Extend the peak with headers that attach directly to it.
    ///
    /// A leading run of already-trusted headers is skipped when it is
    /// contiguous and ends at the peak, so repeating a call is a no-op.
    pub async fn new_blocks(&self, headers: &[HeaderBlock]) -> Result<BlocksOutcome> {
        let guard = self.write_lock.clone().lock_owned().await;
        let current = self.snapshot().await;

        let peak = current.peak_header.as_ref().ok_or_else(|| {
            ChainViewError::Linkage("chain view has no peak to extend".to_string())
        })?;

        let first_new = headers
            .iter()
            .position(|header| !current.is_known(header))
            .unwrap_or(headers.len());
        let (known, new_headers) = headers.split_at(first_new);

        let last = match new_headers.last() {
            Some(last) => last,
            None => return Ok(BlocksOutcome::AlreadyKnown),
        };

        if let Some(last_known) = known.last() {
            let contiguous = known.windows(2).all(|pair| pair[1].extends(&pair[0]));
            if !contiguous || last_known.height != peak.height {
                return Err(ChainViewError::Linkage(format!(
                    "known headers up to height {} do not lead to the peak at height {}",
                    last_known.height, peak.height
                )));
            }
        }

        self.validator.validate_extension(peak, new_headers)?;
        if last.weight < current.peak_weight {
            return Err(ChainViewError::InvalidHeader {
                height: last.height,
                reason: format!("weight {} below peak weight {}", last.weight, current.peak_weight),
            });
        }

        let mut next = PeakState::clone(&current);
        for header in new_headers {
            next.checkpoints.insert(header.height, header.clone());
        }
        next.peak_header = Some(last.clone());
        next.peak_height = last.height;
        next.peak_weight = last.weight;
        next.latest_timestamp = last.timestamp;
        next.prune_checkpoints(self.recent_window);

        let from = peak.height + 1;
        let to = last.height;
        self.publish(guard, next).await?;

        info!("Extended peak {} -> {} with {} headers", from - 1, to, new_headers.len());
        Ok(BlocksOutcome::Extended { from, to })
    }

    /// Check a header sequence against the current peak and checkpoints
    /// without changing any state.
    pub async fn validate_blocks(&self, headers: &[HeaderBlock]) -> bool {
        let snapshot = self.snapshot().await;
        self.validator.validate(headers, &snapshot)
    }

    /// Delete the durable state and return to `Uninitialized`
    pub async fn reset(&self) -> Result<()> {
        let guard = self.write_lock.clone().lock_owned().await;
        self.publish(guard, PeakState::new()).await?;
        info!("Chain view reset");
        Ok(())
    }

    pub async fn get_peak_block(&self) -> Option<HeaderBlock> {
        self.snapshot().await.peak_header.clone()
    }

    pub async fn get_peak_height(&self) -> Height {
        self.snapshot().await.peak_height
    }

    pub async fn get_latest_timestamp(&self) -> Timestamp {
        self.snapshot().await.latest_timestamp
    }

    pub async fn get_peak_weight(&self) -> Weight {
        self.snapshot().await.peak_weight
    }

    pub async fn get_checkpoint(&self, height: Height) -> Option<HeaderBlock> {
        self.snapshot().await.checkpoints.get(&height).cloned()
    }

    pub async fn checkpoint_count(&self) -> usize {
        self.snapshot().await.checkpoints.len()
    }

    pub async fn status(&self) -> SyncStatus {
        if self.snapshot().await.is_synced() {
            SyncStatus::Synced
        } else {
            SyncStatus::Uninitialized
        }
    }

    pub async fn chain_info(&self) -> ChainInfo {
        ChainInfo::from(self.snapshot().await.as_ref())
    }

    /// Immutable copy of the current state
    pub async fn snapshot(&self) -> Arc<PeakState> {
        self.state.read().await.clone()
    }

    // Durable write first, in-memory swap second, both inside one task that
    // owns the writer lock. A failed write leaves the old state visible. A
    // dropped caller only stops waiting; the next mutator queues behind the
    // lock and sees the committed state. A state without a peak clears the
    // store.
    async fn publish(&self, guard: OwnedMutexGuard<()>, next: PeakState) -> Result<()> {
        let store = self.store.clone();
        let state = Arc::clone(&self.state);

        tokio::spawn(async move {
            let _guard = guard;
            if next.is_synced() {
                store.commit(&next).await?;
            } else {
                store.clear().await?;
            }
            *state.write().await = Arc::new(next);
            Ok::<(), ChainViewError>(())
        })
        .await
        .map_err(|e| ChainViewError::Storage(format!("Commit task join error: {}", e)))?
    }
}
