// Chain view configuration
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::primitives::{ChainViewError, Policy, Result};

/// Configuration for a chain view instance and its proof verifier
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChainViewConfig {
    /// Directory holding the sled checkpoint database
    pub data_dir: PathBuf,

    /// Largest height span a weight proof may leave unsampled
    pub max_sample_gap: u32,

    /// Minimum number of sampled checkpoint headers per proof
    pub min_checkpoint_samples: usize,

    /// Smallest weight a single header may contribute
    pub min_difficulty: u64,

    /// Heights below the peak that keep every accepted header as a checkpoint
    pub recent_window: u32,
}

impl Default for ChainViewConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("./data"),
            max_sample_gap: Policy::MAX_SAMPLE_GAP,
            min_checkpoint_samples: Policy::MIN_CHECKPOINT_SAMPLES,
            min_difficulty: Policy::MIN_DIFFICULTY,
            recent_window: Policy::RECENT_WINDOW,
        }
    }
}

impl ChainViewConfig {
    /// Load a JSON config file. Missing fields take their defaults.
    pub fn load(path: &Path) -> Result<Self> {
        let data = std::fs::read(path)?;
        let config: Self = serde_json::from_slice(&data)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.max_sample_gap == 0 {
            return Err(ChainViewError::InvalidConfig(
                "max_sample_gap must be positive".to_string(),
            ));
        }
        if self.min_checkpoint_samples == 0 {
            return Err(ChainViewError::InvalidConfig(
                "min_checkpoint_samples must be positive".to_string(),
            ));
        }
        if self.min_difficulty == 0 {
            return Err(ChainViewError::InvalidConfig(
                "min_difficulty must be positive".to_string(),
            ));
        }
        if self.recent_window == 0 {
            return Err(ChainViewError::InvalidConfig(
                "recent_window must be positive".to_string(),
            ));
        }
        Ok(())
    }

    pub fn db_path(&self) -> PathBuf {
        self.data_dir.join("checkpoints.db")
    }
}
