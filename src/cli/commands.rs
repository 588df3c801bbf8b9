// Command argument structs and their behaviour
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{bail, Context};
use clap::Args;
use serde::de::DeserializeOwned;

use super::{AsyncCommand, SyncCommand};
use crate::blockchain::{ChainInfo, HeaderBlock, WeightProof, WeightProofVerifier};
use crate::chain_view::{BlocksOutcome, ChainView, ProofOutcome};
use crate::common::DifficultyRules;
use crate::config::ChainViewConfig;
use crate::primitives::Timestamp;
use crate::storage::SledStore;

/// Options shared by every command that opens the checkpoint database
#[derive(Args, Debug, Clone, Default, PartialEq, Eq)]
pub struct StoreArgs {
    /// Data directory holding the checkpoint database
    #[arg(short, long)]
    pub data_dir: Option<PathBuf>,

    /// JSON configuration file
    #[arg(short, long)]
    pub config: Option<PathBuf>,
}

impl StoreArgs {
    pub fn load_config(&self) -> anyhow::Result<ChainViewConfig> {
        let mut config = load_config(self.config.as_deref())?;
        if let Some(data_dir) = &self.data_dir {
            config.data_dir = data_dir.clone();
        }
        Ok(config)
    }

    pub async fn open_view(&self, config: &ChainViewConfig) -> anyhow::Result<ChainView> {
        let db_path = config.db_path();
        let db = SledStore::open(&db_path)
            .with_context(|| format!("opening checkpoint database at {}", db_path.display()))?;
        let rules = Arc::new(DifficultyRules::new(config.min_difficulty));
        let view = ChainView::open(Arc::new(db), rules).await?;
        Ok(view.with_recent_window(config.recent_window))
    }
}

#[derive(Args, Debug, Clone, PartialEq, Eq)]
pub struct StatusCommand {
    #[command(flatten)]
    pub store: StoreArgs,

    /// Print the peak as JSON
    #[arg(long)]
    pub json: bool,
}

impl StatusCommand {
    pub async fn execute(&self) -> anyhow::Result<ChainInfo> {
        let config = self.store.load_config()?;
        let view = self.store.open_view(&config).await?;
        Ok(view.chain_info().await)
    }
}

#[async_trait::async_trait]
impl AsyncCommand for StatusCommand {
    async fn run(&self) -> anyhow::Result<()> {
        let info = self.execute().await?;
        if self.json {
            println!("{}", serde_json::to_string_pretty(&info)?);
            return Ok(());
        }

        match info.peak_hash {
            Some(hash) => {
                println!("Peak height:      {}", info.peak_height);
                println!("Peak hash:        {}", hash);
                println!("Peak weight:      {}", info.peak_weight);
                println!("Latest timestamp: {}", format_timestamp(info.latest_timestamp));
                println!("Checkpoints:      {}", info.checkpoint_count);
            }
            None => println!("No peak: no weight proof has been accepted yet"),
        }
        Ok(())
    }
}

#[derive(Args, Debug, Clone, PartialEq, Eq)]
pub struct ImportProofCommand {
    #[command(flatten)]
    pub store: StoreArgs,

    /// JSON file containing the weight proof
    #[arg(short, long)]
    pub proof: PathBuf,
}

impl ImportProofCommand {
    pub async fn execute(&self) -> anyhow::Result<ProofOutcome> {
        let config = self.store.load_config()?;
        let proof: WeightProof = read_json(&self.proof)?;
        let view = self.store.open_view(&config).await?;
        let verifier = WeightProofVerifier::new(
            &config,
            Arc::new(DifficultyRules::new(config.min_difficulty)),
        );
        Ok(view.new_weight_proof(&proof, &verifier).await?)
    }
}

#[async_trait::async_trait]
impl AsyncCommand for ImportProofCommand {
    async fn run(&self) -> anyhow::Result<()> {
        match self.execute().await? {
            ProofOutcome::Adopted { height, weight } => {
                println!("Adopted weight proof: peak height {} weight {}", height, weight)
            }
            ProofOutcome::Rejected { height, weight, peak_weight } => println!(
                "Kept current peak: proof at height {} has weight {} (peak weight {})",
                height, weight, peak_weight
            ),
        }
        Ok(())
    }
}

#[derive(Args, Debug, Clone, PartialEq, Eq)]
pub struct ImportHeadersCommand {
    #[command(flatten)]
    pub store: StoreArgs,

    /// JSON file containing an array of headers
    #[arg(long)]
    pub headers: PathBuf,
}

impl ImportHeadersCommand {
    pub async fn execute(&self) -> anyhow::Result<BlocksOutcome> {
        let config = self.store.load_config()?;
        let headers: Vec<HeaderBlock> = read_json(&self.headers)?;
        let view = self.store.open_view(&config).await?;
        Ok(view.new_blocks(&headers).await?)
    }
}

#[async_trait::async_trait]
impl AsyncCommand for ImportHeadersCommand {
    async fn run(&self) -> anyhow::Result<()> {
        match self.execute().await? {
            BlocksOutcome::Extended { from, to } => {
                println!("Extended peak with heights {}..={}", from, to)
            }
            BlocksOutcome::AlreadyKnown => println!("All headers already known"),
        }
        Ok(())
    }
}

#[derive(Args, Debug, Clone, PartialEq, Eq)]
pub struct ValidateHeadersCommand {
    #[command(flatten)]
    pub store: StoreArgs,

    /// JSON file containing an array of headers
    #[arg(long)]
    pub headers: PathBuf,
}

impl ValidateHeadersCommand {
    pub async fn execute(&self) -> anyhow::Result<bool> {
        let config = self.store.load_config()?;
        let headers: Vec<HeaderBlock> = read_json(&self.headers)?;
        let view = self.store.open_view(&config).await?;
        Ok(view.validate_blocks(&headers).await)
    }
}

#[async_trait::async_trait]
impl AsyncCommand for ValidateHeadersCommand {
    async fn run(&self) -> anyhow::Result<()> {
        if self.execute().await? {
            println!("valid");
            Ok(())
        } else {
            bail!("headers do not extend the trusted chain")
        }
    }
}

#[derive(Args, Debug, Clone, PartialEq, Eq)]
pub struct InspectProofCommand {
    /// JSON file containing the weight proof
    #[arg(short, long)]
    pub proof: PathBuf,

    /// JSON configuration file
    #[arg(short, long)]
    pub config: Option<PathBuf>,
}

impl SyncCommand for InspectProofCommand {
    fn run(&self) -> anyhow::Result<()> {
        let config = load_config(self.config.as_deref())?;
        let proof: WeightProof = read_json(&self.proof)?;
        let verifier = WeightProofVerifier::new(
            &config,
            Arc::new(DifficultyRules::new(config.min_difficulty)),
        );
        let verified = verifier.verify(&proof)?;

        println!("Tip height:  {}", verified.height);
        println!("Tip hash:    {}", verified.tip.hash());
        println!("Tip weight:  {}", verified.weight);
        println!("Tip time:    {}", format_timestamp(verified.tip.timestamp));
        println!("Checkpoints: {}", verified.checkpoints.len());
        Ok(())
    }
}

#[derive(Args, Debug, Clone, PartialEq, Eq)]
pub struct ResetCommand {
    #[command(flatten)]
    pub store: StoreArgs,

    /// Confirm deletion of the stored peak
    #[arg(long)]
    pub yes: bool,
}

#[async_trait::async_trait]
impl AsyncCommand for ResetCommand {
    async fn run(&self) -> anyhow::Result<()> {
        if !self.yes {
            bail!("refusing to reset without --yes");
        }
        let config = self.store.load_config()?;
        let view = self.store.open_view(&config).await?;
        view.reset().await?;
        println!("Chain view reset");
        Ok(())
    }
}

fn load_config(path: Option<&Path>) -> anyhow::Result<ChainViewConfig> {
    match path {
        Some(path) => ChainViewConfig::load(path)
            .with_context(|| format!("loading config from {}", path.display())),
        None => Ok(ChainViewConfig::default()),
    }
}

fn read_json<T: DeserializeOwned>(path: &Path) -> anyhow::Result<T> {
    let data = std::fs::read(path).with_context(|| format!("reading {}", path.display()))?;
    serde_json::from_slice(&data).with_context(|| format!("parsing {}", path.display()))
}

fn format_timestamp(timestamp: Timestamp) -> String {
    i64::try_from(timestamp)
        .ok()
        .and_then(|secs| chrono::DateTime::from_timestamp(secs, 0))
        .map(|time| time.to_rfc3339())
        .unwrap_or_else(|| timestamp.to_string())
}
