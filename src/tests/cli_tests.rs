// Command parsing and end-to-end command execution
use std::path::{Path, PathBuf};

use clap::Parser;
use tempfile::TempDir;

use super::fixtures::*;
use crate::chain_view::{BlocksOutcome, ProofOutcome};
use crate::cli::*;

fn parse(args: &[&str]) -> Commands {
    let mut argv = vec!["chain-view"];
    argv.extend_from_slice(args);
    Cli::try_parse_from(argv).unwrap().command
}

fn store_args(dir: &Path) -> StoreArgs {
    StoreArgs {
        data_dir: Some(dir.to_path_buf()),
        config: None,
    }
}

fn write_json<T: serde::Serialize>(dir: &Path, name: &str, value: &T) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, serde_json::to_vec(value).unwrap()).unwrap();
    path
}

#[test]
fn test_parse_import_proof() {
    let command = parse(&["import-proof", "--proof", "wp.json", "-d", "/tmp/view"]);
    assert_eq!(
        command,
        Commands::ImportProof(ImportProofCommand {
            store: StoreArgs {
                data_dir: Some(PathBuf::from("/tmp/view")),
                config: None,
            },
            proof: PathBuf::from("wp.json"),
        })
    );
}

#[test]
fn test_parse_status_defaults() {
    let command = parse(&["status"]);
    assert_eq!(
        command,
        Commands::Status(StatusCommand {
            store: StoreArgs::default(),
            json: false,
        })
    );
}

#[test]
fn test_parse_rejects_missing_required_option() {
    assert!(Cli::try_parse_from(["chain-view", "validate-headers"]).is_err());
    assert!(Cli::try_parse_from(["chain-view", "import-proof", "--bogus"]).is_err());
}

#[test]
fn test_runnable_variants() {
    assert!(parse(&["inspect-proof", "-p", "wp.json"]).into_runnable().is_immediate());
    assert!(!parse(&["reset", "--yes"]).into_runnable().is_immediate());
    assert!(!parse(&["status", "--json"]).into_runnable().is_immediate());
}

#[tokio::test]
async fn test_commands_end_to_end() {
    let temp_dir = TempDir::new().unwrap();
    let data_dir = temp_dir.path().join("data");
    let chain = build_chain(600);

    let proof_path = write_json(temp_dir.path(), "proof.json", &build_weight_proof(&chain, 499));
    let range_path = write_json(temp_dir.path(), "range.json", &chain[300..].to_vec());
    let next_path = write_json(temp_dir.path(), "next.json", &chain[500..=501].to_vec());

    InspectProofCommand { proof: proof_path.clone(), config: None }
        .run()
        .unwrap();

    let import = ImportProofCommand { store: store_args(&data_dir), proof: proof_path };
    assert_eq!(
        import.execute().await.unwrap(),
        ProofOutcome::Adopted { height: 499, weight: chain[499].weight }
    );
    assert!(matches!(import.execute().await.unwrap(), ProofOutcome::Rejected { .. }));

    let validate = ValidateHeadersCommand { store: store_args(&data_dir), headers: range_path };
    assert!(validate.execute().await.unwrap());

    let extend = ImportHeadersCommand { store: store_args(&data_dir), headers: next_path };
    assert_eq!(
        extend.execute().await.unwrap(),
        BlocksOutcome::Extended { from: 500, to: 501 }
    );

    let status = StatusCommand { store: store_args(&data_dir), json: false };
    let info = status.execute().await.unwrap();
    assert_eq!(info.peak_height, 501);
    assert_eq!(info.peak_hash, Some(chain[501].hash()));

    let reset = ResetCommand { store: store_args(&data_dir), yes: false };
    assert!(reset.run().await.is_err());
    ResetCommand { store: store_args(&data_dir), yes: true }.run().await.unwrap();
    assert_eq!(status.execute().await.unwrap().peak_hash, None);
}

#[test]
fn test_inspect_rejects_malformed_proof() {
    let temp_dir = TempDir::new().unwrap();
    let chain = build_chain(100);
    let mut proof = build_weight_proof(&chain, 90);
    proof.claimed_height = 91;
    let path = write_json(temp_dir.path(), "bad.json", &proof);

    assert!(InspectProofCommand { proof: path, config: None }.run().is_err());
}
