// Persistence of the peak state across chain view instances
use std::sync::Arc;

use tempfile::TempDir;

use super::fixtures::*;
use crate::chain_view::ChainView;
use crate::storage::SledStore;

// Views are rebuilt over one shared handle so a reload never races the
// previous handle's file lock
async fn open_sled_view(db: &Arc<SledStore>) -> ChainView {
    ChainView::open(db.clone(), test_rules()).await.unwrap()
}

#[tokio::test]
async fn test_peak_survives_reopen() {
    let temp_dir = TempDir::new().unwrap();
    let db = Arc::new(SledStore::open(temp_dir.path()).unwrap());
    let chain = build_chain(600);

    let (height, checkpoints) = {
        let view = open_sled_view(&db).await;
        view.new_weight_proof(&build_weight_proof(&chain, 499), &test_verifier())
            .await
            .unwrap();
        view.new_blocks(&chain[500..=502]).await.unwrap();
        (view.get_peak_height().await, view.checkpoint_count().await)
    };
    assert_eq!(height, 502);

    let reopened = open_sled_view(&db).await;
    assert_eq!(reopened.get_peak_height().await, 502);
    assert_eq!(reopened.get_peak_block().await, Some(chain[502].clone()));
    assert_eq!(reopened.get_peak_weight().await, chain[502].weight);
    assert_eq!(reopened.get_latest_timestamp().await, chain[502].timestamp);
    assert_eq!(reopened.checkpoint_count().await, checkpoints);

    // The reloaded checkpoints still anchor range validation
    assert!(reopened.validate_blocks(&chain[200..]).await);
    assert!(!reopened.validate_blocks(&chain[504..]).await);
}

#[tokio::test]
async fn test_reset_survives_reopen() {
    let temp_dir = TempDir::new().unwrap();
    let db = Arc::new(SledStore::open(temp_dir.path()).unwrap());
    let chain = build_chain(200);

    {
        let view = open_sled_view(&db).await;
        view.new_weight_proof(&build_weight_proof(&chain, 150), &test_verifier())
            .await
            .unwrap();
        view.reset().await.unwrap();
    }

    let reopened = open_sled_view(&db).await;
    assert!(reopened.get_peak_block().await.is_none());
    assert_eq!(reopened.get_peak_height().await, 0);
}

#[tokio::test]
async fn test_rejected_proof_writes_nothing() {
    let chain = build_chain(300);
    let (view, db) = memory_view().await;

    view.new_weight_proof(&build_weight_proof(&chain, 250), &test_verifier())
        .await
        .unwrap();
    let entries = db.len().await;

    view.new_weight_proof(&build_weight_proof(&chain, 200), &test_verifier())
        .await
        .unwrap();
    assert_eq!(db.len().await, entries);
    assert_eq!(view.get_peak_height().await, 250);
}
