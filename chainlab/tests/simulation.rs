//! End-to-end pass over the whole core: mine an interactive chain, tamper
//! with it, rebuild it, then run a consensus round over simulated nodes.

use std::time::Duration;

use chainlab::{
    auto_mine, resolve_conflict, sync_to_longest_chain, sync_to_majority, validate_all_nodes,
    AutoMineStatus, CancelSignal, Chain, MiningConfig, MiningEngine, MiningOutcome,
    MiningRegistry, Node, SessionKey,
};

const DIFFICULTY: usize = 1;

fn test_engine() -> MiningEngine {
    MiningEngine::new(MiningConfig {
        progress_stride: 100,
        settle_delay: Duration::from_millis(1),
        poll_interval: Duration::from_millis(2),
        max_poll_attempts: 5,
    })
}

async fn mined_node(engine: &MiningEngine, id: u64, payloads: &[&str]) -> Node {
    let cancel = CancelSignal::new();
    let mut blocks = Vec::new();
    for data in payloads {
        let previous_hash: Option<String> = blocks.last().map(|b: &chainlab::BlockData| b.hash.clone());
        let result = engine
            .mine_record(data, previous_hash.as_deref(), DIFFICULTY, &cancel, None)
            .await
            .unwrap();
        assert_eq!(result.outcome, MiningOutcome::Mined);
        blocks.push(result.into_record(*data));
    }
    Node::new(id, format!("Node {id}"), blocks)
}

#[tokio::test]
async fn test_mine_tamper_and_remine_chain() {
    let engine = test_engine();
    let registry = MiningRegistry::new();
    let cancel = CancelSignal::new();

    let mut chain = Chain::new(DIFFICULTY);
    chain.push_data("Alice pays Bob 5");
    chain.push_data("Bob pays Carol 3");

    let report = auto_mine(&mut chain, 0, &engine, &registry, &cancel, None)
        .await
        .unwrap();
    assert_eq!(report.status, AutoMineStatus::Completed);
    assert!(chain.is_chain_valid());
    assert_eq!(chain.ledger().len(), 2);

    // Editing a mined payload changes its hash, so the successor's stored
    // link no longer matches and the chain as a whole fails validation.
    chain.update_block_data(1, "Alice pays Bob 500").unwrap();
    assert!(!chain.is_block_valid(2));
    assert!(!chain.is_chain_valid());

    // A second auto-mine pass repairs the damage.
    let report = auto_mine(&mut chain, 0, &engine, &registry, &cancel, None)
        .await
        .unwrap();
    assert_eq!(report.status, AutoMineStatus::Completed);
    assert!(chain.is_chain_valid());
    assert!(!registry.is_mining(SessionKey::new(0, 1)));
}

#[tokio::test]
async fn test_consensus_round_over_simulated_nodes() {
    let engine = test_engine();

    let replicated = mined_node(&engine, 1, &["a", "b", "c"]).await;
    let mut nodes = vec![
        replicated.clone(),
        Node::new(2, "Node 2", replicated.blocks.clone()),
        mined_node(&engine, 3, &["a", "b"]).await,
    ];
    // Corrupt a third copy so one node fails validation outright.
    nodes[2].blocks[0].data = "forged".to_string();

    let verdicts = validate_all_nodes(&nodes, DIFFICULTY);
    assert_eq!(verdicts, vec![true, true, false]);

    let report = resolve_conflict(&nodes, DIFFICULTY);
    assert_eq!(report.winner_index, 0);
    assert_eq!(report.valid_length, 3);

    let majority = sync_to_majority(nodes.clone(), DIFFICULTY);
    assert!(validate_all_nodes(&majority, DIFFICULTY).iter().all(|&v| v));
    for node in &majority {
        assert_eq!(node.blocks, replicated.blocks);
    }

    let longest = sync_to_longest_chain(nodes, DIFFICULTY);
    for node in &longest {
        assert_eq!(node.blocks, replicated.blocks);
    }
}

#[tokio::test]
async fn test_registry_cancel_interrupts_chain_mining() {
    let engine = test_engine();
    let registry = std::sync::Arc::new(MiningRegistry::new());
    let key = SessionKey::new(7, 1);

    // An unreachable target: only cancellation ends this session.
    let task = {
        let registry = std::sync::Arc::clone(&registry);
        let engine = engine.clone();
        tokio::spawn(async move {
            registry
                .start(key, |signal| async move {
                    engine
                        .mine_record("unreachable", None, 16, &signal, None)
                        .await
                })
                .await
        })
    };

    while !registry.is_mining(key) {
        tokio::task::yield_now().await;
    }
    registry.cancel(key);

    let result = task.await.unwrap().unwrap().unwrap();
    assert_eq!(result.outcome, MiningOutcome::Cancelled);
    assert!(!registry.is_mining(key));
}
