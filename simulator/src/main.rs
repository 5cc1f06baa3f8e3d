//! Demo driver for the chainlab core: plays the role of the UI layer.
//!
//! Mines an interactive chain block by block, tampers with a mined payload,
//! repairs the chain, then runs a consensus round over a set of simulated
//! ledger nodes, logging every result.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use clap::Parser;
use rand::Rng;
use tokio::sync::mpsc;
use tracing::{info, warn};

use chainlab::{
    auto_mine, resolve_conflict, sync_to_longest_chain, sync_to_majority, validate_all_nodes,
    CancelSignal, Chain, MiningConfig, MiningEngine, MiningProgress, MiningRegistry, Node,
    SessionKey,
};

#[derive(Parser, Debug)]
#[command(
    name = "simulator",
    about = "Drives the chainlab proof-of-work simulation end to end"
)]
struct Args {
    /// Leading zero characters a mined hash must carry (1-4 stays snappy)
    #[arg(long, default_value_t = 2)]
    difficulty: usize,

    /// Payload blocks to mine on the interactive chain (genesis excluded)
    #[arg(long, default_value_t = 3)]
    blocks: usize,

    /// Simulated ledger nodes taking part in the consensus round
    #[arg(long, default_value_t = 4)]
    nodes: usize,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt::init();
    let args = Args::parse();

    let engine = MiningEngine::new(MiningConfig {
        settle_delay: Duration::from_millis(50),
        ..MiningConfig::default()
    });
    let registry = Arc::new(MiningRegistry::new());

    mine_interactive_chain(&args, &engine, &registry).await?;
    cancellation_demo(&engine, &registry).await;
    consensus_round(&args, &engine).await?;

    Ok(())
}

/// Builds a chain of unmined payload blocks and auto-mines them in order,
/// then tampers with one payload and repairs the chain.
async fn mine_interactive_chain(
    args: &Args,
    engine: &MiningEngine,
    registry: &MiningRegistry,
) -> Result<()> {
    let mut chain = Chain::new(args.difficulty);
    for i in 0..args.blocks.max(1) {
        chain.push_data(format!("Transaction batch #{}", i + 1));
    }

    let (progress_tx, mut progress_rx) = mpsc::unbounded_channel::<MiningProgress>();
    let reporter = tokio::spawn(async move {
        while let Some(update) = progress_rx.recv().await {
            info!(
                attempts = update.attempts,
                nonce = update.nonce,
                elapsed_ms = update.elapsed.as_millis() as u64,
                "mining progress"
            );
        }
    });

    let cancel = CancelSignal::new();
    let report = auto_mine(&mut chain, 0, engine, registry, &cancel, Some(&progress_tx)).await?;
    drop(progress_tx);
    reporter.await?;

    info!(
        status = ?report.status,
        mined = report.blocks_mined,
        valid = chain.is_chain_valid(),
        "auto-mine pass finished"
    );
    for entry in chain.ledger() {
        info!(
            data = %entry.data,
            nonce = entry.nonce,
            hash = %entry.hash,
            "ledger entry"
        );
    }

    // Tamper with a random mined payload, then repair.
    let victim = rand::thread_rng().gen_range(1..chain.len());
    chain.update_block_data(victim, "tampered payload")?;
    warn!(
        block = victim,
        valid = chain.is_chain_valid(),
        "payload edited without re-mining"
    );

    let report = auto_mine(&mut chain, 0, engine, registry, &cancel, None).await?;
    info!(
        status = ?report.status,
        mined = report.blocks_mined,
        valid = chain.is_chain_valid(),
        "chain repaired"
    );
    Ok(())
}

/// Starts a search against an unreachable target and cancels it through the
/// registry a moment later.
async fn cancellation_demo(engine: &MiningEngine, registry: &Arc<MiningRegistry>) {
    let key = SessionKey::new(99, 0);

    let canceller = {
        let registry = Arc::clone(registry);
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(100)).await;
            registry.cancel(key);
        })
    };

    let outcome = registry
        .start(key, |signal| async move {
            engine
                .mine_record("uncancellable payload? no such thing", None, 16, &signal, None)
                .await
        })
        .await;

    if let Some(Ok(result)) = outcome {
        info!(
            outcome = ?result.outcome,
            attempts = result.attempts,
            "cancellation demo finished"
        );
    }
    let _ = canceller.await;
    registry.reset_block(key);
}

/// Builds a node set with a replicated majority chain, a shorter honest
/// fork, and a corrupted copy, then applies every resolution rule.
async fn consensus_round(args: &Args, engine: &MiningEngine) -> Result<()> {
    let difficulty = args.difficulty;
    let cancel = CancelSignal::new();

    let mut canonical = Vec::new();
    for i in 0..args.blocks.max(1) {
        let previous_hash: Option<String> = canonical
            .last()
            .map(|b: &chainlab::BlockData| b.hash.clone());
        let data = format!("Ledger record {}", i + 1);
        let result = engine
            .mine_record(&data, previous_hash.as_deref(), difficulty, &cancel, None)
            .await?;
        canonical.push(result.into_record(data));
    }

    let short_fork = canonical[..canonical.len().saturating_sub(1)].to_vec();

    let mut nodes: Vec<Node> = (0..args.nodes.max(2) as u64)
        .map(|id| Node::new(id + 1, format!("Node {}", id + 1), canonical.clone()))
        .collect();

    // One node trails behind, another holds a forged record.
    let last = nodes.len() - 1;
    nodes[last].blocks = short_fork;
    if nodes.len() > 2 {
        let victim = rand::thread_rng().gen_range(0..canonical.len());
        nodes[last - 1].blocks[victim].data = "forged record".to_string();
    }

    let verdicts = validate_all_nodes(&nodes, difficulty);
    for (node, valid) in nodes.iter().zip(&verdicts) {
        info!(node = %node.name, blocks = node.blocks.len(), valid, "node state");
    }

    let report = resolve_conflict(&nodes, difficulty);
    info!(
        winner = %nodes[report.winner_index].name,
        valid_length = report.valid_length,
        "conflict report"
    );

    let majority = sync_to_majority(nodes.clone(), difficulty);
    info!(
        all_valid = validate_all_nodes(&majority, difficulty).iter().all(|&v| v),
        "after majority sync"
    );

    let longest = sync_to_longest_chain(nodes, difficulty);
    info!(
        all_valid = validate_all_nodes(&longest, difficulty).iter().all(|&v| v),
        length = longest[0].blocks.len(),
        "after longest-chain sync"
    );

    Ok(())
}
