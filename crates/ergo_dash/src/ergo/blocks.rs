//! Recent blocks with miner fees recovered from block outputs.

use crate::chain::fetch::{BlockDetail, BlockTransaction, ExplorerBlock, FetchError, Fetcher};
use crate::chain::nano_to_erg;
use crate::ergo::miners::{MinerDirectory, MinerInfo};
use futures_util::future::join_all;
use serde::Serialize;
use tracing::{debug, info, warn};

/// Blocks shown by the dashboard when no count is given.
pub const DEFAULT_BLOCK_COUNT: u32 = 4;

/// A recent block, all values in ERG.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Block {
    pub id: String,
    pub height: u64,
    pub miner_address: String,
    /// Miner identifier as reported upstream; resolved via [`MinerDirectory`].
    pub miner_name: Option<String>,
    pub transactions_count: u64,
    pub size: u64,
    pub miner_reward: f64,
    pub total_fees: f64,
    pub total_block_value: f64,
    /// Epoch milliseconds.
    pub timestamp: i64,
}

impl Block {
    pub fn from_explorer(block: &ExplorerBlock, total_fees: f64) -> Self {
        let miner_reward = nano_to_erg(block.miner_reward);
        Self {
            id: block.id.clone(),
            height: block.height,
            miner_address: block.miner.address.clone(),
            miner_name: block.miner.name.clone(),
            transactions_count: block.transactions_count,
            size: block.size,
            miner_reward,
            total_fees,
            total_block_value: miner_reward + total_fees,
            timestamp: block.timestamp,
        }
    }

    pub fn miner_info(&self, miners: &MinerDirectory) -> MinerInfo {
        miners.lookup(self.miner_name.as_deref())
    }
}

/// Position and value of the output chosen as the miner's fee.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FeeOutput {
    pub tx_index: usize,
    pub output_index: usize,
    pub value_nano: u64,
}

/// Find the miner's fee output among all transactions of a block.
///
/// The first output paid to `miner_address` with no attached assets wins,
/// scanning transactions in order and outputs in order. Outputs to the miner
/// that carry tokens are skipped. This is a heuristic: a later asset-free
/// output to the same address (e.g. change) is never considered.
pub fn find_miner_fee(transactions: &[BlockTransaction], miner_address: &str) -> Option<FeeOutput> {
    for (tx_index, tx) in transactions.iter().enumerate() {
        let Some(outputs) = tx.outputs.as_deref() else {
            continue;
        };
        for (output_index, output) in outputs.iter().enumerate() {
            if output.address.as_deref() != Some(miner_address) {
                continue;
            }
            if output.has_assets() {
                debug!(tx_index, output_index, "skipping miner output with assets");
                continue;
            }
            return Some(FeeOutput {
                tx_index,
                output_index,
                value_nano: output.value_nano(),
            });
        }
    }
    None
}

/// Fee in ERG for a block detail; 0.0 when nothing matches.
pub fn miner_fee_from_detail(detail: &BlockDetail, block_id: &str, miner_address: &str) -> f64 {
    let Some(inner) = detail.block.as_ref() else {
        warn!(%block_id, "block detail has no block");
        return 0.0;
    };
    let txs = inner.block_transactions.as_deref().unwrap_or(&[]);
    if txs.is_empty() {
        warn!(%block_id, "block detail has no transactions");
        return 0.0;
    }
    match find_miner_fee(txs, miner_address) {
        Some(fee) => {
            let erg = nano_to_erg(fee.value_nano);
            debug!(
                %block_id,
                tx_index = fee.tx_index,
                output_index = fee.output_index,
                fee_erg = erg,
                "found miner fee"
            );
            erg
        }
        None => {
            debug!(%block_id, %miner_address, "no asset-free miner output");
            0.0
        }
    }
}

/// Fetch the block detail and derive the fee. Any failure degrades to 0.0.
pub async fn fetch_miner_fee(fetcher: &Fetcher, block_id: &str, miner_address: &str) -> f64 {
    match fetcher.block_detail(block_id).await {
        Ok(detail) => miner_fee_from_detail(&detail, block_id, miner_address),
        Err(e) => {
            warn!(%block_id, error = %e, "block detail failed; fee set to 0");
            0.0
        }
    }
}

/// Most recent `count` blocks, each with its miner fee.
///
/// Errors only when the listing itself fails; per-block fee lookups never
/// abort the batch.
pub async fn recent_blocks(fetcher: &Fetcher, count: u32) -> Result<Vec<Block>, FetchError> {
    let listed = fetcher.blocks(count).await?;
    let fees = join_all(
        listed
            .iter()
            .map(|b| fetch_miner_fee(fetcher, &b.id, &b.miner.address)),
    )
    .await;
    let blocks: Vec<Block> = listed
        .iter()
        .zip(fees)
        .map(|(b, fee)| Block::from_explorer(b, fee))
        .collect();
    info!(count = blocks.len(), "recent_blocks");
    Ok(blocks)
}
