//! JSON shapes served to the front end.

use crate::ergo::{Block, MinerDirectory, MinerInfo, Transaction};
use serde::Serialize;

pub const CURRENCY: &str = "USD";

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct TransactionView {
    #[serde(flatten)]
    pub transaction: Transaction,
    pub usd_value: f64,
}

impl TransactionView {
    pub fn new(transaction: Transaction, price: f64) -> Self {
        let usd_value = transaction.value * price;
        Self {
            transaction,
            usd_value,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BlockLabel {
    pub height: u64,
    pub size: u64,
    pub miner_reward: f64,
    pub transactions_count: u64,
    pub timestamp: i64,
    pub miner_info: MinerInfo,
}

impl BlockLabel {
    pub fn new(block: &Block, miners: &MinerDirectory) -> Self {
        Self {
            height: block.height,
            size: block.size,
            miner_reward: block.miner_reward,
            transactions_count: block.transactions_count,
            timestamp: block.timestamp,
            miner_info: block.miner_info(miners),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BlockView {
    #[serde(flatten)]
    pub block: Block,
    pub miner_info: MinerInfo,
}

impl BlockView {
    pub fn new(block: Block, miners: &MinerDirectory) -> Self {
        let miner_info = block.miner_info(miners);
        Self { block, miner_info }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct PriceView {
    pub price: f64,
    pub currency: &'static str,
}

impl PriceView {
    pub fn usd(price: f64) -> Self {
        Self {
            price,
            currency: CURRENCY,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ergo::FeeSource;
    use serde_json::json;
    use std::collections::HashMap;

    fn block() -> Block {
        Block {
            id: "b1".into(),
            height: 100,
            miner_address: "9fMiner".into(),
            miner_name: Some("pool1".into()),
            transactions_count: 3,
            size: 2048,
            miner_reward: 6.0,
            total_fees: 0.5,
            total_block_value: 6.5,
            timestamp: 1_700_000_000_000,
        }
    }

    #[test]
    fn transaction_view_adds_usd_value() {
        let tx = Transaction {
            id: "t".into(),
            size: Some(10),
            value: 3.0,
            fee: 0.001,
            fee_source: FeeSource::Fallback,
            inputs: vec![],
            outputs: vec![],
        };
        let v = serde_json::to_value(TransactionView::new(tx, 1.5)).unwrap();
        assert_eq!(v["usd_value"], 4.5);
        assert_eq!(v["id"], "t");
        assert_eq!(v["value"], 3.0);
        assert_eq!(v["feeSource"], "fallback");
    }

    #[test]
    fn block_label_shape() {
        let miners = MinerDirectory::new(
            HashMap::from([("pool1".to_string(), "Pool One".to_string())]),
            HashMap::new(),
        );
        let v = serde_json::to_value(BlockLabel::new(&block(), &miners)).unwrap();
        assert_eq!(
            v,
            json!({
                "height": 100,
                "size": 2048,
                "minerReward": 6.0,
                "transactionsCount": 3,
                "timestamp": 1_700_000_000_000i64,
                "minerInfo": {"name": "Pool One", "logo": null}
            })
        );
    }

    #[test]
    fn block_view_flattens_block() {
        let v = serde_json::to_value(BlockView::new(block(), &MinerDirectory::default())).unwrap();
        assert_eq!(v["totalBlockValue"], 6.5);
        assert_eq!(v["minerAddress"], "9fMiner");
        assert_eq!(v["minerInfo"]["name"], "Unknown");
    }

    #[test]
    fn price_view_shape() {
        let v = serde_json::to_value(PriceView::usd(1.0)).unwrap();
        assert_eq!(v, json!({"price": 1.0, "currency": "USD"}));
    }
}
