//! Unconfirmed (mempool) transactions normalized to ERG.

use crate::chain::fetch::{ExplorerBox, Fetcher, TxQuery, UnconfirmedTx};
use crate::chain::nano_to_erg;
use serde::Serialize;
use tracing::{info, warn};

/// P2S address of the miner fee contract; outputs paid here are the tx fee.
pub const ERGO_FEE_ADDRESS: &str = "2iHkR7CWvD1R4j1yZg5bkeDRQavjAaVPeTDFGGLZduHyfWMuYpmhHocX8GJoaieTx78FntzJbCBVL6rf96ocJoZdmWBL2fci7NqWgAirppPQmZ7fN9V6z13Ay6brPriBKYqLp1bT2Fk4FkFLCfdPpe";

/// Fee assumed when no usable fee output exists (ERG).
pub const FALLBACK_FEE: f64 = 0.001;
/// Fees above this are treated as bogus (ERG).
pub const MAX_REASONABLE_FEE: f64 = 10.0;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum FeeSource {
    FeeAddressOutput,
    Fallback,
    FallbackUnreasonable,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct AddressValue {
    pub address: String,
    /// ERG.
    pub value: f64,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    pub id: String,
    pub size: Option<u64>,
    /// Total ERG across all outputs.
    pub value: f64,
    pub fee: f64,
    pub fee_source: FeeSource,
    pub inputs: Vec<AddressValue>,
    pub outputs: Vec<AddressValue>,
}

fn flatten_boxes(boxes: &[ExplorerBox]) -> Vec<AddressValue> {
    boxes
        .iter()
        .filter_map(|b| {
            b.address.as_ref().map(|address| AddressValue {
                address: address.clone(),
                value: nano_to_erg(b.value_nano()),
            })
        })
        .collect()
}

/// Fee paid to the fee contract, falling back to [`FALLBACK_FEE`] when
/// missing or outside (0, [`MAX_REASONABLE_FEE`]].
pub fn transaction_fee(outputs: &[ExplorerBox]) -> (f64, FeeSource) {
    let fee_output = outputs
        .iter()
        .find(|o| o.address.as_deref() == Some(ERGO_FEE_ADDRESS));
    let Some(output) = fee_output else {
        return (FALLBACK_FEE, FeeSource::Fallback);
    };
    let fee = nano_to_erg(output.value_nano());
    if fee <= 0.0 || fee > MAX_REASONABLE_FEE {
        return (FALLBACK_FEE, FeeSource::FallbackUnreasonable);
    }
    (fee, FeeSource::FeeAddressOutput)
}

impl From<UnconfirmedTx> for Transaction {
    fn from(tx: UnconfirmedTx) -> Self {
        let inputs = tx.inputs.unwrap_or_default();
        let outputs = tx.outputs.unwrap_or_default();
        let total_nano = outputs
            .iter()
            .fold(0u64, |acc, o| acc.saturating_add(o.value_nano()));
        let (fee, fee_source) = transaction_fee(&outputs);
        Self {
            id: tx.id,
            size: tx.size,
            value: nano_to_erg(total_nano),
            fee,
            fee_source,
            inputs: flatten_boxes(&inputs),
            outputs: flatten_boxes(&outputs),
        }
    }
}

/// Decode raw records one at a time, skipping any that fail.
pub fn normalize_transactions(raw: Vec<serde_json::Value>) -> Vec<Transaction> {
    let total = raw.len();
    let decoded: Vec<Result<UnconfirmedTx, serde_json::Error>> =
        raw.into_iter().map(serde_json::from_value).collect();
    let txs: Vec<Transaction> = decoded
        .into_iter()
        .enumerate()
        .filter_map(|(i, r)| match r {
            Ok(tx) => Some(Transaction::from(tx)),
            Err(e) => {
                warn!(index = i, error = %e, "skipping malformed transaction");
                None
            }
        })
        .collect();
    if txs.len() < total {
        info!(skipped = total - txs.len(), "dropped malformed transactions");
    }
    txs
}

/// Current mempool. Upstream failure yields an empty list.
pub async fn unconfirmed_transactions(fetcher: &Fetcher, query: &TxQuery) -> Vec<Transaction> {
    match fetcher.unconfirmed_transactions(query).await {
        Ok(raw) => {
            let txs = normalize_transactions(raw);
            info!(count = txs.len(), "unconfirmed_transactions");
            txs
        }
        Err(e) => {
            warn!(error = %e, "failed to fetch unconfirmed transactions");
            Vec::new()
        }
    }
}
