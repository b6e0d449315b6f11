//! Ergo-specific normalization: blocks with miner fees, mempool transactions,
//! the ERG/USD price, and the miner directory.

mod blocks;
mod miners;
mod price;
mod transactions;

pub use blocks::{
    fetch_miner_fee, find_miner_fee, miner_fee_from_detail, recent_blocks, Block, FeeOutput,
    DEFAULT_BLOCK_COUNT,
};
pub use miners::{MinerDirectory, MinerInfo, UNKNOWN_MINER};
pub use price::{OraclePriceSource, PriceFetcher, PriceQuote, PriceSource, DEFAULT_PRICE};
pub use transactions::{
    normalize_transactions, transaction_fee, unconfirmed_transactions, AddressValue, FeeSource,
    Transaction, ERGO_FEE_ADDRESS, FALLBACK_FEE, MAX_REASONABLE_FEE,
};
