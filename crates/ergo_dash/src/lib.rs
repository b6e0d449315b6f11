//! ergo_dash: backend for an Ergo explorer dashboard.
//!
//! Fetches the mempool, recent blocks, and the ERG/USD oracle price from
//! upstream REST APIs and normalizes them for the front end. All ERG values
//! leave this crate already converted from nanoERG.

pub mod chain;
pub mod dashboard;
pub mod ergo;

pub use chain::{FetchConfig, FetchError, Fetcher, PriceCache, PriceSnapshot, TxQuery};
pub use dashboard::{BlockLabel, BlockView, Dashboard, DashboardConfig, PriceView, TransactionView};
pub use ergo::{Block, MinerDirectory, MinerInfo, PriceFetcher, PriceQuote, PriceSource, Transaction};
