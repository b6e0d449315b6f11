//! Endpoint payloads: USD-annotated transactions, block labels, and price.

mod views;

pub use views::{BlockLabel, BlockView, PriceView, TransactionView, CURRENCY};

use crate::chain::{FetchConfig, FetchError, Fetcher, TxQuery, PRICE_WINDOW};
use crate::ergo::{
    recent_blocks, unconfirmed_transactions, Block, MinerDirectory, OraclePriceSource,
    PriceFetcher, PriceSource, DEFAULT_BLOCK_COUNT,
};
use std::sync::Arc;
use std::time::Duration;
use tracing::warn;

#[derive(Clone, Debug)]
pub struct DashboardConfig {
    pub block_count: u32,
    pub tx_query: TxQuery,
    pub price_window: Duration,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            block_count: DEFAULT_BLOCK_COUNT,
            tx_query: TxQuery::default(),
            price_window: PRICE_WINDOW,
        }
    }
}

/// Process-scoped state shared by every request: the upstream client, the
/// price cache, and the miner tables.
pub struct Dashboard {
    config: DashboardConfig,
    fetcher: Arc<Fetcher>,
    price: PriceFetcher,
    miners: MinerDirectory,
}

impl Dashboard {
    /// Build with the oracle as price source.
    pub fn new(
        fetch: FetchConfig,
        config: DashboardConfig,
        miners: MinerDirectory,
    ) -> Result<Self, FetchError> {
        let fetcher = Arc::new(Fetcher::new(fetch)?);
        let source = Arc::new(OraclePriceSource::new(fetcher.clone()));
        Ok(Self::with_price_source(fetcher, source, config, miners))
    }

    pub fn with_price_source(
        fetcher: Arc<Fetcher>,
        source: Arc<dyn PriceSource>,
        config: DashboardConfig,
        miners: MinerDirectory,
    ) -> Self {
        let price = PriceFetcher::new(source, config.price_window);
        Self {
            config,
            fetcher,
            price,
            miners,
        }
    }

    pub fn miners(&self) -> &MinerDirectory {
        &self.miners
    }

    pub fn fetcher(&self) -> &Fetcher {
        &self.fetcher
    }

    pub async fn price(&self) -> PriceView {
        PriceView::usd(self.price.get_price().await)
    }

    /// Mempool with `usd_value` attached. Empty when the upstream fails.
    pub async fn transactions(&self) -> Vec<TransactionView> {
        let txs = unconfirmed_transactions(&self.fetcher, &self.config.tx_query).await;
        if txs.is_empty() {
            return Vec::new();
        }
        let price = self.price.get_price().await;
        txs.into_iter()
            .map(|tx| TransactionView::new(tx, price))
            .collect()
    }

    /// Recent blocks, or `None` when the listing is unavailable.
    pub async fn blocks(&self) -> Option<Vec<Block>> {
        match recent_blocks(&self.fetcher, self.config.block_count).await {
            Ok(blocks) => Some(blocks),
            Err(e) => {
                warn!(error = %e, "block listing unavailable");
                None
            }
        }
    }

    /// Labels for the block strip; empty when blocks are unavailable.
    pub async fn block_labels(&self) -> Vec<BlockLabel> {
        self.blocks()
            .await
            .unwrap_or_default()
            .iter()
            .map(|b| BlockLabel::new(b, &self.miners))
            .collect()
    }

    /// Full block rows with resolved miner info; empty when unavailable.
    pub async fn block_views(&self) -> Vec<BlockView> {
        self.blocks()
            .await
            .unwrap_or_default()
            .into_iter()
            .map(|b| BlockView::new(b, &self.miners))
            .collect()
    }
}
