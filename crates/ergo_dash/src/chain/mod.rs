//! Upstream fetching, normalization, and the price cache.

mod cache;
pub(crate) mod fetch;
mod normalize;

pub use cache::{PriceCache, PriceSnapshot, PRICE_WINDOW};
pub use fetch::{
    BlockDetail, BlockTransaction, ExplorerAsset, ExplorerBlock, ExplorerBox, ExplorerMiner,
    FetchConfig, FetchError, Fetcher, TxQuery, UnconfirmedTx,
};
pub use normalize::{
    decode_quoted_json, nano_to_erg, unquote_json_body, ListOrEnvelope, NormalizeError,
    NANO_ERG_PER_ERG,
};
