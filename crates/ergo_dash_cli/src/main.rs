//! ergo-dash CLI: serve the dashboard API, or query each upstream once.

use clap::{Args, Parser, Subcommand};
use ergo_dash::chain::{FetchConfig, Fetcher, TxQuery};
use ergo_dash::ergo::{recent_blocks, unconfirmed_transactions, OraclePriceSource, PriceSource};
use ergo_dash::{Dashboard, DashboardConfig, MinerDirectory};
use ergo_dash_server::{ApiServer, AppState};
use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()))
        .init();
    let cli = Cli::parse();
    match cli.command {
        Command::Serve(args) => run_serve(args),
        Command::Blocks(args) => run_blocks(args),
        Command::Transactions(args) => run_transactions(args),
        Command::Price(args) => run_price(args),
        Command::Miner(args) => run_miner(args),
    }
}

#[derive(Parser)]
#[command(name = "ergo-dash")]
#[command(about = "Ergo explorer dashboard backend (mempool, recent blocks, ERG/USD price)")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Serve the dashboard JSON endpoints.
    Serve(ServeArgs),
    /// Print recent blocks with miner fees.
    Blocks(BlocksArgs),
    /// Print unconfirmed transactions.
    Transactions(TransactionsArgs),
    /// Print the current ERG/USD quote.
    Price(UpstreamArgs),
    /// Resolve a miner identifier to its display name and logo.
    Miner(MinerArgs),
}

#[derive(Args, Clone)]
struct UpstreamArgs {
    #[arg(long, default_value = "https://api.ergoplatform.com")]
    explorer_url: String,
    #[arg(long, default_value = "https://erg-oracle-ergusd.spirepools.com/frontendData")]
    price_url: String,
    /// Per-request timeout in seconds.
    #[arg(long, default_value_t = 10)]
    timeout: u64,
}

impl UpstreamArgs {
    fn fetch_config(&self) -> FetchConfig {
        FetchConfig {
            explorer_url: self.explorer_url.clone(),
            price_url: self.price_url.clone(),
            timeout_secs: self.timeout,
        }
    }
}

#[derive(Args)]
struct MinerTableArgs {
    /// JSON object of miner id -> display name. Defaults to env/config lookup.
    #[arg(long)]
    miner_names: Option<PathBuf>,
    /// JSON object of miner id -> logo.
    #[arg(long)]
    miner_logos: Option<PathBuf>,
}

impl MinerTableArgs {
    fn load(&self) -> MinerDirectory {
        MinerDirectory::load_with(self.miner_names.as_deref(), self.miner_logos.as_deref())
    }
}

#[derive(Args)]
struct ServeArgs {
    #[command(flatten)]
    upstream: UpstreamArgs,
    #[command(flatten)]
    miners: MinerTableArgs,
    #[arg(long, default_value = "0.0.0.0")]
    host: IpAddr,
    #[arg(long, default_value_t = 5000)]
    port: u16,
    /// Directory served at `/` (front end).
    #[arg(long)]
    static_dir: Option<PathBuf>,
    #[arg(long, default_value_t = 4)]
    block_count: u32,
    #[arg(long, default_value_t = 500)]
    tx_limit: u32,
    /// Price cache window in seconds.
    #[arg(long, default_value_t = 300, value_parser = clap::value_parser!(u64).range(1..))]
    price_window: u64,
}

#[derive(Args)]
struct BlocksArgs {
    #[command(flatten)]
    upstream: UpstreamArgs,
    #[arg(long, default_value_t = 4)]
    count: u32,
}

#[derive(Args)]
struct TransactionsArgs {
    #[command(flatten)]
    upstream: UpstreamArgs,
    #[arg(long, default_value_t = 500)]
    limit: u32,
    #[arg(long, default_value_t = 0)]
    offset: u32,
    #[arg(long, default_value = "size")]
    sort_by: String,
    #[arg(long, default_value = "desc")]
    sort_direction: String,
}

#[derive(Args)]
struct MinerArgs {
    #[command(flatten)]
    miners: MinerTableArgs,
    /// Miner identifier as reported by the explorer.
    id: Option<String>,
}

fn run_serve(args: ServeArgs) -> Result<(), Box<dyn std::error::Error>> {
    let miners = args.miners.load();
    let config = DashboardConfig {
        block_count: args.block_count,
        tx_query: TxQuery {
            limit: args.tx_limit,
            ..Default::default()
        },
        price_window: Duration::from_secs(args.price_window),
    };
    let rt = tokio::runtime::Runtime::new()?;
    rt.block_on(async {
        let dashboard = Dashboard::new(args.upstream.fetch_config(), config, miners)?;
        let addr = SocketAddr::new(args.host, args.port);
        info!(%addr, explorer = %args.upstream.explorer_url, "starting ergo-dash");
        ApiServer::new(AppState::new(Arc::new(dashboard)), addr, args.static_dir)
            .start()
            .await?;
        Ok::<_, Box<dyn std::error::Error>>(())
    })?;
    Ok(())
}

fn run_blocks(args: BlocksArgs) -> Result<(), Box<dyn std::error::Error>> {
    let fetcher = Fetcher::new(args.upstream.fetch_config())?;
    let rt = tokio::runtime::Runtime::new()?;
    let blocks = rt.block_on(async { recent_blocks(&fetcher, args.count).await })?;
    for b in &blocks {
        println!(
            "{}\treward={:.4}\tfees={:.4}\ttotal={:.4}\ttxs={}\tminer={}",
            b.height,
            b.miner_reward,
            b.total_fees,
            b.total_block_value,
            b.transactions_count,
            b.miner_name.as_deref().unwrap_or("-"),
        );
    }
    info!(requests = fetcher.request_count(), "blocks complete");
    Ok(())
}

fn run_transactions(args: TransactionsArgs) -> Result<(), Box<dyn std::error::Error>> {
    let fetcher = Fetcher::new(args.upstream.fetch_config())?;
    let query = TxQuery {
        limit: args.limit,
        offset: args.offset,
        sort_by: args.sort_by,
        sort_direction: args.sort_direction,
    };
    let rt = tokio::runtime::Runtime::new()?;
    let txs = rt.block_on(async { unconfirmed_transactions(&fetcher, &query).await });
    println!("{}", serde_json::to_string_pretty(&txs)?);
    info!(count = txs.len(), "transactions complete");
    Ok(())
}

fn run_price(args: UpstreamArgs) -> Result<(), Box<dyn std::error::Error>> {
    let fetcher = Arc::new(Fetcher::new(args.fetch_config())?);
    let source = OraclePriceSource::new(fetcher);
    let rt = tokio::runtime::Runtime::new()?;
    let quote = rt.block_on(async { source.fetch_quote().await })?;
    println!("{}", serde_json::to_string_pretty(&quote)?);
    Ok(())
}

fn run_miner(args: MinerArgs) -> Result<(), Box<dyn std::error::Error>> {
    let directory = args.miners.load();
    let info = directory.lookup(args.id.as_deref());
    println!("{}", serde_json::to_string_pretty(&info)?);
    Ok(())
}
