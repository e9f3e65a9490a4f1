// Live Auction - GraphQL Server
// Run with: cargo run --bin server

//! # Live Auction Server Binary
//!
//! Starts the HTTP server exposing the auction GraphQL API.
//!
//! ## What This Server Provides
//!
//! - **GraphQL API**: `createAuction`, `placeBid`, queries over auction state
//! - **Subscriptions**: `auctionStarted`, `bidPlaced`, `auctionEnded`,
//!   `auctionsUpdated` over WebSocket at `/ws`
//! - **GraphiQL Interface**: interactive explorer at http://localhost:4000
//! - **In-Memory State**: nothing survives a restart
//!
//! ## Configuration
//!
//! Defaults, then `auction.toml` (or `--config <file>`), then `AUCTION_*`
//! environment variables, then `--port`. A `.env` file is read first.

use std::path::PathBuf;

use clap::Parser;
use dotenv::dotenv;
use live_auction::{AppConfig, GraphQLServerBuilder};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "live-auction-server")]
#[command(about = "Live auction GraphQL server with real-time subscriptions")]
#[command(version)]
struct Args {
    /// Config file to use instead of ./auction.toml
    #[arg(short, long, env = "AUCTION_CONFIG")]
    config: Option<PathBuf>,

    /// Port to listen on (overrides the config file and environment)
    #[arg(short, long)]
    port: Option<u16>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // .env is optional
    if let Err(e) = dotenv() {
        eprintln!("Warning: Could not load .env file: {}", e);
    }

    let args = Args::parse();
    let mut config = AppConfig::load_from(args.config.as_deref())?;
    if let Some(port) = args.port {
        config.server.port = port;
    }

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.log_level.as_str()));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    info!("🚀 Starting Live Auction Server...");
    info!("Server: {}", config.bind_address());
    info!(
        "Auctions: default duration {}s, soft-close window {}s",
        config.auction.default_duration_secs, config.auction.soft_close_window_secs
    );

    GraphQLServerBuilder::new()
        .with_config(config)
        .build_and_run()
        .await?;

    Ok(())
}
