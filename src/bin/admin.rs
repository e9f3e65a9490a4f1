//! Live Auction Admin CLI
//!
//! Command-line client for a running auction server. Every command is a
//! GraphQL request, so this exercises exactly what a browser client would.

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use colored::Colorize;
use futures::{SinkExt, StreamExt};
use serde_json::{json, Value};
use tokio_tungstenite::{
    connect_async,
    tungstenite::{client::IntoClientRequest, http::HeaderValue, protocol::Message},
};
use tracing::{debug, info};

const AUCTION_FIELDS: &str =
    "id startingBid currentBid currentWinner duration startTime endTime isActive extendedBidding";

#[derive(Parser)]
#[command(name = "live-auction-admin")]
#[command(about = "Live Auction Admin CLI - drive a running auction server over GraphQL")]
#[command(version = "1.0")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// GraphQL HTTP endpoint
    #[arg(long, env = "AUCTION_ENDPOINT", default_value = "http://localhost:4000/graphql")]
    endpoint: String,

    /// GraphQL WebSocket endpoint used by `watch`
    #[arg(long, env = "AUCTION_WS_ENDPOINT", default_value = "ws://localhost:4000/ws")]
    ws_endpoint: String,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Show the demo counter
    Counter,

    /// Increment the demo counter
    Increment,

    /// Show the current auction
    Active,

    /// List all auctions
    List,

    /// List accepted bids for an auction
    Bids {
        /// Auction ID
        auction_id: String,
    },

    /// Start a new auction
    Create {
        /// Opening price
        #[arg(long)]
        starting_bid: f64,

        /// Length in seconds (server default when omitted)
        #[arg(long)]
        duration: Option<i32>,

        /// Extend the deadline when bids arrive in the last seconds
        #[arg(long)]
        extended: bool,
    },

    /// Bid on the active auction
    Bid {
        /// Auction ID
        auction_id: String,

        /// Bid amount; must beat the current bid
        amount: f64,

        /// Bidder name
        bidder: String,
    },

    /// Print auction list updates as they happen (Ctrl-C to stop)
    Watch,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let log_level = if cli.verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt().with_env_filter(log_level).init();

    let client = GraphQLClient::new(&cli.endpoint);

    match cli.command {
        Commands::Counter => {
            let data = client.request("query { counter }", json!({})).await?;
            println!("Counter: {}", data["counter"]);
        }

        Commands::Increment => {
            let data = client.request("mutation { incrementCounter }", json!({})).await?;
            println!("Counter: {}", data["incrementCounter"]);
        }

        Commands::Active => {
            let query = format!("query {{ activeAuction {{ {} }} }}", AUCTION_FIELDS);
            let data = client.request(&query, json!({})).await?;
            match data.get("activeAuction").filter(|a| !a.is_null()) {
                Some(auction) => print_auction(auction),
                None => println!("No auction has been started."),
            }
        }

        Commands::List => {
            let query = format!("query {{ auctions {{ {} }} }}", AUCTION_FIELDS);
            let data = client.request(&query, json!({})).await?;
            print_auction_list(&data["auctions"]);
        }

        Commands::Bids { auction_id } => {
            let data = client
                .request(
                    "query Bids($auctionId: ID!) { bids(auctionId: $auctionId) { id amount bidder timestamp } }",
                    json!({ "auctionId": auction_id }),
                )
                .await?;
            print_bids(&data["bids"]);
        }

        Commands::Create {
            starting_bid,
            duration,
            extended,
        } => {
            let query = format!(
                "mutation Create($startingBid: Float!, $duration: Int, $extendedBidding: Boolean) {{ \
                 createAuction(startingBid: $startingBid, duration: $duration, extendedBidding: $extendedBidding) {{ {} }} }}",
                AUCTION_FIELDS
            );
            let data = client
                .request(
                    &query,
                    json!({
                        "startingBid": starting_bid,
                        "duration": duration,
                        "extendedBidding": extended,
                    }),
                )
                .await?;
            println!("{}", "✅ Auction started".green());
            print_auction(&data["createAuction"]);
        }

        Commands::Bid {
            auction_id,
            amount,
            bidder,
        } => {
            let query = format!(
                "mutation Bid($auctionId: ID!, $amount: Float!, $bidder: String!) {{ \
                 placeBid(auctionId: $auctionId, amount: $amount, bidder: $bidder) {{ \
                 success message bid {{ id amount bidder timestamp }} auction {{ {} }} }} }}",
                AUCTION_FIELDS
            );
            let data = client
                .request(
                    &query,
                    json!({ "auctionId": auction_id, "amount": amount, "bidder": bidder }),
                )
                .await?;

            let result = &data["placeBid"];
            let message = result["message"].as_str().unwrap_or_default();
            if result["success"].as_bool().unwrap_or(false) {
                println!("{} {}", "✅".green(), message.green());
            } else {
                println!("{} {}", "❌".red(), message.red());
            }
            if !result["auction"].is_null() {
                print_auction(&result["auction"]);
            }
        }

        Commands::Watch => {
            watch(&cli.ws_endpoint).await?;
        }
    }

    Ok(())
}

/// Minimal GraphQL-over-HTTP client
struct GraphQLClient {
    http: reqwest::Client,
    endpoint: String,
}

impl GraphQLClient {
    fn new(endpoint: &str) -> Self {
        Self {
            http: reqwest::Client::new(),
            endpoint: endpoint.to_string(),
        }
    }

    /// POST a query and return its `data`, failing on transport or GraphQL errors
    async fn request(&self, query: &str, variables: Value) -> Result<Value> {
        debug!("POST {} {}", self.endpoint, query);

        let response: Value = self
            .http
            .post(&self.endpoint)
            .json(&json!({ "query": query, "variables": variables }))
            .send()
            .await
            .with_context(|| format!("Could not reach {}. Is the server running?", self.endpoint))?
            .error_for_status()?
            .json()
            .await?;

        graphql_data(response)
    }
}

/// Split a GraphQL response into its data or a combined error
fn graphql_data(response: Value) -> Result<Value> {
    if let Some(errors) = response
        .get("errors")
        .and_then(Value::as_array)
        .filter(|errors| !errors.is_empty())
    {
        let messages: Vec<&str> = errors
            .iter()
            .filter_map(|e| e.get("message").and_then(Value::as_str))
            .collect();
        bail!("GraphQL error: {}", messages.join("; "));
    }

    Ok(response.get("data").cloned().unwrap_or(Value::Null))
}

/// Subscribe to `auctionsUpdated` using the graphql-transport-ws protocol
async fn watch(ws_endpoint: &str) -> Result<()> {
    let mut request = ws_endpoint.into_client_request()?;
    request.headers_mut().insert(
        "Sec-WebSocket-Protocol",
        HeaderValue::from_static("graphql-transport-ws"),
    );

    let (ws_stream, _) = connect_async(request)
        .await
        .with_context(|| format!("Failed to connect to {}", ws_endpoint))?;
    info!("Connected to {}", ws_endpoint);

    let (mut write, mut read) = ws_stream.split();

    write
        .send(Message::Text(json!({ "type": "connection_init" }).to_string()))
        .await?;

    let subscription = json!({
        "id": "auctions",
        "type": "subscribe",
        "payload": {
            "query": format!("subscription {{ auctionsUpdated {{ {} }} }}", AUCTION_FIELDS)
        }
    });
    write.send(Message::Text(subscription.to_string())).await?;

    println!("👀 Watching auctions (Ctrl-C to stop)...");

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                write
                    .send(Message::Text(json!({ "id": "auctions", "type": "complete" }).to_string()))
                    .await?;
                break;
            }
            message = read.next() => {
                let Some(message) = message else {
                    println!("Connection closed by server");
                    break;
                };

                if let Message::Text(text) = message? {
                    let frame: Value = serde_json::from_str(&text)?;
                    match frame["type"].as_str() {
                        Some("connection_ack") => debug!("Connection acknowledged"),
                        Some("next") => {
                            let data = graphql_data(frame["payload"].clone())?;
                            println!("\n{}", "── auctions updated ──".bold());
                            print_auction_list(&data["auctionsUpdated"]);
                        }
                        Some("error") => bail!("Subscription error: {}", frame["payload"]),
                        Some("complete") => break,
                        _ => debug!("Ignoring frame: {}", text),
                    }
                }
            }
        }
    }

    Ok(())
}

fn print_auction_list(auctions: &Value) {
    let auctions = auctions.as_array().cloned().unwrap_or_default();

    println!("\n🔨 Auctions ({})", auctions.len());
    println!("=====================================");

    if auctions.is_empty() {
        println!("No auctions found.");
        return;
    }

    for auction in &auctions {
        print_auction(auction);
    }
}

fn print_auction(auction: &Value) {
    let status = if auction["isActive"].as_bool().unwrap_or(false) {
        "ACTIVE".green().bold()
    } else {
        "ENDED".red().bold()
    };

    println!("🔨 ID: {} [{}]", auction["id"].as_str().unwrap_or("?"), status);
    println!(
        "   Current bid: {} (started at {})",
        auction["currentBid"], auction["startingBid"]
    );
    println!(
        "   Winner: {}",
        auction["currentWinner"].as_str().unwrap_or("-")
    );
    if let Some(end) = auction["endTime"].as_f64() {
        println!("   Ends: {}", format_millis(end));
    }
    if auction["extendedBidding"].as_bool().unwrap_or(false) {
        println!("   Extended bidding: on");
    }
    println!();
}

fn print_bids(bids: &Value) {
    let bids = bids.as_array().cloned().unwrap_or_default();

    println!("\n💰 Bids ({})", bids.len());
    println!("=====================================");

    for bid in &bids {
        let when = bid["timestamp"].as_f64().map(format_millis).unwrap_or_default();
        println!(
            "{}  {:>10}  {}",
            when,
            bid["amount"],
            bid["bidder"].as_str().unwrap_or("?")
        );
    }
}

fn format_millis(millis: f64) -> String {
    chrono::DateTime::from_timestamp_millis(millis as i64)
        .map(|t| t.format("%Y-%m-%d %H:%M:%S%.3f UTC").to_string())
        .unwrap_or_else(|| format!("{}", millis))
}
