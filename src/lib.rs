// Live Auction - Rust Edition
// A single-item auction server with real-time GraphQL subscriptions

//! # Live Auction Library
//!
//! This is the library crate behind the `server` and `admin` binaries. It
//! defines the public API that the binaries (and tests) build on.
//!
//! ## Core Components
//!
//! ### Domain Models
//! - [`Auction`]: the item on sale, its price and deadline
//! - [`Bid`]: an accepted offer
//! - [`BidResult`] / [`BidRejection`]: outcome of `placeBid`
//!
//! ### Auction Engine
//!
//! [`AuctionEngine`] owns all state and enforces the rules:
//! - at most one auction is active at a time
//! - a bid must beat the current bid outright and arrive before the deadline
//! - with extended bidding, a late bid pushes the deadline to ten seconds out
//! - a timer closes the auction when its (possibly extended) deadline passes
//!
//! Every state change is published on the engine's [`EventBus`].
//!
//! ### GraphQL Layer
//! [`create_schema`] builds the async-graphql schema (queries, mutations and
//! subscriptions) around a shared engine.
//!
//! ### Server
//! [`GraphQLServerBuilder`] wires the schema into an axum router with
//! GraphiQL, a WebSocket subscription endpoint and a health check.
//!
//! ```text
//! client mutation → resolver → AuctionEngine → state + EventBus
//!                                                   ↓
//!                              subscription stream → client
//! ```

// Layered configuration (defaults, file, environment)
pub mod config;

// Core domain models
pub mod models;

// Auction engine, event bus and GraphQL schema
pub mod engine;

// HTTP server setup
pub mod server;

// Re-export core domain types for easy access
pub use models::{Auction, AuctionStatus, Bid, BidRejection, BidResult, CreateAuction};

// Re-export engine types for convenience
pub use engine::{
    auction::{AuctionEngine, EngineConfig},
    clock::{Clock, ManualClock, SystemClock},
    events::{AuctionEvent, EventBus},
    graphql::{create_schema, AuctionSchema},
};

pub use crate::config::AppConfig;

// Re-export server types for convenience
pub use server::graphql::GraphQLServerBuilder;

use thiserror::Error;

/// Errors raised by auction operations
///
/// Only hard failures live here. A rejected bid is not an error; it is
/// reported through [`BidResult`].
#[derive(Error, Debug)]
pub enum AuctionError {
    /// The operation would break the single-active-auction rule
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Error when invalid input is provided
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Error when a resource cannot be found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Configuration could not be loaded
    #[error("Configuration error: {0}")]
    Config(#[from] ::config::ConfigError),
}

impl AuctionError {
    /// Machine-readable code placed in GraphQL error extensions
    pub fn code(&self) -> &'static str {
        match self {
            AuctionError::Conflict(_) => "CONFLICT",
            AuctionError::InvalidInput(_) => "INVALID_INPUT",
            AuctionError::NotFound(_) => "NOT_FOUND",
            AuctionError::Config(_) => "CONFIG",
        }
    }
}

/// Type alias for Results that use our custom error type
pub type Result<T> = std::result::Result<T, AuctionError>;
