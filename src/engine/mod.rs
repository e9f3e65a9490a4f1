// Live Auction Engine
// This contains the auction state machine and the API interfaces around it

//! # Auction Engine Module
//!
//! The engine layer sits between the domain models and the outside world:
//! - **Domain Models**: plain auction and bid records (in `models/`)
//! - **Engine Layer**: state machine, events, GraphQL schema (this module)
//! - **Server Layer**: HTTP and WebSocket endpoints (in `server/`)
//!
//! ## Engine Components
//!
//! ### Auction Engine (`auction` module)
//! - Owns all auction state behind a single lock
//! - Validates bids and applies the soft-close rule
//! - Runs one cancellable expiry timer per auction
//!
//! ### Event System (`events` module)
//! - One broadcast channel per event kind
//! - Subscriber lifetime is the receiver's lifetime
//!
//! ### Clock (`clock` module)
//! - Injectable time source so deadlines can be tested deterministically
//!
//! ### GraphQL Engine (`graphql` module)
//! - Query, Mutation and Subscription roots
//! - Translates between GraphQL types and domain models

/// Auction state machine and expiry timer
pub mod auction;

/// Time source abstraction
pub mod clock;

/// Event bus feeding GraphQL subscriptions
pub mod events;

/// GraphQL schema and resolvers
pub mod graphql;

pub use auction::{AuctionEngine, EngineConfig};
pub use clock::{Clock, ManualClock, SystemClock};
pub use events::{AuctionEvent, EventBus};
pub use graphql::{create_schema, AuctionGQL, AuctionSchema, BidGQL, BidResultGQL};
