// Core domain models for the live auction
// Plain data types; all behaviour that touches time or events lives in the engine

//! # Domain Models Module
//!
//! The auction server has two records:
//! - [`Auction`]: the item on sale, mutated in place by bids and by the expiry timer
//! - [`Bid`]: an accepted offer, immutable once created
//!
//! plus the result type returned by `placeBid` ([`BidResult`]) and the
//! enumerated reasons a bid can be turned away ([`BidRejection`]).
//!
//! These types carry no GraphQL derives; the engine's GraphQL layer maps them
//! to its own output types so the wire schema can evolve separately.

// Contains Auction, AuctionStatus and CreateAuction
pub mod auction;

// Contains Bid, BidResult and BidRejection
pub mod bid;

pub use auction::{generate_id, Auction, AuctionStatus, CreateAuction, DEFAULT_DURATION_SECS};
pub use bid::{Bid, BidRejection, BidResult, BID_ACCEPTED_MESSAGE};
