// Auction domain model - the single item being sold

//! # Auction Model
//!
//! This module defines the auction record that the engine mutates in place:
//! - `Auction`: the item on sale, its current price and its deadline
//! - `AuctionStatus`: derived lifecycle position (`Active` or `Ended`)
//! - `CreateAuction`: the parameters accepted by `createAuction`
//!
//! ## Lifecycle
//!
//! ```text
//! createAuction ──> [Active] ──(deadline passes, timer fires)──> [Ended]
//!                      │  ^
//!                      └──┘ placeBid (price, winner, soft-close deadline)
//! ```
//!
//! Auctions are created already active; `Ended` is terminal.
//!
//! ## Time Representation
//!
//! `start_time` and `end_time` are milliseconds since the Unix epoch. They
//! are exposed as-is over GraphQL so that browser clients can feed them
//! straight into `Date` for countdown rendering.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::bid::Bid;

/// Default auction length in seconds when `createAuction` omits `duration`
pub const DEFAULT_DURATION_SECS: u32 = 30;

/// Lifecycle position of an auction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AuctionStatus {
    /// Accepting bids until `end_time`
    Active,
    /// Closed by the expiry timer; terminal
    Ended,
}

impl std::fmt::Display for AuctionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AuctionStatus::Active => write!(f, "active"),
            AuctionStatus::Ended => write!(f, "ended"),
        }
    }
}

/// A single-item auction
///
/// Invariants maintained by the engine:
/// - `current_bid >= starting_bid`
/// - `end_time` never decreases while `is_active`
/// - `current_winner` is `None` until the first accepted bid
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Auction {
    /// Opaque unique identifier (`auction_<millis>_<random>`)
    pub id: String,

    /// Price the auction opened at
    pub starting_bid: f64,

    /// Highest accepted bid so far, or `starting_bid` before any bid
    pub current_bid: f64,

    /// Bidder holding `current_bid`
    pub current_winner: Option<String>,

    /// Requested length of the auction in seconds
    pub duration: u32,

    /// Creation instant, ms since epoch
    pub start_time: i64,

    /// Deadline, ms since epoch; pushed back by soft-close extensions
    pub end_time: i64,

    /// Whether the auction still accepts bids
    pub is_active: bool,

    /// Whether late bids push the deadline back (anti-sniping)
    pub extended_bidding: bool,
}

impl Auction {
    /// Open a new auction starting at `now_millis`
    pub fn new(
        id: impl Into<String>,
        starting_bid: f64,
        duration: u32,
        extended_bidding: bool,
        now_millis: i64,
    ) -> Self {
        Self {
            id: id.into(),
            starting_bid,
            current_bid: starting_bid,
            current_winner: None,
            duration,
            start_time: now_millis,
            end_time: now_millis + i64::from(duration) * 1000,
            is_active: true,
            extended_bidding,
        }
    }

    pub fn status(&self) -> AuctionStatus {
        if self.is_active {
            AuctionStatus::Active
        } else {
            AuctionStatus::Ended
        }
    }

    /// Milliseconds left until the deadline; negative once it has passed
    pub fn remaining_millis(&self, now_millis: i64) -> i64 {
        self.end_time - now_millis
    }

    /// A bid arriving at `now_millis` is late when it is strictly after the deadline
    pub fn is_past_deadline(&self, now_millis: i64) -> bool {
        now_millis > self.end_time
    }

    /// Record an accepted bid as the new price and winner
    pub fn apply_bid(&mut self, bid: &Bid) {
        self.current_bid = bid.amount;
        self.current_winner = Some(bid.bidder.clone());
    }

    /// Soft close: when extended bidding is on and fewer than `window_millis`
    /// remain, move the deadline to `now + window`. Returns whether it moved.
    pub fn extend_for_soft_close(&mut self, now_millis: i64, window_millis: i64) -> bool {
        if !self.extended_bidding || self.remaining_millis(now_millis) >= window_millis {
            return false;
        }

        self.end_time = now_millis + window_millis;
        true
    }

    /// Move to `Ended`. Returns `false` if it had already ended.
    pub fn close(&mut self) -> bool {
        let was_active = self.is_active;
        self.is_active = false;
        was_active
    }
}

/// Parameters for opening an auction
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateAuction {
    pub starting_bid: f64,
    /// Seconds; the engine's configured default applies when absent
    pub duration: Option<i64>,
    pub extended_bidding: Option<bool>,
}

impl CreateAuction {
    pub fn new(starting_bid: f64) -> Self {
        Self {
            starting_bid,
            duration: None,
            extended_bidding: None,
        }
    }

    pub fn with_duration(mut self, seconds: i64) -> Self {
        self.duration = Some(seconds);
        self
    }

    pub fn with_extended_bidding(mut self, enabled: bool) -> Self {
        self.extended_bidding = Some(enabled);
        self
    }
}

/// Build an identifier of the form `<prefix>_<millis>_<random>`
pub fn generate_id(prefix: &str, now_millis: i64) -> String {
    format!("{}_{}_{}", prefix, now_millis, Uuid::new_v4().simple())
}
