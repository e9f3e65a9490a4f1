// Bid domain model - offers placed against the active auction

use serde::{Deserialize, Serialize};

use super::auction::Auction;

/// An accepted bid. Never mutated after creation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Bid {
    pub id: String,
    pub auction_id: String,
    pub amount: f64,
    pub bidder: String,
    /// ms since epoch
    pub timestamp: i64,
}

impl Bid {
    pub fn new(
        id: impl Into<String>,
        auction_id: impl Into<String>,
        amount: f64,
        bidder: impl Into<String>,
        timestamp: i64,
    ) -> Self {
        Self {
            id: id.into(),
            auction_id: auction_id.into(),
            amount,
            bidder: bidder.into(),
            timestamp,
        }
    }
}

/// Why a bid was turned away
///
/// Checks run in declaration order and the first failing one wins.
/// The messages are part of the public API; clients match on them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BidRejection {
    NoActiveAuction,
    AuctionIdMismatch,
    TooLate,
    TooLow,
    MissingBidder,
}

impl BidRejection {
    pub fn message(&self) -> &'static str {
        match self {
            BidRejection::NoActiveAuction => "No active auction found",
            BidRejection::AuctionIdMismatch => "Auction ID mismatch",
            BidRejection::TooLate => "bid too late",
            BidRejection::TooLow => "bid too low",
            BidRejection::MissingBidder => "Bidder name is required",
        }
    }
}

impl std::fmt::Display for BidRejection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.message())
    }
}

pub const BID_ACCEPTED_MESSAGE: &str = "Bid placed successfully";

/// Outcome of `placeBid`
///
/// Rejections are soft failures: they are reported here rather than as
/// errors. `auction` carries the tracked auction whenever there is one, so
/// a client that lost a race can re-render the current price.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BidResult {
    pub success: bool,
    pub message: String,
    pub bid: Option<Bid>,
    pub auction: Option<Auction>,
}

impl BidResult {
    pub fn accepted(bid: Bid, auction: Auction) -> Self {
        Self {
            success: true,
            message: BID_ACCEPTED_MESSAGE.to_string(),
            bid: Some(bid),
            auction: Some(auction),
        }
    }

    pub fn rejected(rejection: BidRejection, auction: Option<Auction>) -> Self {
        Self {
            success: false,
            message: rejection.message().to_string(),
            bid: None,
            auction,
        }
    }
}
