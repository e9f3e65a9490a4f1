// GraphQL API for the auction engine
// Resolvers are glue: each maps one GraphQL field onto one engine call

use async_graphql::{
    Context, Enum, ErrorExtensions, Object, Schema, SimpleObject, Subscription, ID,
};
use futures::{Stream, StreamExt};
use tracing::debug;

use crate::engine::auction::AuctionEngine;
use crate::engine::events::{
    event_stream, AUCTIONS_UPDATED, AUCTION_ENDED, AUCTION_STARTED, BID_PLACED,
};
use crate::models::{Auction, AuctionStatus, Bid, BidResult, CreateAuction};
use crate::AuctionError;

// GraphQL types - these are the API representations of our domain models

#[derive(Enum, Debug, Clone, Copy, PartialEq, Eq)]
#[graphql(name = "AuctionStatus")]
pub enum AuctionStatusGQL {
    Active,
    Ended,
}

#[derive(SimpleObject, Debug, Clone)]
#[graphql(name = "Auction")]
pub struct AuctionGQL {
    pub id: ID,
    pub starting_bid: f64,
    pub current_bid: f64,
    pub current_winner: Option<String>,
    pub duration: i32,
    /// Milliseconds since the Unix epoch
    pub start_time: f64,
    /// Milliseconds since the Unix epoch
    pub end_time: f64,
    pub is_active: bool,
    pub extended_bidding: bool,
    pub status: AuctionStatusGQL,
}

#[derive(SimpleObject, Debug, Clone)]
#[graphql(name = "Bid")]
pub struct BidGQL {
    pub id: ID,
    pub auction_id: ID,
    pub amount: f64,
    pub bidder: String,
    /// Milliseconds since the Unix epoch
    pub timestamp: f64,
}

#[derive(SimpleObject, Debug, Clone)]
#[graphql(name = "BidResult")]
pub struct BidResultGQL {
    pub success: bool,
    pub message: Option<String>,
    pub bid: Option<BidGQL>,
    pub auction: Option<AuctionGQL>,
}

impl From<AuctionStatus> for AuctionStatusGQL {
    fn from(status: AuctionStatus) -> Self {
        match status {
            AuctionStatus::Active => AuctionStatusGQL::Active,
            AuctionStatus::Ended => AuctionStatusGQL::Ended,
        }
    }
}

impl From<&Auction> for AuctionGQL {
    fn from(auction: &Auction) -> Self {
        Self {
            id: ID::from(auction.id.clone()),
            starting_bid: auction.starting_bid,
            current_bid: auction.current_bid,
            current_winner: auction.current_winner.clone(),
            duration: i32::try_from(auction.duration).unwrap_or(i32::MAX),
            start_time: auction.start_time as f64,
            end_time: auction.end_time as f64,
            is_active: auction.is_active,
            extended_bidding: auction.extended_bidding,
            status: auction.status().into(),
        }
    }
}

impl From<&Bid> for BidGQL {
    fn from(bid: &Bid) -> Self {
        Self {
            id: ID::from(bid.id.clone()),
            auction_id: ID::from(bid.auction_id.clone()),
            amount: bid.amount,
            bidder: bid.bidder.clone(),
            timestamp: bid.timestamp as f64,
        }
    }
}

impl From<&BidResult> for BidResultGQL {
    fn from(result: &BidResult) -> Self {
        Self {
            success: result.success,
            message: Some(result.message.clone()),
            bid: result.bid.as_ref().map(BidGQL::from),
            auction: result.auction.as_ref().map(AuctionGQL::from),
        }
    }
}

impl ErrorExtensions for AuctionError {
    fn extend(&self) -> async_graphql::Error {
        let code = self.code();
        async_graphql::Error::new(self.to_string()).extend_with(|_, e| e.set("code", code))
    }
}

// GraphQL Query root
pub struct Query;

#[Object]
impl Query {
    /// Demo counter value
    async fn counter(&self, ctx: &Context<'_>) -> async_graphql::Result<Option<i32>> {
        let engine = ctx.data::<AuctionEngine>()?;
        Ok(Some(engine.get_counter().await))
    }

    /// The most recent auction; `isActive` tells whether it still takes bids
    async fn active_auction(&self, ctx: &Context<'_>) -> async_graphql::Result<Option<AuctionGQL>> {
        let engine = ctx.data::<AuctionEngine>()?;
        Ok(engine.get_active_auction().await.as_ref().map(AuctionGQL::from))
    }

    /// Every auction ever created, oldest first
    async fn auctions(&self, ctx: &Context<'_>) -> async_graphql::Result<Vec<AuctionGQL>> {
        let engine = ctx.data::<AuctionEngine>()?;
        Ok(engine.list_auctions().await.iter().map(AuctionGQL::from).collect())
    }

    /// Get an auction by ID
    async fn auction(&self, ctx: &Context<'_>, id: ID) -> async_graphql::Result<Option<AuctionGQL>> {
        let engine = ctx.data::<AuctionEngine>()?;
        Ok(engine.get_auction(&id).await.as_ref().map(AuctionGQL::from))
    }

    /// Accepted bids for an auction, oldest first
    async fn bids(&self, ctx: &Context<'_>, auction_id: ID) -> async_graphql::Result<Vec<BidGQL>> {
        let engine = ctx.data::<AuctionEngine>()?;
        let bids = engine
            .bids_for_auction(&auction_id)
            .await
            .map_err(|e| e.extend())?;
        Ok(bids.iter().map(BidGQL::from).collect())
    }
}

// GraphQL Mutation root
pub struct Mutation;

#[Object]
impl Mutation {
    /// Bump the demo counter and return its new value
    async fn increment_counter(&self, ctx: &Context<'_>) -> async_graphql::Result<Option<i32>> {
        let engine = ctx.data::<AuctionEngine>()?;
        Ok(Some(engine.increment_counter().await))
    }

    /// Open a new auction. Fails while another auction is active.
    async fn create_auction(
        &self,
        ctx: &Context<'_>,
        starting_bid: f64,
        duration: Option<i32>,
        extended_bidding: Option<bool>,
    ) -> async_graphql::Result<Option<AuctionGQL>> {
        let engine = ctx.data::<AuctionEngine>()?;

        let request = CreateAuction {
            starting_bid,
            duration: duration.map(i64::from),
            extended_bidding,
        };

        let auction = engine
            .create_auction(request)
            .await
            .map_err(|e| e.extend())?;

        Ok(Some(AuctionGQL::from(&auction)))
    }

    /// Bid on the active auction. Rejections come back in `BidResult.message`.
    async fn place_bid(
        &self,
        ctx: &Context<'_>,
        auction_id: ID,
        amount: f64,
        bidder: String,
    ) -> async_graphql::Result<Option<BidResultGQL>> {
        let engine = ctx.data::<AuctionEngine>()?;
        let result = engine.place_bid(&auction_id, amount, &bidder).await;
        Ok(Some(BidResultGQL::from(&result)))
    }
}

// GraphQL Subscription root (for real-time updates)
pub struct Subscription;

#[Subscription]
impl Subscription {
    /// Fires when an auction opens
    async fn auction_started(
        &self,
        ctx: &Context<'_>,
    ) -> async_graphql::Result<impl Stream<Item = AuctionGQL>> {
        let engine = ctx.data::<AuctionEngine>()?;
        debug!("Client subscribed to {}", AUCTION_STARTED);
        Ok(event_stream(engine.events().subscribe_auction_started())
            .map(|auction| AuctionGQL::from(&auction)))
    }

    /// Fires for every accepted bid
    async fn bid_placed(&self, ctx: &Context<'_>) -> async_graphql::Result<impl Stream<Item = BidGQL>> {
        let engine = ctx.data::<AuctionEngine>()?;
        debug!("Client subscribed to {}", BID_PLACED);
        Ok(event_stream(engine.events().subscribe_bid_placed()).map(|bid| BidGQL::from(&bid)))
    }

    /// Fires when the expiry timer closes an auction
    async fn auction_ended(
        &self,
        ctx: &Context<'_>,
    ) -> async_graphql::Result<impl Stream<Item = AuctionGQL>> {
        let engine = ctx.data::<AuctionEngine>()?;
        debug!("Client subscribed to {}", AUCTION_ENDED);
        Ok(event_stream(engine.events().subscribe_auction_ended())
            .map(|auction| AuctionGQL::from(&auction)))
    }

    /// Full auction list after every change
    async fn auctions_updated(
        &self,
        ctx: &Context<'_>,
    ) -> async_graphql::Result<impl Stream<Item = Vec<AuctionGQL>>> {
        let engine = ctx.data::<AuctionEngine>()?;
        debug!("Client subscribed to {}", AUCTIONS_UPDATED);
        Ok(event_stream(engine.events().subscribe_auctions_updated())
            .map(|auctions| auctions.iter().map(AuctionGQL::from).collect::<Vec<_>>()))
    }
}

// Schema type alias
pub type AuctionSchema = Schema<Query, Mutation, Subscription>;

/// Create the GraphQL schema around a shared engine
pub fn create_schema(engine: AuctionEngine) -> AuctionSchema {
    Schema::build(Query, Mutation, Subscription)
        .data(engine)
        .finish()
}
