// Event system for auction lifecycle notifications

//! # Event System
//!
//! This module provides the event bus that connects the auction engine to
//! GraphQL subscriptions. It handles:
//! - One typed broadcast channel per event kind
//! - Routing a published [`AuctionEvent`] to its channel
//! - Turning a receiver into a subscription stream
//!
//! ## Delivery Semantics
//!
//! Delivery is fire-and-forget and at-most-once:
//! - Publishing never blocks and never fails, even with no subscribers
//! - A subscriber only sees events published after it subscribed
//! - A subscriber that falls more than the channel capacity behind skips
//!   the events it missed
//!
//! Registration is tied to the receiver: dropping it (for example when a
//! WebSocket client disconnects and async-graphql drops the stream)
//! deregisters the subscriber.

use futures::{Stream, StreamExt};
use tokio::sync::broadcast;
use tokio_stream::wrappers::{errors::BroadcastStreamRecvError, BroadcastStream};
use tracing::{debug, warn};

use crate::models::{Auction, Bid};

/// Event name contract shared with subscription clients
pub const AUCTION_STARTED: &str = "AUCTION_STARTED";
pub const BID_PLACED: &str = "BID_PLACED";
pub const AUCTION_ENDED: &str = "AUCTION_ENDED";
pub const AUCTIONS_UPDATED: &str = "AUCTIONS_UPDATED";

/// Buffer size of each channel when not configured
pub const DEFAULT_EVENT_CAPACITY: usize = 1000;

/// Something that happened to auction state
#[derive(Debug, Clone, PartialEq)]
pub enum AuctionEvent {
    AuctionStarted(Auction),
    BidPlaced(Bid),
    AuctionEnded(Auction),
    /// Full auction list after any change
    AuctionsUpdated(Vec<Auction>),
}

impl AuctionEvent {
    pub fn name(&self) -> &'static str {
        match self {
            AuctionEvent::AuctionStarted(_) => AUCTION_STARTED,
            AuctionEvent::BidPlaced(_) => BID_PLACED,
            AuctionEvent::AuctionEnded(_) => AUCTION_ENDED,
            AuctionEvent::AuctionsUpdated(_) => AUCTIONS_UPDATED,
        }
    }
}

/// Event bus for publishing and subscribing to auction events
pub struct EventBus {
    auction_started: broadcast::Sender<Auction>,
    bid_placed: broadcast::Sender<Bid>,
    auction_ended: broadcast::Sender<Auction>,
    auctions_updated: broadcast::Sender<Vec<Auction>>,
}

impl EventBus {
    /// Create a new event bus
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_EVENT_CAPACITY)
    }

    /// Create a bus whose channels each buffer up to `capacity` events
    pub fn with_capacity(capacity: usize) -> Self {
        // broadcast::channel panics on zero
        let capacity = capacity.max(1);

        let (auction_started, _) = broadcast::channel(capacity);
        let (bid_placed, _) = broadcast::channel(capacity);
        let (auction_ended, _) = broadcast::channel(capacity);
        let (auctions_updated, _) = broadcast::channel(capacity);

        Self {
            auction_started,
            bid_placed,
            auction_ended,
            auctions_updated,
        }
    }

    /// Publish an event to all current subscribers of its kind.
    /// Returns how many subscribers it reached.
    pub fn publish(&self, event: AuctionEvent) -> usize {
        let name = event.name();

        // send() only errors when nobody is listening
        let delivered = match event {
            AuctionEvent::AuctionStarted(auction) => self.auction_started.send(auction).unwrap_or(0),
            AuctionEvent::BidPlaced(bid) => self.bid_placed.send(bid).unwrap_or(0),
            AuctionEvent::AuctionEnded(auction) => self.auction_ended.send(auction).unwrap_or(0),
            AuctionEvent::AuctionsUpdated(auctions) => {
                self.auctions_updated.send(auctions).unwrap_or(0)
            }
        };

        debug!(event = name, subscribers = delivered, "Event published");
        delivered
    }

    pub fn subscribe_auction_started(&self) -> broadcast::Receiver<Auction> {
        self.auction_started.subscribe()
    }

    pub fn subscribe_bid_placed(&self) -> broadcast::Receiver<Bid> {
        self.bid_placed.subscribe()
    }

    pub fn subscribe_auction_ended(&self) -> broadcast::Receiver<Auction> {
        self.auction_ended.subscribe()
    }

    pub fn subscribe_auctions_updated(&self) -> broadcast::Receiver<Vec<Auction>> {
        self.auctions_updated.subscribe()
    }

    /// Number of live subscribers for an event name; 0 for unknown names
    pub fn subscriber_count(&self, event_name: &str) -> usize {
        match event_name {
            AUCTION_STARTED => self.auction_started.receiver_count(),
            BID_PLACED => self.bid_placed.receiver_count(),
            AUCTION_ENDED => self.auction_ended.receiver_count(),
            AUCTIONS_UPDATED => self.auctions_updated.receiver_count(),
            _ => 0,
        }
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

impl Clone for EventBus {
    fn clone(&self) -> Self {
        Self {
            auction_started: self.auction_started.clone(),
            bid_placed: self.bid_placed.clone(),
            auction_ended: self.auction_ended.clone(),
            auctions_updated: self.auctions_updated.clone(),
        }
    }
}

/// Adapt a receiver into a stream, dropping lag notifications
pub fn event_stream<T>(receiver: broadcast::Receiver<T>) -> impl Stream<Item = T>
where
    T: Clone + Send + 'static,
{
    BroadcastStream::new(receiver).filter_map(|item| async move {
        match item {
            Ok(event) => Some(event),
            Err(BroadcastStreamRecvError::Lagged(skipped)) => {
                warn!(skipped, "Subscriber lagged behind; events dropped");
                None
            }
        }
    })
}
