// Auction engine - owns auction state, validates bids, runs the expiry timer

//! # Auction Engine
//!
//! [`AuctionEngine`] is the only component that mutates auction state. The
//! GraphQL resolvers call into it and the subscription layer listens to the
//! [`EventBus`] it publishes on.
//!
//! ## State
//!
//! ```text
//! AuctionState
//!   counter   demo counter behind incrementCounter
//!   tracked   the most recent auction + its timer's cancellation token
//!   history   every auction ever created, in creation order
//!   bids      accepted bids per auction id
//! ```
//!
//! At most one auction is active: `create_auction` refuses to open a new one
//! while the tracked auction is still active.
//!
//! ## Concurrency
//!
//! All state sits behind one `tokio::sync::Mutex`. Each operation holds it for
//! its whole run, including event publication, so operations never interleave
//! and subscribers observe events in the same order as the state changes.
//!
//! ## Expiry Timer
//!
//! Every auction gets a spawned task that sleeps until the auction's current
//! deadline. On waking it re-checks, under the lock, that the auction is still
//! the tracked one, still active and actually past its deadline. A soft-close
//! extension simply sends it back to sleep. The task also listens on a
//! `CancellationToken` so that shutdown (or a replaced auction) stops it.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::clock::{Clock, SystemClock};
use super::events::{AuctionEvent, EventBus, DEFAULT_EVENT_CAPACITY};
use crate::config::AuctionSettings;
use crate::models::{
    generate_id, Auction, Bid, BidRejection, BidResult, CreateAuction, DEFAULT_DURATION_SECS,
};
use crate::{AuctionError, Result};

/// Soft-close window used when not configured
pub const DEFAULT_SOFT_CLOSE_WINDOW: Duration = Duration::from_secs(10);

/// Auction engine configuration
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Length of an auction when `createAuction` omits `duration`
    pub default_duration_secs: u32,
    /// A bid with less than this much time left pushes the deadline to now + window
    pub soft_close_window: Duration,
    /// Buffer size of each event channel
    pub event_capacity: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            default_duration_secs: DEFAULT_DURATION_SECS,
            soft_close_window: DEFAULT_SOFT_CLOSE_WINDOW,
            event_capacity: DEFAULT_EVENT_CAPACITY,
        }
    }
}

impl From<&AuctionSettings> for EngineConfig {
    fn from(settings: &AuctionSettings) -> Self {
        Self {
            default_duration_secs: settings.default_duration_secs,
            soft_close_window: Duration::from_secs(u64::from(settings.soft_close_window_secs)),
            event_capacity: settings.event_capacity,
        }
    }
}

impl EngineConfig {
    fn soft_close_window_millis(&self) -> i64 {
        i64::try_from(self.soft_close_window.as_millis()).unwrap_or(i64::MAX)
    }
}

struct TrackedAuction {
    auction: Auction,
    timer: CancellationToken,
}

#[derive(Default)]
struct AuctionState {
    counter: i32,
    tracked: Option<TrackedAuction>,
    history: Vec<Auction>,
    bids: HashMap<String, Vec<Bid>>,
}

impl AuctionState {
    /// Copy the live auction over its history entry
    fn sync_history(&mut self, auction: &Auction) {
        if let Some(entry) = self.history.iter_mut().find(|a| a.id == auction.id) {
            *entry = auction.clone();
        }
    }
}

/// What the expiry timer should do next
#[derive(Debug, PartialEq)]
enum Expiry {
    /// Deadline not reached; sleep this long and check again
    Pending(Duration),
    /// The timer closed the auction
    Closed,
    /// The auction is no longer tracked or already ended
    Stale,
}

struct EngineInner {
    state: Mutex<AuctionState>,
    events: EventBus,
    clock: Arc<dyn Clock>,
    config: EngineConfig,
}

/// Main auction engine
///
/// Cheap to clone; clones share the same state.
#[derive(Clone)]
pub struct AuctionEngine {
    inner: Arc<EngineInner>,
}

impl AuctionEngine {
    pub fn new(config: EngineConfig) -> Self {
        Self::with_clock(config, Arc::new(SystemClock))
    }

    pub fn with_clock(config: EngineConfig, clock: Arc<dyn Clock>) -> Self {
        Self {
            inner: Arc::new(EngineInner {
                state: Mutex::new(AuctionState::default()),
                events: EventBus::with_capacity(config.event_capacity),
                clock,
                config,
            }),
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.inner.config
    }

    pub fn events(&self) -> &EventBus {
        &self.inner.events
    }

    pub async fn get_counter(&self) -> i32 {
        self.inner.state.lock().await.counter
    }

    pub async fn increment_counter(&self) -> i32 {
        let mut state = self.inner.state.lock().await;
        state.counter = state.counter.saturating_add(1);
        state.counter
    }

    /// The most recent auction, active or already ended
    pub async fn get_active_auction(&self) -> Option<Auction> {
        let state = self.inner.state.lock().await;
        state.tracked.as_ref().map(|t| t.auction.clone())
    }

    /// Every auction ever created, oldest first
    pub async fn list_auctions(&self) -> Vec<Auction> {
        self.inner.state.lock().await.history.clone()
    }

    pub async fn get_auction(&self, id: &str) -> Option<Auction> {
        let state = self.inner.state.lock().await;
        state.history.iter().find(|a| a.id == id).cloned()
    }

    /// Accepted bids for an auction, in acceptance order
    pub async fn bids_for_auction(&self, auction_id: &str) -> Result<Vec<Bid>> {
        let state = self.inner.state.lock().await;
        state
            .bids
            .get(auction_id)
            .cloned()
            .ok_or_else(|| AuctionError::NotFound(format!("auction {}", auction_id)))
    }

    /// Open a new auction and schedule its expiry
    ///
    /// ## Errors
    /// - `InvalidInput` if the starting bid is not a positive number or the
    ///   duration is not a positive number of seconds
    /// - `Conflict` if another auction is still active
    pub async fn create_auction(&self, request: CreateAuction) -> Result<Auction> {
        if !(request.starting_bid.is_finite() && request.starting_bid > 0.0) {
            return Err(AuctionError::InvalidInput(format!(
                "startingBid must be a positive number, got {}",
                request.starting_bid
            )));
        }

        let requested = request
            .duration
            .unwrap_or_else(|| i64::from(self.inner.config.default_duration_secs));
        let duration = u32::try_from(requested)
            .ok()
            .filter(|secs| *secs > 0)
            .ok_or_else(|| {
                AuctionError::InvalidInput(format!(
                    "duration must be a positive number of seconds, got {}",
                    requested
                ))
            })?;
        let extended_bidding = request.extended_bidding.unwrap_or(false);

        let mut guard = self.inner.state.lock().await;
        let state = &mut *guard;

        if let Some(current) = state.tracked.as_ref().filter(|t| t.auction.is_active) {
            warn!(active = %current.auction.id, "Rejected createAuction: an auction is already active");
            return Err(AuctionError::Conflict(
                "An auction is already active. Only one auction can be active at a time."
                    .to_string(),
            ));
        }

        let now = self.inner.clock.now_millis();
        let auction = Auction::new(
            generate_id("auction", now),
            request.starting_bid,
            duration,
            extended_bidding,
            now,
        );
        let timer = CancellationToken::new();

        if let Some(previous) = state.tracked.replace(TrackedAuction {
            auction: auction.clone(),
            timer: timer.clone(),
        }) {
            previous.timer.cancel();
        }
        state.history.push(auction.clone());
        state.bids.insert(auction.id.clone(), Vec::new());

        info!(
            auction = %auction.id,
            starting_bid = auction.starting_bid,
            duration_secs = auction.duration,
            extended_bidding = auction.extended_bidding,
            "Auction started"
        );

        self.inner
            .events
            .publish(AuctionEvent::AuctionStarted(auction.clone()));
        self.inner
            .events
            .publish(AuctionEvent::AuctionsUpdated(state.history.clone()));

        drop(guard);
        self.spawn_expiry_timer(auction.id.clone(), timer);

        Ok(auction)
    }

    /// Place a bid on the tracked auction
    ///
    /// Checks, first failure wins:
    /// 1. an auction exists, and is still active unless `auction_id` names it
    /// 2. `auction_id` names it
    /// 3. it has not ended and its deadline has not passed
    /// 4. `amount` is strictly greater than the current bid
    /// 5. `bidder` is not blank
    ///
    /// Rejections leave state untouched.
    pub async fn place_bid(&self, auction_id: &str, amount: f64, bidder: &str) -> BidResult {
        let mut guard = self.inner.state.lock().await;
        let state = &mut *guard;
        let now = self.inner.clock.now_millis();

        let Some(tracked) = state.tracked.as_mut() else {
            return reject(BidRejection::NoActiveAuction, None);
        };
        let auction = &mut tracked.auction;

        // an ended auction only answers to its own id
        if !auction.is_active && auction.id != auction_id {
            return reject(BidRejection::NoActiveAuction, Some(auction.clone()));
        }
        if auction.id != auction_id {
            return reject(BidRejection::AuctionIdMismatch, Some(auction.clone()));
        }
        if !auction.is_active || auction.is_past_deadline(now) {
            return reject(BidRejection::TooLate, Some(auction.clone()));
        }
        // Written this way so NaN is rejected too
        if !(amount > auction.current_bid) {
            return reject(BidRejection::TooLow, Some(auction.clone()));
        }
        if bidder.trim().is_empty() {
            return reject(BidRejection::MissingBidder, Some(auction.clone()));
        }

        let bid = Bid::new(generate_id("bid", now), auction_id, amount, bidder, now);
        auction.apply_bid(&bid);

        let previous_end = auction.end_time;
        if auction.extend_for_soft_close(now, self.inner.config.soft_close_window_millis()) {
            info!(
                auction = %auction.id,
                previous_end,
                new_end = auction.end_time,
                "Soft close: auction extended"
            );
        }

        let auction = auction.clone();
        state.sync_history(&auction);
        state
            .bids
            .entry(auction.id.clone())
            .or_default()
            .push(bid.clone());

        info!(auction = %auction.id, bidder = %bid.bidder, amount = bid.amount, "Bid accepted");

        self.inner.events.publish(AuctionEvent::BidPlaced(bid.clone()));
        self.inner
            .events
            .publish(AuctionEvent::AuctionsUpdated(state.history.clone()));

        BidResult::accepted(bid, auction)
    }

    /// Stop the pending expiry timer, if any. Auction state is left as is.
    pub async fn shutdown(&self) {
        let state = self.inner.state.lock().await;
        if let Some(tracked) = state.tracked.as_ref() {
            tracked.timer.cancel();
            debug!(auction = %tracked.auction.id, "Expiry timer cancelled");
        }
    }

    fn spawn_expiry_timer(&self, auction_id: String, timer: CancellationToken) {
        let engine = self.clone();
        tokio::spawn(async move {
            engine.run_expiry_timer(auction_id, timer).await;
        });
    }

    async fn run_expiry_timer(&self, auction_id: String, timer: CancellationToken) {
        loop {
            let wait = match self.expire_if_due(&auction_id).await {
                Expiry::Pending(wait) => wait,
                Expiry::Closed | Expiry::Stale => return,
            };

            tokio::select! {
                _ = timer.cancelled() => {
                    debug!(auction = %auction_id, "Expiry timer stopped");
                    return;
                }
                _ = tokio::time::sleep(wait) => {}
            }
        }
    }

    /// Close the auction if it is still tracked, active and past its deadline
    async fn expire_if_due(&self, auction_id: &str) -> Expiry {
        let mut guard = self.inner.state.lock().await;
        let state = &mut *guard;

        let Some(tracked) = state
            .tracked
            .as_mut()
            .filter(|t| t.auction.id == auction_id && t.auction.is_active)
        else {
            return Expiry::Stale;
        };

        // bids at exactly endTime are still on time, so close strictly after it
        let remaining = tracked.auction.remaining_millis(self.inner.clock.now_millis());
        if remaining >= 0 {
            return Expiry::Pending(Duration::from_millis(remaining.unsigned_abs().max(1)));
        }

        tracked.auction.close();
        let auction = tracked.auction.clone();
        state.sync_history(&auction);

        info!(
            auction = %auction.id,
            winner = ?auction.current_winner,
            final_bid = auction.current_bid,
            "Auction ended"
        );

        self.inner
            .events
            .publish(AuctionEvent::AuctionEnded(auction));
        self.inner
            .events
            .publish(AuctionEvent::AuctionsUpdated(state.history.clone()));

        Expiry::Closed
    }
}

fn reject(rejection: BidRejection, auction: Option<Auction>) -> BidResult {
    debug!(reason = %rejection, "Bid rejected");
    BidResult::rejected(rejection, auction)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::clock::ManualClock;
    use crate::engine::events::{AUCTIONS_UPDATED, AUCTION_ENDED};
    use tokio::sync::broadcast::error::TryRecvError;

    const T0: i64 = 1_700_000_000_000;

    fn manual_engine() -> (AuctionEngine, ManualClock) {
        let clock = ManualClock::new(T0);
        let engine = AuctionEngine::with_clock(EngineConfig::default(), Arc::new(clock.clone()));
        (engine, clock)
    }

    async fn open(
        engine: &AuctionEngine,
        starting_bid: f64,
        duration: i64,
        extended: bool,
    ) -> Auction {
        let auction = engine
            .create_auction(
                CreateAuction::new(starting_bid)
                    .with_duration(duration)
                    .with_extended_bidding(extended),
            )
            .await
            .unwrap();

        // let the expiry task take its first look before the clock moves
        tokio::task::yield_now().await;
        auction
    }

    fn active_count(auctions: &[Auction]) -> usize {
        auctions.iter().filter(|a| a.is_active).count()
    }

    #[tokio::test]
    async fn test_create_auction_initial_state() {
        let (engine, _clock) = manual_engine();
        let auction = open(&engine, 10.0, 5, true).await;

        assert!(auction.id.starts_with("auction_"));
        assert_eq!(auction.current_bid, 10.0);
        assert_eq!(auction.current_winner, None);
        assert_eq!(auction.start_time, T0);
        assert_eq!(auction.end_time, T0 + 5_000);
        assert!(auction.is_active);
        assert!(auction.extended_bidding);

        assert_eq!(engine.get_active_auction().await, Some(auction.clone()));
        assert_eq!(engine.list_auctions().await, vec![auction.clone()]);
        assert!(engine.bids_for_auction(&auction.id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_create_auction_defaults() {
        let (engine, _clock) = manual_engine();
        let auction = engine.create_auction(CreateAuction::new(3.0)).await.unwrap();

        assert_eq!(auction.duration, 30);
        assert_eq!(auction.end_time, T0 + 30_000);
        assert!(!auction.extended_bidding);
    }

    #[tokio::test]
    async fn test_create_auction_conflicts_with_active_auction() {
        let (engine, clock) = manual_engine();
        let first = open(&engine, 10.0, 60, false).await;

        clock.advance(1_000);
        let err = engine
            .create_auction(CreateAuction::new(50.0))
            .await
            .unwrap_err();

        assert!(matches!(err, AuctionError::Conflict(_)));
        assert_eq!(engine.get_active_auction().await, Some(first));
        assert_eq!(engine.list_auctions().await.len(), 1);
    }

    #[tokio::test]
    async fn test_create_auction_validates_input() {
        let (engine, _clock) = manual_engine();

        for request in [
            CreateAuction::new(0.0),
            CreateAuction::new(-5.0),
            CreateAuction::new(f64::NAN),
            CreateAuction::new(10.0).with_duration(0),
            CreateAuction::new(10.0).with_duration(-3),
        ] {
            let err = engine.create_auction(request).await.unwrap_err();
            assert!(matches!(err, AuctionError::InvalidInput(_)));
        }

        assert!(engine.get_active_auction().await.is_none());
    }

    #[tokio::test]
    async fn test_bid_without_auction() {
        let (engine, _clock) = manual_engine();
        let result = engine.place_bid("auction_x", 5.0, "alice").await;

        assert!(!result.success);
        assert_eq!(result.message, "No active auction found");
        assert!(result.auction.is_none());
    }

    #[tokio::test]
    async fn test_bid_with_wrong_auction_id() {
        let (engine, _clock) = manual_engine();
        let auction = open(&engine, 10.0, 30, false).await;

        let result = engine.place_bid("auction_other", 50.0, "alice").await;

        assert!(!result.success);
        assert_eq!(result.message, "Auction ID mismatch");
        assert_eq!(result.auction, Some(auction));
    }

    #[tokio::test]
    async fn test_bid_after_deadline_is_too_late() {
        let (engine, clock) = manual_engine();
        let auction = open(&engine, 1.0, 1, false).await;

        clock.advance(1_100);
        let result = engine.place_bid(&auction.id, 5.0, "alice").await;

        assert!(!result.success);
        assert_eq!(result.message, "bid too late");
        assert_eq!(engine.get_active_auction().await.unwrap().current_bid, 1.0);
    }

    #[tokio::test]
    async fn test_bid_at_deadline_is_accepted() {
        let (engine, clock) = manual_engine();
        let auction = open(&engine, 1.0, 1, false).await;

        clock.advance(1_000);
        assert!(engine.place_bid(&auction.id, 2.0, "alice").await.success);
    }

    #[tokio::test]
    async fn test_bid_equal_to_current_is_too_low() {
        let (engine, _clock) = manual_engine();
        let auction = open(&engine, 1.0, 30, false).await;

        let result = engine.place_bid(&auction.id, 1.0, "alice").await;

        assert!(!result.success);
        assert_eq!(result.message, "bid too low");
        assert_eq!(engine.get_active_auction().await, Some(auction.clone()));
        assert!(engine.bids_for_auction(&auction.id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_low_bids_never_mutate_state() {
        let (engine, _clock) = manual_engine();
        let auction = open(&engine, 10.0, 30, false).await;
        assert!(engine.place_bid(&auction.id, 20.0, "alice").await.success);
        let before = engine.list_auctions().await;

        for amount in [20.0, 19.99, 0.0, -1.0, f64::NAN] {
            let result = engine.place_bid(&auction.id, amount, "bob").await;
            assert_eq!(result.message, "bid too low");
        }

        assert_eq!(engine.list_auctions().await, before);
        assert_eq!(engine.bids_for_auction(&auction.id).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_blank_bidder_rejected() {
        let (engine, _clock) = manual_engine();
        let auction = open(&engine, 10.0, 30, false).await;

        let result = engine.place_bid(&auction.id, 20.0, "   ").await;

        assert!(!result.success);
        assert_eq!(result.message, "Bidder name is required");
    }

    #[tokio::test]
    async fn test_accepted_bid_updates_auction_and_history() {
        let (engine, clock) = manual_engine();
        let auction = open(&engine, 10.0, 30, false).await;

        clock.advance(2_000);
        let result = engine.place_bid(&auction.id, 12.5, "alice").await;

        assert!(result.success);
        assert_eq!(result.message, "Bid placed successfully");

        let bid = result.bid.unwrap();
        assert!(bid.id.starts_with("bid_"));
        assert_eq!(bid.auction_id, auction.id);
        assert_eq!(bid.amount, 12.5);
        assert_eq!(bid.bidder, "alice");
        assert_eq!(bid.timestamp, T0 + 2_000);

        let updated = result.auction.unwrap();
        assert_eq!(updated.current_bid, 12.5);
        assert_eq!(updated.current_winner.as_deref(), Some("alice"));
        assert_eq!(updated.end_time, auction.end_time);

        assert_eq!(engine.list_auctions().await, vec![updated.clone()]);
        assert_eq!(engine.get_auction(&auction.id).await, Some(updated));
        assert_eq!(engine.bids_for_auction(&auction.id).await.unwrap(), vec![bid]);
    }

    #[tokio::test]
    async fn test_soft_close_extends_to_ten_seconds_from_bid() {
        let (engine, clock) = manual_engine();
        let auction = open(&engine, 10.0, 5, true).await;

        // 4s remaining
        clock.advance(1_000);
        let result = engine.place_bid(&auction.id, 15.0, "alice").await;

        assert!(result.success);
        let bid_time = result.bid.unwrap().timestamp;
        assert_eq!(result.auction.unwrap().end_time, bid_time + 10_000);
        assert_eq!(
            engine.get_active_auction().await.unwrap().end_time,
            bid_time + 10_000
        );
    }

    #[tokio::test]
    async fn test_soft_close_leaves_deadline_with_time_to_spare() {
        let (engine, clock) = manual_engine();
        let auction = open(&engine, 10.0, 30, true).await;

        // exactly 10s remaining is not inside the window
        clock.advance(20_000);
        let result = engine.place_bid(&auction.id, 15.0, "alice").await;

        assert!(result.success);
        assert_eq!(result.auction.unwrap().end_time, auction.end_time);
    }

    #[tokio::test]
    async fn test_no_extension_without_extended_bidding() {
        let (engine, clock) = manual_engine();
        let auction = open(&engine, 10.0, 5, false).await;

        clock.advance(4_000);
        let result = engine.place_bid(&auction.id, 15.0, "alice").await;

        assert!(result.success);
        assert_eq!(result.auction.unwrap().end_time, auction.end_time);
    }

    #[tokio::test]
    async fn test_repeated_soft_close_never_moves_deadline_back() {
        let (engine, clock) = manual_engine();
        let auction = open(&engine, 10.0, 5, true).await;

        let mut last_end = auction.end_time;
        for (step, amount) in [(3_000, 11.0), (8_000, 12.0), (9_500, 13.0)] {
            clock.advance(step);
            let result = engine.place_bid(&auction.id, amount, "alice").await;
            let end = result.auction.unwrap().end_time;
            assert!(end >= last_end);
            last_end = end;
        }
    }

    #[tokio::test]
    async fn test_events_follow_state_changes() {
        let (engine, clock) = manual_engine();
        let mut started = engine.events().subscribe_auction_started();
        let mut placed = engine.events().subscribe_bid_placed();
        let mut updated = engine.events().subscribe_auctions_updated();

        let auction = open(&engine, 10.0, 30, false).await;
        assert_eq!(started.recv().await.unwrap(), auction);
        assert_eq!(updated.recv().await.unwrap(), vec![auction.clone()]);

        clock.advance(500);
        let result = engine.place_bid(&auction.id, 11.0, "alice").await;
        assert_eq!(placed.recv().await.unwrap(), result.bid.unwrap());
        assert_eq!(updated.recv().await.unwrap(), vec![result.auction.unwrap()]);

        // rejected bids publish nothing
        engine.place_bid(&auction.id, 1.0, "bob").await;
        assert_eq!(placed.try_recv(), Err(TryRecvError::Empty));
        assert_eq!(updated.try_recv(), Err(TryRecvError::Empty));
    }

    #[tokio::test]
    async fn test_expiry_closes_auction_and_allows_next() {
        let (engine, clock) = manual_engine();
        let mut ended = engine.events().subscribe_auction_ended();
        let first = open(&engine, 10.0, 5, false).await;

        clock.advance(3_000);
        assert!(matches!(
            engine.expire_if_due(&first.id).await,
            Expiry::Pending(wait) if wait == Duration::from_millis(2_000)
        ));

        clock.advance(2_001);
        assert_eq!(engine.expire_if_due(&first.id).await, Expiry::Closed);
        assert_eq!(engine.expire_if_due(&first.id).await, Expiry::Stale);

        let closed = ended.recv().await.unwrap();
        assert_eq!(closed.id, first.id);
        assert!(!closed.is_active);

        // still reported as the tracked auction, but no longer biddable
        let tracked = engine.get_active_auction().await.unwrap();
        assert!(!tracked.is_active);
        let result = engine.place_bid(&first.id, 100.0, "alice").await;
        assert_eq!(result.message, "bid too late");

        let second = open(&engine, 20.0, 5, false).await;
        let auctions = engine.list_auctions().await;
        assert_eq!(auctions.len(), 2);
        assert_eq!(active_count(&auctions), 1);
        assert_eq!(auctions[1].id, second.id);
        assert_eq!(engine.expire_if_due(&first.id).await, Expiry::Stale);
    }

    #[tokio::test]
    async fn test_bid_on_other_id_after_expiry_finds_no_auction() {
        let (engine, clock) = manual_engine();
        let auction = open(&engine, 1.0, 1, false).await;

        clock.advance(2_000);
        assert_eq!(engine.expire_if_due(&auction.id).await, Expiry::Closed);

        let result = engine.place_bid("auction_other", 5.0, "alice").await;
        assert!(!result.success);
        assert_eq!(result.message, "No active auction found");

        let result = engine.place_bid(&auction.id, 5.0, "alice").await;
        assert_eq!(result.message, "bid too late");
    }

    #[tokio::test]
    async fn test_expiry_keeps_auction_open_at_exact_deadline() {
        let (engine, clock) = manual_engine();
        let auction = open(&engine, 1.0, 5, false).await;

        clock.advance(5_000);
        assert_eq!(
            engine.expire_if_due(&auction.id).await,
            Expiry::Pending(Duration::from_millis(1))
        );
        assert!(engine.place_bid(&auction.id, 2.0, "alice").await.success);

        clock.advance(1);
        assert_eq!(engine.expire_if_due(&auction.id).await, Expiry::Closed);
    }

    #[tokio::test]
    async fn test_expiry_waits_for_extended_deadline() {
        let (engine, clock) = manual_engine();
        let auction = open(&engine, 10.0, 5, true).await;

        clock.advance(4_000);
        assert!(engine.place_bid(&auction.id, 11.0, "alice").await.success);

        // original deadline passes, extended one has not
        clock.advance(1_500);
        assert!(matches!(
            engine.expire_if_due(&auction.id).await,
            Expiry::Pending(wait) if wait == Duration::from_millis(8_500)
        ));
        assert!(engine.get_active_auction().await.unwrap().is_active);
    }

    #[tokio::test]
    async fn test_expiry_timer_fires_in_real_time() {
        let engine = AuctionEngine::new(EngineConfig::default());
        let mut ended = engine.events().subscribe_auction_ended();
        let mut updated = engine.events().subscribe_auctions_updated();

        let auction = open(&engine, 1.0, 1, false).await;
        assert_eq!(updated.recv().await.unwrap().len(), 1);

        let closed = tokio::time::timeout(Duration::from_secs(3), ended.recv())
            .await
            .expect("auction should end within its duration")
            .unwrap();
        assert_eq!(closed.id, auction.id);
        assert!(!closed.is_active);

        let snapshot = updated.recv().await.unwrap();
        assert_eq!(active_count(&snapshot), 0);
        assert!(!engine.get_active_auction().await.unwrap().is_active);
        assert_eq!(engine.events().subscriber_count(AUCTION_ENDED), 1);
        assert_eq!(engine.events().subscriber_count(AUCTIONS_UPDATED), 1);
    }

    #[tokio::test]
    async fn test_bid_after_real_expiry_is_too_late() {
        let engine = AuctionEngine::new(EngineConfig::default());
        let auction = open(&engine, 1.0, 1, false).await;

        tokio::time::sleep(Duration::from_millis(1_100)).await;
        let result = engine.place_bid(&auction.id, 5.0, "alice").await;

        assert!(!result.success);
        assert_eq!(result.message, "bid too late");
    }

    #[tokio::test]
    async fn test_real_timer_honours_extension() {
        let engine = AuctionEngine::new(EngineConfig::default());
        let auction = open(&engine, 1.0, 1, true).await;

        assert!(engine.place_bid(&auction.id, 2.0, "alice").await.success);
        tokio::time::sleep(Duration::from_millis(1_500)).await;

        assert!(engine.get_active_auction().await.unwrap().is_active);
        engine.shutdown().await;
    }

    #[tokio::test]
    async fn test_shutdown_cancels_timer() {
        let engine = AuctionEngine::new(EngineConfig::default());
        let mut ended = engine.events().subscribe_auction_ended();
        open(&engine, 1.0, 1, false).await;

        engine.shutdown().await;
        tokio::time::sleep(Duration::from_millis(1_300)).await;

        assert!(engine.get_active_auction().await.unwrap().is_active);
        assert_eq!(ended.try_recv(), Err(TryRecvError::Empty));
    }

    #[tokio::test]
    async fn test_counter() {
        let (engine, _clock) = manual_engine();

        assert_eq!(engine.get_counter().await, 0);
        assert_eq!(engine.increment_counter().await, 1);
        assert_eq!(engine.increment_counter().await, 2);
        assert_eq!(engine.get_counter().await, 2);
    }

    #[tokio::test]
    async fn test_bids_for_unknown_auction() {
        let (engine, _clock) = manual_engine();
        let err = engine.bids_for_auction("auction_missing").await.unwrap_err();
        assert!(matches!(err, AuctionError::NotFound(_)));
    }

    #[test]
    fn test_engine_config_from_settings() {
        let settings = AuctionSettings {
            default_duration_secs: 45,
            soft_close_window_secs: 15,
            event_capacity: 64,
        };
        let config = EngineConfig::from(&settings);

        assert_eq!(config.default_duration_secs, 45);
        assert_eq!(config.soft_close_window, Duration::from_secs(15));
        assert_eq!(config.soft_close_window_millis(), 15_000);
        assert_eq!(config.event_capacity, 64);
    }
}
