//! Change feed for change-request rows.
//!
//! # Responsibility
//! - Fan out inserted/updated/deleted change requests to connected clients.
//! - Give subscribers an explicit reconnect policy when they fall behind.
//!
//! Repositories publish only when a feed is attached with
//! `SqliteChangeRequestRepository::with_feed`. The FFI layer attaches one
//! process-wide feed to every workflow it builds.
//!
//! # Invariants
//! - Repositories publish only after the SQL write succeeded.
//! - Publishing never fails; zero subscribers is a normal state.
//! - A subscriber that lagged receives `FeedItem::Resync` and must reload
//!   its view from the repository.

use crate::model::change_request::{ChangeRequest, ChangeRequestId};
use crate::model::profile::ProfileId;
use log::{debug, warn};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::time::Duration;
use tokio::sync::broadcast;
use tokio::sync::broadcast::error::{RecvError, TryRecvError};

pub const DEFAULT_FEED_CAPACITY: usize = 64;

/// One committed change to the `change_requests` table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChangeEvent {
    Inserted(ChangeRequest),
    Updated(ChangeRequest),
    /// Administrative storage deletion; carries only the id.
    Deleted(ChangeRequestId),
}

impl ChangeEvent {
    pub fn request_id(&self) -> ChangeRequestId {
        match self {
            Self::Inserted(request) | Self::Updated(request) => request.id,
            Self::Deleted(id) => *id,
        }
    }

    fn name(&self) -> &'static str {
        match self {
            Self::Inserted(_) => "inserted",
            Self::Updated(_) => "updated",
            Self::Deleted(_) => "deleted",
        }
    }
}

/// Which events a subscription receives.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubscriptionFilter {
    All,
    /// Events for requests the profile sent or received. Deletions always
    /// pass because the row is gone.
    Profile(ProfileId),
}

impl SubscriptionFilter {
    fn matches(&self, event: &ChangeEvent) -> bool {
        match (self, event) {
            (Self::All, _) | (Self::Profile(_), ChangeEvent::Deleted(_)) => true,
            (Self::Profile(profile_id), ChangeEvent::Inserted(request))
            | (Self::Profile(profile_id), ChangeEvent::Updated(request)) => {
                request.involves(*profile_id)
            }
        }
    }
}

/// Item delivered to a subscriber.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FeedItem {
    Event(ChangeEvent),
    /// The subscriber fell behind and was reattached at the tail of the
    /// feed; `missed` events were dropped.
    Resync { missed: u64 },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FeedError {
    /// Every publisher is gone.
    Closed,
    /// Too many consecutive resyncs without a delivered event.
    ReconnectExhausted { attempts: u32 },
}

impl Display for FeedError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Closed => write!(f, "change feed closed"),
            Self::ReconnectExhausted { attempts } => {
                write!(f, "change feed reconnect gave up after {attempts} attempts")
            }
        }
    }
}

impl Error for FeedError {}

/// Backoff applied between consecutive resyncs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReconnectPolicy {
    pub max_attempts: u32,
    pub initial_backoff: Duration,
    pub max_backoff: Duration,
}

impl Default for ReconnectPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            initial_backoff: Duration::from_millis(200),
            max_backoff: Duration::from_secs(30),
        }
    }
}

impl ReconnectPolicy {
    /// Delay before reconnect `attempt` (1-based), doubling from
    /// `initial_backoff` and capped at `max_backoff`. `None` once attempts
    /// are exhausted.
    pub fn delay_for(&self, attempt: u32) -> Option<Duration> {
        if attempt == 0 || attempt > self.max_attempts {
            return None;
        }
        let factor = 2u32.saturating_pow((attempt - 1).min(16));
        Some(
            self.initial_backoff
                .saturating_mul(factor)
                .min(self.max_backoff),
        )
    }
}

/// Publisher side of the feed. Cheap to clone.
#[derive(Debug, Clone)]
pub struct ChangeFeed {
    sender: broadcast::Sender<ChangeEvent>,
}

impl Default for ChangeFeed {
    fn default() -> Self {
        Self::new(DEFAULT_FEED_CAPACITY)
    }
}

impl ChangeFeed {
    /// Creates a feed buffering up to `capacity` events per slow subscriber.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    /// Publishes one event and returns how many subscribers received it.
    pub fn publish(&self, event: ChangeEvent) -> usize {
        let kind = event.name();
        let request_id = event.request_id();
        let delivered = self.sender.send(event).unwrap_or(0);
        debug!(
            "event=feed_publish module=feed kind={kind} request_id={request_id} subscribers={delivered}"
        );
        delivered
    }

    pub fn subscribe(&self, filter: SubscriptionFilter) -> Subscription {
        self.subscribe_with_policy(filter, ReconnectPolicy::default())
    }

    pub fn subscribe_with_policy(
        &self,
        filter: SubscriptionFilter,
        policy: ReconnectPolicy,
    ) -> Subscription {
        Subscription {
            receiver: self.sender.subscribe(),
            filter,
            policy,
            attempts: 0,
        }
    }

    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

/// Receiving side of the feed. Dropping it unsubscribes.
#[derive(Debug)]
pub struct Subscription {
    receiver: broadcast::Receiver<ChangeEvent>,
    filter: SubscriptionFilter,
    policy: ReconnectPolicy,
    attempts: u32,
}

impl Subscription {
    /// Returns the next matching item without waiting, `None` when idle.
    ///
    /// Never sleeps; the caller decides when to poll again.
    pub fn try_next(&mut self) -> Result<Option<FeedItem>, FeedError> {
        loop {
            match self.receiver.try_recv() {
                Ok(event) => {
                    self.attempts = 0;
                    if self.filter.matches(&event) {
                        return Ok(Some(FeedItem::Event(event)));
                    }
                }
                Err(TryRecvError::Empty) => return Ok(None),
                Err(TryRecvError::Lagged(missed)) => {
                    return self.reconnect(missed).map(|(item, _)| Some(item))
                }
                Err(TryRecvError::Closed) => return Err(FeedError::Closed),
            }
        }
    }

    /// Blocks the current thread until a matching item arrives.
    ///
    /// Sleeps for the policy delay before resyncing. Must not be called from
    /// inside an async runtime.
    pub fn next_blocking(&mut self) -> Result<FeedItem, FeedError> {
        loop {
            match self.receiver.blocking_recv() {
                Ok(event) => {
                    self.attempts = 0;
                    if self.filter.matches(&event) {
                        return Ok(FeedItem::Event(event));
                    }
                }
                Err(RecvError::Lagged(missed)) => {
                    let (item, delay) = self.reconnect(missed)?;
                    std::thread::sleep(delay);
                    return Ok(item);
                }
                Err(RecvError::Closed) => return Err(FeedError::Closed),
            }
        }
    }

    /// Explicit unsubscribe; equivalent to dropping the subscription.
    pub fn unsubscribe(self) {}

    fn reconnect(&mut self, missed: u64) -> Result<(FeedItem, Duration), FeedError> {
        self.attempts += 1;
        let Some(delay) = self.policy.delay_for(self.attempts) else {
            warn!(
                "event=feed_reconnect module=feed status=error attempts={} missed={missed}",
                self.attempts - 1
            );
            return Err(FeedError::ReconnectExhausted {
                attempts: self.attempts - 1,
            });
        };

        self.receiver = self.receiver.resubscribe();
        warn!(
            "event=feed_reconnect module=feed status=ok attempt={} missed={missed} delay_ms={}",
            self.attempts,
            delay.as_millis()
        );
        Ok((FeedItem::Resync { missed }, delay))
    }
}
