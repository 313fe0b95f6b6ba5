//! Stale-response protection for overlapping fetches.
//!
//! Each fetch takes a [`RequestTicket`] before it starts. When results come
//! back, only the ticket issued last may apply its result; anything older is
//! dropped, so a slow first request can never overwrite a fast second one.

use std::sync::atomic::{AtomicU64, Ordering};
use tracing::debug;

/// Identity of one issued request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct RequestTicket(u64);

/// Issues monotonically increasing request tickets.
#[derive(Debug, Default)]
pub struct RequestSequencer {
    latest: AtomicU64,
}

impl RequestSequencer {
    /// A sequencer that has issued nothing yet.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Issues the next ticket, superseding all earlier ones.
    pub fn begin(&self) -> RequestTicket {
        RequestTicket(self.latest.fetch_add(1, Ordering::AcqRel) + 1)
    }

    /// Whether `ticket` is the most recently issued one.
    #[must_use]
    pub fn is_latest(&self, ticket: RequestTicket) -> bool {
        self.latest.load(Ordering::Acquire) == ticket.0
    }
}

/// Loading state of a view backed by a fetch.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum FetchState<T> {
    /// Nothing requested yet
    #[default]
    Idle,
    /// A request is in flight
    Loading,
    /// The latest request succeeded
    Loaded(T),
    /// The latest request failed; the message is shown to the user
    Failed(String),
}

/// Holds the result of the most recently issued fetch.
#[derive(Debug, Default)]
pub struct LatestResult<T> {
    sequencer: RequestSequencer,
    state: FetchState<T>,
}

impl<T> LatestResult<T> {
    /// Empty holder in [`FetchState::Idle`].
    #[must_use]
    pub fn new() -> Self {
        Self {
            sequencer: RequestSequencer::new(),
            state: FetchState::Idle,
        }
    }

    /// Starts a request and moves to [`FetchState::Loading`].
    pub fn begin(&mut self) -> RequestTicket {
        self.state = FetchState::Loading;
        self.sequencer.begin()
    }

    /// Applies a finished request. Returns `false` (and leaves the state
    /// untouched) when a newer request has been issued since `ticket`.
    pub fn resolve<E: std::fmt::Display>(
        &mut self,
        ticket: RequestTicket,
        result: Result<T, E>,
    ) -> bool {
        if !self.sequencer.is_latest(ticket) {
            debug!("Discarding stale response for request {:?}", ticket);
            return false;
        }
        self.state = match result {
            Ok(value) => FetchState::Loaded(value),
            Err(e) => FetchState::Failed(e.to_string()),
        };
        true
    }

    /// Current state.
    #[must_use]
    pub const fn state(&self) -> &FetchState<T> {
        &self.state
    }

    /// Loaded value, if the latest request succeeded.
    #[must_use]
    pub const fn value(&self) -> Option<&T> {
        match &self.state {
            FetchState::Loaded(value) => Some(value),
            _ => None,
        }
    }
}
