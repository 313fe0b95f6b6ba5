//! The consent store: single source of truth for cookie consent.
//!
//! A store only exists hydrated. [`ConsentStore::hydrate`] reads durable storage
//! before returning, so no caller can observe default values that were never
//! a real decision. Consumers that run without a store (server-rendered output,
//! background jobs) use [`DetachedConsent`], whose snapshot is undecided and
//! keeps the banner hidden.

use super::preferences::{ConsentCategory, ConsentStatus, CookiePreferences, PreferencesUpdate};
use super::storage::ConsentStorage;
use crate::errors::Result;
use tracing::{debug, info, instrument, warn};

/// Storage key holding the serialized [`ConsentStatus`].
pub const CONSENT_KEY: &str = "cookie-consent";
/// Storage key holding the serialized [`CookiePreferences`].
pub const PREFERENCES_KEY: &str = "cookie-preferences";

/// In-memory consent state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConsentState {
    /// Current per-category preferences
    pub preferences: CookiePreferences,
    /// Current decision
    pub status: ConsentStatus,
    /// Whether the banner should be shown
    pub banner_visible: bool,
}

impl ConsentState {
    /// No decision yet: necessary-only preferences, `pending` status.
    #[must_use]
    pub const fn undecided(banner_visible: bool) -> Self {
        Self {
            preferences: CookiePreferences::necessary_only(),
            status: ConsentStatus::Pending,
            banner_visible,
        }
    }
}

/// Outcome of asking whether a category may be used.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConsentGate {
    /// No decision has been made; do not load, but do not treat as refused either
    Undecided,
    /// The user allowed this category
    Granted,
    /// The user refused this category
    Denied,
}

/// Read-only view of consent handed to consumers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConsentSnapshot {
    /// The state at the time of the snapshot
    pub state: ConsentState,
    /// `false` when taken from [`DetachedConsent`]
    pub attached: bool,
}

impl ConsentSnapshot {
    /// Whether a real decision has been recorded.
    #[must_use]
    pub fn is_decided(&self) -> bool {
        self.attached && self.state.status != ConsentStatus::Pending
    }

    /// Gate for loading something in `category`.
    #[must_use]
    pub fn gate(&self, category: ConsentCategory) -> ConsentGate {
        if category == ConsentCategory::Necessary {
            return ConsentGate::Granted;
        }
        if !self.is_decided() {
            return ConsentGate::Undecided;
        }
        if self.state.preferences.allows(category) {
            ConsentGate::Granted
        } else {
            ConsentGate::Denied
        }
    }
}

/// Anything that can hand out a consent snapshot.
pub trait ConsentSource {
    /// Current consent as seen by this source.
    fn snapshot(&self) -> ConsentSnapshot;
}

/// Stand-in for contexts where no store has been constructed.
#[derive(Debug, Default, Clone, Copy)]
pub struct DetachedConsent;

impl ConsentSource for DetachedConsent {
    fn snapshot(&self) -> ConsentSnapshot {
        ConsentSnapshot {
            state: ConsentState::undecided(false),
            attached: false,
        }
    }
}

/// Identifies a subscription so it can be removed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

type Listener = Box<dyn Fn(&ConsentState) + Send + Sync>;

/// Owns consent state and its persistence.
pub struct ConsentStore<S: ConsentStorage> {
    storage: S,
    state: ConsentState,
    listeners: Vec<(SubscriptionId, Listener)>,
    next_subscription: u64,
    last_persist_error: Option<String>,
}

impl<S: ConsentStorage> std::fmt::Debug for ConsentStore<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConsentStore")
            .field("state", &self.state)
            .field("listeners", &self.listeners.len())
            .field("last_persist_error", &self.last_persist_error)
            .finish_non_exhaustive()
    }
}

impl<S: ConsentStorage> ConsentStore<S> {
    /// Loads persisted consent from `storage`.
    ///
    /// Both keys must be present, the status must be a known decision (not
    /// `pending`) and the preferences must be valid JSON; otherwise the store
    /// starts `pending` with the banner visible. Read failures count as absence.
    #[instrument(skip(storage))]
    pub fn hydrate(storage: S) -> Self {
        let state = match Self::read_persisted(&storage) {
            Some((status, preferences)) => {
                debug!("Hydrated consent: status={}", status);
                ConsentState {
                    preferences,
                    status,
                    banner_visible: false,
                }
            }
            None => {
                debug!("No usable stored consent; banner will be shown.");
                ConsentState::undecided(true)
            }
        };

        Self {
            storage,
            state,
            listeners: Vec::new(),
            next_subscription: 0,
            last_persist_error: None,
        }
    }

    fn read_persisted(storage: &S) -> Option<(ConsentStatus, CookiePreferences)> {
        let read = |key: &str| {
            storage
                .read(key)
                .inspect_err(|e| warn!("Failed to read {} from consent storage: {}", key, e))
                .ok()
                .flatten()
        };
        let raw_status = read(CONSENT_KEY)?;
        let raw_preferences = read(PREFERENCES_KEY)?;

        let status = raw_status
            .parse::<ConsentStatus>()
            .inspect_err(|e| warn!("Ignoring stored consent: {}", e))
            .ok()?;
        if status == ConsentStatus::Pending {
            debug!("Stored consent is pending; asking again");
            return None;
        }
        let preferences = CookiePreferences::from_stored(&raw_preferences);
        if preferences.is_none() {
            warn!("Ignoring stored consent: preferences are not valid JSON");
        }
        Some((status, preferences?))
    }

    /// Current state.
    #[must_use]
    pub const fn state(&self) -> &ConsentState {
        &self.state
    }

    /// Last persistence failure, if the most recent write failed.
    #[must_use]
    pub fn last_persist_error(&self) -> Option<&str> {
        self.last_persist_error.as_deref()
    }

    /// Borrow the backing storage.
    #[must_use]
    pub const fn storage(&self) -> &S {
        &self.storage
    }

    /// Enables every category and records `accepted`.
    pub fn accept_all(&mut self) {
        self.decide(CookiePreferences::all(), ConsentStatus::Accepted);
    }

    /// Disables every optional category and records `rejected`.
    pub fn reject_all(&mut self) {
        self.decide(CookiePreferences::necessary_only(), ConsentStatus::Rejected);
    }

    /// Merges `update` over the current preferences and records `customized`.
    /// `necessary` stays `true` whatever the update says.
    pub fn save_preferences(&mut self, update: PreferencesUpdate) {
        let preferences = self.state.preferences.merged(update);
        self.decide(preferences, ConsentStatus::Customized);
    }

    /// Shows the banner again so the user can revisit their choice.
    pub fn open_preferences(&mut self) {
        self.apply(ConsentState {
            banner_visible: true,
            ..self.state
        });
    }

    /// Hides the banner, unless no decision has been made yet.
    pub fn close_banner(&mut self) {
        if self.state.status == ConsentStatus::Pending {
            debug!("Ignoring close_banner while consent is pending");
            return;
        }
        self.apply(ConsentState {
            banner_visible: false,
            ..self.state
        });
    }

    /// Registers `listener` to be called after every state change.
    pub fn subscribe(
        &mut self,
        listener: impl Fn(&ConsentState) + Send + Sync + 'static,
    ) -> SubscriptionId {
        let id = SubscriptionId(self.next_subscription);
        self.next_subscription += 1;
        self.listeners.push((id, Box::new(listener)));
        id
    }

    /// Removes a listener. Returns whether it was registered.
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|(existing, _)| *existing != id);
        self.listeners.len() != before
    }

    fn decide(&mut self, preferences: CookiePreferences, status: ConsentStatus) {
        let next = ConsentState {
            preferences,
            status,
            banner_visible: false,
        };
        match self.persist(&next) {
            Ok(()) => self.last_persist_error = None,
            Err(e) => {
                // In-memory state stays authoritative for the session.
                warn!("Failed to persist consent decision: {}", e);
                self.last_persist_error = Some(e.to_string());
            }
        }
        info!("Consent decision recorded: {}", status);
        self.apply(next);
    }

    fn persist(&mut self, state: &ConsentState) -> Result<()> {
        let preferences = serde_json::to_string(&state.preferences)?;
        self.storage.write(CONSENT_KEY, state.status.as_str())?;
        self.storage.write(PREFERENCES_KEY, &preferences)?;
        Ok(())
    }

    fn apply(&mut self, next: ConsentState) {
        if next == self.state {
            return;
        }
        self.state = next;
        for (_, listener) in &self.listeners {
            listener(&self.state);
        }
    }
}

impl<S: ConsentStorage> ConsentSource for ConsentStore<S> {
    fn snapshot(&self) -> ConsentSnapshot {
        ConsentSnapshot {
            state: self.state,
            attached: true,
        }
    }
}
