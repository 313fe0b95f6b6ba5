//! Cookie consent: preference types, durable storage, the consent store state
//! machine and the banner view model bound to it.

/// Consent banner view model and user actions
pub mod banner;
/// Preference flags, consent status and categories
pub mod preferences;
/// Durable key-value storage for the two consent keys
pub mod storage;
/// The consent store state machine
pub mod store;

pub use banner::{BannerAction, BannerBody, BannerModel, ConsentBanner, ToggleModel};
pub use preferences::{ConsentCategory, ConsentStatus, CookiePreferences, PreferencesUpdate};
pub use storage::{ConsentStorage, FileStorage, MemoryStorage};
pub use store::{
    CONSENT_KEY, ConsentGate, ConsentSnapshot, ConsentSource, ConsentState, ConsentStore,
    DetachedConsent, PREFERENCES_KEY, SubscriptionId,
};
