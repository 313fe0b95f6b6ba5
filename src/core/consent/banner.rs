//! Consent banner view model.
//!
//! The banner is a pure function of the store state plus local UI state: whether
//! the detail view is open and a draft copy of the preferences being edited.
//! Toggling categories only changes the draft; the store is touched by the
//! accept, reject and save actions alone.

use super::preferences::{ConsentCategory, CookiePreferences, PreferencesUpdate};
use super::storage::ConsentStorage;
use super::store::{ConsentState, ConsentStore};
use tracing::debug;

/// Id of the banner heading, referenced by `aria-labelledby`.
pub const BANNER_HEADING_ID: &str = "cookie-banner-title";

/// Something the user did inside the banner.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BannerAction {
    /// "Accept all" button
    AcceptAll,
    /// "Reject all" button
    RejectAll,
    /// Link from the quick view to the detail view
    ShowDetails,
    /// A category switch in the detail view
    Toggle(ConsentCategory),
    /// "Save preferences" in the detail view
    Save,
    /// "Back" in the detail view; discards the draft
    Back,
}

/// One category switch in the detail view.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToggleModel {
    /// Category the switch controls
    pub category: ConsentCategory,
    /// Switch label
    pub label: &'static str,
    /// Explanatory text
    pub description: &'static str,
    /// Draft value
    pub checked: bool,
    /// Non-interactive switches (the necessary category)
    pub disabled: bool,
}

/// Which view the banner body is showing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BannerBody {
    /// Accept / reject buttons plus a details link
    Quick {
        /// Actions offered, in display order
        actions: [BannerAction; 3],
    },
    /// Per-category switches with save and back
    Detail {
        /// One switch per category
        toggles: Vec<ToggleModel>,
        /// Actions offered, in display order
        actions: [BannerAction; 2],
    },
}

/// Everything needed to draw the banner.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BannerModel {
    /// Always `"dialog"`
    pub role: &'static str,
    /// The dialog blocks interaction with the page behind it
    pub aria_modal: bool,
    /// Id of the heading labelling the dialog
    pub labelled_by: &'static str,
    /// Heading text
    pub heading: &'static str,
    /// Current body
    pub body: BannerBody,
}

/// Local UI state of the banner.
///
/// The detail view is tied to the store state it was opened on. Any store
/// transition made elsewhere (a decision, closing and reopening the banner)
/// drops the banner back to the quick view, so a stale draft is never shown.
#[derive(Debug, Default, Clone)]
pub struct ConsentBanner {
    opened_on: Option<ConsentState>,
    draft: CookiePreferences,
}

impl ConsentBanner {
    /// A banner showing the quick view.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether the detail view is open for the store's current state.
    #[must_use]
    pub fn in_detail_view<S: ConsentStorage>(&self, store: &ConsentStore<S>) -> bool {
        self.opened_on.as_ref() == Some(store.state())
    }

    /// The preferences currently being edited.
    #[must_use]
    pub const fn draft(&self) -> CookiePreferences {
        self.draft
    }

    /// Builds the view model, or `None` when the banner is hidden.
    #[must_use]
    pub fn render<S: ConsentStorage>(&self, store: &ConsentStore<S>) -> Option<BannerModel> {
        if !store.state().banner_visible {
            return None;
        }

        let body = if self.in_detail_view(store) {
            BannerBody::Detail {
                toggles: ConsentCategory::ALL
                    .into_iter()
                    .map(|category| ToggleModel {
                        category,
                        label: category.label(),
                        description: category.description(),
                        checked: self.draft.allows(category),
                        disabled: category == ConsentCategory::Necessary,
                    })
                    .collect(),
                actions: [BannerAction::Save, BannerAction::Back],
            }
        } else {
            BannerBody::Quick {
                actions: [
                    BannerAction::AcceptAll,
                    BannerAction::RejectAll,
                    BannerAction::ShowDetails,
                ],
            }
        };

        Some(BannerModel {
            role: "dialog",
            aria_modal: true,
            labelled_by: BANNER_HEADING_ID,
            heading: "Wij gebruiken cookies",
            body,
        })
    }

    /// Applies a user action, calling into the store where the action is a
    /// decision.
    pub fn handle<S: ConsentStorage>(&mut self, action: BannerAction, store: &mut ConsentStore<S>) {
        debug!("Consent banner action: {:?}", action);
        match action {
            BannerAction::AcceptAll => {
                store.accept_all();
                self.opened_on = None;
            }
            BannerAction::RejectAll => {
                store.reject_all();
                self.opened_on = None;
            }
            BannerAction::ShowDetails => {
                self.draft = store.state().preferences;
                self.opened_on = Some(*store.state());
            }
            BannerAction::Toggle(category) => {
                if self.in_detail_view(store) {
                    let current = self.draft.allows(category);
                    self.draft.set(category, !current);
                }
            }
            BannerAction::Save => {
                if self.in_detail_view(store) {
                    store.save_preferences(PreferencesUpdate::from(self.draft));
                    self.opened_on = None;
                }
            }
            BannerAction::Back => {
                self.draft = store.state().preferences;
                self.opened_on = None;
            }
        }
    }
}
