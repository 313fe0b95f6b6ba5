//! Consent preference flags and status.
//!
//! The `necessary` flag is forced to `true` on every construction path:
//! constructors, merges, serde deserialization and parsing of stored JSON.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Per-category cookie preferences.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "RawPreferences")]
pub struct CookiePreferences {
    /// Strictly necessary cookies; always `true`
    pub necessary: bool,
    /// Analytics cookies
    pub analytics: bool,
    /// Marketing cookies
    pub marketing: bool,
}

#[derive(Deserialize)]
struct RawPreferences {
    #[serde(default)]
    analytics: bool,
    #[serde(default)]
    marketing: bool,
}

impl From<RawPreferences> for CookiePreferences {
    fn from(raw: RawPreferences) -> Self {
        Self::new(raw.analytics, raw.marketing)
    }
}

impl CookiePreferences {
    /// Builds preferences with `necessary` set.
    #[must_use]
    pub const fn new(analytics: bool, marketing: bool) -> Self {
        Self {
            necessary: true,
            analytics,
            marketing,
        }
    }

    /// Only necessary cookies.
    #[must_use]
    pub const fn necessary_only() -> Self {
        Self::new(false, false)
    }

    /// Every category enabled.
    #[must_use]
    pub const fn all() -> Self {
        Self::new(true, true)
    }

    /// Applies `update` over these preferences. Any `necessary` value in the
    /// update is ignored.
    #[must_use]
    pub fn merged(self, update: PreferencesUpdate) -> Self {
        Self::new(
            update.analytics.unwrap_or(self.analytics),
            update.marketing.unwrap_or(self.marketing),
        )
    }

    /// Parses the stored `cookie-preferences` value.
    ///
    /// Returns `None` when the text is not valid JSON. Valid JSON that is not an
    /// object, or fields that are not booleans, fall back to `false`.
    #[must_use]
    pub fn from_stored(raw: &str) -> Option<Self> {
        let value: serde_json::Value = serde_json::from_str(raw).ok()?;
        let flag = |name: &str| {
            value
                .get(name)
                .and_then(serde_json::Value::as_bool)
                .unwrap_or(false)
        };
        Some(Self::new(flag("analytics"), flag("marketing")))
    }

    /// Whether the given category is enabled.
    #[must_use]
    pub const fn allows(&self, category: ConsentCategory) -> bool {
        match category {
            ConsentCategory::Necessary => true,
            ConsentCategory::Analytics => self.analytics,
            ConsentCategory::Marketing => self.marketing,
        }
    }

    /// Sets one category; `Necessary` cannot be switched off.
    pub const fn set(&mut self, category: ConsentCategory, enabled: bool) {
        match category {
            ConsentCategory::Necessary => {}
            ConsentCategory::Analytics => self.analytics = enabled,
            ConsentCategory::Marketing => self.marketing = enabled,
        }
    }
}

impl Default for CookiePreferences {
    fn default() -> Self {
        Self::necessary_only()
    }
}

/// A partial preference change as submitted from the detailed banner view.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PreferencesUpdate {
    /// Ignored when merged; present so callers can pass whole forms through
    #[serde(default)]
    pub necessary: Option<bool>,
    /// New analytics flag, if changing
    #[serde(default)]
    pub analytics: Option<bool>,
    /// New marketing flag, if changing
    #[serde(default)]
    pub marketing: Option<bool>,
}

impl From<CookiePreferences> for PreferencesUpdate {
    fn from(prefs: CookiePreferences) -> Self {
        Self {
            necessary: Some(prefs.necessary),
            analytics: Some(prefs.analytics),
            marketing: Some(prefs.marketing),
        }
    }
}

/// Where the user stands on cookie consent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConsentStatus {
    /// No decision recorded yet
    Pending,
    /// All categories accepted
    Accepted,
    /// All optional categories rejected
    Rejected,
    /// A specific combination chosen in the detailed view
    Customized,
}

impl ConsentStatus {
    /// The string stored under the `cookie-consent` key.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Accepted => "accepted",
            Self::Rejected => "rejected",
            Self::Customized => "customized",
        }
    }
}

impl fmt::Display for ConsentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ConsentStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            "accepted" => Ok(Self::Accepted),
            "rejected" => Ok(Self::Rejected),
            "customized" => Ok(Self::Customized),
            other => Err(format!("unknown consent status: {other}")),
        }
    }
}

/// Cookie categories shown in the banner.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConsentCategory {
    /// Required for the site to work
    Necessary,
    /// Visitor statistics
    Analytics,
    /// Third-party marketing and embeds
    Marketing,
}

impl ConsentCategory {
    /// All categories in display order.
    pub const ALL: [Self; 3] = [Self::Necessary, Self::Analytics, Self::Marketing];

    /// Stable identifier used for form field ids.
    #[must_use]
    pub const fn key(self) -> &'static str {
        match self {
            Self::Necessary => "necessary",
            Self::Analytics => "analytics",
            Self::Marketing => "marketing",
        }
    }

    /// Visitor-facing label.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Necessary => "Noodzakelijke cookies",
            Self::Analytics => "Analytische cookies",
            Self::Marketing => "Marketing cookies",
        }
    }

    /// Visitor-facing explanation.
    #[must_use]
    pub const fn description(self) -> &'static str {
        match self {
            Self::Necessary => {
                "Nodig om de website te laten werken. Deze kunnen niet worden uitgeschakeld."
            }
            Self::Analytics => "Helpen ons te begrijpen hoe bezoekers de website gebruiken.",
            Self::Marketing => "Worden gebruikt voor ingesloten media en gerichte inhoud.",
        }
    }
}
