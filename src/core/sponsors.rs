//! Sponsor banner rotation and analytics.
//!
//! [`SponsorRotation`] is the pure carousel index. [`RotationTimer`] advances it
//! on a fixed interval and is tied to the lifetime of the view that owns it:
//! dropping the timer stops the task. [`ImpressionTracker`] counts at most one
//! impression per sponsor per page view, once enough of the banner is visible.

use crate::{
    config::site::SponsorSettings,
    core::cms::ContentEntry,
    entities::{SponsorEvent, sponsor_event},
    errors::Result,
};
use sea_orm::{QueryOrder, Set, prelude::*};
use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tokio::task::JoinHandle;
use tracing::{debug, instrument, trace};

/// A sponsor as shown in the banner.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sponsor {
    /// CMS id
    pub id: String,
    /// Display name
    pub name: String,
    /// Logo image URL
    pub logo: Option<String>,
    /// Link target
    pub website: Option<String>,
}

impl Sponsor {
    /// Builds a sponsor from a `sponsor` content entry. Entries without a
    /// name are skipped, and so are entries with `data.active == false`.
    #[must_use]
    pub fn from_entry(entry: &ContentEntry) -> Option<Self> {
        if entry.data.get("active").and_then(serde_json::Value::as_bool) == Some(false) {
            return None;
        }
        let name = entry.text("name").or(entry.name.as_deref())?;
        Some(Self {
            id: entry.id.clone(),
            name: name.to_string(),
            logo: entry.text("logo").map(str::to_string),
            website: entry.text("website").map(str::to_string),
        })
    }
}

/// Carousel position over a fixed list of sponsors.
#[derive(Debug, Clone, Default)]
pub struct SponsorRotation {
    sponsors: Vec<Sponsor>,
    index: usize,
}

impl SponsorRotation {
    /// Rotation starting at the first sponsor.
    #[must_use]
    pub const fn new(sponsors: Vec<Sponsor>) -> Self {
        Self { sponsors, index: 0 }
    }

    /// Sponsor currently shown.
    #[must_use]
    pub fn current(&self) -> Option<&Sponsor> {
        self.sponsors.get(self.index)
    }

    /// Current position.
    #[must_use]
    pub const fn index(&self) -> usize {
        self.index
    }

    /// Number of sponsors in the rotation.
    #[must_use]
    pub fn len(&self) -> usize {
        self.sponsors.len()
    }

    /// Whether there is nothing to show.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.sponsors.is_empty()
    }

    /// Moves to the next sponsor, wrapping at the end.
    pub fn advance(&mut self) {
        if !self.sponsors.is_empty() {
            self.index = (self.index + 1) % self.sponsors.len();
        }
    }
}

/// Periodic task advancing a shared rotation. Aborted when dropped.
#[derive(Debug)]
pub struct RotationTimer {
    handle: JoinHandle<()>,
}

impl RotationTimer {
    /// Starts advancing `rotation` every `interval`. The first advance happens
    /// one full interval after start.
    #[must_use]
    pub fn start(rotation: Arc<RwLock<SponsorRotation>>, interval: Duration) -> Self {
        let handle = tokio::spawn(async move {
            let start = tokio::time::Instant::now() + interval;
            let mut ticker = tokio::time::interval_at(start, interval);
            loop {
                ticker.tick().await;
                let mut guard = rotation.write().await;
                guard.advance();
                trace!("Sponsor rotation advanced to {}", guard.index());
            }
        });
        Self { handle }
    }

    /// Starts a timer with the configured rotation interval.
    #[must_use]
    pub fn from_settings(
        rotation: Arc<RwLock<SponsorRotation>>,
        settings: &SponsorSettings,
    ) -> Self {
        Self::start(rotation, settings.rotation_interval())
    }

    /// Stops the timer explicitly.
    pub fn stop(self) {
        drop(self);
    }

    /// Whether the task has ended.
    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }
}

impl Drop for RotationTimer {
    fn drop(&mut self) {
        self.handle.abort();
        debug!("Sponsor rotation timer stopped");
    }
}

/// Decides which visibility reports count as impressions.
#[derive(Debug, Clone)]
pub struct ImpressionTracker {
    threshold: f64,
    seen: HashSet<String>,
}

impl ImpressionTracker {
    /// Tracker counting an impression once `threshold` (0..=1) of the banner
    /// is visible.
    #[must_use]
    pub fn new(threshold: f64) -> Self {
        Self {
            threshold: threshold.clamp(0.0, 1.0),
            seen: HashSet::new(),
        }
    }

    /// Tracker using the configured visibility threshold.
    #[must_use]
    pub fn from_settings(settings: &SponsorSettings) -> Self {
        Self::new(settings.visibility_threshold)
    }

    /// Reports a visibility ratio for `sponsor_id`. Returns `true` the first
    /// time the sponsor crosses the threshold.
    pub fn observe(&mut self, sponsor_id: &str, visible_ratio: f64) -> bool {
        if visible_ratio < self.threshold || self.seen.contains(sponsor_id) {
            return false;
        }
        self.seen.insert(sponsor_id.to_string())
    }

    /// Starts a new page view.
    pub fn reset(&mut self) {
        self.seen.clear();
    }
}

/// Kind of sponsor event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SponsorEventKind {
    /// Banner was seen
    Impression,
    /// Banner was clicked
    Click,
}

impl SponsorEventKind {
    const fn as_str(self) -> &'static str {
        match self {
            Self::Impression => "impression",
            Self::Click => "click",
        }
    }
}

/// Stores one impression or click.
#[instrument(skip(db, sponsor), fields(sponsor = %sponsor.id))]
pub async fn record_event(
    db: &DatabaseConnection,
    sponsor: &Sponsor,
    kind: SponsorEventKind,
    page: Option<&str>,
) -> Result<sponsor_event::Model> {
    sponsor_event::ActiveModel {
        sponsor_id: Set(sponsor.id.clone()),
        sponsor_name: Set(sponsor.name.clone()),
        event_type: Set(kind.as_str().to_string()),
        page: Set(page.map(str::to_string)),
        created_at: Set(chrono::Utc::now()),
        ..Default::default()
    }
    .insert(db)
    .await
    .map_err(Into::into)
}

/// Feeds a visibility report through `tracker` and stores an impression when
/// it counts. Returns whether one was stored.
pub async fn track_visibility(
    db: &DatabaseConnection,
    tracker: &mut ImpressionTracker,
    sponsor: &Sponsor,
    visible_ratio: f64,
    page: Option<&str>,
) -> Result<bool> {
    if !tracker.observe(&sponsor.id, visible_ratio) {
        return Ok(false);
    }
    record_event(db, sponsor, SponsorEventKind::Impression, page).await?;
    Ok(true)
}

/// Aggregated analytics for one sponsor.
#[derive(Debug, Clone, PartialEq)]
pub struct SponsorStats {
    /// CMS id
    pub sponsor_id: String,
    /// Most recent name seen in events
    pub sponsor_name: String,
    /// Number of impressions
    pub impressions: u64,
    /// Number of clicks
    pub clicks: u64,
}

impl SponsorStats {
    /// Click-through rate in percent, 0 without impressions.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn click_through_rate(&self) -> f64 {
        if self.impressions == 0 {
            return 0.0;
        }
        self.clicks as f64 / self.impressions as f64 * 100.0
    }
}

/// Per-sponsor totals over all recorded events, ordered by sponsor id.
pub async fn summarize(db: &DatabaseConnection) -> Result<Vec<SponsorStats>> {
    let events = SponsorEvent::find()
        .order_by_asc(sponsor_event::Column::Id)
        .all(db)
        .await?;

    let mut stats: BTreeMap<String, SponsorStats> = BTreeMap::new();
    for event in events {
        let entry = stats
            .entry(event.sponsor_id.clone())
            .or_insert_with(|| SponsorStats {
                sponsor_id: event.sponsor_id.clone(),
                sponsor_name: event.sponsor_name.clone(),
                impressions: 0,
                clicks: 0,
            });
        entry.sponsor_name = event.sponsor_name;
        match event.event_type.as_str() {
            "impression" => entry.impressions += 1,
            "click" => entry.clicks += 1,
            other => debug!("Ignoring unknown sponsor event type {}", other),
        }
    }
    Ok(stats.into_values().collect())
}
