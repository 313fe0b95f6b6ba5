//! Filter → sort → paginate derivation.

use crate::config::site::TableDefaults;
use chrono::{DateTime, Utc};
use std::cmp::Ordering;
use std::collections::BTreeMap;
use tracing::trace;

/// A sortable / filterable field value.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    /// Compared case-insensitively
    Text(String),
    /// Compared by timestamp
    Date(DateTime<Utc>),
    /// Compared numerically
    Number(f64),
}

impl FieldValue {
    /// Comparator used for sorting. Values of different kinds order
    /// text < date < number, which only happens with inconsistent data.
    #[must_use]
    pub fn compare(&self, other: &Self) -> Ordering {
        match (self, other) {
            (Self::Text(a), Self::Text(b)) => a
                .to_lowercase()
                .cmp(&b.to_lowercase())
                .then_with(|| a.cmp(b)),
            (Self::Date(a), Self::Date(b)) => a.timestamp_millis().cmp(&b.timestamp_millis()),
            (Self::Number(a), Self::Number(b)) => a.total_cmp(b),
            _ => self.rank().cmp(&other.rank()),
        }
    }

    const fn rank(&self) -> u8 {
        match self {
            Self::Text(_) => 0,
            Self::Date(_) => 1,
            Self::Number(_) => 2,
        }
    }

    /// Text form used to match categorical filter values.
    #[must_use]
    pub fn filter_text(&self) -> String {
        match self {
            Self::Text(s) => s.clone(),
            Self::Date(d) => d.to_rfc3339(),
            Self::Number(n) => n.to_string(),
        }
    }
}

/// An entity that can be shown in an admin table.
pub trait TableRow {
    /// Stable identifier of the row.
    fn row_id(&self) -> String;

    /// Fields matched by the free-text search box.
    fn search_fields(&self) -> Vec<&str>;

    /// Value of a filterable or sortable field, `None` if the row lacks it.
    fn field(&self, key: &str) -> Option<FieldValue>;

    /// Value a categorical filter is matched against. Rows whose fields are
    /// parsed from stored text override this to return that text unchanged.
    fn filter_value(&self, key: &str) -> Option<String> {
        self.field(key).map(|field| field.filter_text())
    }
}

/// Sort direction. `None` keeps input order.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SortDirection {
    /// Ascending
    Asc,
    /// Descending
    Desc,
    /// Unsorted
    #[default]
    None,
}

/// Search, filters, sort and page of one admin table.
///
/// Setters apply the page-reset rule: changing the search query, a filter or
/// the page size sends the user back to page 1; changing the sort does not.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableState {
    search: String,
    filters: BTreeMap<String, String>,
    sort_key: Option<String>,
    sort_direction: SortDirection,
    page: usize,
    page_size: usize,
}

impl TableState {
    /// State on page 1 with the given page size (at least 1).
    #[must_use]
    pub fn new(page_size: usize) -> Self {
        Self {
            search: String::new(),
            filters: BTreeMap::new(),
            sort_key: None,
            sort_direction: SortDirection::None,
            page: 1,
            page_size: page_size.max(1),
        }
    }

    /// State using the configured default page size.
    #[must_use]
    pub fn from_defaults(defaults: &TableDefaults) -> Self {
        Self::new(defaults.page_size)
    }

    /// Current search query.
    #[must_use]
    pub fn search(&self) -> &str {
        &self.search
    }

    /// Active categorical filters.
    #[must_use]
    pub const fn filters(&self) -> &BTreeMap<String, String> {
        &self.filters
    }

    /// Current sort key and direction.
    #[must_use]
    pub fn sort(&self) -> (Option<&str>, SortDirection) {
        (self.sort_key.as_deref(), self.sort_direction)
    }

    /// Current 1-based page.
    #[must_use]
    pub const fn page(&self) -> usize {
        self.page
    }

    /// Rows per page.
    #[must_use]
    pub const fn page_size(&self) -> usize {
        self.page_size
    }

    /// Whether a search or any filter narrows the collection.
    #[must_use]
    pub fn has_active_criteria(&self) -> bool {
        !self.search.is_empty() || !self.filters.is_empty()
    }

    /// Sets the search query.
    pub fn set_search(&mut self, query: impl Into<String>) {
        let query = query.into();
        if query != self.search {
            self.search = query;
            self.page = 1;
        }
    }

    /// Selects `value` for filter `name`. An empty value or `"all"` clears it.
    pub fn set_filter(&mut self, name: &str, value: &str) {
        if value.is_empty() || value == "all" {
            self.clear_filter(name);
            return;
        }
        if self.filters.get(name).map(String::as_str) != Some(value) {
            self.filters.insert(name.to_string(), value.to_string());
            self.page = 1;
        }
    }

    /// Removes filter `name`.
    pub fn clear_filter(&mut self, name: &str) {
        if self.filters.remove(name).is_some() {
            self.page = 1;
        }
    }

    /// Changes the page size (at least 1).
    pub fn set_page_size(&mut self, page_size: usize) {
        let page_size = page_size.max(1);
        if page_size != self.page_size {
            self.page_size = page_size;
            self.page = 1;
        }
    }

    /// Moves to `page` (at least 1).
    pub const fn set_page(&mut self, page: usize) {
        self.page = if page == 0 { 1 } else { page };
    }

    /// Sets the sort explicitly. The page is kept.
    pub fn set_sort(&mut self, key: impl Into<String>, direction: SortDirection) {
        if direction == SortDirection::None {
            self.sort_key = None;
        } else {
            self.sort_key = Some(key.into());
        }
        self.sort_direction = direction;
    }

    /// Header click on column `key`: asc → desc → none on the same column,
    /// asc on a different one. The page is kept.
    pub fn toggle_sort(&mut self, key: &str) {
        let next = if self.sort_key.as_deref() == Some(key) {
            match self.sort_direction {
                SortDirection::Asc => SortDirection::Desc,
                SortDirection::Desc | SortDirection::None => SortDirection::None,
            }
        } else {
            SortDirection::Asc
        };
        self.set_sort(key, next);
    }
}

/// Why a page has no rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmptyState {
    /// The collection itself is empty
    NoData,
    /// Rows exist but none match the active search/filters
    NoMatches,
}

impl EmptyState {
    /// Message shown in place of the table body.
    #[must_use]
    pub const fn message(self) -> &'static str {
        match self {
            Self::NoData => "Er zijn nog geen items.",
            Self::NoMatches => "Geen items gevonden die aan de filters voldoen.",
        }
    }
}

/// One derived page of a table.
#[derive(Debug)]
pub struct TablePage<'a, T> {
    /// Rows on this page
    pub items: Vec<&'a T>,
    /// Rows passing search and filters
    pub total_items: usize,
    /// `ceil(total_items / page_size)`, 0 when nothing matches
    pub total_pages: usize,
    /// 1-based page the items belong to
    pub current_page: usize,
    /// Pagination controls are omitted when nothing matches
    pub show_pagination: bool,
    /// Set when `items` is empty because nothing matched
    pub empty_state: Option<EmptyState>,
}

/// Derives the visible page from the full collection.
#[must_use]
pub fn derive_page<'a, T: TableRow>(rows: &'a [T], state: &TableState) -> TablePage<'a, T> {
    let needle = state.search.to_lowercase();
    let mut filtered: Vec<&T> = rows
        .iter()
        .filter(|row| {
            needle.is_empty()
                || row
                    .search_fields()
                    .iter()
                    .any(|field| field.to_lowercase().contains(&needle))
        })
        .filter(|row| {
            state.filters.iter().all(|(name, value)| {
                row.filter_value(name).is_some_and(|field| field == *value)
            })
        })
        .collect();

    if let Some(key) = state.sort_key.as_deref() {
        let descending = match state.sort_direction {
            SortDirection::Asc => Some(false),
            SortDirection::Desc => Some(true),
            SortDirection::None => None,
        };
        if let Some(descending) = descending {
            filtered.sort_by(|a, b| compare_field(a.field(key), b.field(key), descending));
        }
    }

    let total_items = filtered.len();
    let total_pages = total_items.div_ceil(state.page_size);
    let start = (state.page - 1).saturating_mul(state.page_size);
    let items: Vec<&T> = filtered
        .into_iter()
        .skip(start)
        .take(state.page_size)
        .collect();

    let empty_state = (total_items == 0).then(|| {
        if !rows.is_empty() && state.has_active_criteria() {
            EmptyState::NoMatches
        } else {
            EmptyState::NoData
        }
    });

    trace!(
        "Derived table page {}/{} with {} of {} rows",
        state.page,
        total_pages,
        items.len(),
        total_items
    );

    TablePage {
        items,
        total_items,
        total_pages,
        current_page: state.page,
        show_pagination: total_items > 0,
        empty_state,
    }
}

// Rows missing the field sort after rows that have it, in either direction.
fn compare_field(a: Option<FieldValue>, b: Option<FieldValue>, descending: bool) -> Ordering {
    match (a, b) {
        (Some(a), Some(b)) if descending => b.compare(&a),
        (Some(a), Some(b)) => a.compare(&b),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}
