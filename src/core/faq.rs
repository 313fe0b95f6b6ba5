//! FAQ accordion state with keyboard navigation.
//!
//! Focus moves between question headers with the arrow keys (wrapping),
//! Home and End; Enter and Space toggle the focused question.

use crate::core::cms::ContentEntry;
use std::collections::BTreeSet;

/// One question and answer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FaqItem {
    /// CMS id
    pub id: String,
    /// Question text
    pub question: String,
    /// Answer text or HTML
    pub answer: String,
}

impl FaqItem {
    /// Reads `data.question` and `data.answer`; entries missing either are skipped.
    #[must_use]
    pub fn from_entry(entry: &ContentEntry) -> Option<Self> {
        Some(Self {
            id: entry.id.clone(),
            question: entry.text("question")?.to_string(),
            answer: entry.text("answer")?.to_string(),
        })
    }
}

/// Keys the accordion reacts to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    /// Focus the next header
    ArrowDown,
    /// Focus the previous header
    ArrowUp,
    /// Focus the first header
    Home,
    /// Focus the last header
    End,
    /// Toggle the focused item
    Enter,
    /// Toggle the focused item
    Space,
}

/// Accordion over a list of FAQ items.
#[derive(Debug, Clone)]
pub struct FaqAccordion {
    items: Vec<FaqItem>,
    open: BTreeSet<usize>,
    focus: Option<usize>,
    allow_multiple: bool,
}

impl FaqAccordion {
    /// All items closed, nothing focused.
    #[must_use]
    pub const fn new(items: Vec<FaqItem>, allow_multiple: bool) -> Self {
        Self {
            items,
            open: BTreeSet::new(),
            focus: None,
            allow_multiple,
        }
    }

    /// Items in display order.
    #[must_use]
    pub fn items(&self) -> &[FaqItem] {
        &self.items
    }

    /// Whether item `index` is expanded.
    #[must_use]
    pub fn is_open(&self, index: usize) -> bool {
        self.open.contains(&index)
    }

    /// Focused header, if any.
    #[must_use]
    pub const fn focused(&self) -> Option<usize> {
        self.focus
    }

    /// `id` of the header button of item `index`.
    #[must_use]
    pub fn header_id(&self, index: usize) -> Option<String> {
        self.items.get(index).map(|item| format!("faq-header-{}", item.id))
    }

    /// `id` of the answer panel of item `index`.
    #[must_use]
    pub fn panel_id(&self, index: usize) -> Option<String> {
        self.items.get(index).map(|item| format!("faq-panel-{}", item.id))
    }

    /// Expands or collapses item `index` and focuses it. In single mode,
    /// opening one item closes the others.
    pub fn toggle(&mut self, index: usize) {
        if index >= self.items.len() {
            return;
        }
        self.focus = Some(index);
        if self.open.remove(&index) {
            return;
        }
        if !self.allow_multiple {
            self.open.clear();
        }
        self.open.insert(index);
    }

    /// Focuses header `index` (clicking or tabbing onto it).
    pub fn focus(&mut self, index: usize) {
        if index < self.items.len() {
            self.focus = Some(index);
        }
    }

    /// Handles a key press on a focused header. Returns whether the key was
    /// consumed (so the caller can prevent default scrolling).
    pub fn handle_key(&mut self, key: Key) -> bool {
        let count = self.items.len();
        if count == 0 {
            return false;
        }
        let current = self.focus.unwrap_or(0);
        match key {
            Key::ArrowDown => self.focus = Some((current + 1) % count),
            Key::ArrowUp => self.focus = Some((current + count - 1) % count),
            Key::Home => self.focus = Some(0),
            Key::End => self.focus = Some(count - 1),
            Key::Enter | Key::Space => match self.focus {
                Some(index) => self.toggle(index),
                None => return false,
            },
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn accordion(count: usize, allow_multiple: bool) -> FaqAccordion {
        let items = (0..count)
            .map(|i| FaqItem {
                id: format!("q{i}"),
                question: format!("Vraag {i}"),
                answer: format!("Antwoord {i}"),
            })
            .collect();
        FaqAccordion::new(items, allow_multiple)
    }

    #[test]
    fn test_single_mode_closes_others() {
        let mut faq = accordion(3, false);
        faq.toggle(0);
        faq.toggle(2);
        assert!(!faq.is_open(0));
        assert!(faq.is_open(2));
        faq.toggle(2);
        assert!(!faq.is_open(2));
    }

    #[test]
    fn test_multiple_mode_keeps_others_open() {
        let mut faq = accordion(3, true);
        faq.toggle(0);
        faq.toggle(1);
        assert!(faq.is_open(0) && faq.is_open(1));
    }

    #[test]
    fn test_arrow_navigation_wraps() {
        let mut faq = accordion(3, false);
        faq.focus(2);
        assert!(faq.handle_key(Key::ArrowDown));
        assert_eq!(faq.focused(), Some(0));
        assert!(faq.handle_key(Key::ArrowUp));
        assert_eq!(faq.focused(), Some(2));
        faq.handle_key(Key::Home);
        assert_eq!(faq.focused(), Some(0));
        faq.handle_key(Key::End);
        assert_eq!(faq.focused(), Some(2));
    }

    #[test]
    fn test_enter_and_space_toggle_focused() {
        let mut faq = accordion(2, false);
        assert!(!faq.handle_key(Key::Enter));
        faq.focus(1);
        assert!(faq.handle_key(Key::Enter));
        assert!(faq.is_open(1));
        assert!(faq.handle_key(Key::Space));
        assert!(!faq.is_open(1));
    }

    #[test]
    fn test_empty_accordion_ignores_keys() {
        let mut faq = accordion(0, false);
        assert!(!faq.handle_key(Key::ArrowDown));
        faq.toggle(0);
        assert_eq!(faq.focused(), None);
    }

    #[test]
    fn test_aria_ids() {
        let faq = accordion(1, false);
        assert_eq!(faq.header_id(0).as_deref(), Some("faq-header-q0"));
        assert_eq!(faq.panel_id(0).as_deref(), Some("faq-panel-q0"));
        assert!(faq.panel_id(1).is_none());
    }
}
