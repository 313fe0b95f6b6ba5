//! Registry of page blocks the CMS may place on a page.
//!
//! Block names map to constructors that turn the block's options into a typed
//! [`Component`]. The registry is built once at startup; unknown names are
//! logged and skipped when a page is assembled.

use crate::errors::{Error, Result};
use serde_json::{Map, Value};
use std::collections::HashMap;
use tracing::warn;

/// A page block with its typed options.
#[derive(Debug, Clone, PartialEq)]
pub enum Component {
    /// Large heading with optional image
    Hero {
        /// Heading text
        title: String,
        /// Text under the heading
        subtitle: Option<String>,
        /// Background image URL
        image: Option<String>,
    },
    /// Upcoming activities
    ActivityList {
        /// Maximum number shown
        limit: u32,
        /// Only this category, if set
        category: Option<String>,
    },
    /// Latest news items
    NewsList {
        /// Maximum number shown
        limit: u32,
    },
    /// FAQ accordion
    Faq {
        /// Whether several answers may be open at once
        allow_multiple: bool,
    },
    /// Rotating sponsor banner
    SponsorBanner {
        /// Override of the configured rotation interval
        rotation_secs: Option<u64>,
    },
    /// Contact form
    ContactForm {
        /// Heading above the form
        title: Option<String>,
    },
    /// Free text
    RichText {
        /// HTML content
        html: String,
    },
}

/// Builds a component from block options.
pub type ComponentFactory = fn(&Map<String, Value>) -> Result<Component>;

/// Block name → constructor.
#[derive(Debug, Clone, Default)]
pub struct ComponentRegistry {
    factories: HashMap<String, ComponentFactory>,
}

fn opt_string(options: &Map<String, Value>, key: &str) -> Option<String> {
    options.get(key).and_then(Value::as_str).map(str::to_string)
}

fn opt_u64(options: &Map<String, Value>, key: &str) -> Option<u64> {
    options.get(key).and_then(Value::as_u64)
}

fn limit(options: &Map<String, Value>, default: u32) -> u32 {
    opt_u64(options, "limit")
        .and_then(|n| u32::try_from(n).ok())
        .unwrap_or(default)
}

fn hero(options: &Map<String, Value>) -> Result<Component> {
    let title = opt_string(options, "title")
        .ok_or_else(|| Error::validation("Hero.title", "title is required"))?;
    Ok(Component::Hero {
        title,
        subtitle: opt_string(options, "subtitle"),
        image: opt_string(options, "image"),
    })
}

fn activity_list(options: &Map<String, Value>) -> Result<Component> {
    Ok(Component::ActivityList {
        limit: limit(options, 6),
        category: opt_string(options, "category"),
    })
}

fn news_list(options: &Map<String, Value>) -> Result<Component> {
    Ok(Component::NewsList {
        limit: limit(options, 3),
    })
}

fn faq(options: &Map<String, Value>) -> Result<Component> {
    Ok(Component::Faq {
        allow_multiple: options
            .get("allowMultiple")
            .and_then(Value::as_bool)
            .unwrap_or(false),
    })
}

fn sponsor_banner(options: &Map<String, Value>) -> Result<Component> {
    Ok(Component::SponsorBanner {
        rotation_secs: opt_u64(options, "rotationSeconds").filter(|s| *s > 0),
    })
}

fn contact_form(options: &Map<String, Value>) -> Result<Component> {
    Ok(Component::ContactForm {
        title: opt_string(options, "title"),
    })
}

fn rich_text(options: &Map<String, Value>) -> Result<Component> {
    Ok(Component::RichText {
        html: opt_string(options, "text").unwrap_or_default(),
    })
}

impl ComponentRegistry {
    /// Empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with every block the site knows.
    #[must_use]
    pub fn with_site_components() -> Self {
        let mut registry = Self::new();
        registry.register("Hero", hero);
        registry.register("ActivityList", activity_list);
        registry.register("NewsList", news_list);
        registry.register("FAQ", faq);
        registry.register("SponsorBanner", sponsor_banner);
        registry.register("ContactForm", contact_form);
        registry.register("Text", rich_text);
        registry
    }

    /// Adds or replaces the constructor for `name`.
    pub fn register(&mut self, name: &str, factory: ComponentFactory) {
        self.factories.insert(name.to_string(), factory);
    }

    /// Whether `name` is known.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.factories.contains_key(name)
    }

    /// Builds the component `name` from `options`.
    ///
    /// # Errors
    /// [`Error::NotFound`] for unknown names, or the constructor's validation error.
    pub fn build(&self, name: &str, options: &Map<String, Value>) -> Result<Component> {
        let factory = self
            .factories
            .get(name)
            .ok_or_else(|| Error::not_found("component", name))?;
        factory(options)
    }

    /// Builds a page from CMS blocks of the form
    /// `{"component": {"name": "...", "options": {...}}}`. Blocks that are
    /// malformed, unknown or invalid are logged and skipped.
    #[must_use]
    pub fn build_page(&self, blocks: &[Value]) -> Vec<Component> {
        let empty = Map::new();
        blocks
            .iter()
            .filter_map(|block| {
                let component = block.get("component")?;
                let Some(name) = component.get("name").and_then(Value::as_str) else {
                    warn!("Skipping block without component name");
                    return None;
                };
                let options = component
                    .get("options")
                    .and_then(Value::as_object)
                    .unwrap_or(&empty);
                self.build(name, options)
                    .inspect_err(|e| warn!("Skipping block {}: {}", name, e))
                    .ok()
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use serde_json::json;

    #[test]
    fn test_build_known_components() {
        let registry = ComponentRegistry::with_site_components();
        let options = json!({"limit": 4, "category": "sport"});
        let component = registry
            .build("ActivityList", options.as_object().unwrap())
            .unwrap();
        assert_eq!(
            component,
            Component::ActivityList {
                limit: 4,
                category: Some("sport".to_string())
            }
        );
        assert_eq!(
            registry.build("NewsList", &Map::new()).unwrap(),
            Component::NewsList { limit: 3 }
        );
    }

    #[test]
    fn test_unknown_component_is_not_found() {
        let registry = ComponentRegistry::with_site_components();
        assert!(matches!(
            registry.build("Carousel3D", &Map::new()),
            Err(Error::NotFound { .. })
        ));
    }

    #[test]
    fn test_build_page_skips_bad_blocks() {
        let registry = ComponentRegistry::with_site_components();
        let blocks = vec![
            json!({"component": {"name": "Hero", "options": {"title": "Welkom"}}}),
            json!({"component": {"name": "Hero", "options": {}}}),
            json!({"component": {"name": "Unknown"}}),
            json!({"component": {}}),
            json!({"tagName": "div"}),
            json!({"component": {"name": "FAQ", "options": {"allowMultiple": true}}}),
        ];
        let page = registry.build_page(&blocks);
        assert_eq!(page.len(), 2);
        assert!(matches!(page[0], Component::Hero { ref title, .. } if title == "Welkom"));
        assert_eq!(page[1], Component::Faq { allow_multiple: true });
    }

    #[test]
    fn test_register_overrides() {
        let mut registry = ComponentRegistry::new();
        assert!(!registry.contains("Text"));
        registry.register("Text", |_| {
            Ok(Component::RichText {
                html: "vast".to_string(),
            })
        });
        assert_eq!(
            registry.build("Text", &Map::new()).unwrap(),
            Component::RichText {
                html: "vast".to_string()
            }
        );
    }
}
