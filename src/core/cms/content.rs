//! Content entries as returned by the CMS, and the query builder for fetching them.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Body of a content API response.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ContentResponse {
    /// Matching entries
    #[serde(default)]
    pub results: Vec<ContentEntry>,
}

/// One CMS entry of some content model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContentEntry {
    /// CMS identifier
    pub id: String,
    /// Entry name as shown in the CMS
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Publication state (`"published"`, `"draft"`, ...)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub published: Option<String>,
    /// Model fields
    #[serde(default)]
    pub data: Map<String, Value>,
}

impl ContentEntry {
    /// Entry with the given id and fields.
    #[must_use]
    pub fn new(id: impl Into<String>, data: Map<String, Value>) -> Self {
        Self {
            id: id.into(),
            name: None,
            published: None,
            data,
        }
    }

    /// String field from `data`.
    #[must_use]
    pub fn text(&self, field: &str) -> Option<&str> {
        self.data.get(field).and_then(Value::as_str)
    }

    /// Numeric field from `data`.
    #[must_use]
    pub fn number(&self, field: &str) -> Option<f64> {
        self.data.get(field).and_then(Value::as_f64)
    }

    /// Date field from `data`: an RFC 3339 string, a `YYYY-MM-DD` date or
    /// epoch milliseconds.
    #[must_use]
    pub fn date(&self, field: &str) -> Option<DateTime<Utc>> {
        match self.data.get(field)? {
            Value::String(s) => DateTime::parse_from_rfc3339(s)
                .map(|d| d.with_timezone(&Utc))
                .ok()
                .or_else(|| {
                    chrono::NaiveDate::parse_from_str(s, "%Y-%m-%d")
                        .ok()
                        .and_then(|d| d.and_hms_opt(0, 0, 0))
                        .map(|d| d.and_utc())
                }),
            Value::Number(n) => n.as_i64().and_then(DateTime::from_timestamp_millis),
            _ => None,
        }
    }

    /// Title to show in tables: `data.title`, else the entry name, else the id.
    #[must_use]
    pub fn display_title(&self) -> &str {
        self.text("title")
            .or(self.name.as_deref())
            .unwrap_or(&self.id)
    }
}

/// Sort order for a content query.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
    /// Oldest / smallest first
    Ascending,
    /// Newest / largest first
    Descending,
}

/// Query parameters for the content API.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContentQuery {
    limit: Option<u32>,
    sort: Option<(String, SortOrder)>,
    filters: Vec<(String, String)>,
}

impl ContentQuery {
    /// Query with no limit, sort or filters.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Caps the number of results.
    #[must_use]
    pub const fn limit(mut self, limit: u32) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Sorts by `data.<field>`.
    #[must_use]
    pub fn sort(mut self, field: impl Into<String>, order: SortOrder) -> Self {
        self.sort = Some((field.into(), order));
        self
    }

    /// Keeps entries whose `data.<field>` equals `value`.
    #[must_use]
    pub fn filter(mut self, field: impl Into<String>, value: impl Into<String>) -> Self {
        self.filters.push((field.into(), value.into()));
        self
    }

    /// Query-string pairs, API key first.
    #[must_use]
    pub fn to_params(&self, api_key: &str) -> Vec<(String, String)> {
        let mut params = vec![("apiKey".to_string(), api_key.to_string())];
        if let Some(limit) = self.limit {
            params.push(("limit".to_string(), limit.to_string()));
        }
        if let Some((field, order)) = &self.sort {
            let direction = match order {
                SortOrder::Ascending => "1",
                SortOrder::Descending => "-1",
            };
            params.push((format!("sort.data.{field}"), direction.to_string()));
        }
        for (field, value) in &self.filters {
            params.push((format!("query.data.{field}"), value.clone()));
        }
        params
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use serde_json::json;

    #[test]
    fn test_query_params() {
        let params = ContentQuery::new()
            .limit(50)
            .sort("date", SortOrder::Descending)
            .filter("category", "sport")
            .to_params("abc");
        let expected: Vec<(String, String)> = [
            ("apiKey", "abc"),
            ("limit", "50"),
            ("sort.data.date", "-1"),
            ("query.data.category", "sport"),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
        assert_eq!(params, expected);
    }

    #[test]
    fn test_parse_response_with_missing_fields() {
        let response: ContentResponse = serde_json::from_value(json!({
            "results": [
                {
                    "id": "a1",
                    "name": "Kerstmarkt",
                    "data": {"title": "Kerstmarkt", "date": "2024-12-20"}
                },
                {"id": "a2"}
            ]
        }))
        .unwrap();
        assert_eq!(response.results.len(), 2);
        assert_eq!(response.results[0].text("title"), Some("Kerstmarkt"));
        assert!(response.results[1].data.is_empty());
        assert_eq!(response.results[1].display_title(), "a2");
    }

    #[test]
    fn test_date_field_formats() {
        let entry = ContentEntry::new(
            "x",
            json!({
                "iso": "2024-03-01T10:00:00Z",
                "day": "2024-03-01",
                "millis": 1_709_287_200_000_i64,
                "bad": "next week"
            })
            .as_object()
            .cloned()
            .unwrap(),
        );
        assert_eq!(entry.date("iso"), entry.date("millis"));
        assert!(entry.date("day").unwrap() < entry.date("iso").unwrap());
        assert!(entry.date("bad").is_none());
        assert!(entry.date("missing").is_none());
    }
}
