use super::pipeline::{FieldValue, TableRow};
use crate::{
    core::{cms::ContentEntry, sponsors::SponsorStats},
    entities::{audit_log, user},
};
use serde_json::Value;

// CMS entries (activities, news, pages). `status` is the publication state,
// anything else is looked up in `data` by name.
impl TableRow for ContentEntry {
    fn row_id(&self) -> String {
        self.id.clone()
    }

    fn search_fields(&self) -> Vec<&str> {
        let mut fields = vec![self.display_title()];
        fields.extend(self.name.as_deref());
        fields.extend(
            ["description", "category", "location", "slug"]
                .into_iter()
                .filter_map(|key| self.text(key)),
        );
        fields
    }

    fn field(&self, key: &str) -> Option<FieldValue> {
        match key {
            "title" => Some(FieldValue::Text(self.display_title().to_string())),
            "status" => self.published.clone().map(FieldValue::Text),
            _ => match self.data.get(key)? {
                Value::Number(n) => n.as_f64().map(FieldValue::Number),
                Value::String(s) => Some(
                    self.date(key)
                        .map_or_else(|| FieldValue::Text(s.clone()), FieldValue::Date),
                ),
                Value::Bool(b) => Some(FieldValue::Text(b.to_string())),
                _ => None,
            },
        }
    }

    // Stored strings are matched as written, even when they sort as dates.
    fn filter_value(&self, key: &str) -> Option<String> {
        match self.data.get(key) {
            Some(Value::String(s)) if key != "title" => Some(s.clone()),
            _ => self.field(key).map(|field| field.filter_text()),
        }
    }
}

impl TableRow for user::Model {
    fn row_id(&self) -> String {
        self.id.to_string()
    }

    fn search_fields(&self) -> Vec<&str> {
        vec![self.name.as_str(), self.email.as_str()]
    }

    fn field(&self, key: &str) -> Option<FieldValue> {
        match key {
            "name" => Some(FieldValue::Text(self.name.clone())),
            "email" => Some(FieldValue::Text(self.email.clone())),
            "role" => Some(FieldValue::Text(self.role.clone())),
            "created_at" => Some(FieldValue::Date(self.created_at)),
            _ => None,
        }
    }
}

impl TableRow for audit_log::Model {
    fn row_id(&self) -> String {
        self.id.to_string()
    }

    fn search_fields(&self) -> Vec<&str> {
        let mut fields = vec![
            self.actor.as_str(),
            self.entity_type.as_str(),
            self.entity_id.as_str(),
        ];
        fields.extend(self.details.as_deref());
        fields
    }

    fn field(&self, key: &str) -> Option<FieldValue> {
        match key {
            "actor" => Some(FieldValue::Text(self.actor.clone())),
            "action" => Some(FieldValue::Text(self.action.clone())),
            "entity_type" => Some(FieldValue::Text(self.entity_type.clone())),
            "entity_id" => Some(FieldValue::Text(self.entity_id.clone())),
            "created_at" => Some(FieldValue::Date(self.created_at)),
            _ => None,
        }
    }
}

#[allow(clippy::cast_precision_loss)]
impl TableRow for SponsorStats {
    fn row_id(&self) -> String {
        self.sponsor_id.clone()
    }

    fn search_fields(&self) -> Vec<&str> {
        vec![self.sponsor_name.as_str()]
    }

    fn field(&self, key: &str) -> Option<FieldValue> {
        match key {
            "name" => Some(FieldValue::Text(self.sponsor_name.clone())),
            "impressions" => Some(FieldValue::Number(self.impressions as f64)),
            "clicks" => Some(FieldValue::Number(self.clicks as f64)),
            "ctr" => Some(FieldValue::Number(self.click_through_rate())),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use crate::core::table::{EmptyState, SortDirection, TableState, derive_page};
    use chrono::{TimeZone, Utc};
    use serde_json::json;

    fn activity(id: &str, data: Value, published: &str) -> ContentEntry {
        let mut entry = ContentEntry::new(id, data.as_object().cloned().unwrap());
        entry.published = Some(published.to_string());
        entry
    }

    fn activities() -> Vec<ContentEntry> {
        vec![
            activity(
                "a1",
                json!({"title": "Kerstmarkt", "category": "feest", "date": "2024-12-20"}),
                "published",
            ),
            activity(
                "a2",
                json!({"title": "Sportdag", "category": "sport", "date": "2024-06-12"}),
                "draft",
            ),
            activity(
                "a3",
                json!({"title": "avondvierdaagse", "category": "sport", "date": "2024-05-27",
                       "description": "Vier avonden wandelen"}),
                "published",
            ),
        ]
    }

    fn ids<T: TableRow>(items: &[&T]) -> Vec<String> {
        items.iter().map(|row| row.row_id()).collect()
    }

    #[test]
    fn test_activities_filter_and_date_sort() {
        let rows = activities();
        let mut state = TableState::new(10);
        state.set_filter("category", "sport");
        state.set_sort("date", SortDirection::Asc);

        let page = derive_page(&rows, &state);
        assert_eq!(ids(&page.items), vec!["a3", "a2"]);
    }

    #[test]
    fn test_activities_status_filter_and_search_in_description() {
        let rows = activities();
        let mut state = TableState::new(10);
        state.set_filter("status", "published");
        state.set_search("wandelen");

        let page = derive_page(&rows, &state);
        assert_eq!(ids(&page.items), vec!["a3"]);
    }

    #[test]
    fn test_filter_matches_date_shaped_text_as_stored() {
        let rows = vec![
            activity("c1", json!({"code": "2024-01-01"}), "published"),
            activity("c2", json!({"code": "2024-01-02"}), "published"),
        ];
        let mut state = TableState::new(10);
        state.set_filter("code", "2024-01-01");

        let page = derive_page(&rows, &state);
        assert_eq!(page.total_items, 1);
        assert_eq!(ids(&page.items), vec!["c1"]);
    }

    #[test]
    fn test_rows_without_sort_field_go_last_in_both_directions() {
        let mut rows = activities();
        rows.push(activity("a4", json!({"title": "Zonder datum"}), "draft"));
        let mut state = TableState::new(10);

        state.set_sort("date", SortDirection::Asc);
        assert_eq!(ids(&derive_page(&rows, &state).items), vec!["a3", "a2", "a1", "a4"]);

        state.set_sort("date", SortDirection::Desc);
        assert_eq!(ids(&derive_page(&rows, &state).items), vec!["a1", "a2", "a3", "a4"]);
    }

    #[test]
    fn test_title_sort_is_case_insensitive() {
        let rows = activities();
        let mut state = TableState::new(10);
        state.set_sort("title", SortDirection::Asc);
        let page = derive_page(&rows, &state);
        assert_eq!(ids(&page.items), vec!["a3", "a1", "a2"]);
    }

    #[test]
    fn test_users_by_role_and_name() {
        let created_at = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let make_user = |id: i64, name: &str, role: &str| user::Model {
            id,
            email: format!("{}@school.nl", name.to_lowercase()),
            name: name.to_string(),
            role: role.to_string(),
            created_at,
        };
        let rows = vec![
            make_user(1, "Sanne", "editor"),
            make_user(2, "Ahmed", "admin"),
            make_user(3, "Bram", "editor"),
        ];
        let mut state = TableState::new(10);
        state.set_filter("role", "editor");
        state.toggle_sort("name");

        let page = derive_page(&rows, &state);
        assert_eq!(ids(&page.items), vec!["3", "1"]);

        state.set_search("nobody");
        let page = derive_page(&rows, &state);
        assert_eq!(page.empty_state, Some(EmptyState::NoMatches));
    }

    #[test]
    fn test_audit_entries_search_details() {
        let created_at = Utc.with_ymd_and_hms(2024, 2, 1, 9, 0, 0).unwrap();
        let rows = vec![
            audit_log::Model {
                id: 1,
                actor: "bestuur@school.nl".to_string(),
                action: "update".to_string(),
                entity_type: "user".to_string(),
                entity_id: "4".to_string(),
                details: Some("role editor -> admin".to_string()),
                created_at,
            },
            audit_log::Model {
                id: 2,
                actor: "bestuur@school.nl".to_string(),
                action: "export".to_string(),
                entity_type: "content".to_string(),
                entity_id: "faq".to_string(),
                details: None,
                created_at,
            },
        ];
        let mut state = TableState::new(10);
        state.set_search("ADMIN");
        let page = derive_page(&rows, &state);
        assert_eq!(ids(&page.items), vec!["1"]);

        state.set_search("");
        state.set_filter("action", "export");
        let page = derive_page(&rows, &state);
        assert_eq!(ids(&page.items), vec!["2"]);
    }

    #[test]
    fn test_sponsor_stats_sorted_by_click_through_rate() {
        let stat = |id: &str, impressions, clicks| SponsorStats {
            sponsor_id: id.to_string(),
            sponsor_name: format!("Sponsor {id}"),
            impressions,
            clicks,
        };
        let rows = vec![stat("a", 100, 5), stat("b", 10, 4), stat("c", 0, 0)];
        let mut state = TableState::new(10);
        state.set_sort("ctr", SortDirection::Desc);
        let page = derive_page(&rows, &state);
        assert_eq!(ids(&page.items), vec!["b", "a", "c"]);
    }
}
