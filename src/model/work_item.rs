use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// A normalized, provider-agnostic representation of one open issue, as
/// consumed by the work-items dashboard.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkItem {
    /// `"redmine:" + <issue id>`; unique within one run's output.
    pub id: String,
    pub title: String,
    /// Empty when the source issue has no description.
    pub description: String,
    /// Deep link to the issue on the (host-rewritten) server.
    pub url: String,
    /// Always `"task"`; no other kinds are produced.
    pub kind: String,
    pub attributes: WorkItemAttributes,
}

/// Secondary metadata attached to every work item. The shape is fixed:
/// absent values serialize as explicit `null`s, never as missing keys.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkItemAttributes {
    pub provider: String,
    pub project: Option<String>,
    pub status: Option<String>,
    pub assignee: Option<String>,
    pub priority: Option<String>,
    pub tracker: Option<String>,
    pub due_date: Option<NaiveDate>,
    pub updated_at: Option<DateTime<Utc>>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn item() -> WorkItem {
        WorkItem {
            id: "redmine:42".into(),
            title: "Fix the login bug".into(),
            description: String::new(),
            url: "http://localhost:3000/issues/42".into(),
            kind: "task".into(),
            attributes: WorkItemAttributes {
                provider: "redmine".into(),
                project: Some("Website".into()),
                status: Some("New".into()),
                assignee: None,
                priority: None,
                tracker: None,
                due_date: Some(NaiveDate::from_ymd_opt(2024, 5, 1).unwrap()),
                updated_at: Some(Utc.with_ymd_and_hms(2024, 4, 2, 8, 30, 0).unwrap()),
            },
        }
    }

    #[test]
    fn attributes_use_camel_case_keys() {
        let json = serde_json::to_string(&item()).unwrap();
        assert!(json.contains("\"dueDate\":\"2024-05-01\""));
        assert!(json.contains("\"updatedAt\":\"2024-04-02T08:30:00Z\""));
        assert!(!json.contains("due_date"));
        assert!(!json.contains("updated_at"));
    }

    #[test]
    fn absent_attributes_serialize_as_null() {
        let json = serde_json::to_string(&item()).unwrap();
        assert!(json.contains("\"assignee\":null"));
        assert!(json.contains("\"priority\":null"));
        assert!(json.contains("\"tracker\":null"));
    }

    #[test]
    fn serialization_round_trips() {
        let original = item();
        let json = serde_json::to_string(&original).unwrap();
        let parsed: WorkItem = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, original);
    }
}
