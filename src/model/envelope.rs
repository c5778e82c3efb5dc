use serde::{Deserialize, Serialize};

use crate::model::work_item::WorkItem;

/// The single top-level JSON object a hook run emits: either a success
/// payload with zero or more items, or an error description with none.
/// `error` is omitted entirely on success, not serialized as `null`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResultEnvelope {
    pub ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub items: Vec<WorkItem>,
}

impl ResultEnvelope {
    pub fn success(items: Vec<WorkItem>) -> Self {
        Self {
            ok: true,
            error: None,
            items,
        }
    }

    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            ok: false,
            error: Some(message.into()),
            items: Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn success_omits_error_field() {
        let json = serde_json::to_string(&ResultEnvelope::success(Vec::new())).unwrap();
        assert_eq!(json, r#"{"ok":true,"items":[]}"#);
    }

    #[test]
    fn failure_carries_message_and_no_items() {
        let json = serde_json::to_string(&ResultEnvelope::failure("connection refused")).unwrap();
        assert_eq!(json, r#"{"ok":false,"error":"connection refused","items":[]}"#);
    }

    #[test]
    fn failure_round_trips() {
        let envelope = ResultEnvelope::failure("boom");
        let json = serde_json::to_string(&envelope).unwrap();
        let parsed: ResultEnvelope = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, envelope);
    }
}
