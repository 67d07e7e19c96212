use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A checklist item as the hub sends it over the wire.
///
/// Older hubs omit `counter` entirely and send `null` for `last_updated`
/// on items that were never checked off, so both fields default.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WireItem {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub complete: bool,
    #[serde(default)]
    pub counter: u32,
    #[serde(default)]
    pub last_updated: Option<DateTime<Utc>>,
}

/// A list descriptor from the hub's listing endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WireList {
    pub id: String,
    pub name: String,
}

/// Per-list settings the hub attaches to an items response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WireSettings {
    pub rare_days: i64,
}

/// Full items response: the snapshot plus optional list settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WireListResponse {
    pub items: Vec<WireItem>,
    #[serde(default)]
    pub settings: Option<WireSettings>,
}

/// Partial update payload. Only the fields actually being changed are
/// serialized so the hub applies field-level last-writer-wins.
#[derive(Debug, Clone, Default, Serialize)]
pub struct WireItemPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub complete: Option<bool>,
}

/// One change event from the hub. `list_id` is absent for hub-wide
/// events that every subscriber should treat as "refresh".
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WireEvent {
    #[serde(default)]
    pub list_id: Option<String>,
}

/// A batch of events from the long-poll endpoint, with the cursor to
/// resume from on the next poll.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WireEventBatch {
    pub cursor: u64,
    #[serde(default)]
    pub events: Vec<WireEvent>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_item_defaults_for_missing_counter_and_timestamp() {
        let item: WireItem =
            serde_json::from_str(r#"{"id":"a1","name":"Milk","complete":false}"#).unwrap();
        assert_eq!(item.counter, 0);
        assert!(item.last_updated.is_none());
    }

    #[test]
    fn test_item_parses_null_last_updated() {
        let item: WireItem = serde_json::from_str(
            r#"{"id":"a1","name":"Milk","complete":true,"counter":3,"last_updated":null}"#,
        )
        .unwrap();
        assert_eq!(item.counter, 3);
        assert!(item.last_updated.is_none());
    }

    #[test]
    fn test_list_response_settings_are_optional() {
        let resp: WireListResponse = serde_json::from_str(r#"{"items":[]}"#).unwrap();
        assert!(resp.settings.is_none());

        let resp: WireListResponse =
            serde_json::from_str(r#"{"items":[],"settings":{"rare_days":90}}"#).unwrap();
        assert_eq!(resp.settings.unwrap().rare_days, 90);
    }

    #[test]
    fn test_patch_skips_unset_fields() {
        let patch = WireItemPatch {
            name: None,
            complete: Some(true),
        };
        let json = serde_json::to_string(&patch).unwrap();
        assert_eq!(json, r#"{"complete":true}"#);
    }

    #[test]
    fn test_event_batch_tolerates_bare_events() {
        let batch: WireEventBatch =
            serde_json::from_str(r#"{"cursor":7,"events":[{},{"list_id":"l1"}]}"#).unwrap();
        assert_eq!(batch.cursor, 7);
        assert!(batch.events[0].list_id.is_none());
        assert_eq!(batch.events[1].list_id.as_deref(), Some("l1"));
    }
}
