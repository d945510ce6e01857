//! Watch events delivered to the updater.

use serde::{Deserialize, Serialize};

use crate::objects::ClusterObject;

/// A lifecycle notification for one cluster object.
///
/// Delivery is at-least-once and may be reordered across kinds; applying
/// the same event twice is harmless.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "object")]
pub enum WatchEvent {
    Added(ClusterObject),
    Modified(ClusterObject),
    /// Carries the last known state of the deleted object.
    Deleted(ClusterObject),
}

impl WatchEvent {
    pub fn object(&self) -> &ClusterObject {
        match self {
            WatchEvent::Added(o) | WatchEvent::Modified(o) | WatchEvent::Deleted(o) => o,
        }
    }

    pub fn is_delete(&self) -> bool {
        matches!(self, WatchEvent::Deleted(_))
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            WatchEvent::Added(_) => "added",
            WatchEvent::Modified(_) => "modified",
            WatchEvent::Deleted(_) => "deleted",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::objects::NodeObject;

    #[test]
    fn test_event_json_shape() {
        let event = WatchEvent::Deleted(NodeObject::new("node0").into());
        let json = serde_json::to_string(&event).unwrap();
        assert_eq!(
            json,
            r#"{"type":"Deleted","object":{"kind":"Node","object":{"name":"node0","attachments":[]}}}"#
        );

        let back: WatchEvent = serde_json::from_str(&json).unwrap();
        assert!(back.is_delete());
        assert_eq!(back.type_name(), "deleted");
    }
}
