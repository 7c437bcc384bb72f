use serde::{Deserialize, Serialize};

use crate::temporal::Timestamp;

/// One entry of a user's append-only navigation history.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryEntry {
    /// What the user did, e.g. `"Logged In"` or the name of a page visited.
    pub action: String,
    pub at: Timestamp,
}

impl HistoryEntry {
    pub fn new(action: impl Into<String>, at: Timestamp) -> Self {
        Self {
            action: action.into(),
            at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serializes_as_object() {
        let at = Timestamp::from_unix_micros(0).unwrap();
        let entry = HistoryEntry::new("Chord", at);
        let json = serde_json::to_string(&entry).unwrap();
        assert_eq!(json, r#"{"action":"Chord","at":"1970-01-01T00:00:00Z"}"#);
        let parsed: HistoryEntry = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, entry);
    }
}
