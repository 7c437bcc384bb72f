use tonewiki_types::HistoryEntry;

use crate::error::{WikiError, WikiResult};

/// A user record as stored in the users bucket.
///
/// Wire format, three newline-separated fields:
///
/// ```text
/// <display-name>
/// <bcrypt-hash>
/// <history as a one-line JSON array of {"action","at"} objects>
/// ```
///
/// An empty or missing third line is an empty history.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UserRecord {
    pub display_name: String,
    pub password_hash: String,
    pub history: Vec<HistoryEntry>,
}

impl UserRecord {
    pub fn parse(key: &str, text: &str) -> WikiResult<Self> {
        let corrupt = |reason: String| WikiError::CorruptRecord {
            key: key.to_string(),
            reason,
        };

        let mut fields = text.splitn(3, '\n');
        let display_name = fields.next().unwrap_or_default();
        let password_hash = fields
            .next()
            .ok_or_else(|| corrupt("missing password hash".into()))?;
        if password_hash.is_empty() {
            return Err(corrupt("empty password hash".into()));
        }
        let history = match fields.next().map(str::trim) {
            None | Some("") => Vec::new(),
            Some(json) => serde_json::from_str(json)
                .map_err(|e| corrupt(format!("history: {e}")))?,
        };

        Ok(Self {
            display_name: display_name.to_string(),
            password_hash: password_hash.to_string(),
            history,
        })
    }

    pub fn encode(&self) -> WikiResult<String> {
        let history = serde_json::to_string(&self.history)
            .map_err(|e| WikiError::Internal(format!("history encoding: {e}")))?;
        Ok(format!(
            "{}\n{}\n{}",
            self.display_name, self.password_hash, history
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tonewiki_types::Timestamp;

    fn entry(action: &str, micros: i64) -> HistoryEntry {
        HistoryEntry::new(action, Timestamp::from_unix_micros(micros).unwrap())
    }

    #[test]
    fn encode_layout() {
        let record = UserRecord {
            display_name: "Everett-Alan".into(),
            password_hash: "$2b$04$abc".into(),
            history: vec![entry("Signed Up", 0)],
        };
        assert_eq!(
            record.encode().unwrap(),
            "Everett-Alan\n$2b$04$abc\n[{\"action\":\"Signed Up\",\"at\":\"1970-01-01T00:00:00Z\"}]"
        );
    }

    #[test]
    fn parse_inverts_encode() {
        let record = UserRecord {
            display_name: "Sandy".into(),
            password_hash: "$2b$04$xyz".into(),
            history: vec![entry("Logged In", 5), entry("Chord, \"voicings\"", 9)],
        };
        let parsed = UserRecord::parse("sandy", &record.encode().unwrap()).unwrap();
        assert_eq!(parsed, record);
    }

    #[test]
    fn missing_history_is_empty() {
        let parsed = UserRecord::parse("sandy", "Sandy\n$2b$04$xyz").unwrap();
        assert!(parsed.history.is_empty());
        let parsed = UserRecord::parse("sandy", "Sandy\n$2b$04$xyz\n").unwrap();
        assert!(parsed.history.is_empty());
    }

    #[test]
    fn corrupt_records_are_reported() {
        assert!(matches!(
            UserRecord::parse("sandy", "only-a-name"),
            Err(WikiError::CorruptRecord { .. })
        ));
        assert!(matches!(
            UserRecord::parse("sandy", "Sandy\n$2b$04$xyz\n['Home', '1.0']"),
            Err(WikiError::CorruptRecord { .. })
        ));
    }
}
