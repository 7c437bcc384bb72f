use tonewiki_types::{HistoryEntry, Username};

use crate::backend::Backend;
use crate::error::{WikiError, WikiResult};

impl Backend {
    /// Append `action` to a user's history, stamped with the current time.
    pub fn append_history(&self, username: &str, action: &str) -> WikiResult<()> {
        let action = action.trim();
        if action.is_empty() {
            return Err(WikiError::InvalidInput("history action must not be empty".into()));
        }
        let key = Username::new(username)?.key();
        self.user_locks.with(&key, || {
            let mut record = self
                .load_user(&key)?
                .ok_or_else(|| WikiError::NotFound(format!("user {key}")))?;
            record
                .history
                .push(HistoryEntry::new(action, self.clock.now()));
            self.save_user(&key, &record)?;
            tracing::debug!(user = %key, action, "history appended");
            Ok(())
        })
    }

    /// A user's history, oldest first.
    pub fn history(&self, username: &str) -> WikiResult<Vec<HistoryEntry>> {
        let key = Username::new(username)?.key();
        self.load_user(&key)?
            .map(|record| record.history)
            .ok_or_else(|| WikiError::NotFound(format!("user {key}")))
    }
}
