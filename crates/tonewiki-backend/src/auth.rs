use tonewiki_types::{HistoryEntry, Username};

use crate::backend::Backend;
use crate::error::{WikiError, WikiResult};
use crate::record::UserRecord;

/// History action recorded when an account is created.
pub const SIGNED_UP: &str = "Signed Up";
/// History action recorded on every successful sign-in.
pub const LOGGED_IN: &str = "Logged In";

fn validate_display_name(name: &str) -> WikiResult<()> {
    if name.trim().is_empty() {
        return Err(WikiError::InvalidInput("name must not be empty".into()));
    }
    if name.contains(['\n', '\r']) {
        return Err(WikiError::InvalidInput("name must be a single line".into()));
    }
    Ok(())
}

impl Backend {
    /// Create an account and return its display name.
    ///
    /// Fails with [`WikiError::AlreadyExists`] when the (case-insensitive)
    /// username is taken; the existing record is left untouched.
    pub fn sign_up(&self, name: &str, username: &str, password: &str) -> WikiResult<String> {
        validate_display_name(name)?;
        let username = Username::new(username)?;
        if password.is_empty() {
            return Err(WikiError::InvalidInput("password must not be empty".into()));
        }

        let key = username.key();
        self.user_locks.with(&key, || {
            if self.store.exists(&self.config.buckets.users, &key)? {
                return Err(WikiError::AlreadyExists(format!("user {username}")));
            }

            let record = UserRecord {
                display_name: name.to_string(),
                password_hash: self.hasher.hash(&key, password)?,
                history: vec![HistoryEntry::new(SIGNED_UP, self.clock.now())],
            };
            self.store
                .write(&self.config.buckets.users, &key, record.encode()?.as_bytes())?;
            tracing::info!(user = %key, "account created");
            Ok(record.display_name)
        })
    }

    /// Check credentials and return the display name.
    ///
    /// Unknown users and wrong passwords both yield [`WikiError::AuthFailed`].
    pub fn sign_in(&self, username: &str, password: &str) -> WikiResult<String> {
        let Ok(username) = Username::new(username) else {
            return Err(WikiError::AuthFailed);
        };
        let key = username.key();
        self.user_locks.with(&key, || {
            let Some(mut record) = self.load_user(&key)? else {
                tracing::debug!(user = %key, "sign-in for unknown user");
                return Err(WikiError::AuthFailed);
            };
            if !self.hasher.verify(&key, password, &record.password_hash)? {
                tracing::info!(user = %key, "sign-in rejected");
                return Err(WikiError::AuthFailed);
            }

            record
                .history
                .push(HistoryEntry::new(LOGGED_IN, self.clock.now()));
            self.save_user(&key, &record)?;
            tracing::info!(user = %key, "signed in");
            Ok(record.display_name)
        })
    }

    pub(crate) fn load_user(&self, key: &str) -> WikiResult<Option<UserRecord>> {
        self.store
            .read_string(&self.config.buckets.users, key)?
            .map(|text| UserRecord::parse(key, &text))
            .transpose()
    }

    pub(crate) fn save_user(&self, key: &str, record: &UserRecord) -> WikiResult<()> {
        self.store
            .write(&self.config.buckets.users, key, record.encode()?.as_bytes())?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::testing::harness;
    use tonewiki_store::BlobStore;

    const NAME: &str = "Everett-Alan";
    const USER: &str = "tim3line";
    const PASS: &str = "su4wirf-";

    #[test]
    fn sign_up_then_sign_in() {
        let h = harness();
        assert_eq!(h.backend.sign_up(NAME, USER, PASS).unwrap(), NAME);
        assert_eq!(h.backend.sign_in(USER, PASS).unwrap(), NAME);
    }

    #[test]
    fn usernames_are_case_insensitive() {
        let h = harness();
        h.backend.sign_up(NAME, "Tim3Line", PASS).unwrap();
        assert!(h.store.exists("users", "tim3line").unwrap());
        assert_eq!(h.backend.sign_in("TIM3LINE", PASS).unwrap(), NAME);
    }

    #[test]
    fn duplicate_sign_up_leaves_record_untouched() {
        let h = harness();
        h.backend.sign_up(NAME, USER, PASS).unwrap();
        let before = h.store.read("users", USER).unwrap();

        let err = h.backend.sign_up("Someone Else", USER, "other").unwrap_err();
        assert!(matches!(err, WikiError::AlreadyExists(_)));
        assert_eq!(h.store.read("users", USER).unwrap(), before);
        assert_eq!(h.backend.sign_in(USER, PASS).unwrap(), NAME);
    }

    #[test]
    fn wrong_password_and_unknown_user_fail_alike() {
        let h = harness();
        h.backend.sign_up(NAME, USER, PASS).unwrap();
        assert!(matches!(
            h.backend.sign_in(USER, "invalid_password"),
            Err(WikiError::AuthFailed)
        ));
        assert!(matches!(
            h.backend.sign_in("invalid_username", PASS),
            Err(WikiError::AuthFailed)
        ));
        assert!(matches!(
            h.backend.sign_in("not a username", PASS),
            Err(WikiError::AuthFailed)
        ));
    }

    #[test]
    fn password_is_not_stored_in_cleartext() {
        let h = harness();
        h.backend.sign_up(NAME, USER, PASS).unwrap();
        let text = h.store.read_string("users", USER).unwrap().unwrap();
        assert!(!text.contains(PASS));
        let record = UserRecord::parse(USER, &text).unwrap();
        assert_eq!(record.display_name, NAME);
        assert!(record.password_hash.starts_with("$2"));
    }

    #[test]
    fn history_records_sign_up_and_sign_in() {
        let h = harness();
        h.backend.sign_up(NAME, USER, PASS).unwrap();
        h.clock.advance_micros(1_000_000);
        h.backend.sign_in(USER, PASS).unwrap();
        h.backend.sign_in(USER, "wrong").unwrap_err();

        let history = h.backend.history(USER).unwrap();
        let actions: Vec<_> = history.iter().map(|e| e.action.as_str()).collect();
        assert_eq!(actions, vec![SIGNED_UP, LOGGED_IN]);
        assert!(history[0].at < history[1].at);
    }

    #[test]
    fn sign_up_validates_input() {
        let h = harness();
        assert!(matches!(
            h.backend.sign_up("", USER, PASS),
            Err(WikiError::InvalidInput(_))
        ));
        assert!(matches!(
            h.backend.sign_up("Two\nLines", USER, PASS),
            Err(WikiError::InvalidInput(_))
        ));
        assert!(matches!(
            h.backend.sign_up(NAME, "has:colon", PASS),
            Err(WikiError::InvalidInput(_))
        ));
        assert!(matches!(
            h.backend.sign_up(NAME, USER, ""),
            Err(WikiError::InvalidInput(_))
        ));
        assert!(h.store.is_empty());
    }

    #[test]
    fn failed_sign_ins_leave_no_lock_entries() {
        let h = harness();
        h.backend.sign_up(NAME, USER, PASS).unwrap();
        for i in 0..5000 {
            assert!(matches!(
                h.backend.sign_in(&format!("ghost{i}"), "pw"),
                Err(WikiError::AuthFailed)
            ));
        }
        h.backend.sign_in(USER, "wrong").unwrap_err();
        assert_eq!(h.backend.user_locks.len(), 0);
    }
}
