use std::fmt;
use std::str::FromStr;

use crate::error::TypeError;
use crate::name::Username;
use crate::temporal::Timestamp;

/// Key of a comment blob: `<float-unix-timestamp>:<username>`.
///
/// The comments bucket has no other index, so the key alone carries the
/// author and posting time.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct CommentKey {
    pub posted_at: Timestamp,
    pub username: Username,
}

impl CommentKey {
    pub fn new(posted_at: Timestamp, username: Username) -> Self {
        Self {
            posted_at,
            username,
        }
    }
}

impl fmt::Display for CommentKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.posted_at.as_unix_string(), self.username)
    }
}

impl FromStr for CommentKey {
    type Err = TypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (ts, user) = s
            .split_once(':')
            .ok_or_else(|| TypeError::InvalidCommentKey(s.to_string()))?;
        let posted_at = Timestamp::parse_unix(ts)
            .map_err(|_| TypeError::InvalidCommentKey(s.to_string()))?;
        let username = Username::new(user)
            .map_err(|_| TypeError::InvalidCommentKey(s.to_string()))?;
        Ok(Self::new(posted_at, username))
    }
}
