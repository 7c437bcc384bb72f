//! Session-scoped identity.
//!
//! The only thing kept in a session is the name the user signed in with.

use tower_sessions::Session;

use crate::error::{ServerError, ServerResult};

const USERNAME_KEY: &str = "username";

fn session_error(e: tower_sessions::session::Error) -> ServerError {
    ServerError::Session(e.to_string())
}

/// The signed-in username, if any.
pub async fn current_user(session: &Session) -> ServerResult<Option<String>> {
    session.get::<String>(USERNAME_KEY).await.map_err(session_error)
}

/// The signed-in username, or [`ServerError::Unauthenticated`].
pub async fn require_user(session: &Session) -> ServerResult<String> {
    current_user(session).await?.ok_or(ServerError::Unauthenticated)
}

/// Bind `username` to the session under a fresh session id.
pub async fn sign_in(session: &Session, username: &str) -> ServerResult<()> {
    session.cycle_id().await.map_err(session_error)?;
    session
        .insert(USERNAME_KEY, username.to_string())
        .await
        .map_err(session_error)
}

/// Drop the session entirely.
pub async fn sign_out(session: &Session) -> ServerResult<()> {
    session.flush().await.map_err(session_error)
}
