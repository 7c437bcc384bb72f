use std::sync::Arc;

use tonewiki_backend::{Backend, WikiResult};

use crate::error::{ServerError, ServerResult};

/// Shared by every handler.
#[derive(Clone, Debug)]
pub struct AppState {
    pub backend: Arc<Backend>,
}

impl AppState {
    pub fn new(backend: Arc<Backend>) -> Self {
        Self { backend }
    }

    /// Run a backend call on the blocking pool.
    ///
    /// Store I/O and bcrypt both block, so no backend call runs on the
    /// async executor.
    pub async fn run<T, F>(&self, f: F) -> ServerResult<T>
    where
        F: FnOnce(&Backend) -> WikiResult<T> + Send + 'static,
        T: Send + 'static,
    {
        let backend = Arc::clone(&self.backend);
        tokio::task::spawn_blocking(move || f(backend.as_ref()))
            .await
            .map_err(|e| ServerError::Internal(format!("backend task failed: {e}")))?
            .map_err(ServerError::from)
    }

    /// Append to a signed-in user's history, logging instead of failing.
    pub async fn log_visit(&self, username: Option<String>, action: impl Into<String>) {
        let Some(username) = username else {
            return;
        };
        let action = action.into();
        let (user, act) = (username.clone(), action.clone());
        if let Err(e) = self.run(move |b| b.append_history(&user, &act)).await {
            tracing::warn!(user = %username, action = %action, error = %e, "history not recorded");
        }
    }
}
