use thiserror::Error;

use tonewiki_crypto::CryptoError;
use tonewiki_store::StoreError;
use tonewiki_types::TypeError;

#[derive(Debug, Error)]
pub enum WikiError {
    #[error("not found: {0}")]
    NotFound(String),

    #[error("already exists: {0}")]
    AlreadyExists(String),

    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// Unknown user or wrong password; the two are deliberately indistinguishable.
    #[error("incorrect username and/or password")]
    AuthFailed,

    #[error("corrupt record {key}: {reason}")]
    CorruptRecord { key: String, reason: String },

    #[error("store error: {0}")]
    Store(#[from] StoreError),

    #[error("crypto error: {0}")]
    Crypto(#[from] CryptoError),

    #[error("internal error: {0}")]
    Internal(String),
}

impl WikiError {
    /// Whether the same call may succeed if repeated later.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Store(e) if e.is_retryable())
    }
}

impl From<TypeError> for WikiError {
    fn from(e: TypeError) -> Self {
        Self::InvalidInput(e.to_string())
    }
}

pub type WikiResult<T> = Result<T, WikiError>;
