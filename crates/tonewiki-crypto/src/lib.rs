//! Password hashing for tonewiki.
//!
//! User records carry a bcrypt hash of a SHA-256 pre-hash. The pre-hash
//! step exists only so that records written by earlier deployments keep
//! verifying; it adds nothing over bcrypt alone.
//!
//! All crypto operations wrap established libraries; there is no custom cryptography.

pub mod password;

pub use password::{CryptoError, PasswordHasher};
