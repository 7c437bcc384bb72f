//! Foundation types for tonewiki.
//!
//! This crate provides the naming, temporal, and record types shared by the
//! store, backend, and server crates.
//!
//! # Key Types
//!
//! - [`PageName`]: Validated wiki page identifier, stored as `<name>.md`
//! - [`Username`]: User-typed login name with a case-insensitive store key
//! - [`Timestamp`]: UTC instant with microsecond precision
//! - [`Clock`]: Injectable time source ([`SystemClock`], [`FixedClock`])
//! - [`HistoryEntry`]: One `(action, timestamp)` pair of a user's history log
//! - [`CommentKey`]: `<unix-timestamp>:<username>` blob key of a comment

pub mod comment;
pub mod error;
pub mod history;
pub mod name;
pub mod temporal;

pub use comment::CommentKey;
pub use error::TypeError;
pub use history::HistoryEntry;
pub use name::{PageName, Username, MARKDOWN_EXTENSION};
pub use temporal::{Clock, FixedClock, SystemClock, Timestamp};
