//! Domain operations of tonewiki.
//!
//! [`Backend`] wraps a [`tonewiki_store::BlobStore`] and turns its buckets into
//! wiki operations. It keeps no per-user state: every user-scoped call names
//! the user explicitly, and the web layer keeps identity in the session.
//!
//! # Modules
//!
//! - [`pages`]: page listing and rendering, image and author listings
//! - [`upload`]: extension dispatch, link validation and zip unpacking for uploads
//! - [`auth`]: sign-up and sign-in against user records
//! - [`comments`]: the comment wall
//! - [`popularity`]: the page-view counter table
//! - [`history`]: per-user navigation history
//! - [`summary`]: the [`Summarizer`] seam and [`LeadSummarizer`]
//! - [`record`]: the user-record wire format

pub mod auth;
pub mod backend;
pub mod comments;
pub mod config;
pub mod error;
pub mod history;
pub mod links;
mod locks;
pub mod pages;
pub mod popularity;
pub mod record;
pub mod summary;
pub mod upload;

pub use backend::Backend;
pub use comments::Comment;
pub use config::{BucketNames, SummaryConfig, WikiConfig};
pub use error::{WikiError, WikiResult};
pub use pages::{render_markdown, AuthorInfo, ImageInfo, RenderedPage};
pub use popularity::PopularityTable;
pub use record::UserRecord;
pub use summary::{LeadSummarizer, Summarizer, SummaryError};
pub use upload::{UploadKind, UploadOutcome};

pub use tonewiki_types::{CommentKey, HistoryEntry, Timestamp, Username};
