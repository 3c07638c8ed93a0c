//! # newsroom
//!
//! Comment pipeline and resilient store access for a school news blog.
//!
//! ## Overview
//!
//! `newsroom` turns reader-submitted comment text into safe markup
//! (linkify, then allow-list sanitize) and runs every content-store call
//! through a retry executor with exponential backoff, jitter and a
//! reachability probe. Swap the backing store (hosted database, in-memory)
//! without changing application code.
//!
//! ## Quick Start
//!
//! ```rust
//! use newsroom::{Newsroom, NewsroomConfig, PostDraft, User};
//! use newsroom::provider::memory::MemoryContentStore;
//! use std::sync::Arc;
//!
//! # async fn example() -> newsroom::Result<()> {
//! let newsroom = Newsroom::new(
//!     Arc::new(MemoryContentStore::default()),
//!     NewsroomConfig::default(),
//! );
//!
//! let admin = User::admin("u-1", "office@school.org", "Office");
//! let post = newsroom.create_post(&admin, &PostDraft {
//!     title: "Sports Day".to_string(),
//!     content: "Races and relays on the main field.".to_string(),
//!     cover_image: "data:image/png;base64,iVBORw0KGgo=".to_string(),
//!     educational_level: vec!["All School".to_string()],
//!     published_at: None,
//! }).await?;
//!
//! let reader = User::new("u-2", "parent@mail.org", "Parent");
//! let comments = newsroom
//!     .add_comment(&reader, &post.post.id, "Photos at example.com/sports")
//!     .await?;
//!
//! println!("{}", comments[0].body);
//! # Ok(())
//! # }
//! ```
//!
//! ## Architecture
//!
//! - **markup**: `linkify` and the `MarkupSanitizer` allow-list filter
//! - **retry**: `RetryPolicy`, failure classification, `ResilientExecutor`
//! - **probe**: `ReachabilityProbe` pre-checks run before each attempt
//! - **ContentStore** trait: core abstraction all backends implement
//! - **Newsroom**: high-level API wiring store, executor and sanitizer

pub mod config;
pub mod error;
pub mod markup;
pub mod probe;
pub mod provider;
pub mod retry;
pub mod store;
pub mod types;

// Re-export core types
pub use config::NewsroomConfig;
pub use error::{NewsError, Result};
pub use markup::{
    linkify, prepare_comment, sanitize, AllowList, AllowListSanitizer, MarkupSanitizer, RawText,
    SanitizedMarkup,
};
pub use probe::{AlwaysReachable, FnProbe, ReachabilityProbe, StoreProbe};
pub use provider::ContentStore;
pub use retry::{classify, with_retry, FailureClass, ResilientExecutor, RetryPolicy};
pub use store::{Newsroom, PostView, RenderedComment};
pub use types::{
    Activity, ActivityKind, Author, BannedUser, BlogSettings, Comment, NewComment, Post,
    PostDraft, PostQuery, ReactionCounts, ReactionKind, Role, SocialLinks, SortBy, SortOrder,
    Statistics, Theme, User,
};

// Re-export the in-memory store for convenience
pub use provider::memory::{MemoryConfig, MemoryContentStore};
