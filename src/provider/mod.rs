//! Content store trait, the core abstraction for blog backends
//!
//! All backends (hosted Postgres-style services, in-memory, etc.)
//! implement `ContentStore` to provide a uniform API over posts,
//! comments, reactions, settings and user moderation. The `Newsroom`
//! facade uses a store for every operation.

use crate::error::Result;
use crate::types::{
    Activity, BannedUser, BlogSettings, Comment, NewComment, Post, PostDraft, PostQuery,
    ReactionCounts, ReactionKind, Statistics, User,
};
use async_trait::async_trait;

pub mod memory;

/// Core trait for content backends
///
/// Identifiers are opaque strings assigned by the store. Missing posts or
/// comments are reported as `NewsError::NotFound`.
#[async_trait]
pub trait ContentStore: Send + Sync {
    /// Cheap connectivity check (e.g. fetch one row from a known table)
    async fn ping(&self) -> Result<()>;

    /// List posts matching the query, comments included
    async fn list_posts(&self, query: &PostQuery) -> Result<Vec<Post>>;

    /// Fetch a single post by id
    async fn get_post(&self, post_id: &str) -> Result<Post>;

    /// Create a post authored by `author`
    async fn create_post(&self, draft: &PostDraft, author: &User) -> Result<Post>;

    /// Replace the editable fields of a post
    async fn update_post(&self, post_id: &str, draft: &PostDraft) -> Result<Post>;

    /// Delete a post together with its comments and reactions
    async fn delete_post(&self, post_id: &str) -> Result<()>;

    /// Comments of a post, oldest first
    async fn list_comments(&self, post_id: &str) -> Result<Vec<Comment>>;

    /// Append a comment and return the post's updated comment list
    async fn add_comment(&self, post_id: &str, comment: &NewComment) -> Result<Vec<Comment>>;

    /// Delete a comment and return the post's updated comment list
    async fn remove_comment(&self, post_id: &str, comment_id: &str) -> Result<Vec<Comment>>;

    /// Toggle one reaction kind for a user and return the new totals
    async fn toggle_reaction(
        &self,
        post_id: &str,
        user_id: &str,
        kind: ReactionKind,
    ) -> Result<ReactionCounts>;

    /// Reaction totals for a post
    async fn reaction_counts(&self, post_id: &str) -> Result<ReactionCounts>;

    /// Current settings, or defaults when none were ever saved
    async fn get_settings(&self) -> Result<BlogSettings>;

    /// Insert or replace the settings record
    async fn update_settings(&self, settings: &BlogSettings) -> Result<BlogSettings>;

    /// Most recent post/comment activity, newest first
    async fn recent_activity(&self, limit: usize) -> Result<Vec<Activity>>;

    /// Post totals, overall and per educational level
    async fn statistics(&self) -> Result<Statistics>;

    /// Ban a user from commenting
    async fn ban_user(&self, user_id: &str, reason: &str, banned_by: &str) -> Result<BannedUser>;

    /// Lift a ban
    async fn unban_user(&self, user_id: &str) -> Result<()>;

    /// All active bans
    async fn banned_users(&self) -> Result<Vec<BannedUser>>;

    /// Whether a user is currently banned
    ///
    /// Default implementation scans `banned_users()`.
    async fn is_banned(&self, user_id: &str) -> Result<bool> {
        Ok(self
            .banned_users()
            .await?
            .iter()
            .any(|b| b.user_id == user_id))
    }

    /// Store name (e.g., "memory", "postgrest")
    fn name(&self) -> &str;
}
