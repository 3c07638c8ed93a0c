//! High-level newsroom API built on a pluggable content store
//!
//! `Newsroom` wires a `ContentStore`, a `ResilientExecutor` probing that same
//! store, and a markup sanitizer. Every store call runs through the executor;
//! every comment body leaving the facade is re-sanitized.

use crate::config::NewsroomConfig;
use crate::error::{NewsError, Result};
use crate::markup::{prepare_comment, AllowListSanitizer, MarkupSanitizer, RawText, SanitizedMarkup};
use crate::probe::{ReachabilityProbe, StoreProbe};
use crate::provider::ContentStore;
use crate::retry::ResilientExecutor;
use crate::types::{
    Activity, Author, BannedUser, BlogSettings, Comment, NewComment, Post, PostDraft, PostQuery,
    ReactionCounts, ReactionKind, Statistics, User,
};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::Arc;

/// A comment ready for display
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RenderedComment {
    pub id: String,
    pub author: Author,
    pub created_at: DateTime<Utc>,
    pub body: SanitizedMarkup,
}

/// A post with its comments rendered
#[derive(Debug, Clone, PartialEq)]
pub struct PostView {
    /// The post as stored; its `comments` field is left empty
    pub post: Post,
    pub comments: Vec<RenderedComment>,
}

/// High-level blog API backed by a pluggable content store
pub struct Newsroom {
    store: Arc<dyn ContentStore>,
    executor: ResilientExecutor,
    sanitizer: Arc<dyn MarkupSanitizer>,
    config: NewsroomConfig,
}

impl Newsroom {
    /// Create a newsroom over `store`, probing the same store before each attempt
    pub fn new(store: Arc<dyn ContentStore>, config: NewsroomConfig) -> Self {
        let probe: Arc<dyn ReachabilityProbe> = Arc::new(StoreProbe::new(store.clone()));
        Self {
            executor: ResilientExecutor::new(config.retry.clone(), probe),
            store,
            sanitizer: Arc::new(AllowListSanitizer::default()),
            config,
        }
    }

    /// Replace the markup sanitizer
    pub fn with_sanitizer(mut self, sanitizer: Arc<dyn MarkupSanitizer>) -> Self {
        self.sanitizer = sanitizer;
        self
    }

    /// Replace the reachability probe
    pub fn with_probe(mut self, probe: Arc<dyn ReachabilityProbe>) -> Self {
        self.executor = ResilientExecutor::new(self.config.retry.clone(), probe);
        self
    }

    /// Get the store name
    pub fn store_name(&self) -> &str {
        self.store.name()
    }

    pub fn config(&self) -> &NewsroomConfig {
        &self.config
    }

    /// Get a reference to the underlying store
    pub fn store(&self) -> &dyn ContentStore {
        self.store.as_ref()
    }

    /// Re-sanitize stored markup before it reaches a renderer
    pub fn render(&self, markup: &str) -> SanitizedMarkup {
        self.sanitizer.sanitize(markup)
    }

    fn render_comment(&self, comment: Comment) -> RenderedComment {
        RenderedComment {
            body: self.render(&comment.content),
            id: comment.id,
            author: comment.author,
            created_at: comment.created_at,
        }
    }

    fn render_comments(&self, comments: Vec<Comment>) -> Vec<RenderedComment> {
        comments.into_iter().map(|c| self.render_comment(c)).collect()
    }

    fn view(&self, mut post: Post) -> PostView {
        let comments = self.render_comments(std::mem::take(&mut post.comments));
        PostView { post, comments }
    }

    fn require_admin(user: &User, action: &str) -> Result<()> {
        if user.is_admin() {
            Ok(())
        } else {
            Err(NewsError::Forbidden(format!(
                "Only administrators can {}",
                action
            )))
        }
    }

    // ========================================================================
    // Reading
    // ========================================================================

    /// List posts matching `query`
    pub async fn posts(&self, query: &PostQuery) -> Result<Vec<PostView>> {
        let posts = self.executor.run(|| self.store.list_posts(query)).await?;
        Ok(posts.into_iter().map(|p| self.view(p)).collect())
    }

    /// Fetch one post
    pub async fn post(&self, post_id: &str) -> Result<PostView> {
        let post = self.executor.run(|| self.store.get_post(post_id)).await?;
        Ok(self.view(post))
    }

    /// Rendered comments of a post, oldest first
    pub async fn comments(&self, post_id: &str) -> Result<Vec<RenderedComment>> {
        let comments = self.executor.run(|| self.store.list_comments(post_id)).await?;
        Ok(self.render_comments(comments))
    }

    /// Current blog settings, or the defaults when the store cannot supply them
    pub async fn settings(&self) -> BlogSettings {
        match self.executor.run(|| self.store.get_settings()).await {
            Ok(settings) => settings,
            Err(e) => {
                tracing::warn!(error = %e, "Falling back to default blog settings");
                BlogSettings::default()
            }
        }
    }

    /// Reaction totals for a post
    pub async fn reactions(&self, post_id: &str) -> Result<ReactionCounts> {
        self.executor
            .run(|| self.store.reaction_counts(post_id))
            .await
    }

    // ========================================================================
    // Reader actions
    // ========================================================================

    /// Submit a comment: validate, linkify, sanitize, store
    ///
    /// Returns the post's updated comment list.
    pub async fn add_comment(
        &self,
        user: &User,
        post_id: &str,
        raw: impl Into<RawText>,
    ) -> Result<Vec<RenderedComment>> {
        let raw = raw.into();
        let text = raw.as_str().trim();
        if text.is_empty() {
            return Err(NewsError::Validation("Comment cannot be empty".to_string()));
        }
        let length = text.chars().count();
        if length > self.config.max_comment_chars {
            return Err(NewsError::Validation(format!(
                "Comment is too long ({} characters, max {})",
                length, self.config.max_comment_chars
            )));
        }

        let banned = self.executor.run(|| self.store.is_banned(&user.id)).await?;
        if banned {
            tracing::info!(user_id = %user.id, post_id, "Rejected comment from banned user");
            return Err(NewsError::Forbidden(
                "You are banned from commenting".to_string(),
            ));
        }

        let markup = prepare_comment(self.sanitizer.as_ref(), &RawText::new(text));
        if markup.as_str().trim().is_empty() {
            return Err(NewsError::Validation("Comment cannot be empty".to_string()));
        }

        let comment = NewComment {
            content: markup.into_inner(),
            author: user.author(),
        };
        let comments = self
            .executor
            .run(|| self.store.add_comment(post_id, &comment))
            .await?;

        tracing::info!(user_id = %user.id, post_id, "Comment added");
        Ok(self.render_comments(comments))
    }

    /// Delete a comment; allowed for its author and for administrators
    pub async fn remove_comment(
        &self,
        user: &User,
        post_id: &str,
        comment_id: &str,
    ) -> Result<Vec<RenderedComment>> {
        let existing = self.executor.run(|| self.store.list_comments(post_id)).await?;
        let comment = existing
            .iter()
            .find(|c| c.id == comment_id)
            .ok_or_else(|| NewsError::NotFound(format!("Comment not found: {}", comment_id)))?;

        if !user.is_admin() && comment.author.id != user.id {
            return Err(NewsError::Forbidden(
                "Only the author or an administrator can delete this comment".to_string(),
            ));
        }

        let comments = self
            .executor
            .run(|| self.store.remove_comment(post_id, comment_id))
            .await?;

        tracing::info!(user_id = %user.id, post_id, comment_id, "Comment removed");
        Ok(self.render_comments(comments))
    }

    /// Toggle a reaction and return the new totals
    pub async fn react(
        &self,
        user: &User,
        post_id: &str,
        kind: ReactionKind,
    ) -> Result<ReactionCounts> {
        self.executor
            .run(|| self.store.toggle_reaction(post_id, &user.id, kind))
            .await
    }

    // ========================================================================
    // Administration
    // ========================================================================

    /// Publish (or schedule) a post
    pub async fn create_post(&self, user: &User, draft: &PostDraft) -> Result<PostView> {
        Self::require_admin(user, "create posts")?;
        draft.validate()?;

        let post = self
            .executor
            .run(|| self.store.create_post(draft, user))
            .await?;

        tracing::info!(
            post_id = %post.id,
            levels = ?post.educational_level,
            scheduled = post.is_scheduled(Utc::now()),
            "Post created"
        );
        Ok(self.view(post))
    }

    /// Edit a post
    pub async fn update_post(
        &self,
        user: &User,
        post_id: &str,
        draft: &PostDraft,
    ) -> Result<PostView> {
        Self::require_admin(user, "edit posts")?;
        draft.validate()?;

        let post = self
            .executor
            .run(|| self.store.update_post(post_id, draft))
            .await?;

        tracing::info!(post_id, "Post updated");
        Ok(self.view(post))
    }

    /// Delete a post with its comments and reactions
    pub async fn delete_post(&self, user: &User, post_id: &str) -> Result<()> {
        Self::require_admin(user, "delete posts")?;
        self.executor.run(|| self.store.delete_post(post_id)).await?;

        tracing::info!(post_id, "Post deleted");
        Ok(())
    }

    /// Save site settings
    pub async fn update_settings(
        &self,
        user: &User,
        settings: &BlogSettings,
    ) -> Result<BlogSettings> {
        Self::require_admin(user, "change settings")?;
        settings.validate()?;
        self.executor
            .run(|| self.store.update_settings(settings))
            .await
    }

    /// Latest activity, capped by `recent_activity_limit`
    pub async fn recent_activity(&self, user: &User) -> Result<Vec<Activity>> {
        Self::require_admin(user, "view activity")?;
        let limit = self.config.recent_activity_limit;
        self.executor
            .run(|| self.store.recent_activity(limit))
            .await
    }

    pub async fn statistics(&self, user: &User) -> Result<Statistics> {
        Self::require_admin(user, "view statistics")?;
        self.executor.run(|| self.store.statistics()).await
    }

    /// Ban a user from commenting
    pub async fn ban_user(&self, admin: &User, user_id: &str, reason: &str) -> Result<BannedUser> {
        Self::require_admin(admin, "ban users")?;
        if admin.id == user_id {
            return Err(NewsError::Validation(
                "Administrators cannot ban themselves".to_string(),
            ));
        }
        self.executor
            .run(|| self.store.ban_user(user_id, reason, &admin.id))
            .await
    }

    pub async fn unban_user(&self, admin: &User, user_id: &str) -> Result<()> {
        Self::require_admin(admin, "unban users")?;
        self.executor.run(|| self.store.unban_user(user_id)).await
    }

    pub async fn banned_users(&self, admin: &User) -> Result<Vec<BannedUser>> {
        Self::require_admin(admin, "view banned users")?;
        self.executor.run(|| self.store.banned_users()).await
    }
}
