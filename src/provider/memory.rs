//! In-memory content store for development and testing
//!
//! Keeps every table in process memory behind a single `RwLock`. Data is
//! lost when the store is dropped. The store can be switched offline and
//! primed with transient failures to exercise retry behaviour.

use super::ContentStore;
use crate::error::{NewsError, Result};
use crate::types::{
    reading_time, Activity, ActivityKind, BannedUser, BlogSettings, Comment, NewComment, Post,
    PostDraft, PostQuery, ReactionCounts, ReactionKind, SortBy, SortOrder, Statistics, User,
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, AtomicU16, AtomicU32, Ordering};
use tokio::sync::RwLock;

/// Configuration for the in-memory store
#[derive(Debug, Clone)]
pub struct MemoryConfig {
    /// Reading speed used to derive `Post::reading_time`
    pub words_per_minute: u32,
}

impl Default for MemoryConfig {
    fn default() -> Self {
        Self {
            words_per_minute: 200,
        }
    }
}

struct StoredPost {
    post: Post,
    created_at: DateTime<Utc>,
}

struct StoredComment {
    post_id: String,
    comment: Comment,
}

#[derive(Default)]
struct Tables {
    posts: Vec<StoredPost>,
    comments: Vec<StoredComment>,
    reactions: HashSet<(String, String, ReactionKind)>,
    settings: Option<BlogSettings>,
    bans: Vec<BannedUser>,
}

impl Tables {
    fn post_index(&self, post_id: &str) -> Result<usize> {
        self.posts
            .iter()
            .position(|p| p.post.id == post_id)
            .ok_or_else(|| NewsError::NotFound(format!("Post not found: {}", post_id)))
    }

    fn comments_of(&self, post_id: &str) -> Vec<Comment> {
        self.comments
            .iter()
            .filter(|c| c.post_id == post_id)
            .map(|c| c.comment.clone())
            .collect()
    }

    fn with_comments(&self, stored: &StoredPost) -> Post {
        let mut post = stored.post.clone();
        post.comments = self.comments_of(&post.id);
        post
    }

    fn reaction_counts(&self, post_id: &str) -> ReactionCounts {
        let mut counts = ReactionCounts::default();
        for (_, _, kind) in self.reactions.iter().filter(|(p, _, _)| p == post_id) {
            counts.add(*kind);
        }
        counts
    }
}

/// In-memory `ContentStore`
pub struct MemoryContentStore {
    tables: RwLock<Tables>,
    config: MemoryConfig,
    online: AtomicBool,
    pending_failures: AtomicU32,
    failure_status: AtomicU16,
}

impl Default for MemoryContentStore {
    fn default() -> Self {
        Self::new(MemoryConfig::default())
    }
}

impl MemoryContentStore {
    /// Create an empty store
    pub fn new(config: MemoryConfig) -> Self {
        Self {
            tables: RwLock::new(Tables::default()),
            config,
            online: AtomicBool::new(true),
            pending_failures: AtomicU32::new(0),
            failure_status: AtomicU16::new(503),
        }
    }

    /// Simulate losing or regaining connectivity
    pub fn set_reachable(&self, reachable: bool) {
        self.online.store(reachable, Ordering::SeqCst);
    }

    /// Make the next `count` operations (not pings) fail with `status`
    pub fn inject_failures(&self, count: u32, status: u16) {
        self.failure_status.store(status, Ordering::SeqCst);
        self.pending_failures.store(count, Ordering::SeqCst);
    }

    fn check_online(&self) -> Result<()> {
        if self.online.load(Ordering::SeqCst) {
            Ok(())
        } else {
            Err(NewsError::Connection("memory store is offline".to_string()))
        }
    }

    /// Connectivity check plus one pending injected failure, if any
    fn begin_operation(&self) -> Result<()> {
        self.check_online()?;
        let consumed = self
            .pending_failures
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if consumed {
            let status = self.failure_status.load(Ordering::SeqCst);
            return Err(NewsError::status_code(status, "injected failure"));
        }
        Ok(())
    }
}

#[async_trait]
impl ContentStore for MemoryContentStore {
    async fn ping(&self) -> Result<()> {
        self.check_online()
    }

    async fn list_posts(&self, query: &PostQuery) -> Result<Vec<Post>> {
        self.begin_operation()?;
        let tables = self.tables.read().await;
        let now = Utc::now();

        let mut posts: Vec<Post> = tables
            .posts
            .iter()
            .filter(|p| query.matches(&p.post, now))
            .map(|p| tables.with_comments(p))
            .collect();

        posts.sort_by(|a, b| {
            let ordering = match query.sort_by {
                SortBy::Date => a.published_at.cmp(&b.published_at),
                SortBy::Comments => a
                    .comments
                    .len()
                    .cmp(&b.comments.len())
                    .then(a.published_at.cmp(&b.published_at)),
            };
            match query.sort_order {
                SortOrder::Asc => ordering,
                SortOrder::Desc => ordering.reverse(),
            }
        });

        Ok(posts)
    }

    async fn get_post(&self, post_id: &str) -> Result<Post> {
        self.begin_operation()?;
        let tables = self.tables.read().await;
        let index = tables.post_index(post_id)?;
        Ok(tables.with_comments(&tables.posts[index]))
    }

    async fn create_post(&self, draft: &PostDraft, author: &User) -> Result<Post> {
        self.begin_operation()?;
        draft.validate()?;

        let now = Utc::now();
        let post = Post {
            id: format!("post-{}", uuid::Uuid::new_v4()),
            title: draft.title.clone(),
            content: draft.content.clone(),
            cover_image: draft.cover_image.clone(),
            published_at: draft.published_at.unwrap_or(now),
            reading_time: reading_time(&draft.content, self.config.words_per_minute),
            educational_level: draft.educational_level.clone(),
            author: author.author(),
            comments: Vec::new(),
        };

        let mut tables = self.tables.write().await;
        tables.posts.push(StoredPost {
            post: post.clone(),
            created_at: now,
        });

        tracing::debug!(post_id = %post.id, title = %post.title, "Post created");
        Ok(post)
    }

    async fn update_post(&self, post_id: &str, draft: &PostDraft) -> Result<Post> {
        self.begin_operation()?;
        draft.validate()?;

        let mut tables = self.tables.write().await;
        let index = tables.post_index(post_id)?;
        {
            let stored = &mut tables.posts[index].post;
            stored.title = draft.title.clone();
            stored.content = draft.content.clone();
            stored.cover_image = draft.cover_image.clone();
            stored.educational_level = draft.educational_level.clone();
            stored.reading_time = reading_time(&draft.content, self.config.words_per_minute);
            if let Some(published_at) = draft.published_at {
                stored.published_at = published_at;
            }
        }

        tracing::debug!(post_id, "Post updated");
        Ok(tables.with_comments(&tables.posts[index]))
    }

    async fn delete_post(&self, post_id: &str) -> Result<()> {
        self.begin_operation()?;
        let mut tables = self.tables.write().await;
        let index = tables.post_index(post_id)?;
        tables.posts.remove(index);
        tables.comments.retain(|c| c.post_id != post_id);
        tables.reactions.retain(|(p, _, _)| p != post_id);

        tracing::debug!(post_id, "Post deleted");
        Ok(())
    }

    async fn list_comments(&self, post_id: &str) -> Result<Vec<Comment>> {
        self.begin_operation()?;
        let tables = self.tables.read().await;
        tables.post_index(post_id)?;
        Ok(tables.comments_of(post_id))
    }

    async fn add_comment(&self, post_id: &str, comment: &NewComment) -> Result<Vec<Comment>> {
        self.begin_operation()?;
        if comment.content.trim().is_empty() {
            return Err(NewsError::Validation("Comment cannot be empty".to_string()));
        }

        let mut tables = self.tables.write().await;
        tables.post_index(post_id)?;

        let stored = Comment {
            id: format!("cmt-{}", uuid::Uuid::new_v4()),
            content: comment.content.trim().to_string(),
            created_at: Utc::now(),
            author: comment.author.clone(),
        };
        tracing::debug!(post_id, comment_id = %stored.id, "Comment added");
        tables.comments.push(StoredComment {
            post_id: post_id.to_string(),
            comment: stored,
        });

        Ok(tables.comments_of(post_id))
    }

    async fn remove_comment(&self, post_id: &str, comment_id: &str) -> Result<Vec<Comment>> {
        self.begin_operation()?;
        let mut tables = self.tables.write().await;
        let index = tables
            .comments
            .iter()
            .position(|c| c.post_id == post_id && c.comment.id == comment_id)
            .ok_or_else(|| NewsError::NotFound(format!("Comment not found: {}", comment_id)))?;
        tables.comments.remove(index);

        tracing::debug!(post_id, comment_id, "Comment removed");
        Ok(tables.comments_of(post_id))
    }

    async fn toggle_reaction(
        &self,
        post_id: &str,
        user_id: &str,
        kind: ReactionKind,
    ) -> Result<ReactionCounts> {
        self.begin_operation()?;
        let mut tables = self.tables.write().await;
        tables.post_index(post_id)?;

        let key = (post_id.to_string(), user_id.to_string(), kind);
        if !tables.reactions.remove(&key) {
            tables.reactions.insert(key);
        }
        Ok(tables.reaction_counts(post_id))
    }

    async fn reaction_counts(&self, post_id: &str) -> Result<ReactionCounts> {
        self.begin_operation()?;
        let tables = self.tables.read().await;
        tables.post_index(post_id)?;
        Ok(tables.reaction_counts(post_id))
    }

    async fn get_settings(&self) -> Result<BlogSettings> {
        self.begin_operation()?;
        let tables = self.tables.read().await;
        Ok(tables.settings.clone().unwrap_or_default())
    }

    async fn update_settings(&self, settings: &BlogSettings) -> Result<BlogSettings> {
        self.begin_operation()?;
        settings.validate()?;
        let mut tables = self.tables.write().await;
        tables.settings = Some(settings.clone());
        Ok(settings.clone())
    }

    async fn recent_activity(&self, limit: usize) -> Result<Vec<Activity>> {
        self.begin_operation()?;
        let tables = self.tables.read().await;

        let titles: HashMap<&str, &str> = tables
            .posts
            .iter()
            .map(|p| (p.post.id.as_str(), p.post.title.as_str()))
            .collect();

        let mut activity: Vec<Activity> = tables
            .posts
            .iter()
            .map(|p| Activity {
                timestamp: p.created_at,
                user: p.post.author.name.clone(),
                kind: ActivityKind::PostCreated,
                post: p.post.title.clone(),
            })
            .chain(tables.comments.iter().map(|c| Activity {
                timestamp: c.comment.created_at,
                user: c.comment.author.name.clone(),
                kind: ActivityKind::Commented,
                post: titles
                    .get(c.post_id.as_str())
                    .map(|t| t.to_string())
                    .unwrap_or_else(|| "Unknown Post".to_string()),
            }))
            .collect();

        activity.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        activity.truncate(limit);
        Ok(activity)
    }

    async fn statistics(&self) -> Result<Statistics> {
        self.begin_operation()?;
        let tables = self.tables.read().await;

        let mut stats = Statistics {
            total_posts: tables.posts.len() as u64,
            ..Default::default()
        };
        for level in tables.posts.iter().flat_map(|p| &p.post.educational_level) {
            *stats.posts_by_level.entry(level.clone()).or_insert(0) += 1;
        }
        Ok(stats)
    }

    async fn ban_user(&self, user_id: &str, reason: &str, banned_by: &str) -> Result<BannedUser> {
        self.begin_operation()?;
        let ban = BannedUser {
            user_id: user_id.to_string(),
            reason: reason.to_string(),
            banned_by: banned_by.to_string(),
            created_at: Utc::now(),
        };

        let mut tables = self.tables.write().await;
        tables.bans.retain(|b| b.user_id != user_id);
        tables.bans.push(ban.clone());

        tracing::info!(user_id, banned_by, "User banned");
        Ok(ban)
    }

    async fn unban_user(&self, user_id: &str) -> Result<()> {
        self.begin_operation()?;
        let mut tables = self.tables.write().await;
        tables.bans.retain(|b| b.user_id != user_id);

        tracing::info!(user_id, "User unbanned");
        Ok(())
    }

    async fn banned_users(&self) -> Result<Vec<BannedUser>> {
        self.begin_operation()?;
        let tables = self.tables.read().await;
        Ok(tables.bans.clone())
    }

    fn name(&self) -> &str {
        "memory"
    }
}
