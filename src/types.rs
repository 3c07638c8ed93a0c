//! Data-transfer types exchanged with the content store
//!
//! All types use camelCase JSON serialization for wire compatibility.
//! Records coming back from a store are decoded into these structs once;
//! comment bodies stay plain strings here and only become
//! [`SanitizedMarkup`](crate::markup::SanitizedMarkup) on the way to a renderer.

use crate::error::{NewsError, Result};
use base64::Engine;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Educational levels of the national section
pub const NATIONAL_LEVELS: &[&str] = &[
    "KG1",
    "KG2",
    "Primary 1",
    "Primary 2",
    "Primary 3",
    "Primary 4",
    "Primary 5",
    "Primary 6",
    "Preparatory 1",
    "Preparatory 2",
    "Preparatory 3",
    "Secondary 1",
    "Secondary 2",
    "Secondary 3",
];

/// Educational levels of the American section
pub const AMERICAN_LEVELS: &[&str] = &[
    "Grade 1", "Grade 2", "Grade 3", "Grade 4", "Grade 5", "Grade 6", "Grade 7", "Grade 8",
    "Grade 9", "Grade 10", "Grade 11", "Grade 12",
];

/// Level that addresses the whole school; as a filter it matches every post
pub const ALL_SCHOOL: &str = "All School";

/// Check a level against the known catalog
pub fn is_known_level(level: &str) -> bool {
    level == ALL_SCHOOL || NATIONAL_LEVELS.contains(&level) || AMERICAN_LEVELS.contains(&level)
}

/// Cover images must be inline data URLs of one of these types
const IMAGE_DATA_PREFIXES: [&str; 3] = [
    "data:image/jpeg;base64,",
    "data:image/png;base64,",
    "data:image/gif;base64,",
];

/// Validate a cover image data URL and its base64 payload
pub fn validate_image_data_url(data_url: &str) -> Result<()> {
    let payload = IMAGE_DATA_PREFIXES
        .iter()
        .find_map(|prefix| data_url.strip_prefix(prefix))
        .ok_or_else(|| NewsError::Validation("Invalid image format".to_string()))?;

    match base64::engine::general_purpose::STANDARD.decode(payload) {
        Ok(bytes) if !bytes.is_empty() => Ok(()),
        _ => Err(NewsError::Validation("Invalid image format".to_string())),
    }
}

/// Estimated reading time in minutes (never less than one)
pub fn reading_time(content: &str, words_per_minute: u32) -> u32 {
    let words = content.split_whitespace().count() as u32;
    words.div_ceil(words_per_minute.max(1)).max(1)
}

/// Account role
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Role {
    Admin,
    #[default]
    User,
}

/// An authenticated account
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: String,
    pub email: String,
    pub name: String,
    #[serde(default)]
    pub role: Role,
}

impl User {
    pub fn new(id: impl Into<String>, email: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            email: email.into(),
            name: name.into(),
            role: Role::User,
        }
    }

    pub fn admin(id: impl Into<String>, email: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            role: Role::Admin,
            ..Self::new(id, email, name)
        }
    }

    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }

    /// Public author card for this account
    pub fn author(&self) -> Author {
        Author {
            id: self.id.clone(),
            name: if self.name.is_empty() {
                "Unknown User".to_string()
            } else {
                self.name.clone()
            },
            email: self.email.clone(),
        }
    }
}

/// Author card attached to posts and comments
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Author {
    pub id: String,
    pub name: String,
    pub email: String,
}

/// A stored comment; `content` is markup produced by the comment pipeline
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Comment {
    pub id: String,
    pub content: String,
    pub created_at: DateTime<Utc>,
    pub author: Author,
}

/// Comment submission handed to the store
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewComment {
    pub content: String,
    pub author: Author,
}

/// A published or scheduled post
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Post {
    pub id: String,
    pub title: String,
    pub content: String,
    pub cover_image: String,
    pub published_at: DateTime<Utc>,
    pub reading_time: u32,
    pub educational_level: Vec<String>,
    pub author: Author,
    #[serde(default)]
    pub comments: Vec<Comment>,
}

impl Post {
    /// Whether the post is scheduled for a later time than `now`
    pub fn is_scheduled(&self, now: DateTime<Utc>) -> bool {
        self.published_at > now
    }
}

/// Fields an administrator supplies when creating or editing a post
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PostDraft {
    pub title: String,
    pub content: String,
    pub cover_image: String,
    pub educational_level: Vec<String>,
    /// Publication time; `None` publishes immediately
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub published_at: Option<DateTime<Utc>>,
}

impl PostDraft {
    /// Field-level validation at the store boundary
    pub fn validate(&self) -> Result<()> {
        if self.title.trim().is_empty() {
            return Err(NewsError::Validation("Title cannot be empty".to_string()));
        }
        if self.content.trim().is_empty() {
            return Err(NewsError::Validation("Content cannot be empty".to_string()));
        }
        validate_image_data_url(&self.cover_image)?;
        if self.educational_level.is_empty() {
            return Err(NewsError::Validation(
                "Select at least one educational level".to_string(),
            ));
        }
        if let Some(unknown) = self.educational_level.iter().find(|l| !is_known_level(l)) {
            return Err(NewsError::Validation(format!(
                "Unknown educational level: {}",
                unknown
            )));
        }
        Ok(())
    }
}

/// Sort key for post listings
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SortBy {
    #[default]
    Date,
    Comments,
}

/// Sort direction for post listings
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SortOrder {
    Asc,
    #[default]
    Desc,
}

/// Filters for listing posts
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PostQuery {
    /// Educational level; `All School` or `None` disables the filter
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub level: Option<String>,

    /// Case-insensitive substring matched against title and content
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub search: Option<String>,

    #[serde(default)]
    pub sort_by: SortBy,

    #[serde(default)]
    pub sort_order: SortOrder,

    /// Include posts whose publication time lies in the future
    #[serde(default)]
    pub include_scheduled: bool,
}

impl PostQuery {
    pub fn level(mut self, level: impl Into<String>) -> Self {
        self.level = Some(level.into());
        self
    }

    pub fn search(mut self, search: impl Into<String>) -> Self {
        self.search = Some(search.into());
        self
    }

    pub fn sorted(mut self, sort_by: SortBy, sort_order: SortOrder) -> Self {
        self.sort_by = sort_by;
        self.sort_order = sort_order;
        self
    }

    pub fn with_scheduled(mut self) -> Self {
        self.include_scheduled = true;
        self
    }

    /// Level filter that actually restricts results
    pub fn effective_level(&self) -> Option<&str> {
        self.level.as_deref().filter(|l| *l != ALL_SCHOOL)
    }

    /// Whether a post passes the level, search and schedule filters
    pub fn matches(&self, post: &Post, now: DateTime<Utc>) -> bool {
        if !self.include_scheduled && post.is_scheduled(now) {
            return false;
        }
        if let Some(level) = self.effective_level() {
            if !post.educational_level.iter().any(|l| l == level) {
                return false;
            }
        }
        if let Some(search) = self.search.as_deref().filter(|s| !s.is_empty()) {
            let needle = search.to_lowercase();
            if !post.title.to_lowercase().contains(&needle)
                && !post.content.to_lowercase().contains(&needle)
            {
                return false;
            }
        }
        true
    }
}

/// Reaction kinds a reader can leave on a post
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReactionKind {
    Like,
    Love,
    Laugh,
}

/// Reaction totals for a post
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReactionCounts {
    pub like: u64,
    pub love: u64,
    pub laugh: u64,
}

impl ReactionCounts {
    pub fn get(&self, kind: ReactionKind) -> u64 {
        match kind {
            ReactionKind::Like => self.like,
            ReactionKind::Love => self.love,
            ReactionKind::Laugh => self.laugh,
        }
    }

    pub(crate) fn add(&mut self, kind: ReactionKind) {
        match kind {
            ReactionKind::Like => self.like += 1,
            ReactionKind::Love => self.love += 1,
            ReactionKind::Laugh => self.laugh += 1,
        }
    }

    pub fn total(&self) -> u64 {
        self.like + self.love + self.laugh
    }
}

/// Site theme
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    #[default]
    Dark,
    Light,
}

/// Social profile links shown in the footer
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SocialLinks {
    #[serde(default)]
    pub twitter: String,
    #[serde(default)]
    pub github: String,
    #[serde(default)]
    pub linkedin: String,
}

/// Site-wide blog settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlogSettings {
    pub title: String,
    pub description: String,
    pub posts_per_page: u32,
    #[serde(default)]
    pub theme: Theme,
    #[serde(default)]
    pub social_links: SocialLinks,
}

impl Default for BlogSettings {
    fn default() -> Self {
        Self {
            title: "St.Josef News".to_string(),
            description: "Latest news and updates from St.Josef International School".to_string(),
            posts_per_page: 9,
            theme: Theme::Dark,
            social_links: SocialLinks::default(),
        }
    }
}

impl BlogSettings {
    pub fn validate(&self) -> Result<()> {
        if self.title.trim().is_empty() {
            return Err(NewsError::Validation("Blog title cannot be empty".to_string()));
        }
        if self.posts_per_page == 0 {
            return Err(NewsError::Validation(
                "Posts per page must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

/// What happened in an activity feed entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ActivityKind {
    PostCreated,
    Commented,
}

impl ActivityKind {
    pub fn action(&self) -> &'static str {
        match self {
            Self::PostCreated => "created a new post",
            Self::Commented => "commented on",
        }
    }
}

/// Admin dashboard activity feed entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Activity {
    pub timestamp: DateTime<Utc>,
    pub user: String,
    pub kind: ActivityKind,
    pub post: String,
}

/// Admin dashboard statistics
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Statistics {
    pub total_posts: u64,
    pub posts_by_level: HashMap<String, u64>,
}

/// A ban preventing a user from commenting
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BannedUser {
    pub user_id: String,
    pub reason: String,
    pub banned_by: String,
    pub created_at: DateTime<Utc>,
}
