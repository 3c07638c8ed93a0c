//! Newsroom configuration
//!
//! Loaded from JSON; every field falls back to a default when absent.

use crate::error::{NewsError, Result};
use crate::retry::RetryPolicy;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Configuration for the `Newsroom` facade
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewsroomConfig {
    /// Retry pacing for every store call
    #[serde(default)]
    pub retry: RetryPolicy,

    /// Longest accepted comment, in characters after trimming
    #[serde(default = "default_max_comment_chars")]
    pub max_comment_chars: usize,

    /// Entries returned by the admin activity feed
    #[serde(default = "default_recent_activity_limit")]
    pub recent_activity_limit: usize,
}

fn default_max_comment_chars() -> usize {
    1000
}

fn default_recent_activity_limit() -> usize {
    10
}

impl Default for NewsroomConfig {
    fn default() -> Self {
        Self {
            retry: RetryPolicy::default(),
            max_comment_chars: default_max_comment_chars(),
            recent_activity_limit: default_recent_activity_limit(),
        }
    }
}

impl NewsroomConfig {
    /// Parse and validate a JSON document
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a JSON config file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|e| {
            NewsError::Config(format!(
                "Failed to read config file {}: {}",
                path.display(),
                e
            ))
        })?;
        Self::from_json(&json)
    }

    /// Write this config as pretty JSON
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        if self.retry.max_attempts == 0 {
            return Err(NewsError::Config(
                "retry.maxAttempts must be at least 1".to_string(),
            ));
        }
        if self.max_comment_chars == 0 {
            return Err(NewsError::Config(
                "maxCommentChars must be at least 1".to_string(),
            ));
        }
        if self.recent_activity_limit == 0 {
            return Err(NewsError::Config(
                "recentActivityLimit must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = NewsroomConfig::default();
        assert_eq!(config.retry.max_attempts, 3);
        assert_eq!(config.retry.base_delay_ms, 1000);
        assert_eq!(config.max_comment_chars, 1000);
        assert_eq!(config.recent_activity_limit, 10);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_from_json_partial() {
        let config = NewsroomConfig::from_json(
            r#"{"retry":{"max_attempts":5,"attempt_timeout_ms":3000},"maxCommentChars":500}"#,
        )
        .unwrap();
        assert_eq!(config.retry.max_attempts, 5);
        assert_eq!(config.retry.max_jitter_ms, 200);
        assert_eq!(config.retry.attempt_timeout_ms, Some(3000));
        assert_eq!(config.max_comment_chars, 500);
        assert_eq!(config.recent_activity_limit, 10);

        assert_eq!(NewsroomConfig::from_json("{}").unwrap(), NewsroomConfig::default());
    }

    #[test]
    fn test_from_json_rejects_invalid() {
        let err = NewsroomConfig::from_json(r#"{"retry":{"max_attempts":0}}"#).unwrap_err();
        assert!(matches!(err, NewsError::Config(_)));

        let err = NewsroomConfig::from_json(r#"{"maxCommentChars":0}"#).unwrap_err();
        assert!(err.to_string().contains("maxCommentChars"));

        assert!(matches!(
            NewsroomConfig::from_json("not json"),
            Err(NewsError::Serialization(_))
        ));
    }

    #[test]
    fn test_file_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("newsroom.json");

        let config = NewsroomConfig {
            recent_activity_limit: 25,
            ..Default::default()
        };
        config.save(&path).unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        assert!(content.contains("recentActivityLimit"));
        assert_eq!(NewsroomConfig::from_file(&path).unwrap(), config);
    }

    #[test]
    fn test_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = NewsroomConfig::from_file(dir.path().join("absent.json")).unwrap_err();
        assert!(matches!(err, NewsError::Config(_)));
        assert!(err.to_string().contains("absent.json"));
    }
}
