use chrono::Duration;
use serde::{Deserialize, Serialize};

use blockdoc::Document;

/// Storage key for an in-progress post that has no server id yet.
pub const NEW_POST_KEY: &str = "autosave_new_post";
/// Storage key prefix for posts with a server id.
pub const POST_KEY_PREFIX: &str = "autosave_post_";

/// How long a snapshot stays restorable. Anything older is purged instead
/// of offered.
pub fn max_restore_age() -> Duration {
    Duration::hours(24)
}

/// Identity of the post a snapshot belongs to.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PostKey {
    New,
    Existing(String),
}

impl PostKey {
    pub fn storage_key(&self) -> String {
        match self {
            PostKey::New => NEW_POST_KEY.to_string(),
            PostKey::Existing(id) => format!("{POST_KEY_PREFIX}{id}"),
        }
    }

    /// Invert [`storage_key`](Self::storage_key); `None` for foreign keys.
    pub fn from_storage_key(key: &str) -> Option<PostKey> {
        if key == NEW_POST_KEY {
            return Some(PostKey::New);
        }
        let id = key.strip_prefix(POST_KEY_PREFIX)?;
        if id.is_empty() {
            None
        } else {
            Some(PostKey::Existing(id.to_string()))
        }
    }
}

/// One autosave record: the draft metadata plus the Document JSON exactly
/// as the editor produced it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    pub title: String,
    /// Serialized [`Document`].
    pub content: String,
    /// Milliseconds since the Unix epoch.
    pub timestamp: i64,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub tags: Vec<String>,
}

impl Snapshot {
    /// True once the snapshot has aged past the restore window.
    pub fn is_stale(&self, now_ms: i64) -> bool {
        Duration::milliseconds(now_ms.saturating_sub(self.timestamp)) >= max_restore_age()
    }

    /// Parse the stored Document back out.
    pub fn document(&self) -> serde_json::Result<Document> {
        Document::from_json(&self.content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn key_scheme_round_trips() {
        assert_eq!(PostKey::New.storage_key(), "autosave_new_post");
        assert_eq!(
            PostKey::Existing("42".into()).storage_key(),
            "autosave_post_42"
        );
        assert_eq!(
            PostKey::from_storage_key("autosave_post_42"),
            Some(PostKey::Existing("42".into()))
        );
        assert_eq!(
            PostKey::from_storage_key("autosave_new_post"),
            Some(PostKey::New)
        );
        assert_eq!(PostKey::from_storage_key("autosave_post_"), None);
        assert_eq!(PostKey::from_storage_key("other"), None);
    }

    #[test]
    fn staleness_boundary() {
        let snap = Snapshot {
            title: "t".into(),
            content: "{}".into(),
            timestamp: 0,
            category: String::new(),
            tags: Vec::new(),
        };
        let day_ms = 24 * 60 * 60 * 1000;
        assert!(!snap.is_stale(day_ms - 1));
        assert!(snap.is_stale(day_ms));
    }
}
