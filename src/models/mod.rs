pub mod page_metadata;

pub use page_metadata::PageMetadata;

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

// ============================================================================
// User Models
// ============================================================================

/// Internal database row. Not serializable; use UserDto for API responses
/// to avoid accidentally exposing password_hash.
#[derive(Debug, Clone, FromRow)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    pub password_hash: String,
    pub name: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Public user shape returned by all API responses.
#[derive(Debug, Serialize)]
pub struct UserDto {
    pub id: Uuid,
    pub email: String,
    pub name: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl From<User> for UserDto {
    fn from(user: User) -> Self {
        UserDto {
            id: user.id,
            email: user.email,
            name: user.name,
            created_at: user.created_at,
        }
    }
}

// ============================================================================
// Bookmark Models
// ============================================================================

#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Bookmark {
    pub id: Uuid,
    pub user_id: Uuid,
    pub url: String,
    pub title: String,
    pub description: String,
    /// Comma-separated, as typed by the user.
    pub tags: String,
    pub favicon: Option<String>,
    /// Set on create; moved forward only when `url` changes.
    pub metadata_fetched_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

/// Fields the user sent on create or update, before enrichment.
///
/// `None` means "not supplied"; blank strings are handled by the merge rules.
#[derive(Debug, Clone, Deserialize)]
pub struct BookmarkSubmission {
    pub url: String,
    pub title: Option<String>,
    pub description: Option<String>,
    pub tags: Option<String>,
}

/// Row values for an INSERT, after enrichment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewBookmark {
    pub url: String,
    pub title: String,
    pub description: String,
    pub tags: String,
    pub favicon: Option<String>,
}

/// Row values for an UPDATE, after enrichment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BookmarkUpdate {
    pub url: String,
    pub title: String,
    pub description: String,
    pub tags: String,
    pub favicon: Option<String>,
    /// Whether metadata was fetched for a new URL; drives
    /// `metadata_fetched_at`.
    pub refetched: bool,
}

// ============================================================================
// Tag Models
// ============================================================================

#[derive(Debug, Serialize)]
pub struct TagSummary {
    /// Most used first; ties broken alphabetically.
    pub tags: Vec<String>,
    pub tag_counts: HashMap<String, i64>,
}

impl TagSummary {
    /// Tally comma-separated tag strings, one per bookmark.
    pub fn from_tag_strings<'a>(rows: impl IntoIterator<Item = &'a str>) -> Self {
        let mut tag_counts: HashMap<String, i64> = HashMap::new();
        for tag in rows
            .into_iter()
            .flat_map(|row| row.split(','))
            .map(str::trim)
            .filter(|t| !t.is_empty())
        {
            *tag_counts.entry(tag.to_string()).or_default() += 1;
        }

        let mut tags: Vec<String> = tag_counts.keys().cloned().collect();
        tags.sort_by(|a, b| tag_counts[b].cmp(&tag_counts[a]).then_with(|| a.cmp(b)));

        TagSummary { tags, tag_counts }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tag_summary_counts_and_orders() {
        let summary = TagSummary::from_tag_strings(["rust, web", "web", "db,web , rust"]);
        assert_eq!(summary.tags, vec!["web", "rust", "db"]);
        assert_eq!(summary.tag_counts["web"], 3);
        assert_eq!(summary.tag_counts["rust"], 2);
        assert_eq!(summary.tag_counts["db"], 1);
    }

    #[test]
    fn tag_summary_skips_blank_entries() {
        let summary = TagSummary::from_tag_strings(["", " , ,", "a,"]);
        assert_eq!(summary.tags, vec!["a"]);
    }

    #[test]
    fn user_dto_drops_password_hash() {
        let user = User {
            id: Uuid::new_v4(),
            email: "a@example.com".into(),
            password_hash: "secret".into(),
            name: None,
            created_at: Utc::now(),
        };
        let json = serde_json::to_value(UserDto::from(user)).unwrap();
        assert!(json.get("password_hash").is_none());
        assert_eq!(json["email"], "a@example.com");
    }
}
