use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Thumbnail substituted when an entry has none
pub const PLACEHOLDER_THUMBNAIL: &str = "/placeholder.svg";

/// A single catalog entry (movie or series episode bundle)
///
/// Produced by the store provider as a fully-populated value: every field
/// that may be absent in a raw document resolves to a documented default at
/// decode time, so downstream code never branches on missing data.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CatalogEntry {
    pub id: String,
    pub name: String,
    pub category: String,
    pub is_series: bool,
    /// 0-10 viewer rating
    pub rating: f64,
    pub upload_date: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub release_date: Option<DateTime<Utc>>,
    pub coming_soon: bool,
    pub description: String,
    pub watch_url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub download_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trailer_url: Option<String>,
    pub thumbnail_url: String,
    /// User ids that liked this entry; contains no duplicates
    pub likes: Vec<String>,
    /// Newest-first
    pub comments: Vec<Comment>,
}

impl CatalogEntry {
    pub fn like_count(&self) -> usize {
        self.likes.len()
    }

    pub fn is_liked_by(&self, uid: &str) -> bool {
        self.likes.iter().any(|l| l == uid)
    }
}

/// A viewer comment on a catalog entry; never mutated after creation
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Comment {
    pub id: String,
    pub author_id: String,
    pub author_label: String,
    pub text: String,
    pub posted_at: DateTime<Utc>,
}

/// One page of catalog results with an opaque continuation cursor
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogPage {
    pub entries: Vec<CatalogEntry>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_cursor: Option<String>,
}

/// Single field the store can order a catalog read by (always descending)
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum CatalogOrder {
    #[default]
    UploadDate,
    Rating,
    Likes,
}

/// Bounded catalog read with optional equality filters
#[derive(Debug, Clone, Default)]
pub struct CatalogQuery {
    pub limit: u32,
    pub order: CatalogOrder,
    pub category: Option<String>,
    pub is_series: Option<bool>,
    pub coming_soon: Option<bool>,
    pub cursor: Option<String>,
}

/// Verified viewer identity, as reported by the identity provider
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserInfo {
    pub uid: String,
    pub email: String,
    pub display_name: Option<String>,
}

impl UserInfo {
    /// Label shown next to comments and substituted into prompts
    pub fn label(&self) -> &str {
        self.display_name.as_deref().unwrap_or(&self.email)
    }
}

/// Who authored a chat message
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Sender {
    User,
    Assistant,
}

/// What the assistant decided the turn was about
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Intent {
    Search,
    General,
    Identity,
}

/// Interpreted pipeline output: reply text plus any resolved catalog entries
#[derive(Debug, Clone, PartialEq)]
pub struct AssistantReply {
    pub text: String,
    pub matched_entries: Vec<CatalogEntry>,
    pub intent: Intent,
}

/// A chat turn as shown in the message list; session-scoped, never persisted
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatMessage {
    /// Monotonic within one chat session
    pub id: u64,
    pub text: String,
    pub sender: Sender,
    pub sent_at: DateTime<Utc>,
    #[serde(default)]
    pub matched_entries: Vec<CatalogEntry>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub intent: Option<Intent>,
}

#[cfg(test)]
pub mod test_support {
    use super::*;

    /// Builds a catalog entry with sensible defaults for tests
    pub fn entry(id: &str, name: &str, rating: f64) -> CatalogEntry {
        CatalogEntry {
            id: id.to_string(),
            name: name.to_string(),
            category: "action".to_string(),
            is_series: false,
            rating,
            upload_date: DateTime::<Utc>::UNIX_EPOCH,
            release_date: None,
            coming_soon: false,
            description: format!("About {name}"),
            watch_url: format!("https://cdn.example/{id}/watch"),
            download_url: None,
            trailer_url: None,
            thumbnail_url: PLACEHOLDER_THUMBNAIL.to_string(),
            likes: Vec::new(),
            comments: Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_catalog_entry_serializes_camel_case() {
        let entry = test_support::entry("m1", "Nova", 9.0);
        let json = serde_json::to_value(&entry).unwrap();
        assert_eq!(json["thumbnailUrl"], PLACEHOLDER_THUMBNAIL);
        assert_eq!(json["isSeries"], false);
        assert_eq!(json["uploadDate"], "1970-01-01T00:00:00Z");
        // Absent optionals are omitted entirely
        assert!(json.get("downloadUrl").is_none());
    }

    #[test]
    fn test_is_liked_by() {
        let mut entry = test_support::entry("m1", "Nova", 9.0);
        entry.likes = vec!["u1".to_string(), "u2".to_string()];
        assert!(entry.is_liked_by("u1"));
        assert!(!entry.is_liked_by("u3"));
        assert_eq!(entry.like_count(), 2);
    }

    #[test]
    fn test_intent_serialization() {
        assert_eq!(serde_json::to_string(&Intent::Search).unwrap(), "\"search\"");
        assert_eq!(serde_json::to_string(&Intent::Identity).unwrap(), "\"identity\"");
    }

    #[test]
    fn test_catalog_order_deserializes_from_query_values() {
        let order: CatalogOrder = serde_json::from_str("\"upload_date\"").unwrap();
        assert_eq!(order, CatalogOrder::UploadDate);
        let order: CatalogOrder = serde_json::from_str("\"likes\"").unwrap();
        assert_eq!(order, CatalogOrder::Likes);
    }

    #[test]
    fn test_user_label_prefers_display_name() {
        let user = UserInfo {
            uid: "u1".to_string(),
            email: "viewer@example.com".to_string(),
            display_name: Some("Viewer".to_string()),
        };
        assert_eq!(user.label(), "Viewer");

        let anonymous = UserInfo {
            uid: "u2".to_string(),
            email: "other@example.com".to_string(),
            display_name: None,
        };
        assert_eq!(anonymous.label(), "other@example.com");
    }
}
