use std::sync::Arc;

use chrono::Utc;
use uuid::Uuid;

use crate::{
    error::{AppError, AppResult},
    models::{CatalogEntry, CatalogOrder, CatalogPage, CatalogQuery, Comment, UserInfo},
    services::providers::CatalogStore,
};

const DEFAULT_PAGE_SIZE: u32 = 24;
const MAX_PAGE_SIZE: u32 = 50;
const SEARCH_SCAN_LIMIT: u32 = 100;
const MAX_COMMENT_LEN: usize = 2000;

/// Runs a bounded, filterable catalog read
pub async fn browse(store: Arc<dyn CatalogStore>, mut query: CatalogQuery) -> AppResult<CatalogPage> {
    if query.limit == 0 {
        query.limit = DEFAULT_PAGE_SIZE;
    }
    query.limit = query.limit.min(MAX_PAGE_SIZE);
    store.fetch_entries(&query).await
}

/// Fetches a single entry, failing with `NotFound` when it does not exist
pub async fn find(store: Arc<dyn CatalogStore>, id: &str) -> AppResult<CatalogEntry> {
    store
        .fetch_entry(id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("no catalog entry {}", id)))
}

/// Case-insensitive name search over a bounded recent slice of the catalog
///
/// The store has no text-search operator, so this scans the most recent
/// uploads and filters locally, the same way the browsing UI always has.
pub async fn search(
    store: Arc<dyn CatalogStore>,
    query: &str,
    limit: u32,
) -> AppResult<Vec<CatalogEntry>> {
    if query.trim().is_empty() {
        return Err(AppError::InvalidInput(
            "Search query cannot be empty".to_string(),
        ));
    }

    let scan = CatalogQuery {
        limit: SEARCH_SCAN_LIMIT,
        order: CatalogOrder::UploadDate,
        ..Default::default()
    };
    let page = store.fetch_entries(&scan).await?;

    let needle = query.trim().to_lowercase();
    let matches: Vec<CatalogEntry> = page
        .entries
        .into_iter()
        .filter(|entry| entry.name.to_lowercase().contains(&needle))
        .take(limit.min(MAX_PAGE_SIZE) as usize)
        .collect();

    tracing::info!(query = %query, results = matches.len(), "Catalog search completed");
    Ok(matches)
}

/// Result of a like toggle
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LikeOutcome {
    pub liked: bool,
    pub like_count: usize,
}

/// Adds or removes the viewer's like on an entry
///
/// Read-modify-write of the whole array; the store has no atomic append, so
/// two concurrent toggles can race. Accepted.
pub async fn toggle_like(
    store: Arc<dyn CatalogStore>,
    id: &str,
    uid: &str,
) -> AppResult<LikeOutcome> {
    let entry = find(store.clone(), id).await?;

    let mut likes = entry.likes;
    let liked = match likes.iter().position(|l| l == uid) {
        Some(pos) => {
            likes.remove(pos);
            false
        }
        None => {
            likes.push(uid.to_string());
            true
        }
    };

    store.replace_likes(id, &likes).await?;

    tracing::info!(entry_id = %id, liked, like_count = likes.len(), "Like toggled");
    Ok(LikeOutcome {
        liked,
        like_count: likes.len(),
    })
}

/// Appends a viewer comment, newest-first, rewriting the whole array
pub async fn add_comment(
    store: Arc<dyn CatalogStore>,
    id: &str,
    author: &UserInfo,
    text: &str,
) -> AppResult<Comment> {
    let text = text.trim();
    if text.is_empty() {
        return Err(AppError::InvalidInput("Comment cannot be empty".to_string()));
    }
    if text.len() > MAX_COMMENT_LEN {
        return Err(AppError::InvalidInput(format!(
            "Comment exceeds {} characters",
            MAX_COMMENT_LEN
        )));
    }

    let entry = find(store.clone(), id).await?;

    let comment = Comment {
        id: Uuid::new_v4().to_string(),
        author_id: author.uid.clone(),
        author_label: author.label().to_string(),
        text: text.to_string(),
        posted_at: Utc::now(),
    };

    let mut comments = entry.comments;
    comments.insert(0, comment.clone());
    store.replace_comments(id, &comments).await?;

    tracing::info!(entry_id = %id, comments = comments.len(), "Comment appended");
    Ok(comment)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::test_support::entry;
    use crate::services::providers::MockCatalogStore;

    fn viewer() -> UserInfo {
        UserInfo {
            uid: "u1".to_string(),
            email: "viewer@example.com".to_string(),
            display_name: Some("Viewer".to_string()),
        }
    }

    #[tokio::test]
    async fn test_browse_applies_default_and_max_limits() {
        let mut store = MockCatalogStore::new();
        store
            .expect_fetch_entries()
            .withf(|query| query.limit == DEFAULT_PAGE_SIZE)
            .times(1)
            .returning(|_| Ok(CatalogPage { entries: vec![], next_cursor: None }));
        store
            .expect_fetch_entries()
            .withf(|query| query.limit == MAX_PAGE_SIZE)
            .times(1)
            .returning(|_| Ok(CatalogPage { entries: vec![], next_cursor: None }));

        let store = Arc::new(store);
        browse(store.clone(), CatalogQuery::default()).await.unwrap();
        browse(
            store,
            CatalogQuery {
                limit: 500,
                ..Default::default()
            },
        )
        .await
        .unwrap();
    }

    #[tokio::test]
    async fn test_find_maps_missing_entry_to_not_found() {
        let mut store = MockCatalogStore::new();
        store.expect_fetch_entry().returning(|_| Ok(None));

        let result = find(Arc::new(store), "missing").await;
        assert!(matches!(result, Err(AppError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_search_rejects_empty_query() {
        let store = MockCatalogStore::new();
        let result = search(Arc::new(store), "   ", 10).await;
        assert!(matches!(result, Err(AppError::InvalidInput(_))));
    }

    #[tokio::test]
    async fn test_search_filters_case_insensitively() {
        let mut store = MockCatalogStore::new();
        store.expect_fetch_entries().returning(|_| {
            Ok(CatalogPage {
                entries: vec![
                    entry("m1", "Nova", 9.0),
                    entry("m2", "Space Odyssey", 8.0),
                    entry("m3", "Supernova Rising", 7.0),
                ],
                next_cursor: None,
            })
        });

        let matches = search(Arc::new(store), "NOVA", 10).await.unwrap();
        let ids: Vec<&str> = matches.iter().map(|e| e.id.as_str()).collect();
        assert_eq!(ids, vec!["m1", "m3"]);
    }

    #[tokio::test]
    async fn test_toggle_like_adds_then_removes() {
        let mut liked_entry = entry("m1", "Nova", 9.0);
        liked_entry.likes = vec!["u1".to_string()];

        let mut store = MockCatalogStore::new();
        let plain = entry("m1", "Nova", 9.0);
        store
            .expect_fetch_entry()
            .times(1)
            .returning(move |_| Ok(Some(plain.clone())));
        store
            .expect_replace_likes()
            .withf(|_, likes| likes == ["u1".to_string()])
            .times(1)
            .returning(|_, _| Ok(()));

        let outcome = toggle_like(Arc::new(store), "m1", "u1").await.unwrap();
        assert!(outcome.liked);
        assert_eq!(outcome.like_count, 1);

        let mut store = MockCatalogStore::new();
        store
            .expect_fetch_entry()
            .times(1)
            .returning(move |_| Ok(Some(liked_entry.clone())));
        store
            .expect_replace_likes()
            .withf(|_, likes| likes.is_empty())
            .times(1)
            .returning(|_, _| Ok(()));

        let outcome = toggle_like(Arc::new(store), "m1", "u1").await.unwrap();
        assert!(!outcome.liked);
        assert_eq!(outcome.like_count, 0);
    }

    #[tokio::test]
    async fn test_add_comment_prepends() {
        let mut existing = entry("m1", "Nova", 9.0);
        existing.comments = vec![Comment {
            id: "c1".to_string(),
            author_id: "u9".to_string(),
            author_label: "old@example.com".to_string(),
            text: "first!".to_string(),
            posted_at: Utc::now(),
        }];

        let mut store = MockCatalogStore::new();
        store
            .expect_fetch_entry()
            .returning(move |_| Ok(Some(existing.clone())));
        store
            .expect_replace_comments()
            .withf(|_, comments| comments.len() == 2 && comments[0].text == "great movie")
            .times(1)
            .returning(|_, _| Ok(()));

        let comment = add_comment(Arc::new(store), "m1", &viewer(), "great movie")
            .await
            .unwrap();
        assert_eq!(comment.author_label, "Viewer");
        assert_eq!(comment.author_id, "u1");
    }

    #[tokio::test]
    async fn test_add_comment_rejects_blank_text() {
        let store = MockCatalogStore::new();
        let result = add_comment(Arc::new(store), "m1", &viewer(), "  \n ").await;
        assert!(matches!(result, Err(AppError::InvalidInput(_))));
    }
}
