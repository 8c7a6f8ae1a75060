use std::sync::Arc;

use crate::{
    error::AppResult,
    models::{CatalogEntry, CatalogOrder, CatalogQuery},
    services::providers::CatalogStore,
};

/// Catalog snapshot loader
///
/// Fetches the bounded, most-liked slice of the catalog the assistant's
/// context is built from. Read-only; failures surface as
/// `SnapshotUnavailable` so callers degrade deliberately instead of chatting
/// against a silently empty catalog.
pub async fn load_snapshot(
    store: Arc<dyn CatalogStore>,
    max_entries: u32,
) -> AppResult<Vec<CatalogEntry>> {
    let query = CatalogQuery {
        limit: max_entries,
        order: CatalogOrder::Likes,
        ..Default::default()
    };
    let page = store.fetch_entries(&query).await?;

    tracing::debug!(entries = page.entries.len(), "Catalog snapshot loaded");
    Ok(page.entries)
}
