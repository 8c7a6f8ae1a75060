/// Document store provider (Firestore REST)
///
/// All catalog persistence is delegated here. Raw documents carry typed
/// value wrappers and may omit fields freely; this module is the one place
/// that flattens them into fully-populated [`CatalogEntry`] values, so the
/// rest of the crate never sees a half-present record.
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use chrono::{DateTime, Utc};
use reqwest::Client as HttpClient;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::collections::HashMap;

use crate::{
    error::{AppError, AppResult},
    models::{
        CatalogEntry, CatalogOrder, CatalogPage, CatalogQuery, Comment, PLACEHOLDER_THUMBNAIL,
    },
    services::providers::CatalogStore,
};

#[derive(Clone)]
pub struct FirestoreCatalog {
    http_client: HttpClient,
    api_url: String,
    project_id: String,
    collection: String,
    api_key: String,
}

impl FirestoreCatalog {
    pub fn new(api_url: String, project_id: String, collection: String, api_key: String) -> Self {
        Self {
            http_client: HttpClient::new(),
            api_url,
            project_id,
            collection,
            api_key,
        }
    }

    fn documents_root(&self) -> String {
        format!("projects/{}/databases/(default)/documents", self.project_id)
    }

    fn document_name(&self, id: &str) -> String {
        format!("{}/{}/{}", self.documents_root(), self.collection, id)
    }

    /// Builds the structured query body for a bounded catalog read
    fn build_query(&self, query: &CatalogQuery) -> AppResult<Value> {
        let mut filters = Vec::new();
        if let Some(category) = &query.category {
            filters.push(equality_filter("category", json!({ "stringValue": category })));
        }
        if let Some(is_series) = query.is_series {
            filters.push(equality_filter("isSeries", json!({ "booleanValue": is_series })));
        }
        if let Some(coming_soon) = query.coming_soon {
            filters.push(equality_filter("comingSoon", json!({ "booleanValue": coming_soon })));
        }

        let mut structured = json!({
            "from": [{ "collectionId": self.collection }],
            "orderBy": [
                { "field": { "fieldPath": order_field_path(query.order) }, "direction": "DESCENDING" },
                { "field": { "fieldPath": "__name__" }, "direction": "DESCENDING" },
            ],
            "limit": query.limit,
        });

        match filters.len() {
            0 => {}
            1 => {
                structured["where"] = filters.remove(0);
            }
            _ => {
                structured["where"] = json!({
                    "compositeFilter": { "op": "AND", "filters": filters }
                });
            }
        }

        if let Some(cursor) = &query.cursor {
            let cursor = decode_cursor(cursor)?;
            // before=false makes the cursor position exclusive
            structured["startAt"] = json!({
                "values": [
                    serde_json::to_value(&cursor.order_value)
                        .map_err(|e| AppError::Internal(e.to_string()))?,
                    { "referenceValue": cursor.doc_name },
                ],
                "before": false,
            });
        }

        Ok(json!({ "structuredQuery": structured }))
    }
}

#[async_trait::async_trait]
impl CatalogStore for FirestoreCatalog {
    async fn fetch_entries(&self, query: &CatalogQuery) -> AppResult<CatalogPage> {
        let url = format!(
            "{}/{}:runQuery?key={}",
            self.api_url,
            self.documents_root(),
            self.api_key
        );
        let body = self.build_query(query)?;

        let response = self
            .http_client
            .post(&url)
            .json(&body)
            .send()
            .await
            .map_err(|e| AppError::SnapshotUnavailable(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            // Rejected queries (e.g. a missing composite index) land here and
            // must reach the caller instead of silently emptying the catalog.
            return Err(AppError::SnapshotUnavailable(format!(
                "store returned status {}: {}",
                status, body
            )));
        }

        let items: Vec<RunQueryItem> = response
            .json()
            .await
            .map_err(|e| AppError::SnapshotUnavailable(e.to_string()))?;

        let documents: Vec<Document> = items.into_iter().filter_map(|i| i.document).collect();

        let next_cursor = if documents.len() as u32 >= query.limit {
            documents
                .last()
                .map(|doc| encode_cursor(doc, query.order))
        } else {
            None
        };

        let entries: Vec<CatalogEntry> = documents.iter().map(entry_from_document).collect();

        tracing::info!(
            results = entries.len(),
            order = ?query.order,
            provider = "firestore",
            "Catalog query completed"
        );

        Ok(CatalogPage { entries, next_cursor })
    }

    async fn fetch_entry(&self, id: &str) -> AppResult<Option<CatalogEntry>> {
        let url = format!(
            "{}/{}?key={}",
            self.api_url,
            self.document_name(id),
            self.api_key
        );

        let response = self
            .http_client
            .get(&url)
            .send()
            .await
            .map_err(|e| AppError::SnapshotUnavailable(e.to_string()))?;

        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::SnapshotUnavailable(format!(
                "store returned status {}: {}",
                status, body
            )));
        }

        let document: Document = response
            .json()
            .await
            .map_err(|e| AppError::SnapshotUnavailable(e.to_string()))?;

        Ok(Some(entry_from_document(&document)))
    }

    async fn replace_likes(&self, id: &str, likes: &[String]) -> AppResult<()> {
        let values: Vec<Value> = likes.iter().map(|l| json!({ "stringValue": l })).collect();
        let fields = json!({ "likes": { "arrayValue": { "values": values } } });
        self.patch_field(id, "likes", fields).await
    }

    async fn replace_comments(&self, id: &str, comments: &[Comment]) -> AppResult<()> {
        let values: Vec<Value> = comments.iter().map(comment_to_value).collect();
        let fields = json!({ "comments": { "arrayValue": { "values": values } } });
        self.patch_field(id, "comments", fields).await
    }
}

impl FirestoreCatalog {
    /// Whole-field replace via PATCH with an update mask
    async fn patch_field(&self, id: &str, field: &str, fields: Value) -> AppResult<()> {
        let url = format!(
            "{}/{}?updateMask.fieldPaths={}&key={}",
            self.api_url,
            self.document_name(id),
            field,
            self.api_key
        );

        let response = self
            .http_client
            .patch(&url)
            .json(&json!({ "fields": fields }))
            .send()
            .await
            .map_err(|e| AppError::ExternalApi(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::ExternalApi(format!(
                "store write returned status {}: {}",
                status, body
            )));
        }

        tracing::info!(entry_id = %id, field = %field, provider = "firestore", "Catalog field replaced");
        Ok(())
    }
}

fn equality_filter(path: &str, value: Value) -> Value {
    json!({
        "fieldFilter": {
            "field": { "fieldPath": path },
            "op": "EQUAL",
            "value": value,
        }
    })
}

fn order_field_path(order: CatalogOrder) -> &'static str {
    match order {
        CatalogOrder::UploadDate => "uploadDate",
        CatalogOrder::Rating => "rating",
        CatalogOrder::Likes => "likes",
    }
}

// ============================================================================
// Wire types
// ============================================================================

/// One streamed result of a structured query; bare read-time items carry no
/// document
#[derive(Debug, Deserialize)]
struct RunQueryItem {
    #[serde(default)]
    document: Option<Document>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct Document {
    name: String,
    #[serde(default)]
    fields: HashMap<String, DocValue>,
}

/// A typed store value; exactly one variant field is populated per value
///
/// Integers travel as strings on the wire, and dates show up either as
/// timestamp values or as plain RFC 3339 strings depending on which client
/// wrote the document, so the accessors absorb both shapes.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DocValue {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    string_value: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    integer_value: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    double_value: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    boolean_value: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    timestamp_value: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    array_value: Option<ArrayValue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    map_value: Option<MapValue>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct ArrayValue {
    #[serde(default)]
    values: Vec<DocValue>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct MapValue {
    #[serde(default)]
    fields: HashMap<String, DocValue>,
}

impl DocValue {
    fn as_str(&self) -> Option<&str> {
        self.string_value.as_deref()
    }

    fn as_f64(&self) -> Option<f64> {
        self.double_value
            .or_else(|| self.integer_value.as_ref().and_then(|i| i.parse().ok()))
    }

    fn as_bool(&self) -> Option<bool> {
        self.boolean_value
    }

    fn as_datetime(&self) -> Option<DateTime<Utc>> {
        self.timestamp_value.or_else(|| {
            self.string_value
                .as_deref()
                .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
                .map(|d| d.with_timezone(&Utc))
        })
    }

    fn as_array(&self) -> &[DocValue] {
        self.array_value.as_ref().map(|a| a.values.as_slice()).unwrap_or(&[])
    }

    fn as_map(&self) -> Option<&HashMap<String, DocValue>> {
        self.map_value.as_ref().map(|m| &m.fields)
    }
}

// ============================================================================
// Normalization
// ============================================================================

fn field<'a>(doc: &'a Document, name: &str) -> Option<&'a DocValue> {
    doc.fields.get(name)
}

fn string_or(doc: &Document, name: &str, default: &str) -> String {
    field(doc, name)
        .and_then(DocValue::as_str)
        .unwrap_or(default)
        .to_string()
}

fn opt_string(doc: &Document, name: &str) -> Option<String> {
    field(doc, name)
        .and_then(DocValue::as_str)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

/// Flattens a raw document into a fully-populated catalog entry
fn entry_from_document(doc: &Document) -> CatalogEntry {
    let id = doc.name.rsplit('/').next().unwrap_or(&doc.name).to_string();

    let mut likes: Vec<String> = Vec::new();
    for value in field(doc, "likes").map(DocValue::as_array).unwrap_or(&[]) {
        if let Some(uid) = value.as_str() {
            if !likes.iter().any(|l| l == uid) {
                likes.push(uid.to_string());
            }
        }
    }

    let mut comments: Vec<Comment> = field(doc, "comments")
        .map(DocValue::as_array)
        .unwrap_or(&[])
        .iter()
        .filter_map(comment_from_value)
        .collect();
    // Newest-first convention, regardless of stored order
    comments.sort_by(|a, b| b.posted_at.cmp(&a.posted_at));

    CatalogEntry {
        id,
        name: string_or(doc, "name", "Untitled"),
        category: string_or(doc, "category", "uncategorized"),
        is_series: field(doc, "isSeries").and_then(DocValue::as_bool).unwrap_or(false),
        rating: field(doc, "rating").and_then(DocValue::as_f64).unwrap_or(0.0),
        upload_date: field(doc, "uploadDate")
            .and_then(DocValue::as_datetime)
            .unwrap_or(DateTime::<Utc>::UNIX_EPOCH),
        release_date: field(doc, "releaseDate").and_then(DocValue::as_datetime),
        coming_soon: field(doc, "comingSoon").and_then(DocValue::as_bool).unwrap_or(false),
        description: string_or(doc, "description", ""),
        watch_url: string_or(doc, "watchUrl", ""),
        download_url: opt_string(doc, "downloadUrl"),
        trailer_url: opt_string(doc, "trailerUrl"),
        thumbnail_url: string_or(doc, "thumbnailUrl", PLACEHOLDER_THUMBNAIL),
        likes,
        comments,
    }
}

fn comment_from_value(value: &DocValue) -> Option<Comment> {
    let fields = value.as_map()?;
    Some(Comment {
        id: fields.get("id").and_then(DocValue::as_str).unwrap_or_default().to_string(),
        author_id: fields.get("userId").and_then(DocValue::as_str).unwrap_or_default().to_string(),
        author_label: fields
            .get("userEmail")
            .and_then(DocValue::as_str)
            .unwrap_or("anonymous")
            .to_string(),
        text: fields.get("content").and_then(DocValue::as_str).unwrap_or_default().to_string(),
        posted_at: fields
            .get("timestamp")
            .and_then(DocValue::as_datetime)
            .unwrap_or(DateTime::<Utc>::UNIX_EPOCH),
    })
}

fn comment_to_value(comment: &Comment) -> Value {
    json!({
        "mapValue": {
            "fields": {
                "id": { "stringValue": comment.id },
                "userId": { "stringValue": comment.author_id },
                "userEmail": { "stringValue": comment.author_label },
                "content": { "stringValue": comment.text },
                "timestamp": { "timestampValue": comment.posted_at.to_rfc3339() },
            }
        }
    })
}

// ============================================================================
// Pagination cursors
// ============================================================================

/// Continuation state baked into the opaque cursor handed to clients
#[derive(Debug, Serialize, Deserialize)]
struct Cursor {
    order_value: DocValue,
    doc_name: String,
}

fn encode_cursor(doc: &Document, order: CatalogOrder) -> String {
    let cursor = Cursor {
        order_value: doc
            .fields
            .get(order_field_path(order))
            .cloned()
            .unwrap_or_default(),
        doc_name: doc.name.clone(),
    };
    let bytes = serde_json::to_vec(&cursor).unwrap_or_default();
    URL_SAFE_NO_PAD.encode(bytes)
}

fn decode_cursor(cursor: &str) -> AppResult<Cursor> {
    let bytes = URL_SAFE_NO_PAD
        .decode(cursor)
        .map_err(|_| AppError::InvalidInput("malformed cursor".to_string()))?;
    serde_json::from_slice(&bytes).map_err(|_| AppError::InvalidInput("malformed cursor".to_string()))
}
