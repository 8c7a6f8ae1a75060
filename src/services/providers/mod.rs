/// External-service provider abstractions
///
/// Every managed service the application delegates to sits behind a trait:
/// the document store holding the catalog, the identity toolkit verifying
/// viewer tokens, and the generative-language API backing the assistant.
/// Handlers and services only ever see these traits, so tests swap in mocks
/// and the pipeline stays independent of any one vendor's wire format.
use crate::{
    error::AppResult,
    models::{CatalogEntry, CatalogPage, CatalogQuery, Comment, UserInfo},
};

pub mod firestore;
pub mod gemini;
pub mod identity;

/// Read/write access to the external catalog document store
///
/// Reads are bounded queries with equality filters and a single descending
/// order field. Writes replace a whole array field at a time; the store has
/// no server-side append, so callers do read-modify-write and accept the
/// race window.
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait CatalogStore: Send + Sync {
    /// Run a bounded catalog query
    async fn fetch_entries(&self, query: &CatalogQuery) -> AppResult<CatalogPage>;

    /// Fetch a single entry by id; `None` when the document does not exist
    async fn fetch_entry(&self, id: &str) -> AppResult<Option<CatalogEntry>>;

    /// Replace an entry's `likes` array wholesale
    async fn replace_likes(&self, id: &str, likes: &[String]) -> AppResult<()>;

    /// Replace an entry's `comments` array wholesale
    async fn replace_comments(&self, id: &str, comments: &[Comment]) -> AppResult<()>;
}

/// Token verification against the external identity provider
///
/// The application never mints or refreshes tokens; a verified uid is its
/// only authentication signal.
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait IdentityProvider: Send + Sync {
    async fn verify(&self, id_token: &str) -> AppResult<UserInfo>;
}

/// Factory for conversational model sessions
///
/// `start_session` is local construction (history lives client-side), so it
/// is infallible; the first `send` carries all the network risk. The session
/// registry guarantees it runs exactly once per chat session.
#[cfg_attr(test, mockall::automock)]
pub trait LanguageModel: Send + Sync {
    fn start_session(&self) -> Box<dyn ModelSession>;

    /// Model name for logging
    fn name(&self) -> &'static str;
}

/// An append-only conversational exchange with the model
///
/// Implementations keep their own ordered history and fold every prompt into
/// it; callers only ever push prompts in and get raw text back. A failed
/// `send` must leave the history untouched so the session stays usable.
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait ModelSession: Send + Sync {
    async fn send(&self, prompt: &str) -> AppResult<String>;
}
