/// The assistant pipeline.
///
/// One turn flows governor -> snapshot -> prompt -> model -> interpreter ->
/// message, strictly sequentially. Every externally-caused failure is
/// converted here into a degraded but well-formed reply; the only error a
/// caller sees is the governor's quota denial.
use std::sync::Arc;

use chrono::Utc;

use crate::{
    config::Config,
    error::{AppError, AppResult},
    models::{AssistantReply, ChatMessage, Intent, Sender, UserInfo},
    services::{providers::CatalogStore, snapshot},
};

pub mod interpreter;
pub mod prompt;
pub mod quota;
pub mod session;

use session::ChatSession;

/// Canned reply when the model cannot be reached; the turn still succeeds
pub const APOLOGY_TEXT: &str =
    "I'm sorry, I'm having trouble reaching the assistant right now. Please try again in a moment.";

/// Tunables for one pipeline pass
#[derive(Debug, Clone)]
pub struct ChatPolicy {
    pub snapshot_limit: u32,
    pub max_suggestions: usize,
    pub guest_query_limit: u32,
}

impl From<&Config> for ChatPolicy {
    fn from(config: &Config) -> Self {
        Self {
            snapshot_limit: config.snapshot_limit,
            max_suggestions: config.max_suggestions,
            guest_query_limit: config.guest_query_limit,
        }
    }
}

/// Outcome of one chat turn
#[derive(Debug)]
pub struct ChatTurn {
    pub message: ChatMessage,
    pub queries_used: u32,
    /// Set when the turn ran without catalog context (store read failed)
    pub catalog_unavailable: bool,
}

/// Runs one assistant turn for this session.
pub async fn respond(
    store: Arc<dyn CatalogStore>,
    session: &ChatSession,
    policy: &ChatPolicy,
    user_message: &str,
    viewer: Option<&UserInfo>,
) -> AppResult<ChatTurn> {
    let mut turn = session.begin_turn().await;

    if quota::admit(viewer.is_some(), turn.queries_used, policy.guest_query_limit)
        == quota::Admission::Deny
    {
        return Err(AppError::QuotaExceeded {
            used: turn.queries_used,
            limit: policy.guest_query_limit,
        });
    }

    let (entries, catalog_unavailable) =
        match snapshot::load_snapshot(store, policy.snapshot_limit).await {
            Ok(entries) => (entries, false),
            Err(AppError::SnapshotUnavailable(reason)) => {
                tracing::warn!(%reason, "Running chat turn without catalog context");
                (Vec::new(), true)
            }
            Err(e) => return Err(e),
        };

    let compiled = prompt::compile(
        prompt::ASSISTANT_TEMPLATE,
        &entries,
        user_message,
        viewer.map(|v| v.label()),
        policy.max_suggestions,
    );

    let reply = match session.model().send(&compiled).await {
        Ok(raw) => {
            // A completed round-trip is the only thing that consumes quota.
            turn.queries_used += 1;
            interpreter::interpret(&raw, &entries, policy.max_suggestions)
        }
        Err(AppError::ModelUnavailable(reason)) => {
            tracing::warn!(%reason, "Model call failed; replying with apology");
            AssistantReply {
                text: APOLOGY_TEXT.to_string(),
                matched_entries: Vec::new(),
                intent: Intent::General,
            }
        }
        Err(e) => return Err(e),
    };

    tracing::info!(
        intent = ?reply.intent,
        matched = reply.matched_entries.len(),
        queries_used = turn.queries_used,
        "Chat turn completed"
    );

    let message = to_message(reply, turn.next_message_id());
    Ok(ChatTurn {
        message,
        queries_used: turn.queries_used,
        catalog_unavailable,
    })
}

/// Presentation adapter: interpreted tuple to a message-list item
fn to_message(reply: AssistantReply, id: u64) -> ChatMessage {
    ChatMessage {
        id,
        text: reply.text,
        sender: Sender::Assistant,
        sent_at: Utc::now(),
        matched_entries: reply.matched_entries,
        intent: Some(reply.intent),
    }
}
