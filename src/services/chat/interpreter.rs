/// Response interpreter: turns raw model text into a reply the UI can show
///
/// Two stages. Classify decides whether the text carries a structured
/// search result or is plain conversation; resolve maps the suggested
/// ids/names back onto real catalog entries, substituting a best-rated
/// fallback when nothing resolves. Malformed structure is never an error
/// here, it just downgrades to plain text.
use std::cmp::Ordering;
use std::collections::HashSet;

use serde::Deserialize;

use crate::models::{AssistantReply, CatalogEntry, Intent};

/// Reply text when suggested titles resolved to nothing
pub const NO_MATCH_TEXT: &str =
    "I couldn't find an exact match for that, but here are some of our best-rated titles:";

/// Reply text when the search payload carried no introduction of its own
pub const DEFAULT_SEARCH_TEXT: &str = "Here are some titles you might like:";

/// Last-resort reply; the final text is never empty
pub const EMPTY_REPLY_TEXT: &str =
    "I'm not sure how to answer that. Could you ask me something else about our movies?";

/// Lowercased self-referential fragments that mark an identity reply
const IDENTITY_PHRASES: &[&str] = &[
    "i am zee",
    "i'm zee",
    "zeestream's movie assistant",
    "your movie assistant",
];

/// The JSON shape the prompt instructs the model to emit for search results
#[derive(Debug, Deserialize)]
struct SearchPayload {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    text: Option<String>,
    #[serde(default)]
    movie_ids: Vec<String>,
    #[serde(default)]
    movie_names: Vec<String>,
}

/// Classification outcome; an explicit value, not a caught exception
#[derive(Debug, PartialEq)]
enum ParseOutcome {
    Search {
        text: Option<String>,
        wanted: Vec<String>,
    },
    Plain,
}

/// Interprets one raw model reply against the snapshot it was prompted with.
pub fn interpret(raw: &str, snapshot: &[CatalogEntry], max_suggestions: usize) -> AssistantReply {
    let reply = match classify(raw) {
        ParseOutcome::Search { text, wanted } => {
            let matched = resolve(&wanted, snapshot, max_suggestions);
            if matched.is_empty() {
                // Search intent with nothing resolved: substitute the
                // best-rated fallback and say so, never "I found these"
                // over an empty list.
                AssistantReply {
                    text: NO_MATCH_TEXT.to_string(),
                    matched_entries: fallback_entries(snapshot, max_suggestions),
                    intent: Intent::Search,
                }
            } else {
                AssistantReply {
                    text: text
                        .filter(|t| !t.trim().is_empty())
                        .unwrap_or_else(|| DEFAULT_SEARCH_TEXT.to_string()),
                    matched_entries: matched,
                    intent: Intent::Search,
                }
            }
        }
        ParseOutcome::Plain => {
            let text = raw.trim().to_string();
            let intent = if is_identity_text(&text) {
                Intent::Identity
            } else {
                Intent::General
            };
            AssistantReply {
                text,
                matched_entries: Vec::new(),
                intent,
            }
        }
    };

    if reply.text.trim().is_empty() {
        AssistantReply {
            text: EMPTY_REPLY_TEXT.to_string(),
            ..reply
        }
    } else {
        reply
    }
}

/// Detects the structured search marker in either of its historical forms:
/// the mandated JSON object (possibly inside a markdown fence) or a
/// double-bracketed name list.
fn classify(raw: &str) -> ParseOutcome {
    let candidate = strip_code_fence(raw);

    if candidate.starts_with('{') {
        if let Ok(payload) = serde_json::from_str::<SearchPayload>(candidate) {
            if payload.kind == "movies" {
                let mut wanted = payload.movie_ids;
                wanted.extend(payload.movie_names);
                return ParseOutcome::Search {
                    text: payload.text,
                    wanted,
                };
            }
        }
        // Present but unparsable or differently-typed JSON downgrades to
        // plain conversation.
    }

    if let Some((text, names)) = bracketed_names(raw) {
        return ParseOutcome::Search {
            text,
            wanted: names,
        };
    }

    ParseOutcome::Plain
}

/// Returns the body of a leading markdown code fence, or the trimmed input
fn strip_code_fence(raw: &str) -> &str {
    let trimmed = raw.trim();
    if let Some(rest) = trimmed.strip_prefix("```") {
        // Drop the info string line, then take everything up to the
        // closing fence.
        let body = rest.split_once('\n').map(|(_, body)| body).unwrap_or("");
        if let Some((body, _)) = body.rsplit_once("```") {
            return body.trim();
        }
    }
    trimmed
}

/// Parses the `[[Name, Name]]` marker; any text before it becomes the reply
fn bracketed_names(raw: &str) -> Option<(Option<String>, Vec<String>)> {
    let start = raw.find("[[")?;
    let end = raw[start + 2..].find("]]")? + start + 2;

    let names: Vec<String> = raw[start + 2..end]
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect();
    if names.is_empty() {
        return None;
    }

    let prefix = raw[..start].trim();
    let text = (!prefix.is_empty()).then(|| prefix.to_string());
    Some((text, names))
}

/// Maps suggested tokens back onto snapshot entries: exact id first, then
/// case-insensitive exact name. Model order, deduplicated, capped. Entries
/// outside the snapshot can never appear.
fn resolve(wanted: &[String], snapshot: &[CatalogEntry], cap: usize) -> Vec<CatalogEntry> {
    let mut seen: HashSet<&str> = HashSet::new();
    let mut matched = Vec::new();

    for token in wanted {
        if matched.len() >= cap {
            break;
        }
        let token_lower = token.to_lowercase();
        let hit = snapshot
            .iter()
            .find(|entry| entry.id == *token)
            .or_else(|| snapshot.iter().find(|entry| entry.name.to_lowercase() == token_lower));

        if let Some(entry) = hit {
            if seen.insert(entry.id.as_str()) {
                matched.push(entry.clone());
            }
        }
    }

    matched
}

/// Deterministic fallback set: best rating first, ties broken by most
/// recent upload.
pub fn fallback_entries(snapshot: &[CatalogEntry], cap: usize) -> Vec<CatalogEntry> {
    let mut ranked: Vec<&CatalogEntry> = snapshot.iter().collect();
    ranked.sort_by(|a, b| {
        b.rating
            .partial_cmp(&a.rating)
            .unwrap_or(Ordering::Equal)
            .then_with(|| b.upload_date.cmp(&a.upload_date))
    });
    ranked.into_iter().take(cap).cloned().collect()
}

fn is_identity_text(text: &str) -> bool {
    let lowered = text.to_lowercase();
    IDENTITY_PHRASES.iter().any(|phrase| lowered.contains(phrase))
}
