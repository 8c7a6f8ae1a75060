use axum::{
    body::Body,
    extract::Request,
    http::HeaderValue,
    middleware::Next,
    response::Response,
};
use uuid::Uuid;

/// HTTP header carrying the chat session id
pub const CHAT_SESSION_HEADER: &str = "x-chat-session";

/// Extension type keying conversational memory and the query quota.
///
/// Unlike a plain correlation id, this value is load-bearing: the session
/// registry hands back the same model exchange and counters for it on every
/// request, so the client must echo the header across a conversation.
#[derive(Clone, Copy, Debug)]
pub struct SessionId(pub Uuid);

impl SessionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for SessionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Middleware that adopts the caller's `x-chat-session` id or mints a fresh
/// one, stores it in the request extensions, and echoes it on the response
/// so the browser can keep the conversation going.
pub async fn session_id_middleware(mut request: Request, next: Next) -> Response {
    let session_id = request
        .headers()
        .get(CHAT_SESSION_HEADER)
        .and_then(|h| h.to_str().ok())
        .and_then(|s| Uuid::parse_str(s).ok())
        .map(SessionId)
        .unwrap_or_default();

    request.extensions_mut().insert(session_id);

    let mut response = next.run(request).await;

    if let Ok(header_value) = HeaderValue::from_str(&session_id.to_string()) {
        response
            .headers_mut()
            .insert(CHAT_SESSION_HEADER, header_value);
    }

    response
}

/// Tracing span maker that tags requests with their session id
pub fn make_span_with_session_id(request: &Request<Body>) -> tracing::Span {
    let session_id = request
        .extensions()
        .get::<SessionId>()
        .map(|id| id.to_string())
        .unwrap_or_else(|| "unknown".to_string());

    tracing::info_span!(
        "http_request",
        method = %request.method(),
        uri = %request.uri(),
        session_id = %session_id,
    )
}
