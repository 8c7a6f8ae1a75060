use tokio::sync::{Mutex, MutexGuard};

use crate::services::providers::ModelSession;

/// Per-session chat state: the conversational model handle plus counters.
///
/// The model exchange is created exactly once per session (the registry's
/// get-or-create guarantees it) and discarded with the session. Counters
/// never persist; a fresh session starts from zero.
pub struct ChatSession {
    model: Box<dyn ModelSession>,
    state: Mutex<TurnState>,
}

#[derive(Debug, Default)]
pub struct TurnState {
    /// Completed model calls this session has spent
    pub queries_used: u32,
    next_message_id: u64,
}

impl TurnState {
    pub fn next_message_id(&mut self) -> u64 {
        self.next_message_id += 1;
        self.next_message_id
    }
}

impl ChatSession {
    pub fn new(model: Box<dyn ModelSession>) -> Self {
        Self {
            model,
            state: Mutex::new(TurnState::default()),
        }
    }

    pub fn model(&self) -> &dyn ModelSession {
        self.model.as_ref()
    }

    /// Takes the turn lock. Held across the whole pipeline pass, which
    /// serializes turns and makes at-most-one-in-flight a hard guarantee
    /// rather than a UI courtesy.
    pub async fn begin_turn(&self) -> MutexGuard<'_, TurnState> {
        self.state.lock().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::providers::MockModelSession;

    #[tokio::test]
    async fn test_message_ids_are_monotonic() {
        let session = ChatSession::new(Box::new(MockModelSession::new()));
        let mut turn = session.begin_turn().await;
        assert_eq!(turn.next_message_id(), 1);
        assert_eq!(turn.next_message_id(), 2);
        drop(turn);

        let mut turn = session.begin_turn().await;
        assert_eq!(turn.next_message_id(), 3);
    }
}
