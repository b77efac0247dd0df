//! Context window assembly.
//!
//! The window is a fixed count of trailing turns, never a token budget or a
//! relevance search; callers keep `history_window` small enough for the
//! remote model's context limit.

use completion_provider::ChatMessage;
use conversation_store::{StoreError, TurnStore, UNLOCK_ACK};

/// Per-request context assembly settings, borrowed from the configuration.
#[derive(Debug, Clone, Copy)]
pub struct ContextPolicy<'a> {
    pub history_window: usize,
    pub unlock_phrase: Option<&'a str>,
    pub unlock_enabled: bool,
    pub system_prompt: &'a str,
}

/// Builds the ordered message list for one chat request:
///
/// 1. one system message (possibly empty),
/// 2. the last `history_window` turns as user/assistant pairs, skipping any
///    turn whose user text equals the unlock phrase so the unlock exchange is
///    never replayed twice,
/// 3. when unlocking is enabled, one synthetic unlock exchange,
/// 4. the new user prompt.
pub fn build_context(
    store: &dyn TurnStore,
    prompt: &str,
    policy: &ContextPolicy<'_>,
) -> Result<Vec<ChatMessage>, StoreError> {
    let mut messages = vec![ChatMessage::system(policy.system_prompt)];

    for turn in store.read_recent(policy.history_window)? {
        if policy.unlock_phrase == Some(turn.user_text.as_str()) {
            continue;
        }

        messages.push(ChatMessage::user(turn.user_text));
        messages.push(ChatMessage::assistant(turn.assistant_text));
    }

    if policy.unlock_enabled {
        if let Some(phrase) = policy.unlock_phrase {
            messages.push(ChatMessage::user(phrase));
            messages.push(ChatMessage::assistant(UNLOCK_ACK));
        }
    }

    messages.push(ChatMessage::user(prompt));
    Ok(messages)
}
