//! Fixed meta-command phrase sets and per-kind cache keys.
//!
//! Matching is exact string equality against closed sets, checked after alias
//! substitution. Substring or fuzzy matching would swallow genuine prompts
//! that merely contain one of these phrases.

/// Phrases that ask for the real error behind the last failed request.
pub const ERROR_REPLAY_PROMPTS: [&str; 8] = [
    "wtf",
    "what does that even mean?",
    "what does that even mean",
    "shut up and tell me what this means",
    "tell me what this means",
    "show error",
    "show service error",
    "show the real error",
];

/// Phrases that wipe the conversation history.
pub const CLEAR_LOG_PROMPTS: [&str; 15] = [
    "clear log",
    "clear history",
    "clear chat",
    "clear chat log",
    "delete history",
    "delete log",
    "erase log",
    "forget me",
    "forget everything",
    "forget everything i said",
    "forget everything i said to you",
    "remove log",
    "remove history",
    "remove chat",
    "remove chat log",
];

#[must_use]
pub fn is_error_replay_prompt(prompt: &str) -> bool {
    ERROR_REPLAY_PROMPTS.contains(&prompt)
}

#[must_use]
pub fn is_clear_log_prompt(prompt: &str) -> bool {
    CLEAR_LOG_PROMPTS.contains(&prompt)
}

/// Kind of remote request an invocation performs. Each kind tracks its own
/// last-outcome flag in the request-state cache.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestKind {
    Chat,
    TextCompletion,
    ImageGeneration,
}

impl RequestKind {
    #[must_use]
    pub fn success_flag_key(self) -> &'static str {
        match self {
            Self::Chat => "last_chat_request_successful",
            Self::TextCompletion => "last_text_completion_request_successful",
            Self::ImageGeneration => "last_image_generation_request_successful",
        }
    }
}
