//! Conversation state and context assembly for a launcher-driven assistant.
//!
//! Each launcher invocation is one short-lived process; everything that must
//! survive between invocations lives in the `conversation_store` ports. This
//! crate owns the per-invocation policy: alias substitution, meta-command
//! interception, context windowing, pre-flight parameter validation, failure
//! translation, and the engine that wires one request end to end.
//!
//! Conversation memory contract: the engine replays the chronological tail of
//! the turn log on every chat request and appends exactly one new turn per
//! request, failed calls included, so the log always reflects what the user
//! saw.

pub mod aliases;
pub mod commands;
pub mod config;
pub mod context;
pub mod engine;
pub mod translate;

pub use aliases::AliasResolver;
pub use commands::{is_clear_log_prompt, is_error_replay_prompt, RequestKind};
pub use config::Config;
pub use context::{build_context, ContextPolicy};
pub use engine::{Engine, EngineError, CLEAR_ACK, STORED_QUERY_KEY};
pub use translate::{user_message, validate_params, ModelClass, SAFETY_REJECTION_MARKER};
