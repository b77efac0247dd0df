//! Transport-only client primitives for an OpenAI-compatible completion
//! service.
//!
//! This crate owns request/response building and parsing for the chat
//! completions, legacy completions, and image generations endpoints. It
//! intentionally contains no conversation state, no retry policy (every call
//! is a single attempt), and no user-facing message wording.

pub mod client;
pub mod config;
pub mod error;
pub mod headers;
pub mod payload;
pub mod url;

pub use client::OpenAiApiClient;
pub use config::OpenAiApiConfig;
pub use error::{parse_error_message, OpenAiApiError};
pub use payload::{
    ChatCompletionRequest, ChatCompletionResponse, CompletionRequest, CompletionResponse,
    ImageGenerationRequest, ImageGenerationResponse, WireMessage,
};
pub use url::{chat_completions_url, completions_url, image_generations_url, normalize_base_url, DEFAULT_OPENAI_BASE_URL};
