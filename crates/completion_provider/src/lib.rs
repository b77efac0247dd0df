//! Minimal provider-agnostic contract for executing a single completion call.
//!
//! This crate intentionally defines only the shared request shapes, the tagged
//! failure taxonomy, and the provider trait. It excludes transport details,
//! wire payloads, and persistence concerns.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Error returned while constructing/configuring a provider before any call starts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderInitError {
    message: String,
}

impl ProviderInitError {
    /// Creates a new provider initialization error.
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    /// Returns the underlying error message.
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }
}

impl fmt::Display for ProviderInitError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

impl std::error::Error for ProviderInitError {}

impl From<String> for ProviderInitError {
    fn from(message: String) -> Self {
        Self::new(message)
    }
}

impl From<&str> for ProviderInitError {
    fn from(message: &str) -> Self {
        Self::new(message)
    }
}

/// Speaker of one context message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

/// One role-tagged message in the context sent to the remote model.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    #[must_use]
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }

    #[must_use]
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    #[must_use]
    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

/// Numeric generation parameters shared by chat and legacy completion calls.
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationParams {
    pub temperature: f64,
    pub max_tokens: Option<u32>,
    pub top_p: f64,
    pub frequency_penalty: f64,
    pub presence_penalty: f64,
    pub stop: Vec<String>,
}

impl Default for GenerationParams {
    fn default() -> Self {
        Self {
            temperature: 0.0,
            max_tokens: None,
            top_p: 1.0,
            frequency_penalty: 0.0,
            presence_penalty: 0.0,
            stop: Vec::new(),
        }
    }
}

/// Input for one chat-mode call: the full ordered context plus parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct ChatRequest {
    pub model: String,
    pub messages: Vec<ChatMessage>,
    pub params: GenerationParams,
}

/// Input for one legacy single-prompt completion call.
#[derive(Debug, Clone, PartialEq)]
pub struct TextCompletionRequest {
    pub model: String,
    pub prompt: String,
    pub params: GenerationParams,
}

/// Input for one image generation call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageRequest {
    pub prompt: String,
    pub count: u32,
    pub size: u32,
}

impl ImageRequest {
    /// Single square image of the given pixel size.
    #[must_use]
    pub fn square(prompt: impl Into<String>, size: u32) -> Self {
        Self {
            prompt: prompt.into(),
            count: 1,
            size,
        }
    }
}

/// Closed set of remote-call failure categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureCategory {
    Auth,
    Rejected,
    ServiceUnavailable,
    Server,
    Connectivity,
    RateLimited,
    Timeout,
    Unknown,
}

impl FailureCategory {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Auth => "auth",
            Self::Rejected => "rejected",
            Self::ServiceUnavailable => "service_unavailable",
            Self::Server => "server",
            Self::Connectivity => "connectivity",
            Self::RateLimited => "rate_limited",
            Self::Timeout => "timeout",
            Self::Unknown => "unknown",
        }
    }
}

/// Tagged outcome of a failed remote call.
///
/// `detail` carries the raw service-side message for diagnostic recording; it
/// is never shown to the user directly.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallFailure {
    pub category: FailureCategory,
    pub detail: String,
}

impl CallFailure {
    #[must_use]
    pub fn new(category: FailureCategory, detail: impl Into<String>) -> Self {
        Self {
            category,
            detail: detail.into(),
        }
    }
}

impl fmt::Display for CallFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.detail.is_empty() {
            write!(f, "{} failure", self.category.as_str())
        } else {
            write!(f, "{} failure: {}", self.category.as_str(), self.detail)
        }
    }
}

impl std::error::Error for CallFailure {}

/// Immutable metadata describing a completion provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderProfile {
    pub provider_id: String,
}

/// Provider interface for executing one request synchronously.
///
/// Every call is a single attempt; retry policy is not a provider concern.
/// Image calls return the fetched image bytes so that callers decide file
/// placement and naming.
pub trait CompletionProvider: Send + Sync + 'static {
    /// Returns provider identity metadata.
    fn profile(&self) -> ProviderProfile;

    /// Executes one chat-mode call and returns the assistant text.
    fn chat(&self, request: ChatRequest) -> Result<String, CallFailure>;

    /// Executes one legacy single-prompt completion call.
    fn complete(&self, request: TextCompletionRequest) -> Result<String, CallFailure>;

    /// Generates one image and returns its bytes.
    fn generate_image(&self, request: ImageRequest) -> Result<Vec<u8>, CallFailure>;
}

#[cfg(test)]
mod tests {
    use super::{
        CallFailure, ChatMessage, ChatRequest, CompletionProvider, FailureCategory,
        GenerationParams, ImageRequest, ProviderInitError, ProviderProfile, Role,
        TextCompletionRequest,
    };

    struct MinimalProvider;

    impl CompletionProvider for MinimalProvider {
        fn profile(&self) -> ProviderProfile {
            ProviderProfile {
                provider_id: "minimal".to_string(),
            }
        }

        fn chat(&self, request: ChatRequest) -> Result<String, CallFailure> {
            let _ = request;
            Ok("chat".to_string())
        }

        fn complete(&self, request: TextCompletionRequest) -> Result<String, CallFailure> {
            let _ = request;
            Ok("completion".to_string())
        }

        fn generate_image(&self, request: ImageRequest) -> Result<Vec<u8>, CallFailure> {
            let _ = request;
            Ok(vec![0x89])
        }
    }

    #[test]
    fn message_constructors_tag_roles() {
        assert_eq!(ChatMessage::system("s").role, Role::System);
        assert_eq!(ChatMessage::user("u").role, Role::User);
        assert_eq!(ChatMessage::assistant("a").role, Role::Assistant);
    }

    #[test]
    fn roles_serialize_to_lowercase_wire_names() {
        let message = ChatMessage::assistant("hello");
        let value = serde_json::to_value(&message).expect("message should serialize");
        assert_eq!(value["role"], "assistant");
        assert_eq!(value["content"], "hello");
    }

    #[test]
    fn default_params_match_neutral_generation_settings() {
        let params = GenerationParams::default();
        assert_eq!(params.temperature, 0.0);
        assert_eq!(params.max_tokens, None);
        assert_eq!(params.top_p, 1.0);
        assert_eq!(params.frequency_penalty, 0.0);
        assert_eq!(params.presence_penalty, 0.0);
        assert!(params.stop.is_empty());
    }

    #[test]
    fn square_image_request_is_single_image() {
        let request = ImageRequest::square("a lighthouse", 512);
        assert_eq!(request.count, 1);
        assert_eq!(request.size, 512);
    }

    #[test]
    fn call_failure_display_includes_category_and_detail() {
        let failure = CallFailure::new(FailureCategory::RateLimited, "too many requests");
        assert_eq!(failure.to_string(), "rate_limited failure: too many requests");

        let bare = CallFailure::new(FailureCategory::Timeout, "");
        assert_eq!(bare.to_string(), "timeout failure");
    }

    #[test]
    fn provider_init_error_preserves_message() {
        let error = ProviderInitError::new("missing key");
        assert_eq!(error.message(), "missing key");
        assert_eq!(error.to_string(), "missing key");
    }

    #[test]
    fn minimal_provider_satisfies_contract() {
        let provider = MinimalProvider;
        assert_eq!(provider.profile().provider_id, "minimal");

        let reply = provider
            .chat(ChatRequest {
                model: "m".to_string(),
                messages: vec![ChatMessage::user("hi")],
                params: GenerationParams::default(),
            })
            .expect("chat should succeed");
        assert_eq!(reply, "chat");
    }
}
