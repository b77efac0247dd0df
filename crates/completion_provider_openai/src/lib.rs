//! OpenAI-compatible implementation of the shared `completion_provider`
//! contract.
//!
//! This adapter translates `openai_api` transport outcomes into the tagged
//! `CallFailure` categories expected by the engine, and bridges the async
//! client behind the synchronous provider trait.

use std::sync::Arc;
use std::time::Duration;

use completion_provider::{
    CallFailure, ChatRequest, CompletionProvider, FailureCategory, GenerationParams, ImageRequest,
    ProviderInitError, ProviderProfile, Role, TextCompletionRequest,
};
use openai_api::{
    ChatCompletionRequest, CompletionRequest, ImageGenerationRequest, OpenAiApiClient,
    OpenAiApiConfig, OpenAiApiError, WireMessage,
};

/// Stable provider identifier used by startup selection.
pub const OPENAI_PROVIDER_ID: &str = "openai";

/// Runtime configuration for the OpenAI-compatible provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OpenAiProviderConfig {
    pub api_key: String,
    pub base_url: Option<String>,
    pub timeout: Option<Duration>,
}

impl OpenAiProviderConfig {
    #[must_use]
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: None,
            timeout: None,
        }
    }

    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    fn into_api_config(self) -> OpenAiApiConfig {
        let mut config = OpenAiApiConfig::new(self.api_key);

        if let Some(base_url) = self.base_url {
            config = config.with_base_url(base_url);
        }

        if let Some(timeout) = self.timeout {
            config = config.with_timeout(timeout);
        }

        config
    }
}

trait Transport: Send + Sync {
    fn chat(&self, request: &ChatCompletionRequest) -> Result<String, OpenAiApiError>;
    fn complete(&self, request: &CompletionRequest) -> Result<String, OpenAiApiError>;
    fn generate_image(&self, request: &ImageGenerationRequest) -> Result<String, OpenAiApiError>;
    fn download(&self, url: &str) -> Result<Vec<u8>, OpenAiApiError>;
}

#[derive(Debug)]
struct DefaultTransport {
    client: OpenAiApiClient,
}

impl DefaultTransport {
    fn block_on<F: std::future::Future>(&self, future: F) -> Result<F::Output, OpenAiApiError> {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(|error| {
                OpenAiApiError::Unknown(format!("failed to initialize tokio runtime: {error}"))
            })?;
        Ok(runtime.block_on(future))
    }
}

impl Transport for DefaultTransport {
    fn chat(&self, request: &ChatCompletionRequest) -> Result<String, OpenAiApiError> {
        self.block_on(self.client.chat(request))?
    }

    fn complete(&self, request: &CompletionRequest) -> Result<String, OpenAiApiError> {
        self.block_on(self.client.complete(request))?
    }

    fn generate_image(&self, request: &ImageGenerationRequest) -> Result<String, OpenAiApiError> {
        self.block_on(self.client.generate_image(request))?
    }

    fn download(&self, url: &str) -> Result<Vec<u8>, OpenAiApiError> {
        self.block_on(self.client.download(url))?
    }
}

/// `CompletionProvider` adapter backed by `openai_api` transport primitives.
pub struct OpenAiProvider {
    transport: Arc<dyn Transport>,
}

impl OpenAiProvider {
    /// Creates a provider using real service transport.
    pub fn new(config: OpenAiProviderConfig) -> Result<Self, ProviderInitError> {
        let client = OpenAiApiClient::new(config.into_api_config()).map_err(|error| {
            ProviderInitError::new(format!("failed to initialize openai provider: {error}"))
        })?;

        Ok(Self {
            transport: Arc::new(DefaultTransport { client }),
        })
    }

    #[cfg(test)]
    fn with_transport_for_tests(transport: Arc<dyn Transport>) -> Self {
        Self { transport }
    }
}

impl CompletionProvider for OpenAiProvider {
    fn profile(&self) -> ProviderProfile {
        ProviderProfile {
            provider_id: OPENAI_PROVIDER_ID.to_string(),
        }
    }

    fn chat(&self, request: ChatRequest) -> Result<String, CallFailure> {
        let wire = to_chat_payload(&request);
        self.transport.chat(&wire).map_err(map_failure)
    }

    fn complete(&self, request: TextCompletionRequest) -> Result<String, CallFailure> {
        let wire = to_completion_payload(&request);
        self.transport.complete(&wire).map_err(map_failure)
    }

    fn generate_image(&self, request: ImageRequest) -> Result<Vec<u8>, CallFailure> {
        let mut wire = ImageGenerationRequest::square(request.prompt, request.size);
        wire.n = request.count;

        let url = self.transport.generate_image(&wire).map_err(map_failure)?;
        self.transport.download(&url).map_err(map_failure)
    }
}

fn wire_role(role: Role) -> &'static str {
    match role {
        Role::System => "system",
        Role::User => "user",
        Role::Assistant => "assistant",
    }
}

fn to_chat_payload(request: &ChatRequest) -> ChatCompletionRequest {
    ChatCompletionRequest {
        model: request.model.clone(),
        messages: request
            .messages
            .iter()
            .map(|message| WireMessage::new(wire_role(message.role), message.content.clone()))
            .collect(),
        temperature: request.params.temperature,
        max_tokens: request.params.max_tokens,
        top_p: request.params.top_p,
        frequency_penalty: request.params.frequency_penalty,
        presence_penalty: request.params.presence_penalty,
        stop: request.params.stop.clone(),
    }
}

fn to_completion_payload(request: &TextCompletionRequest) -> CompletionRequest {
    let GenerationParams {
        temperature,
        max_tokens,
        top_p,
        frequency_penalty,
        presence_penalty,
        ref stop,
    } = request.params;

    CompletionRequest {
        model: request.model.clone(),
        prompt: request.prompt.clone(),
        temperature,
        max_tokens,
        top_p,
        frequency_penalty,
        presence_penalty,
        stop: stop.clone(),
    }
}

fn map_failure(error: OpenAiApiError) -> CallFailure {
    match error {
        OpenAiApiError::MissingApiKey => {
            CallFailure::new(FailureCategory::Auth, "api key is not configured")
        }
        OpenAiApiError::Status(status, message) => {
            let category = match status.as_u16() {
                401 | 403 => FailureCategory::Auth,
                400 | 404 | 422 => FailureCategory::Rejected,
                429 => FailureCategory::RateLimited,
                503 => FailureCategory::ServiceUnavailable,
                code if code >= 500 => FailureCategory::Server,
                _ => FailureCategory::Unknown,
            };
            CallFailure::new(category, message)
        }
        OpenAiApiError::Request(error) => {
            let category = if error.is_timeout() {
                FailureCategory::Timeout
            } else if error.is_connect() {
                FailureCategory::Connectivity
            } else {
                FailureCategory::Unknown
            };
            CallFailure::new(category, error.to_string())
        }
        other => CallFailure::new(FailureCategory::Unknown, other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use completion_provider::ChatMessage;
    use reqwest::StatusCode;

    use super::*;

    fn lock_unpoisoned<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
        match mutex.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    enum FakeOutcome {
        Success(String),
        Error(OpenAiApiError),
    }

    #[derive(Default)]
    struct FakeTransport {
        observed_chat: Mutex<Option<ChatCompletionRequest>>,
        observed_image: Mutex<Option<ImageGenerationRequest>>,
        chat_outcome: Mutex<Option<FakeOutcome>>,
        image_outcome: Mutex<Option<FakeOutcome>>,
        download_bytes: Mutex<Option<Vec<u8>>>,
    }

    impl FakeTransport {
        fn with_chat_outcome(outcome: FakeOutcome) -> Arc<Self> {
            let transport = Self::default();
            *lock_unpoisoned(&transport.chat_outcome) = Some(outcome);
            Arc::new(transport)
        }

        fn observed_chat(&self) -> Option<ChatCompletionRequest> {
            lock_unpoisoned(&self.observed_chat).clone()
        }
    }

    impl Transport for FakeTransport {
        fn chat(&self, request: &ChatCompletionRequest) -> Result<String, OpenAiApiError> {
            *lock_unpoisoned(&self.observed_chat) = Some(request.clone());
            match lock_unpoisoned(&self.chat_outcome).take() {
                Some(FakeOutcome::Success(text)) => Ok(text),
                Some(FakeOutcome::Error(error)) => Err(error),
                None => panic!("fake chat outcome should be consumed exactly once"),
            }
        }

        fn complete(&self, _request: &CompletionRequest) -> Result<String, OpenAiApiError> {
            Ok("completion".to_string())
        }

        fn generate_image(
            &self,
            request: &ImageGenerationRequest,
        ) -> Result<String, OpenAiApiError> {
            *lock_unpoisoned(&self.observed_image) = Some(request.clone());
            match lock_unpoisoned(&self.image_outcome).take() {
                Some(FakeOutcome::Success(url)) => Ok(url),
                Some(FakeOutcome::Error(error)) => Err(error),
                None => panic!("fake image outcome should be consumed exactly once"),
            }
        }

        fn download(&self, _url: &str) -> Result<Vec<u8>, OpenAiApiError> {
            Ok(lock_unpoisoned(&self.download_bytes)
                .clone()
                .unwrap_or_default())
        }
    }

    fn chat_request() -> ChatRequest {
        ChatRequest {
            model: "gpt-3.5-turbo".to_string(),
            messages: vec![ChatMessage::system(""), ChatMessage::user("hello")],
            params: GenerationParams::default(),
        }
    }

    #[test]
    fn chat_translates_context_to_wire_messages() {
        let transport =
            FakeTransport::with_chat_outcome(FakeOutcome::Success("Hi there".to_string()));
        let provider =
            OpenAiProvider::with_transport_for_tests(Arc::clone(&transport) as Arc<dyn Transport>);

        let reply = provider.chat(chat_request()).expect("chat should succeed");
        assert_eq!(reply, "Hi there");

        let observed = transport.observed_chat().expect("request should be observed");
        assert_eq!(observed.model, "gpt-3.5-turbo");
        assert_eq!(observed.messages[0].role, "system");
        assert_eq!(observed.messages[1].role, "user");
        assert_eq!(observed.messages[1].content, "hello");
    }

    #[test]
    fn unauthorized_status_maps_to_auth_failure() {
        let transport = FakeTransport::with_chat_outcome(FakeOutcome::Error(
            OpenAiApiError::Status(StatusCode::UNAUTHORIZED, "Incorrect API key".to_string()),
        ));
        let provider = OpenAiProvider::with_transport_for_tests(transport);

        let failure = provider
            .chat(chat_request())
            .expect_err("unauthorized must fail");
        assert_eq!(failure.category, FailureCategory::Auth);
        assert_eq!(failure.detail, "Incorrect API key");
    }

    #[test]
    fn bad_request_maps_to_rejected_with_detail_preserved() {
        let detail = "Your request was rejected as a result of our safety system.";
        let transport = FakeTransport::with_chat_outcome(FakeOutcome::Error(
            OpenAiApiError::Status(StatusCode::BAD_REQUEST, detail.to_string()),
        ));
        let provider = OpenAiProvider::with_transport_for_tests(transport);

        let failure = provider
            .chat(chat_request())
            .expect_err("bad request must fail");
        assert_eq!(failure.category, FailureCategory::Rejected);
        assert_eq!(failure.detail, detail);
    }

    #[test]
    fn rate_limit_and_server_statuses_map_to_their_categories() {
        let cases = [
            (StatusCode::TOO_MANY_REQUESTS, FailureCategory::RateLimited),
            (
                StatusCode::SERVICE_UNAVAILABLE,
                FailureCategory::ServiceUnavailable,
            ),
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                FailureCategory::Server,
            ),
            (StatusCode::IM_A_TEAPOT, FailureCategory::Unknown),
        ];

        for (status, expected) in cases {
            let transport = FakeTransport::with_chat_outcome(FakeOutcome::Error(
                OpenAiApiError::Status(status, "detail".to_string()),
            ));
            let provider = OpenAiProvider::with_transport_for_tests(transport);
            let failure = provider
                .chat(chat_request())
                .expect_err("status must fail");
            assert_eq!(failure.category, expected, "status {status}");
        }
    }

    #[test]
    fn missing_api_key_maps_to_auth_failure() {
        let transport = FakeTransport::with_chat_outcome(FakeOutcome::Error(
            OpenAiApiError::MissingApiKey,
        ));
        let provider = OpenAiProvider::with_transport_for_tests(transport);

        let failure = provider
            .chat(chat_request())
            .expect_err("missing key must fail");
        assert_eq!(failure.category, FailureCategory::Auth);
    }

    #[test]
    fn image_generation_downloads_the_hosted_result() {
        let transport = Arc::new(FakeTransport::default());
        *lock_unpoisoned(&transport.image_outcome) = Some(FakeOutcome::Success(
            "https://images.example.com/abc.png".to_string(),
        ));
        *lock_unpoisoned(&transport.download_bytes) = Some(vec![0x89, 0x50, 0x4e, 0x47]);
        let provider =
            OpenAiProvider::with_transport_for_tests(Arc::clone(&transport) as Arc<dyn Transport>);

        let bytes = provider
            .generate_image(ImageRequest::square("a lighthouse", 512))
            .expect("image generation should succeed");
        assert_eq!(bytes, vec![0x89, 0x50, 0x4e, 0x47]);

        let observed = lock_unpoisoned(&transport.observed_image)
            .clone()
            .expect("image request should be observed");
        assert_eq!(observed.size, "512x512");
        assert_eq!(observed.n, 1);
    }
}
