use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::debug;

use crate::config::OpenAiApiConfig;
use crate::error::{parse_error_message, OpenAiApiError};
use crate::headers::build_headers;
use crate::payload::{
    ChatCompletionRequest, ChatCompletionResponse, CompletionRequest, CompletionResponse,
    ImageGenerationRequest, ImageGenerationResponse,
};
use crate::url::{chat_completions_url, completions_url, image_generations_url};

/// Single-attempt async client for the completion service.
///
/// No retry loop: the caller gets exactly one request per call, and a timeout
/// configured on the underlying HTTP client surfaces as a request error.
#[derive(Debug)]
pub struct OpenAiApiClient {
    http: Client,
    config: OpenAiApiConfig,
}

impl OpenAiApiClient {
    pub fn new(config: OpenAiApiConfig) -> Result<Self, OpenAiApiError> {
        let mut builder = Client::builder();
        if let Some(timeout) = config.timeout {
            builder = builder.timeout(timeout);
        }
        let http = builder.build().map_err(OpenAiApiError::from)?;
        Ok(Self { http, config })
    }

    pub fn config(&self) -> &OpenAiApiConfig {
        &self.config
    }

    pub fn header_map(&self) -> Result<HeaderMap, OpenAiApiError> {
        let headers = build_headers(&self.config)?;
        let mut out = HeaderMap::new();
        for (key, value) in headers {
            out.insert(
                HeaderName::from_bytes(key.as_bytes()).map_err(|_| {
                    OpenAiApiError::InvalidHeader(format!("invalid header key: {key}"))
                })?,
                HeaderValue::from_str(&value).map_err(|_| {
                    OpenAiApiError::InvalidHeader(format!("invalid header value for {key}"))
                })?,
            );
        }
        Ok(out)
    }

    /// Executes one chat-mode call and returns the first choice's content.
    pub async fn chat(&self, request: &ChatCompletionRequest) -> Result<String, OpenAiApiError> {
        debug!(model = %request.model, messages = request.messages.len(), "dispatching chat request");
        let response: ChatCompletionResponse = self
            .post_json(chat_completions_url(&self.config.base_url), request)
            .await?;
        response
            .choices
            .into_iter()
            .next()
            .map(|choice| choice.message.content)
            .ok_or(OpenAiApiError::EmptyChoices)
    }

    /// Executes one legacy single-prompt call and returns the first choice's text.
    pub async fn complete(&self, request: &CompletionRequest) -> Result<String, OpenAiApiError> {
        debug!(model = %request.model, "dispatching completion request");
        let response: CompletionResponse = self
            .post_json(completions_url(&self.config.base_url), request)
            .await?;
        response
            .choices
            .into_iter()
            .next()
            .map(|choice| choice.text)
            .ok_or(OpenAiApiError::EmptyChoices)
    }

    /// Generates one image and returns the URL of the hosted result.
    pub async fn generate_image(
        &self,
        request: &ImageGenerationRequest,
    ) -> Result<String, OpenAiApiError> {
        debug!(size = %request.size, "dispatching image generation request");
        let response: ImageGenerationResponse = self
            .post_json(image_generations_url(&self.config.base_url), request)
            .await?;
        response
            .data
            .into_iter()
            .next()
            .map(|image| image.url)
            .ok_or(OpenAiApiError::EmptyImageData)
    }

    /// Downloads a generated resource (no auth headers; the URL is pre-signed).
    pub async fn download(&self, url: &str) -> Result<Vec<u8>, OpenAiApiError> {
        let response = self.http.get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(OpenAiApiError::Status(
                status,
                parse_error_message(status, &body),
            ));
        }
        Ok(response.bytes().await?.to_vec())
    }

    async fn post_json<T: DeserializeOwned>(
        &self,
        url: String,
        body: &impl Serialize,
    ) -> Result<T, OpenAiApiError> {
        let headers = self.header_map()?;
        let response = self.http.post(url).headers(headers).json(body).send().await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(OpenAiApiError::Status(
                status,
                parse_error_message(status, &body),
            ));
        }

        response.json::<T>().await.map_err(OpenAiApiError::from)
    }
}
