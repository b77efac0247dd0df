//! Deterministic mock implementation of the shared `completion_provider`
//! contract.
//!
//! This crate contains no transport logic and is intended for local
//! development and contract-level integration testing. Outcomes are queued
//! per call kind; every observed request is recorded so tests can assert
//! whether a remote call would have been made.

use std::collections::VecDeque;
use std::sync::{Mutex, MutexGuard};

use completion_provider::{
    CallFailure, ChatRequest, CompletionProvider, ImageRequest, ProviderProfile,
    TextCompletionRequest,
};

/// Stable provider identifier used for explicit startup selection.
pub const MOCK_PROVIDER_ID: &str = "mock";

const DEFAULT_REPLY: &str = "Mocked assistant reply.";
const DEFAULT_IMAGE_BYTES: [u8; 4] = [0x89, 0x50, 0x4e, 0x47];

/// Scripted provider used by engine tests and local runs.
#[derive(Debug, Default)]
pub struct MockProvider {
    chat_outcomes: Mutex<VecDeque<Result<String, CallFailure>>>,
    completion_outcomes: Mutex<VecDeque<Result<String, CallFailure>>>,
    image_outcomes: Mutex<VecDeque<Result<Vec<u8>, CallFailure>>>,
    observed_chats: Mutex<Vec<ChatRequest>>,
    observed_completions: Mutex<Vec<TextCompletionRequest>>,
    observed_images: Mutex<Vec<ImageRequest>>,
}

impl MockProvider {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Provider whose next chat call returns the given text.
    #[must_use]
    pub fn with_chat_response(text: impl Into<String>) -> Self {
        let provider = Self::new();
        provider.push_chat_outcome(Ok(text.into()));
        provider
    }

    /// Provider whose next chat call fails with the given failure.
    #[must_use]
    pub fn with_chat_failure(failure: CallFailure) -> Self {
        let provider = Self::new();
        provider.push_chat_outcome(Err(failure));
        provider
    }

    pub fn push_chat_outcome(&self, outcome: Result<String, CallFailure>) {
        lock_unpoisoned(&self.chat_outcomes).push_back(outcome);
    }

    pub fn push_completion_outcome(&self, outcome: Result<String, CallFailure>) {
        lock_unpoisoned(&self.completion_outcomes).push_back(outcome);
    }

    pub fn push_image_outcome(&self, outcome: Result<Vec<u8>, CallFailure>) {
        lock_unpoisoned(&self.image_outcomes).push_back(outcome);
    }

    /// Chat requests observed so far, in call order.
    #[must_use]
    pub fn observed_chat_requests(&self) -> Vec<ChatRequest> {
        lock_unpoisoned(&self.observed_chats).clone()
    }

    #[must_use]
    pub fn observed_completion_requests(&self) -> Vec<TextCompletionRequest> {
        lock_unpoisoned(&self.observed_completions).clone()
    }

    #[must_use]
    pub fn observed_image_requests(&self) -> Vec<ImageRequest> {
        lock_unpoisoned(&self.observed_images).clone()
    }

    /// Total number of calls across all kinds.
    #[must_use]
    pub fn call_count(&self) -> usize {
        lock_unpoisoned(&self.observed_chats).len()
            + lock_unpoisoned(&self.observed_completions).len()
            + lock_unpoisoned(&self.observed_images).len()
    }
}

impl CompletionProvider for MockProvider {
    fn profile(&self) -> ProviderProfile {
        ProviderProfile {
            provider_id: MOCK_PROVIDER_ID.to_string(),
        }
    }

    fn chat(&self, request: ChatRequest) -> Result<String, CallFailure> {
        lock_unpoisoned(&self.observed_chats).push(request);
        lock_unpoisoned(&self.chat_outcomes)
            .pop_front()
            .unwrap_or_else(|| Ok(DEFAULT_REPLY.to_string()))
    }

    fn complete(&self, request: TextCompletionRequest) -> Result<String, CallFailure> {
        lock_unpoisoned(&self.observed_completions).push(request);
        lock_unpoisoned(&self.completion_outcomes)
            .pop_front()
            .unwrap_or_else(|| Ok(DEFAULT_REPLY.to_string()))
    }

    fn generate_image(&self, request: ImageRequest) -> Result<Vec<u8>, CallFailure> {
        lock_unpoisoned(&self.observed_images).push(request);
        lock_unpoisoned(&self.image_outcomes)
            .pop_front()
            .unwrap_or_else(|| Ok(DEFAULT_IMAGE_BYTES.to_vec()))
    }
}

fn lock_unpoisoned<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    match mutex.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}

#[cfg(test)]
mod tests {
    use completion_provider::{
        ChatMessage, FailureCategory, GenerationParams,
    };

    use super::*;

    fn chat_request(text: &str) -> ChatRequest {
        ChatRequest {
            model: "mock-model".to_string(),
            messages: vec![ChatMessage::user(text)],
            params: GenerationParams::default(),
        }
    }

    #[test]
    fn queued_outcomes_are_consumed_in_order() {
        let provider = MockProvider::new();
        provider.push_chat_outcome(Ok("first".to_string()));
        provider.push_chat_outcome(Err(CallFailure::new(
            FailureCategory::Server,
            "boom",
        )));

        assert_eq!(
            provider.chat(chat_request("a")).expect("first should succeed"),
            "first"
        );
        let failure = provider
            .chat(chat_request("b"))
            .expect_err("second should fail");
        assert_eq!(failure.category, FailureCategory::Server);
    }

    #[test]
    fn exhausted_queue_falls_back_to_default_reply() {
        let provider = MockProvider::new();
        assert_eq!(
            provider.chat(chat_request("a")).expect("chat should succeed"),
            DEFAULT_REPLY
        );
    }

    #[test]
    fn observed_requests_record_every_call() {
        let provider = MockProvider::with_chat_response("hi");
        let _ = provider.chat(chat_request("observed"));

        let observed = provider.observed_chat_requests();
        assert_eq!(observed.len(), 1);
        assert_eq!(observed[0].messages[0].content, "observed");
        assert_eq!(provider.call_count(), 1);
    }

    #[test]
    fn profile_reports_mock_provider_id() {
        assert_eq!(MockProvider::new().profile().provider_id, MOCK_PROVIDER_ID);
    }
}
