//! Per-invocation orchestration.
//!
//! One [`Engine`] drives exactly one launcher invocation: resolve aliases,
//! intercept meta commands, validate parameters, assemble context, make the
//! single remote call, translate failures, and update the persisted state.
//! The stores and the provider are borrowed ports, so tests run against
//! in-memory doubles and a scripted provider.

use std::fs;
use std::path::PathBuf;

use completion_provider::{
    ChatRequest, CompletionProvider, GenerationParams, ImageRequest, TextCompletionRequest,
};
use conversation_store::{
    CacheValue, DiagnosticEntry, DiagnosticLog, RequestStateCache, StoreError, Turn, TurnStore,
    EMPTY_PLACEHOLDER,
};
use thiserror::Error;
use time::macros::format_description;
use time::OffsetDateTime;
use tracing::info;

use crate::aliases::AliasResolver;
use crate::commands::{self, RequestKind};
use crate::config::Config;
use crate::context::{build_context, ContextPolicy};
use crate::translate;

/// Cache key holding the first half of a composite two-step query.
pub const STORED_QUERY_KEY: &str = "stored_query";

/// Fixed acknowledgement returned after the history is wiped.
pub const CLEAR_ACK: &str = "All my memories of you have been erased 😢";

const COMPLETION_STOP: &str = "<|endoftext|>";
const IMAGE_MODEL: &str = "dall-e-2";
const IMAGE_FILE_PREFIX: &str = "promptdeck";

#[derive(Debug, Error)]
pub enum EngineError {
    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("I/O error while {operation} at {path}: {source}")]
    Io {
        operation: &'static str,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to format image timestamp: {0}")]
    ClockFormat(#[source] time::error::Format),
}

/// One invocation's worth of wiring over the persistence ports and provider.
pub struct Engine<'a> {
    config: &'a Config,
    aliases: AliasResolver,
    turns: &'a mut dyn TurnStore,
    cache: &'a mut dyn RequestStateCache,
    diagnostics: &'a DiagnosticLog,
    provider: &'a dyn CompletionProvider,
}

impl<'a> Engine<'a> {
    pub fn new(
        config: &'a Config,
        turns: &'a mut dyn TurnStore,
        cache: &'a mut dyn RequestStateCache,
        diagnostics: &'a DiagnosticLog,
        provider: &'a dyn CompletionProvider,
    ) -> Self {
        let aliases = AliasResolver::from_spec(&config.aliases);
        Self {
            config,
            aliases,
            turns,
            cache,
            diagnostics,
            provider,
        }
    }

    /// Runs one chat invocation and returns the text to show the user.
    ///
    /// Both successful and failed calls append a turn and update the success
    /// flag; only interception and validation short-circuit before that.
    pub fn run_chat(&mut self, raw_query: &str) -> Result<String, EngineError> {
        let prompt = self.aliases.resolve(raw_query);

        if let Some(reply) = self.intercept(RequestKind::Chat, &prompt)? {
            return Ok(reply);
        }

        let params = self.chat_params();
        if let Some(message) = translate::validate_params(&self.config.chat_model, &params) {
            return Ok(message);
        }

        let policy = ContextPolicy {
            history_window: self.config.history_length,
            unlock_phrase: self.config.unlock_phrase.as_deref(),
            unlock_enabled: self.config.unlock_enabled,
            system_prompt: if self.config.use_system_prompt {
                self.config.system_prompt.as_str()
            } else {
                ""
            },
        };
        let messages = build_context(&*self.turns, &prompt, &policy)?;

        let request = ChatRequest {
            model: self.config.chat_model.clone(),
            messages,
            params: params.clone(),
        };

        match self.provider.chat(request) {
            Ok(reply) => {
                let reply = non_empty(reply);
                self.log_chat_turn(&prompt, &reply)?;
                self.set_success_flag(RequestKind::Chat, true)?;
                Ok(reply)
            }
            Err(failure) => {
                let message = translate::user_message(&failure);
                self.diagnostics.record(&DiagnosticEntry {
                    model: self.config.chat_model.clone(),
                    error_message: failure.detail,
                    user_prompt: prompt.clone(),
                    parameters: parameter_pairs(&params),
                })?;
                self.log_chat_turn(&prompt, &message)?;
                self.set_success_flag(RequestKind::Chat, false)?;
                Ok(message)
            }
        }
    }

    /// Runs one legacy single-prompt completion invocation.
    ///
    /// This flow carries no conversation history; the query is shaped into a
    /// question/answer prompt before dispatch.
    pub fn run_completion(&mut self, raw_query: &str) -> Result<String, EngineError> {
        let query = self.aliases.resolve(raw_query);

        if let Some(reply) = self.intercept(RequestKind::TextCompletion, &query)? {
            return Ok(reply);
        }

        let params = self.completion_params();
        if let Some(message) = translate::validate_params(&self.config.completion_model, &params) {
            return Ok(message);
        }

        let request = TextCompletionRequest {
            model: self.config.completion_model.clone(),
            prompt: completion_prompt(&query),
            params: params.clone(),
        };

        match self.provider.complete(request) {
            Ok(reply) => {
                self.set_success_flag(RequestKind::TextCompletion, true)?;
                Ok(non_empty(reply))
            }
            Err(failure) => {
                let message = translate::user_message(&failure);
                self.diagnostics.record(&DiagnosticEntry {
                    model: self.config.completion_model.clone(),
                    error_message: failure.detail,
                    user_prompt: query.clone(),
                    parameters: parameter_pairs(&params),
                })?;
                self.set_success_flag(RequestKind::TextCompletion, false)?;
                Ok(message)
            }
        }
    }

    /// Runs one image generation invocation and returns the saved file path
    /// (or the translated failure message).
    pub fn run_image(&mut self, raw_query: &str) -> Result<String, EngineError> {
        let prompt = self.aliases.resolve(raw_query);

        if let Some(reply) = self.intercept(RequestKind::ImageGeneration, &prompt)? {
            return Ok(reply);
        }

        let request = ImageRequest::square(prompt.clone(), self.config.image_size);

        match self.provider.generate_image(request) {
            Ok(bytes) => {
                let path = self.save_image(&prompt, &bytes)?;
                self.set_success_flag(RequestKind::ImageGeneration, true)?;
                Ok(path.display().to_string())
            }
            Err(failure) => {
                let message = translate::user_message(&failure);
                self.diagnostics.record(&DiagnosticEntry {
                    model: IMAGE_MODEL.to_string(),
                    error_message: failure.detail,
                    user_prompt: prompt.clone(),
                    parameters: vec![("size".to_string(), self.config.image_size.to_string())],
                })?;
                self.set_success_flag(RequestKind::ImageGeneration, false)?;
                Ok(message)
            }
        }
    }

    /// Stores the alias-resolved query for a later composite invocation and
    /// echoes it back.
    pub fn store_query(&mut self, raw_query: &str) -> Result<String, EngineError> {
        let resolved = self.aliases.resolve(raw_query);
        self.cache
            .set(STORED_QUERY_KEY, CacheValue::from(resolved.clone()))?;
        Ok(resolved)
    }

    /// Prepends a previously stored query to the new input, consuming the
    /// stored value. Without one, the input passes through unchanged.
    pub fn combine_query(&mut self, raw_query: &str) -> Result<String, EngineError> {
        let stored = self
            .cache
            .get(STORED_QUERY_KEY)?
            .and_then(|value| value.as_text().map(str::to_string))
            .filter(|text| !text.is_empty());

        match stored {
            Some(stored) => {
                self.cache.delete(STORED_QUERY_KEY)?;
                Ok(format!("{stored} {raw_query}"))
            }
            None => Ok(raw_query.to_string()),
        }
    }

    /// Wipes the conversation history directly (the non-intercepted path).
    pub fn clear_history(&mut self) -> Result<String, EngineError> {
        self.turns.clear()?;
        info!("conversation history cleared");
        Ok(CLEAR_ACK.to_string())
    }

    /// Returns up to `limit` trailing genuine turns for launcher display;
    /// unlock turns are excluded by their flag.
    pub fn history(&self, limit: usize) -> Result<Vec<Turn>, EngineError> {
        let turns = self.turns.read_recent(limit)?;
        Ok(turns
            .into_iter()
            .filter(|turn| !turn.is_unlock_turn)
            .collect())
    }

    fn intercept(
        &mut self,
        kind: RequestKind,
        prompt: &str,
    ) -> Result<Option<String>, EngineError> {
        // Error replay fires only on an explicitly recorded failure; with the
        // flag true or absent these phrases are ordinary prompts.
        if commands::is_error_replay_prompt(prompt) && self.last_request_failed(kind)? {
            let detail = self.diagnostics.last_error_message()?.unwrap_or_default();
            self.set_success_flag(kind, true)?;
            return Ok(Some(error_replay_message(&detail)));
        }

        if kind == RequestKind::Chat && commands::is_clear_log_prompt(prompt) {
            self.turns.clear()?;
            info!("conversation history cleared by meta command");
            return Ok(Some(CLEAR_ACK.to_string()));
        }

        Ok(None)
    }

    fn last_request_failed(&self, kind: RequestKind) -> Result<bool, EngineError> {
        let flag = self.cache.get(kind.success_flag_key())?;
        Ok(matches!(flag, Some(CacheValue::Bool(false))))
    }

    fn set_success_flag(&mut self, kind: RequestKind, value: bool) -> Result<(), EngineError> {
        self.cache
            .set(kind.success_flag_key(), CacheValue::Bool(value))?;
        Ok(())
    }

    // The unlock exchange is re-logged ahead of every real turn while
    // unlocking is active, so a later context rebuild sees it even after the
    // window slides.
    fn log_chat_turn(&mut self, prompt: &str, reply: &str) -> Result<(), EngineError> {
        if self.config.unlock_enabled {
            if let Some(phrase) = self.config.unlock_phrase.as_deref() {
                self.turns.append_unlock_turn(phrase)?;
            }
        }
        self.turns.append(&Turn::exchange(prompt, reply))?;
        Ok(())
    }

    fn save_image(&self, prompt: &str, bytes: &[u8]) -> Result<PathBuf, EngineError> {
        fs::create_dir_all(&self.config.image_dir).map_err(|source| EngineError::Io {
            operation: "creating image directory",
            path: self.config.image_dir.clone(),
            source,
        })?;

        let file_name =
            image_file_name(prompt, OffsetDateTime::now_utc()).map_err(EngineError::ClockFormat)?;
        let path = self.config.image_dir.join(file_name);
        fs::write(&path, bytes).map_err(|source| EngineError::Io {
            operation: "writing image file",
            path: path.clone(),
            source,
        })?;

        Ok(path)
    }

    fn chat_params(&self) -> GenerationParams {
        GenerationParams {
            temperature: self.config.temperature,
            max_tokens: self.config.chat_max_tokens,
            top_p: self.config.top_p,
            frequency_penalty: self.config.frequency_penalty,
            presence_penalty: self.config.presence_penalty,
            stop: Vec::new(),
        }
    }

    fn completion_params(&self) -> GenerationParams {
        GenerationParams {
            temperature: self.config.temperature,
            max_tokens: Some(self.config.completion_max_tokens),
            top_p: self.config.top_p,
            frequency_penalty: self.config.frequency_penalty,
            presence_penalty: self.config.presence_penalty,
            stop: vec![COMPLETION_STOP.to_string()],
        }
    }
}

/// Message shown when an error-replay phrase surfaces the stored diagnostic.
#[must_use]
pub fn error_replay_message(detail: &str) -> String {
    format!(
        "😬 Sorry, the error message was not really helpful. Here is the original message from the service:\n\n➡️ {detail}"
    )
}

/// Shapes a query for the legacy question/answer completion mode.
#[must_use]
pub fn completion_prompt(query: &str) -> String {
    format!("Q: {query}\nA:")
}

/// Deterministic, collision-resistant image file name: sanitized prompt plus
/// a second-resolution timestamp.
pub fn image_file_name(
    prompt: &str,
    timestamp: OffsetDateTime,
) -> Result<String, time::error::Format> {
    let format = format_description!("[year]-[month]-[day]_[hour]-[minute]-[second]");
    let stamp = timestamp.format(format)?;
    Ok(format!(
        "{IMAGE_FILE_PREFIX}_{}_{stamp}.png",
        sanitize_prompt_for_file_name(prompt)
    ))
}

fn sanitize_prompt_for_file_name(prompt: &str) -> String {
    prompt
        .chars()
        .filter_map(|c| match c {
            ' ' => Some('_'),
            ',' | '.' | '"' | ':' | '\'' | '/' | '\\' => None,
            other => Some(other),
        })
        .collect()
}

fn non_empty(reply: String) -> String {
    if reply.is_empty() {
        EMPTY_PLACEHOLDER.to_string()
    } else {
        reply
    }
}

fn parameter_pairs(params: &GenerationParams) -> Vec<(String, String)> {
    let mut pairs = vec![("temperature".to_string(), params.temperature.to_string())];
    if let Some(max_tokens) = params.max_tokens {
        pairs.push(("max_tokens".to_string(), max_tokens.to_string()));
    }
    pairs.push(("top_p".to_string(), params.top_p.to_string()));
    pairs.push((
        "frequency_penalty".to_string(),
        params.frequency_penalty.to_string(),
    ));
    pairs.push((
        "presence_penalty".to_string(),
        params.presence_penalty.to_string(),
    ));
    pairs
}
