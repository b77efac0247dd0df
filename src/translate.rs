//! Failure translation and pre-flight parameter validation.
//!
//! Remote failures map to fixed, friendly messages; the raw service detail
//! goes to the diagnostic log instead and is only surfaced through the
//! error-replay meta command. Validation runs locally before any network I/O
//! and its findings are configuration mistakes, never service incidents.

use completion_provider::{CallFailure, FailureCategory, GenerationParams};

/// Prefix the service puts on safety-system rejections.
pub const SAFETY_REJECTION_MARKER: &str =
    "Your request was rejected as a result of our safety system";

/// Maps a tagged failure to the user-facing message for that category.
#[must_use]
pub fn user_message(failure: &CallFailure) -> String {
    let message = match failure.category {
        FailureCategory::Auth => {
            "🚨 There seems to be something wrong! Please check your API key."
        }
        FailureCategory::Rejected => {
            if failure.detail.starts_with(SAFETY_REJECTION_MARKER) {
                "🚨 You shouldn't generate such stuff! Your prompt was declined by the service's safety system."
            } else {
                "🚨 Hmmm... Something is wrong with your request. Try again later."
            }
        }
        FailureCategory::ServiceUnavailable => {
            "🚨 Oh no! The server is overloaded or not ready yet."
        }
        FailureCategory::Server => {
            "🚨 D'oh! The server had an error while processing your request."
        }
        FailureCategory::Connectivity => {
            "🚨 There is something fishy with your internet connection. Check your network settings."
        }
        FailureCategory::RateLimited => {
            "🚨 You have reached the rate limit. Check your settings in your service dashboard."
        }
        FailureCategory::Timeout => "🚨 The request timed out. Try again later.",
        FailureCategory::Unknown => "🚨 Something went wrong. Try again later.",
    };

    message.to_string()
}

/// Token-ceiling class of a model identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModelClass {
    Large,
    Small,
    Other,
}

#[must_use]
pub fn model_class(model: &str) -> ModelClass {
    match model {
        "text-davinci-003" | "gpt-3.5-turbo" => ModelClass::Large,
        "text-ada-001" | "text-babbage-001" | "text-curie-001" => ModelClass::Small,
        _ => ModelClass::Other,
    }
}

/// Checks generation parameters before any remote call.
///
/// Returns the rejection message for the first violated rule, or `None` when
/// the parameters are acceptable. Boundaries are inclusive.
#[must_use]
pub fn validate_params(model: &str, params: &GenerationParams) -> Option<String> {
    if params.temperature < 0.0 || params.temperature > 2.0 {
        return Some(format!(
            "🚨 'Temperature' must be ≤ 2.0 and ≥ 0. But you have set it to {}.",
            params.temperature
        ));
    }

    if let Some(max_tokens) = params.max_tokens {
        match model_class(model) {
            ModelClass::Large if max_tokens > 4096 => {
                return Some("🚨 'Maximum tokens' must be ≤ 4096.".to_string());
            }
            ModelClass::Small if max_tokens > 2048 => {
                return Some("🚨 'Maximum tokens' must be ≤ 2048.".to_string());
            }
            _ => {}
        }
    }

    if params.frequency_penalty < -2.0 || params.frequency_penalty > 2.0 {
        return Some(format!(
            "🚨 'Frequency penalty' must be between -2.0 and 2.0. But you have set it to {}.",
            params.frequency_penalty
        ));
    }

    if params.presence_penalty < -2.0 || params.presence_penalty > 2.0 {
        return Some(format!(
            "🚨 'Presence penalty' must be between -2.0 and 2.0. But you have set it to {}.",
            params.presence_penalty
        ));
    }

    None
}
