/// Default base URL for transport requests.
pub const DEFAULT_OPENAI_BASE_URL: &str = "https://api.openai.com/v1";

/// Normalize a base URL for endpoint construction.
///
/// Normalization rules:
/// 1) an empty/whitespace input falls back to the default base
/// 2) trailing slashes are trimmed
/// 3) a `/v1` version segment is appended unless already present
pub fn normalize_base_url(input: &str) -> String {
    let base = if input.trim().is_empty() {
        DEFAULT_OPENAI_BASE_URL
    } else {
        input.trim()
    };

    let trimmed = base.trim_end_matches('/');
    if trimmed.ends_with("/v1") {
        return trimmed.to_string();
    }
    format!("{trimmed}/v1")
}

#[must_use]
pub fn chat_completions_url(base: &str) -> String {
    format!("{}/chat/completions", normalize_base_url(base))
}

#[must_use]
pub fn completions_url(base: &str) -> String {
    format!("{}/completions", normalize_base_url(base))
}

#[must_use]
pub fn image_generations_url(base: &str) -> String {
    format!("{}/images/generations", normalize_base_url(base))
}
