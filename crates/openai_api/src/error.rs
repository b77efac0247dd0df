use std::fmt;

use reqwest::StatusCode;
use serde::Deserialize;
use serde_json::Error as JsonError;

#[derive(Debug)]
pub enum OpenAiApiError {
    MissingApiKey,
    InvalidHeader(String),
    Request(reqwest::Error),
    Status(StatusCode, String),
    Serde(JsonError),
    EmptyChoices,
    EmptyImageData,
    Unknown(String),
}

#[derive(Debug, Deserialize)]
pub(crate) struct ErrorPayload {
    #[serde(rename = "error")]
    pub value: Option<ErrorPayloadFields>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ErrorPayloadFields {
    pub message: Option<String>,
}

impl fmt::Display for OpenAiApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingApiKey => write!(f, "api key is required"),
            Self::InvalidHeader(message) => write!(f, "invalid request header: {message}"),
            Self::Request(error) => write!(f, "request error: {error}"),
            Self::Status(status, message) => write!(f, "HTTP {status} {message}"),
            Self::Serde(error) => write!(f, "serialization error: {error}"),
            Self::EmptyChoices => write!(f, "response contained no choices"),
            Self::EmptyImageData => write!(f, "response contained no image data"),
            Self::Unknown(message) => write!(f, "{message}"),
        }
    }
}

impl std::error::Error for OpenAiApiError {}

impl From<reqwest::Error> for OpenAiApiError {
    fn from(error: reqwest::Error) -> Self {
        Self::Request(error)
    }
}

impl From<JsonError> for OpenAiApiError {
    fn from(error: JsonError) -> Self {
        Self::Serde(error)
    }
}

/// Extract the service-side error message from a failed response body.
///
/// Falls back to the raw body, then to the status line, so the caller always
/// has something recordable.
pub fn parse_error_message(status: StatusCode, body: &str) -> String {
    if let Ok(ErrorPayload {
        value: Some(fields),
    }) = serde_json::from_str::<ErrorPayload>(body)
    {
        if let Some(message) = fields.message.filter(|value| !value.is_empty()) {
            return message;
        }
    }

    if body.is_empty() {
        status
            .canonical_reason()
            .unwrap_or("request failed")
            .to_string()
    } else {
        body.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::parse_error_message;
    use reqwest::StatusCode;

    #[test]
    fn structured_error_body_yields_service_message() {
        let body = r#"{"error":{"message":"Incorrect API key provided","type":"invalid_request_error"}}"#;
        assert_eq!(
            parse_error_message(StatusCode::UNAUTHORIZED, body),
            "Incorrect API key provided"
        );
    }

    #[test]
    fn unstructured_body_is_passed_through() {
        assert_eq!(
            parse_error_message(StatusCode::BAD_GATEWAY, "upstream exploded"),
            "upstream exploded"
        );
    }

    #[test]
    fn empty_body_falls_back_to_status_reason() {
        assert_eq!(
            parse_error_message(StatusCode::SERVICE_UNAVAILABLE, ""),
            "Service Unavailable"
        );
    }

    #[test]
    fn empty_structured_message_falls_back_to_body() {
        let body = r#"{"error":{"message":""}}"#;
        assert_eq!(parse_error_message(StatusCode::BAD_REQUEST, body), body);
    }
}
