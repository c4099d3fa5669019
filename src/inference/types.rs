//! Wire types for the local completion endpoint.

use serde::{Deserialize, Serialize};

pub(crate) const DEFAULT_TEMPERATURE: f32 = 0.7;
pub(crate) const DEFAULT_MAX_TOKENS: u32 = 1024;

pub(crate) fn default_stop_sequences() -> Vec<String> {
    vec!["<|endoftext|>".to_string(), "</s>".to_string()]
}

/// Caller-tunable knobs for a single query. Unset fields fall back to the
/// supervisor defaults; streaming is off by default.
#[derive(Debug, Clone, Default)]
pub struct QueryOptions {
    pub temperature: Option<f32>,
    pub max_tokens: Option<u32>,
    pub stop: Option<Vec<String>>,
    pub stream: Option<bool>,
}

/// Request body for `POST /v1/completions`.
#[derive(Debug, Serialize)]
pub(crate) struct CompletionRequest {
    pub prompt: String,
    pub temperature: f32,
    pub max_tokens: u32,
    pub stop: Vec<String>,
    pub stream: bool,
}

impl CompletionRequest {
    /// Merge caller options over the defaults.
    pub(crate) fn new(prompt: &str, options: &QueryOptions) -> Self {
        Self {
            prompt: prompt.to_string(),
            temperature: options.temperature.unwrap_or(DEFAULT_TEMPERATURE),
            max_tokens: options.max_tokens.unwrap_or(DEFAULT_MAX_TOKENS),
            stop: options.stop.clone().unwrap_or_else(default_stop_sequences),
            stream: options.stream.unwrap_or(false),
        }
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct CompletionResponse {
    pub choices: Vec<CompletionChoice>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct CompletionChoice {
    pub text: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_apply_when_options_are_unset() {
        let request = CompletionRequest::new("ping", &QueryOptions::default());
        assert_eq!(request.temperature, DEFAULT_TEMPERATURE);
        assert_eq!(request.max_tokens, DEFAULT_MAX_TOKENS);
        assert_eq!(request.stop, default_stop_sequences());
        assert!(!request.stream);
    }

    #[test]
    fn caller_options_override_defaults() {
        let options = QueryOptions {
            temperature: Some(0.1),
            max_tokens: Some(64),
            stop: Some(vec!["STOP".to_string()]),
            stream: None,
        };
        let request = CompletionRequest::new("ping", &options);
        assert_eq!(request.temperature, 0.1);
        assert_eq!(request.max_tokens, 64);
        assert_eq!(request.stop, vec!["STOP".to_string()]);
        assert!(!request.stream);
    }

    #[test]
    fn request_serializes_with_expected_keys() {
        let request = CompletionRequest::new("hello", &QueryOptions::default());
        let value = serde_json::to_value(&request).unwrap();
        assert_eq!(value["prompt"], "hello");
        assert!(value["temperature"].is_number());
        assert!(value["max_tokens"].is_number());
        assert!(value["stop"].is_array());
        assert_eq!(value["stream"], false);
    }

    #[test]
    fn response_extracts_first_choice() {
        let raw = r#"{"choices":[{"text":"pong"},{"text":"ignored"}]}"#;
        let response: CompletionResponse = serde_json::from_str(raw).unwrap();
        assert_eq!(response.choices[0].text, "pong");
    }
}
