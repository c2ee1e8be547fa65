use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::transcript::ChatMessage;
use crate::config::AppConfig;
use crate::error::CompletionError;

pub const SYSTEM_PROMPT: &str = "You are an expert in computer hardware and electronics. \
You specialise in components (CPUs, GPUs, memory), laptops and desktops, gaming systems, \
workstations, specifications and comparisons, and buying advice. Answer in detail and \
accurately but keep it understandable for non-specialists. Use concrete examples, compare \
options, justify recommendations and use tables for spec comparisons when helpful.";

const TEMPERATURE: f64 = 0.6;
const MAX_TOKENS: &str = "2000";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

// ---------------------------------------------------------------------------
// Wire format
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct CompletionRequest<'a> {
    model_uri: String,
    completion_options: CompletionOptions,
    messages: Vec<WireMessage<'a>>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct CompletionOptions {
    stream: bool,
    temperature: f64,
    max_tokens: &'static str,
}

#[derive(Debug, Serialize)]
struct WireMessage<'a> {
    role: &'a str,
    text: &'a str,
}

#[derive(Debug, Deserialize)]
struct CompletionResponse {
    result: CompletionResult,
}

#[derive(Debug, Deserialize)]
struct CompletionResult {
    alternatives: Vec<Alternative>,
}

#[derive(Debug, Deserialize)]
struct Alternative {
    message: ReplyMessage,
}

#[derive(Debug, Deserialize)]
struct ReplyMessage {
    text: String,
}

// ---------------------------------------------------------------------------
// Client
// ---------------------------------------------------------------------------

/// Blocking client for the hosted completion API. No retries.
pub struct CompletionClient {
    http: reqwest::blocking::Client,
    url: String,
    model: String,
    namespace: String,
    api_key: String,
}

impl std::fmt::Debug for CompletionClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CompletionClient")
            .field("url", &self.url)
            .field("model", &self.model)
            .field("namespace", &self.namespace)
            .finish_non_exhaustive()
    }
}

impl CompletionClient {
    /// Fails with [`CompletionError::NotConfigured`] when either secret is
    /// missing.
    pub fn from_config(config: &AppConfig) -> Result<Self, CompletionError> {
        let namespace = config
            .model_namespace
            .clone()
            .ok_or(CompletionError::NotConfigured("RIGSCOPE_MODEL_NAMESPACE"))?;
        let api_key = config
            .api_key
            .clone()
            .ok_or(CompletionError::NotConfigured("RIGSCOPE_API_KEY"))?;
        let http = reqwest::blocking::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()?;
        Ok(Self {
            http,
            url: config.completion_url.clone(),
            model: config.completion_model.clone(),
            namespace,
            api_key,
        })
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    /// Label attached to assistant replies.
    pub fn source_label(&self) -> String {
        format!("YandexGPT ({})", self.model)
    }

    fn model_uri(&self) -> String {
        format!("gpt://{}/{}/latest", self.namespace, self.model)
    }

    /// Send the system prompt, `history` and `question`; return the first
    /// alternative's text.
    pub fn complete(&self, history: &[ChatMessage], question: &str) -> Result<String, CompletionError> {
        let mut messages = Vec::with_capacity(history.len() + 2);
        messages.push(WireMessage {
            role: "system",
            text: SYSTEM_PROMPT,
        });
        messages.extend(history.iter().map(|m| WireMessage {
            role: m.role.as_str(),
            text: &m.content,
        }));
        messages.push(WireMessage {
            role: "user",
            text: question,
        });

        let body = CompletionRequest {
            model_uri: self.model_uri(),
            completion_options: CompletionOptions {
                stream: false,
                temperature: TEMPERATURE,
                max_tokens: MAX_TOKENS,
            },
            messages,
        };

        log::debug!("Sending completion request with {} messages", body.messages.len());
        let response = self
            .http
            .post(&self.url)
            .header(reqwest::header::AUTHORIZATION, format!("Api-Key {}", self.api_key))
            .json(&body)
            .send()?;

        let status = response.status();
        if status != reqwest::StatusCode::OK {
            let body = response.text().unwrap_or_default();
            return Err(CompletionError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let raw = response.text()?;
        extract_reply(&raw)
    }
}

fn extract_reply(raw: &str) -> Result<String, CompletionError> {
    let parsed: CompletionResponse =
        serde_json::from_str(raw).map_err(|e| CompletionError::Malformed(e.to_string()))?;
    parsed
        .result
        .alternatives
        .into_iter()
        .next()
        .map(|alt| alt.message.text)
        .ok_or_else(|| CompletionError::Malformed("no alternatives in response".into()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_first_alternative() {
        let raw = r#"{"result":{"alternatives":[
            {"message":{"role":"assistant","text":"first"},"status":"FINAL"},
            {"message":{"role":"assistant","text":"second"}}
        ],"modelVersion":"x"}}"#;
        assert_eq!(extract_reply(raw).expect("valid"), "first");
    }

    #[test]
    fn malformed_bodies_are_errors() {
        assert!(matches!(extract_reply("{}"), Err(CompletionError::Malformed(_))));
        assert!(matches!(
            extract_reply(r#"{"result":{"alternatives":[]}}"#),
            Err(CompletionError::Malformed(_))
        ));
    }

    #[test]
    fn missing_secrets_are_not_configured() {
        let config = AppConfig {
            model_namespace: Some("ns".into()),
            ..AppConfig::default()
        };
        assert!(matches!(
            CompletionClient::from_config(&config),
            Err(CompletionError::NotConfigured("RIGSCOPE_API_KEY"))
        ));
        assert!(matches!(
            CompletionClient::from_config(&AppConfig::default()),
            Err(CompletionError::NotConfigured("RIGSCOPE_MODEL_NAMESPACE"))
        ));
    }

    #[test]
    fn request_serializes_in_camel_case() {
        let body = CompletionRequest {
            model_uri: "gpt://ns/m/latest".into(),
            completion_options: CompletionOptions {
                stream: false,
                temperature: TEMPERATURE,
                max_tokens: MAX_TOKENS,
            },
            messages: vec![WireMessage {
                role: "user",
                text: "hi",
            }],
        };
        let value = serde_json::to_value(&body).expect("serializes");
        assert_eq!(value["modelUri"], "gpt://ns/m/latest");
        assert_eq!(value["completionOptions"]["maxTokens"], "2000");
        assert_eq!(value["completionOptions"]["stream"], false);
        assert_eq!(value["messages"][0]["text"], "hi");
    }
}
