//! Groq chat completions for reply generation.
//!
//! OpenAI-compatible, non-streaming: one bounded completion per turn with
//! the fixed persona system prompt and the requested style.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

use voxrelay_core::config::GenerationConfig;
use voxrelay_core::persona;
use voxrelay_core::protocol::ResponseStyle;

use crate::ReplyGenerator;

const GROQ_BASE_URL: &str = "https://api.groq.com/openai";
const DEFAULT_MODEL: &str = "llama-3.3-70b-versatile";

pub struct GroqGenerator {
    config: GenerationConfig,
    base_url: String,
    client: reqwest::Client,
}

impl GroqGenerator {
    pub fn new(config: GenerationConfig) -> Self {
        Self::with_base_url(config, GROQ_BASE_URL)
    }

    pub fn with_base_url(config: GenerationConfig, base_url: &str) -> Self {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(config.timeout_secs))
            .build()
            .unwrap_or_default();
        Self {
            config,
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
        }
    }
}

// --- Request/response types ---

#[derive(Debug, Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<ChatMessage>,
    max_tokens: u32,
    temperature: f64,
}

#[derive(Debug, Serialize)]
struct ChatMessage {
    role: &'static str,
    content: String,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    #[serde(default)]
    content: String,
}

#[async_trait]
impl ReplyGenerator for GroqGenerator {
    async fn generate(&self, user_text: &str, style: ResponseStyle) -> anyhow::Result<String> {
        let api_key = self
            .config
            .resolve_api_key()
            .ok_or_else(|| anyhow::anyhow!("No generation API key configured"))?;

        let body = ChatRequest {
            model: self
                .config
                .model
                .clone()
                .unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: persona::system_prompt(style),
                },
                ChatMessage {
                    role: "user",
                    content: user_text.to_string(),
                },
            ],
            max_tokens: self.config.max_tokens,
            temperature: self.config.temperature,
        };

        debug!(model = %body.model, ?style, "Requesting reply completion");

        let resp = self
            .client
            .post(format!("{}/v1/chat/completions", self.base_url))
            .header("Authorization", format!("Bearer {api_key}"))
            .json(&body)
            .send()
            .await?;

        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            anyhow::bail!("Generation API error {status}: {body}");
        }

        let body: ChatResponse = resp.json().await?;
        let reply = body
            .choices
            .into_iter()
            .next()
            .map(|c| c.message.content)
            .ok_or_else(|| anyhow::anyhow!("Generation API returned no choices"))?;

        Ok(reply)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn config_with_key() -> GenerationConfig {
        GenerationConfig {
            api_key: Some("test-key".into()),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_generate_sends_persona_and_style() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .and(header("Authorization", "Bearer test-key"))
            .and(body_partial_json(serde_json::json!({
                "model": "llama-3.3-70b-versatile",
                "max_tokens": 300,
                "temperature": 0.7,
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "choices": [ { "message": { "role": "assistant", "content": "Oh hey!" } } ]
            })))
            .mount(&server)
            .await;

        let g = GroqGenerator::with_base_url(config_with_key(), &server.uri());
        let reply = g.generate("hi there", ResponseStyle::Concise).await.unwrap();
        assert_eq!(reply, "Oh hey!");

        // The system message carries the style instruction
        let requests = server.received_requests().await.unwrap();
        let body: serde_json::Value = serde_json::from_slice(&requests[0].body).unwrap();
        assert_eq!(body["messages"][0]["role"], "system");
        assert!(
            body["messages"][0]["content"]
                .as_str()
                .unwrap()
                .contains("1-2 sentences")
        );
        assert_eq!(body["messages"][1]["role"], "user");
        assert_eq!(body["messages"][1]["content"], "hi there");
    }

    #[tokio::test]
    async fn test_provider_error_is_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .respond_with(ResponseTemplate::new(500).set_body_string("overloaded"))
            .mount(&server)
            .await;

        let g = GroqGenerator::with_base_url(config_with_key(), &server.uri());
        assert!(g.generate("hi", ResponseStyle::default()).await.is_err());
    }

    #[tokio::test]
    async fn test_empty_choices_is_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(serde_json::json!({ "choices": [] })),
            )
            .mount(&server)
            .await;

        let g = GroqGenerator::with_base_url(config_with_key(), &server.uri());
        assert!(g.generate("hi", ResponseStyle::default()).await.is_err());
    }
}
