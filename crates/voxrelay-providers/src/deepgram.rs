//! Deepgram prerecorded transcription.
//!
//! One POST of the raw audio body per utterance; no retries. The audio is
//! whatever the browser's MediaRecorder produced (webm/opus).

use async_trait::async_trait;
use serde::Deserialize;
use tracing::debug;

use voxrelay_core::config::TranscriptionConfig;

use crate::Transcriber;

const DEEPGRAM_BASE_URL: &str = "https://api.deepgram.com";
const DEFAULT_MODEL: &str = "nova-2";

pub struct DeepgramTranscriber {
    config: TranscriptionConfig,
    base_url: String,
    client: reqwest::Client,
}

impl DeepgramTranscriber {
    pub fn new(config: TranscriptionConfig) -> Self {
        Self::with_base_url(config, DEEPGRAM_BASE_URL)
    }

    pub fn with_base_url(config: TranscriptionConfig, base_url: &str) -> Self {
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

// --- Response shape (the slice of it we read) ---

#[derive(Debug, Default, Deserialize)]
struct ListenResponse {
    #[serde(default)]
    results: ListenResults,
}

#[derive(Debug, Default, Deserialize)]
struct ListenResults {
    #[serde(default)]
    channels: Vec<Channel>,
}

#[derive(Debug, Default, Deserialize)]
struct Channel {
    #[serde(default)]
    alternatives: Vec<Alternative>,
}

#[derive(Debug, Default, Deserialize)]
struct Alternative {
    #[serde(default)]
    transcript: String,
}

#[async_trait]
impl Transcriber for DeepgramTranscriber {
    async fn transcribe(&self, audio: &[u8]) -> anyhow::Result<String> {
        let api_key = self
            .config
            .resolve_api_key()
            .ok_or_else(|| anyhow::anyhow!("No transcription API key configured"))?;

        let model = self.config.model.as_deref().unwrap_or(DEFAULT_MODEL);

        debug!(model, audio_bytes = audio.len(), "Sending audio for transcription");

        let resp = self
            .client
            .post(format!("{}/v1/listen", self.base_url))
            .query(&[
                ("model", model),
                ("language", "en"),
                ("smart_format", "true"),
                ("punctuate", "true"),
            ])
            .header("Authorization", format!("Token {api_key}"))
            .header("Content-Type", "audio/webm")
            .body(audio.to_vec())
            .send()
            .await?;

        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            anyhow::bail!("Transcription API error {status}: {body}");
        }

        let body: ListenResponse = resp.json().await?;
        let transcript = body
            .results
            .channels
            .first()
            .and_then(|c| c.alternatives.first())
            .map(|a| a.transcript.trim().to_string())
            .unwrap_or_default();

        Ok(transcript)
    }
}
