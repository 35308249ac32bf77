//! ElevenLabs streaming speech synthesis.
//!
//! Chunks are forwarded as they arrive so the client can start playback
//! before the full utterance is synthesized. Missing credentials and
//! provider errors degrade to an empty stream — text delivery never
//! depends on audio working.

use async_trait::async_trait;
use futures::TryStreamExt;
use serde_json::json;
use tracing::{debug, warn};

use voxrelay_core::config::SynthesisConfig;

use crate::{AudioStream, SpeechSynthesizer, empty_audio_stream};

const ELEVENLABS_BASE_URL: &str = "https://api.elevenlabs.io";
const DEFAULT_MODEL: &str = "eleven_turbo_v2";

pub struct ElevenLabsSynthesizer {
    config: SynthesisConfig,
    base_url: String,
    client: reqwest::Client,
}

impl ElevenLabsSynthesizer {
    pub fn new(config: SynthesisConfig) -> Self {
        Self::with_base_url(config, ELEVENLABS_BASE_URL)
    }

    pub fn with_base_url(config: SynthesisConfig, base_url: &str) -> Self {
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

#[async_trait]
impl SpeechSynthesizer for ElevenLabsSynthesizer {
    async fn synthesize(&self, text: &str) -> anyhow::Result<AudioStream> {
        let Some(api_key) = self.config.resolve_api_key() else {
            warn!("Synthesis API key not configured — skipping audio");
            return Ok(empty_audio_stream());
        };

        let voice_id = self.config.resolve_voice_id();
        let model = self.config.model.as_deref().unwrap_or(DEFAULT_MODEL);

        debug!(voice = %voice_id, model, text_len = text.len(), "Starting synthesis stream");

        let url = format!("{}/v1/text-to-speech/{voice_id}/stream", self.base_url);
        let resp = self
            .client
            .post(&url)
            .header("xi-api-key", &api_key)
            .header("Accept", "audio/mpeg")
            .json(&json!({
                "text": text,
                "model_id": model,
                "voice_settings": {
                    "stability": 0.5,
                    "similarity_boost": 0.75,
                    "style": 0.0,
                    "use_speaker_boost": true,
                },
            }))
            .send()
            .await?;

        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            warn!(%status, %body, "Synthesis API error — skipping audio");
            return Ok(empty_audio_stream());
        }

        Ok(Box::pin(resp.bytes_stream().map_err(anyhow::Error::from)))
    }
}
