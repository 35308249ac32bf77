//! Vendor capability adapters.
//!
//! Each leg of the voice pipeline is a trait so vendors are swappable and
//! the orchestrator can be tested against in-process fakes:
//! [`Transcriber`] (audio -> text), [`ReplyGenerator`] (text -> text), and
//! [`SpeechSynthesizer`] (text -> stream of audio bytes).
//!
//! Adapters report failures as errors; the degrade policy (empty transcript,
//! fallback reply, silent audio) belongs to the caller.

use std::pin::Pin;

use async_trait::async_trait;
use bytes::Bytes;
use futures::Stream;

use voxrelay_core::protocol::ResponseStyle;

pub mod deepgram;
pub mod elevenlabs;
pub mod groq;

pub use deepgram::DeepgramTranscriber;
pub use elevenlabs::ElevenLabsSynthesizer;
pub use groq::GroqGenerator;

/// Lazy, finite, non-restartable sequence of synthesized audio chunks.
/// Dropping it cancels the underlying request.
pub type AudioStream = Pin<Box<dyn Stream<Item = anyhow::Result<Bytes>> + Send>>;

/// Speech-to-text.
#[async_trait]
pub trait Transcriber: Send + Sync {
    /// Transcribe one recorded utterance. An empty string means the
    /// provider heard nothing, not an error.
    async fn transcribe(&self, audio: &[u8]) -> anyhow::Result<String>;
}

/// Conversational reply generation.
#[async_trait]
pub trait ReplyGenerator: Send + Sync {
    async fn generate(&self, user_text: &str, style: ResponseStyle) -> anyhow::Result<String>;
}

/// Text-to-speech.
#[async_trait]
pub trait SpeechSynthesizer: Send + Sync {
    /// Start synthesis and return the chunk stream. An empty stream means
    /// "no audio to play" (e.g. no credential configured), not an error.
    async fn synthesize(&self, text: &str) -> anyhow::Result<AudioStream>;
}

/// An `AudioStream` that yields nothing.
pub fn empty_audio_stream() -> AudioStream {
    Box::pin(futures::stream::empty())
}
