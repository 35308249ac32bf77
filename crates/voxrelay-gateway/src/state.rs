//! Gateway shared state.

use std::sync::Arc;

use voxrelay_core::config::Config;
use voxrelay_core::knowledge::KnowledgeBase;
use voxrelay_providers::{ReplyGenerator, SpeechSynthesizer, Transcriber};

/// State shared by every connection and handler.
///
/// Everything here is read-only after startup; sessions share no mutable
/// state, so no cross-session locking exists. The providers are trait
/// objects so tests can inject in-process fakes.
pub struct GatewayState {
    pub config: Arc<Config>,
    pub knowledge: Arc<KnowledgeBase>,
    pub transcriber: Arc<dyn Transcriber>,
    pub generator: Arc<dyn ReplyGenerator>,
    pub synthesizer: Arc<dyn SpeechSynthesizer>,
}

impl GatewayState {
    pub fn new(
        config: Arc<Config>,
        knowledge: Arc<KnowledgeBase>,
        transcriber: Arc<dyn Transcriber>,
        generator: Arc<dyn ReplyGenerator>,
        synthesizer: Arc<dyn SpeechSynthesizer>,
    ) -> Self {
        Self {
            config,
            knowledge,
            transcriber,
            generator,
            synthesizer,
        }
    }
}
