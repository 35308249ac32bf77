//! Configuration loading and validation.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// Top-level voxrelay configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gateway: Option<GatewayConfig>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub transcription: Option<TranscriptionConfig>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub generation: Option<GenerationConfig>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub synthesis: Option<SynthesisConfig>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub knowledge: Option<KnowledgeConfig>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub logging: Option<LoggingConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayConfig {
    #[serde(default = "default_port")]
    pub port: u16,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub bind: Option<String>,

    /// Expose the `/debug/env` credential-metadata endpoint. Off by
    /// default: it reveals which keys are configured and a masked preview.
    #[serde(default)]
    pub diagnostics: bool,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            port: default_port(),
            bind: None,
            diagnostics: false,
        }
    }
}

fn default_port() -> u16 {
    8000
}

/// Speech-to-text (Deepgram) configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranscriptionConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key_env: Option<String>,

    /// Model name (default: "nova-2").
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,

    /// Request timeout in seconds (default: 30).
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for TranscriptionConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            api_key_env: None,
            model: None,
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl TranscriptionConfig {
    pub fn resolve_api_key(&self) -> Option<String> {
        resolve_secret_field(&self.api_key, &self.api_key_env)
            .or_else(|| env_secret("DEEPGRAM_API_KEY"))
    }
}

/// Reply generation (Groq chat completions) configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key_env: Option<String>,

    /// Model name (default: "llama-3.3-70b-versatile").
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,

    /// Completion length bound (default: 300).
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,

    /// Sampling temperature (default: 0.7).
    #[serde(default = "default_temperature")]
    pub temperature: f64,

    /// Request timeout in seconds (default: 30).
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_max_tokens() -> u32 {
    300
}

fn default_temperature() -> f64 {
    0.7
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            api_key_env: None,
            model: None,
            max_tokens: default_max_tokens(),
            temperature: default_temperature(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl GenerationConfig {
    pub fn resolve_api_key(&self) -> Option<String> {
        resolve_secret_field(&self.api_key, &self.api_key_env)
            .or_else(|| env_secret("GROQ_API_KEY"))
    }
}

/// Speech synthesis (ElevenLabs) configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SynthesisConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key_env: Option<String>,

    /// Voice ID (default: ElevenLabs "Rachel").
    #[serde(skip_serializing_if = "Option::is_none")]
    pub voice_id: Option<String>,

    /// Model ID (default: "eleven_turbo_v2").
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,

    /// Transport timeout in seconds (default: 30).
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for SynthesisConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            api_key_env: None,
            voice_id: None,
            model: None,
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl SynthesisConfig {
    pub fn resolve_api_key(&self) -> Option<String> {
        resolve_secret_field(&self.api_key, &self.api_key_env)
            .or_else(|| env_secret("ELEVENLABS_API_KEY"))
    }

    /// Voice ID: config value, then `ELEVENLABS_VOICE_ID`, then the default.
    pub fn resolve_voice_id(&self) -> String {
        self.voice_id
            .clone()
            .filter(|v| !v.is_empty())
            .or_else(|| env_secret("ELEVENLABS_VOICE_ID"))
            .unwrap_or_else(|| DEFAULT_VOICE_ID.to_string())
    }
}

/// ElevenLabs "Rachel".
pub const DEFAULT_VOICE_ID: &str = "21m00Tcm4TlvDq8ikWAM";

fn default_timeout_secs() -> u64 {
    30
}

/// Knowledge base configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KnowledgeConfig {
    /// Directory scanned for `.txt` and `.pdf` documents at startup
    /// (default: "knowledge_base").
    #[serde(default = "default_knowledge_dir")]
    pub dir: String,
}

impl Default for KnowledgeConfig {
    fn default() -> Self {
        Self {
            dir: default_knowledge_dir(),
        }
    }
}

fn default_knowledge_dir() -> String {
    "knowledge_base".into()
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log format: "plain" (default) or "json".
    #[serde(default = "default_log_format")]
    pub format: String,

    /// Log level override (trace/debug/info/warn/error).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub level: Option<String>,

    /// Per-crate log level overrides (e.g. "voxrelay_gateway=debug").
    #[serde(default)]
    pub filters: Vec<String>,
}

fn default_log_format() -> String {
    "plain".into()
}

/// Resolve a secret: check the direct value first, then the env-var reference.
pub fn resolve_secret_field(direct: &Option<String>, env_var: &Option<String>) -> Option<String> {
    if let Some(val) = direct {
        if !val.is_empty() {
            return Some(val.clone());
        }
    }
    if let Some(env) = env_var {
        if let Ok(val) = std::env::var(env) {
            if !val.is_empty() {
                return Some(val);
            }
        }
    }
    None
}

fn env_secret(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.is_empty())
}

/// Substitute `${ENV_VAR}` patterns in a string with their environment variable values.
fn substitute_env_vars(input: &str) -> String {
    let re = regex::Regex::new(r"\$\{([^}]+)\}").unwrap();
    re.replace_all(input, |caps: &regex::Captures| {
        let var_name = &caps[1];
        std::env::var(var_name).unwrap_or_default()
    })
    .into_owned()
}

impl Config {
    /// Load config from a JSON5 file, substituting `${ENV_VAR}` references.
    /// A missing file yields the defaults.
    pub fn load(path: &Path) -> crate::error::Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let raw = std::fs::read_to_string(path).map_err(crate::error::VoxrelayError::Io)?;
        let substituted = substitute_env_vars(&raw);

        let config: Config = json5::from_str(&substituted)
            .map_err(|e| crate::error::VoxrelayError::Config(e.to_string()))?;

        Ok(config)
    }

    /// Default config file path: `~/.voxrelay/config.json`.
    pub fn config_path() -> PathBuf {
        data_dir().join("config.json")
    }

    /// Gateway port.
    pub fn gateway_port(&self) -> u16 {
        self.gateway.as_ref().map(|g| g.port).unwrap_or(8000)
    }

    /// Gateway bind address.
    pub fn gateway_bind(&self) -> String {
        self.gateway
            .as_ref()
            .and_then(|g| g.bind.clone())
            .unwrap_or_else(|| "0.0.0.0".to_string())
    }

    /// Whether the diagnostics endpoint is exposed.
    pub fn diagnostics_enabled(&self) -> bool {
        self.gateway.as_ref().map(|g| g.diagnostics).unwrap_or(false)
    }

    /// Knowledge base directory, resolving `~` if present.
    pub fn knowledge_dir(&self) -> PathBuf {
        let dir = self
            .knowledge
            .as_ref()
            .map(|k| k.dir.clone())
            .unwrap_or_else(default_knowledge_dir);
        PathBuf::from(shellexpand::tilde(&dir).as_ref())
    }

    pub fn transcription(&self) -> TranscriptionConfig {
        self.transcription.clone().unwrap_or_default()
    }

    pub fn generation(&self) -> GenerationConfig {
        self.generation.clone().unwrap_or_default()
    }

    pub fn synthesis(&self) -> SynthesisConfig {
        self.synthesis.clone().unwrap_or_default()
    }

    /// Validate config, returning (warnings, errors).
    pub fn validate(&self) -> (Vec<String>, Vec<String>) {
        let mut warnings = Vec::new();
        let mut errors = Vec::new();

        if self.transcription().resolve_api_key().is_none() {
            warnings.push(
                "No transcription API key configured — spoken audio will not transcribe".into(),
            );
        }
        if self.generation().resolve_api_key().is_none() {
            warnings
                .push("No generation API key configured — replies will use the fallback".into());
        }
        if self.synthesis().resolve_api_key().is_none() {
            warnings.push("No synthesis API key configured — responses will be text-only".into());
        }

        if let Some(gw) = &self.gateway {
            if gw.port == 0 {
                errors.push("Gateway port cannot be 0".to_string());
            }
            if gw.diagnostics {
                warnings.push(
                    "Diagnostics endpoint enabled — /debug/env exposes credential metadata".into(),
                );
            }
        }

        (warnings, errors)
    }
}

/// Base directory for voxrelay data: `~/.voxrelay/`
pub fn data_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".voxrelay")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.gateway_port(), 8000);
        assert_eq!(config.gateway_bind(), "0.0.0.0");
        assert!(!config.diagnostics_enabled());
        assert_eq!(config.knowledge_dir(), PathBuf::from("knowledge_base"));
        assert_eq!(config.generation().max_tokens, 300);
        assert_eq!(config.generation().temperature, 0.7);
        assert_eq!(config.synthesis().timeout_secs, 30);
    }

    #[test]
    fn test_env_var_substitution() {
        // SAFETY: test-only, single-threaded test runner
        unsafe { std::env::set_var("TEST_VX_KEY", "sk-test-123") };
        let input = r#"{"key": "${TEST_VX_KEY}", "other": "plain"}"#;
        let result = substitute_env_vars(input);
        assert!(result.contains("sk-test-123"));
        assert!(result.contains("plain"));
        unsafe { std::env::remove_var("TEST_VX_KEY") };
    }

    #[test]
    fn test_resolve_api_key_direct_over_env() {
        // SAFETY: test-only, single-threaded test runner
        unsafe { std::env::set_var("TEST_VX_GEN_KEY", "from-env") };
        let r#gen = GenerationConfig {
            api_key: Some("direct-key".into()),
            api_key_env: Some("TEST_VX_GEN_KEY".into()),
            ..Default::default()
        };
        assert_eq!(r#gen.resolve_api_key(), Some("direct-key".into()));

        let r#gen = GenerationConfig {
            api_key: None,
            api_key_env: Some("TEST_VX_GEN_KEY".into()),
            ..Default::default()
        };
        assert_eq!(r#gen.resolve_api_key(), Some("from-env".into()));
        unsafe { std::env::remove_var("TEST_VX_GEN_KEY") };
    }

    #[test]
    fn test_voice_id_default() {
        let synth = SynthesisConfig::default();
        // Guard against an ambient override leaking into the assertion
        let saved = std::env::var("ELEVENLABS_VOICE_ID").ok();
        unsafe { std::env::remove_var("ELEVENLABS_VOICE_ID") };
        assert_eq!(synth.resolve_voice_id(), DEFAULT_VOICE_ID);

        unsafe { std::env::set_var("ELEVENLABS_VOICE_ID", "custom-voice") };
        assert_eq!(synth.resolve_voice_id(), "custom-voice");
        unsafe { std::env::remove_var("ELEVENLABS_VOICE_ID") };
        if let Some(val) = saved {
            unsafe { std::env::set_var("ELEVENLABS_VOICE_ID", val) };
        }
    }

    #[test]
    fn test_json5_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(
            &path,
            r#"{
                // comments are fine in json5
                gateway: { port: 9100, diagnostics: true },
                generation: { max_tokens: 128 },
            }"#,
        )
        .unwrap();

        let config = Config::load(&path).unwrap();
        assert_eq!(config.gateway_port(), 9100);
        assert!(config.diagnostics_enabled());
        assert_eq!(config.generation().max_tokens, 128);
        // untouched sections keep defaults
        assert_eq!(config.generation().temperature, 0.7);
    }

    #[test]
    fn test_missing_file_is_default() {
        let config = Config::load(Path::new("/nonexistent/voxrelay.json")).unwrap();
        assert_eq!(config.gateway_port(), 8000);
    }

    #[test]
    fn test_validate_zero_port_errors() {
        let config = Config {
            gateway: Some(GatewayConfig {
                port: 0,
                bind: None,
                diagnostics: false,
            }),
            ..Default::default()
        };
        let (_warnings, errors) = config.validate();
        assert!(errors.iter().any(|e| e.contains("port")));
    }
}
