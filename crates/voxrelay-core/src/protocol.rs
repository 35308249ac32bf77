//! Voice relay wire protocol.
//!
//! All conversation traffic rides one WebSocket: structured JSON frames in
//! both directions, plus raw binary frames carrying synthesized audio from
//! server to client. Binary frames always follow a `response` frame and
//! precede the `audio_complete` that closes the turn.

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use serde::{Deserialize, Serialize};

/// Status line sent before the transcription call.
pub const STATUS_LISTENING: &str = "Listening...";
/// Status line sent before the reply-generation call.
pub const STATUS_THINKING: &str = "Thinking...";
/// Status line sent before streaming synthesized audio.
pub const STATUS_SPEAKING: &str = "Speaking...";

/// Error message for a turn where no speech was recognized.
pub const NO_SPEECH_MESSAGE: &str = "Sorry, I didn't catch that";

/// Requested reply length. Unrecognized values fall back to
/// [`ResponseStyle::Conversational`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", from = "String")]
pub enum ResponseStyle {
    Concise,
    #[default]
    Conversational,
    Detailed,
}

impl From<String> for ResponseStyle {
    fn from(s: String) -> Self {
        match s.as_str() {
            "concise" => Self::Concise,
            "detailed" => Self::Detailed,
            _ => Self::Conversational,
        }
    }
}

/// Client -> Server message.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMessage {
    /// Ask the server to introduce itself.
    Greeting,

    /// One user utterance. `audio` is base64; when `is_text` is set the
    /// payload decodes straight to UTF-8 text and no transcription runs.
    Audio {
        audio: String,
        #[serde(default, rename = "isText")]
        is_text: bool,
        #[serde(default)]
        style: ResponseStyle,
    },
}

/// Enumerated error kind so clients can branch without string matching.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// Transcription produced no text; the turn was abandoned.
    NoSpeech,
    /// The turn failed mid-pipeline; the session stays open.
    TurnFailed,
}

/// Server -> Client message.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMessage {
    Status { message: String },
    Transcript { text: String },
    Response { text: String },
    Error { kind: ErrorKind, message: String },
    AudioComplete,
}

impl ServerMessage {
    pub fn status(message: &str) -> Self {
        Self::Status {
            message: message.to_string(),
        }
    }

    pub fn error(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self::Error {
            kind,
            message: message.into(),
        }
    }
}

/// Decode a base64 audio payload into raw bytes.
pub fn decode_audio_payload(payload: &str) -> anyhow::Result<Vec<u8>> {
    Ok(BASE64.decode(payload)?)
}

/// Decode a base64 payload directly as UTF-8 text (the `is_text` path).
pub fn decode_text_payload(payload: &str) -> anyhow::Result<String> {
    let bytes = BASE64.decode(payload)?;
    Ok(String::from_utf8(bytes)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_audio_message_wire_format() {
        let json = r#"{"type":"audio","audio":"aGk=","isText":true,"style":"concise"}"#;
        let msg: ClientMessage = serde_json::from_str(json).unwrap();
        match msg {
            ClientMessage::Audio {
                audio,
                is_text,
                style,
            } => {
                assert_eq!(audio, "aGk=");
                assert!(is_text);
                assert_eq!(style, ResponseStyle::Concise);
            }
            other => panic!("Expected audio message, got {other:?}"),
        }
    }

    #[test]
    fn test_audio_message_defaults() {
        let json = r#"{"type":"audio","audio":"aGk="}"#;
        let msg: ClientMessage = serde_json::from_str(json).unwrap();
        match msg {
            ClientMessage::Audio { is_text, style, .. } => {
                assert!(!is_text);
                assert_eq!(style, ResponseStyle::Conversational);
            }
            other => panic!("Expected audio message, got {other:?}"),
        }
    }

    #[test]
    fn test_unknown_style_falls_back_to_conversational() {
        let json = r#"{"type":"audio","audio":"aGk=","style":"verbose"}"#;
        let msg: ClientMessage = serde_json::from_str(json).unwrap();
        match msg {
            ClientMessage::Audio { style, .. } => {
                assert_eq!(style, ResponseStyle::Conversational);
            }
            other => panic!("Expected audio message, got {other:?}"),
        }
    }

    #[test]
    fn test_greeting_message() {
        let msg: ClientMessage = serde_json::from_str(r#"{"type":"greeting"}"#).unwrap();
        assert!(matches!(msg, ClientMessage::Greeting));
    }

    #[test]
    fn test_unknown_message_type_is_parse_error() {
        let result = serde_json::from_str::<ClientMessage>(r#"{"type":"ping"}"#);
        assert!(result.is_err());
    }

    #[test]
    fn test_text_payload_round_trip() {
        let encoded = BASE64.encode("hi there");
        assert_eq!(decode_text_payload(&encoded).unwrap(), "hi there");
    }

    #[test]
    fn test_text_payload_invalid_utf8() {
        let encoded = BASE64.encode([0xff, 0xfe, 0xfd]);
        assert!(decode_text_payload(&encoded).is_err());
    }

    #[test]
    fn test_invalid_base64_rejected() {
        assert!(decode_audio_payload("not base64!!!").is_err());
    }

    #[test]
    fn test_server_message_tags() {
        let json = serde_json::to_string(&ServerMessage::AudioComplete).unwrap();
        assert_eq!(json, r#"{"type":"audio_complete"}"#);

        let json =
            serde_json::to_string(&ServerMessage::error(ErrorKind::NoSpeech, NO_SPEECH_MESSAGE))
                .unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["type"], "error");
        assert_eq!(value["kind"], "no_speech");
        assert_eq!(value["message"], NO_SPEECH_MESSAGE);
    }
}
