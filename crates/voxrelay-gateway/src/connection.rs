//! Per-connection session orchestrator.
//!
//! Each turn runs `Idle -> Listening -> Thinking -> Speaking -> Idle`:
//! the loop blocks on the next inbound message, so a new turn never starts
//! before the previous one finished its full response cycle.

use std::sync::Arc;
use std::time::Duration;

use axum::extract::ws::{Message, WebSocket};
use futures::StreamExt;
use tracing::{debug, info, warn};
use uuid::Uuid;

use voxrelay_core::persona::{FALLBACK_REPLY, GREETING};
use voxrelay_core::protocol::{
    ClientMessage, ErrorKind, NO_SPEECH_MESSAGE, ResponseStyle, STATUS_LISTENING, STATUS_SPEAKING,
    STATUS_THINKING, ServerMessage, decode_audio_payload, decode_text_payload,
};

use crate::state::GatewayState;

/// How one turn ended, when it did not complete normally.
///
/// The loop decides what happens next: recoverable variants produce one
/// `error` frame and the session continues; `ConnectionClosed` exits
/// cleanly with nothing emitted.
#[derive(Debug)]
pub enum TurnError {
    /// Transcription produced no text; the turn is abandoned.
    NoSpeech,
    /// Something inside the turn failed (bad payload, encoding, ...).
    Fault(String),
    /// The client went away mid-turn; outstanding work is dropped.
    ConnectionClosed,
}

/// Handle one voice session for the lifetime of its WebSocket.
pub async fn handle_voice_connection(state: Arc<GatewayState>, mut ws: WebSocket) {
    let session_id = Uuid::new_v4();
    info!(%session_id, "Voice session connected");

    while let Some(msg_result) = ws.recv().await {
        let msg = match msg_result {
            Ok(m) => m,
            Err(e) => {
                debug!(%session_id, %e, "WebSocket error");
                break;
            }
        };

        match msg {
            Message::Text(text) => {
                let inbound = match serde_json::from_str::<ClientMessage>(text.as_str()) {
                    Ok(m) => m,
                    Err(e) => {
                        if serde_json::from_str::<serde_json::Value>(text.as_str()).is_ok() {
                            // Valid JSON we don't understand: no-op turn
                            debug!(%session_id, "Ignoring unsupported message");
                            continue;
                        }
                        warn!(%session_id, %e, "Malformed message");
                        let frame = ServerMessage::error(
                            ErrorKind::TurnFailed,
                            format!("Invalid message: {e}"),
                        );
                        if send_json(&mut ws, &frame).await.is_err() {
                            break;
                        }
                        continue;
                    }
                };

                match run_turn(&state, &mut ws, inbound).await {
                    Ok(()) => {}
                    Err(TurnError::ConnectionClosed) => break,
                    Err(TurnError::NoSpeech) => {
                        let frame = ServerMessage::error(ErrorKind::NoSpeech, NO_SPEECH_MESSAGE);
                        if send_json(&mut ws, &frame).await.is_err() {
                            break;
                        }
                    }
                    Err(TurnError::Fault(message)) => {
                        warn!(%session_id, %message, "Turn failed");
                        let frame = ServerMessage::error(ErrorKind::TurnFailed, message);
                        if send_json(&mut ws, &frame).await.is_err() {
                            break;
                        }
                    }
                }
            }
            Message::Close(_) => {
                debug!(%session_id, "Client requested close");
                break;
            }
            // Binary/ping/pong from the client have no meaning here
            _ => {}
        }
    }

    info!(%session_id, "Voice session closed");
}

/// Run one turn to completion.
async fn run_turn(
    state: &Arc<GatewayState>,
    ws: &mut WebSocket,
    msg: ClientMessage,
) -> Result<(), TurnError> {
    match msg {
        ClientMessage::Greeting => {
            send_json(
                ws,
                &ServerMessage::Response {
                    text: GREETING.to_string(),
                },
            )
            .await?;
            speak(state, ws, GREETING).await
        }

        ClientMessage::Audio {
            audio,
            is_text,
            style,
        } => {
            let transcript = if is_text {
                decode_text_payload(&audio).map_err(fault)?
            } else {
                let bytes = decode_audio_payload(&audio).map_err(fault)?;
                send_json(ws, &ServerMessage::status(STATUS_LISTENING)).await?;
                transcribe_or_empty(state, &bytes).await
            };

            if transcript.is_empty() {
                return Err(TurnError::NoSpeech);
            }

            send_json(
                ws,
                &ServerMessage::Transcript {
                    text: transcript.clone(),
                },
            )
            .await?;
            send_json(ws, &ServerMessage::status(STATUS_THINKING)).await?;

            let reply = generate_or_fallback(state, &transcript, style).await;
            send_json(ws, &ServerMessage::Response {
                text: reply.clone(),
            })
            .await?;

            speak(state, ws, &reply).await
        }
    }
}

/// Emit the Speaking status, stream audio chunks, and close the turn with
/// `audio_complete`. Audio failure never blocks text delivery: a setup
/// error means zero chunks, a mid-stream fault truncates, and
/// `audio_complete` is emitted either way.
async fn speak(
    state: &Arc<GatewayState>,
    ws: &mut WebSocket,
    text: &str,
) -> Result<(), TurnError> {
    send_json(ws, &ServerMessage::status(STATUS_SPEAKING)).await?;

    match state.synthesizer.synthesize(text).await {
        Ok(mut stream) => {
            while let Some(chunk) = stream.next().await {
                match chunk {
                    Ok(bytes) => {
                        if !bytes.is_empty() {
                            ws.send(Message::Binary(bytes))
                                .await
                                .map_err(|_| TurnError::ConnectionClosed)?;
                        }
                    }
                    Err(e) => {
                        warn!(%e, "Synthesis stream fault, truncating audio");
                        break;
                    }
                }
            }
        }
        Err(e) => {
            warn!(%e, "Synthesis failed, skipping audio");
        }
    }

    send_json(ws, &ServerMessage::AudioComplete).await
}

/// Transcribe with a bounded timeout; any failure degrades to an empty
/// transcript ("no speech recognized"), never an error.
async fn transcribe_or_empty(state: &Arc<GatewayState>, audio: &[u8]) -> String {
    let timeout = Duration::from_secs(state.config.transcription().timeout_secs);
    match tokio::time::timeout(timeout, state.transcriber.transcribe(audio)).await {
        Ok(Ok(text)) => text,
        Ok(Err(e)) => {
            warn!(%e, "Transcription failed");
            String::new()
        }
        Err(_) => {
            warn!("Transcription timed out");
            String::new()
        }
    }
}

/// Generate with a bounded timeout; any failure degrades to the fixed
/// fallback reply, so the conversation never hard-fails on generation.
async fn generate_or_fallback(
    state: &Arc<GatewayState>,
    transcript: &str,
    style: ResponseStyle,
) -> String {
    let timeout = Duration::from_secs(state.config.generation().timeout_secs);
    match tokio::time::timeout(timeout, state.generator.generate(transcript, style)).await {
        Ok(Ok(reply)) => reply,
        Ok(Err(e)) => {
            warn!(%e, "Reply generation failed");
            FALLBACK_REPLY.to_string()
        }
        Err(_) => {
            warn!("Reply generation timed out");
            FALLBACK_REPLY.to_string()
        }
    }
}

async fn send_json(ws: &mut WebSocket, msg: &ServerMessage) -> Result<(), TurnError> {
    let json = serde_json::to_string(msg).map_err(|e| TurnError::Fault(e.to_string()))?;
    ws.send(Message::Text(json.into()))
        .await
        .map_err(|_| TurnError::ConnectionClosed)
}

fn fault(e: anyhow::Error) -> TurnError {
    TurnError::Fault(e.to_string())
}
