//! The turn pipeline: one user utterance in, one spoken reply out.
//!
//! Phases run Idle -> Transcribing -> Querying -> AwaitingSpeech -> Idle.
//! Submissions while a turn is in flight are ignored rather than queued, and
//! every observable change goes out as a typed [`SessionEvent`] so front ends
//! subscribe instead of wiring callbacks.

use crate::backend::AssistantBackend;
use crate::error::VoiceError;
use crate::playback::Playback;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{info, warn};

/// Shown in place of a reply when the query leg fails.
pub const QUERY_FAILURE_MESSAGE: &str = "Sorry, I encountered an error processing your request.";

/// Where the pipeline is in the current turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TurnPhase {
    Idle,
    Transcribing,
    Querying,
    AwaitingSpeech,
}

/// Status line for a front end to display.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusLine {
    Ready,
    Recording,
    Processing,
    Responding,
    Speaking,
    MicDenied,
    Connected,
    Disconnected,
}

impl std::fmt::Display for StatusLine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            StatusLine::Ready => "Ready",
            StatusLine::Recording => "Recording...",
            StatusLine::Processing => "Processing audio...",
            StatusLine::Responding => "Getting response...",
            StatusLine::Speaking => "Playing response...",
            StatusLine::MicDenied => "Microphone access denied",
            StatusLine::Connected => "Connected",
            StatusLine::Disconnected => "Disconnected",
        };
        f.write_str(s)
    }
}

/// Which leg of a turn failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TurnFailure {
    MicDenied,
    Transcription,
    EmptyTranscription,
    Query,
    Playback,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChatRole {
    User,
    Bot,
}

/// One line of the conversation transcript.
#[derive(Debug, Clone, PartialEq)]
pub struct ChatTurn {
    pub role: ChatRole,
    pub text: String,
}

/// Everything a front end can observe about the session.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    Status(StatusLine),
    UserTurn(String),
    BotTurn(String),
    TurnFailed(TurnFailure),
    /// Playback was cut off by a new user action.
    Interrupted,
}

/// Drives a turn end to end: transcribe, query, speak.
pub struct TurnPipeline {
    phase: TurnPhase,
    backend: Arc<dyn AssistantBackend>,
    playback: Playback,
    transcript: Vec<ChatTurn>,
    events: mpsc::UnboundedSender<SessionEvent>,
}

impl TurnPipeline {
    pub fn new(
        backend: Arc<dyn AssistantBackend>,
        playback: Playback,
        events: mpsc::UnboundedSender<SessionEvent>,
    ) -> Self {
        Self {
            phase: TurnPhase::Idle,
            backend,
            playback,
            transcript: Vec::new(),
            events,
        }
    }

    pub fn phase(&self) -> TurnPhase {
        self.phase
    }

    /// A turn is in flight. Playback does not count: the pipeline returns to
    /// idle once the clip is handed to the sink so a new turn can barge in.
    pub fn is_busy(&self) -> bool {
        self.phase != TurnPhase::Idle
    }

    pub fn is_speaking(&self) -> bool {
        self.playback.is_speaking()
    }

    pub fn transcript(&self) -> &[ChatTurn] {
        &self.transcript
    }

    fn emit(&self, event: SessionEvent) {
        let _ = self.events.send(event);
    }

    fn set_phase(&mut self, phase: TurnPhase) {
        self.phase = phase;
    }

    /// Cut off playback if the bot is speaking. Emits [`SessionEvent::Interrupted`]
    /// after the speaker is already quiet.
    pub fn barge_in(&mut self) {
        if self.playback.is_speaking() {
            info!("barge-in: cancelling playback");
            self.playback.cancel();
            self.emit(SessionEvent::Interrupted);
        }
    }

    /// Run a turn from a recorded take. Returns `false` when the submission
    /// was ignored: busy, or nothing was recorded. A failed leg is reported
    /// through events rather than returned.
    pub async fn submit_audio(&mut self, audio_data_uri: Option<String>) -> bool {
        if self.is_busy() {
            warn!("submission ignored: turn already in flight");
            return false;
        }
        let Some(uri) = audio_data_uri else {
            self.emit(SessionEvent::Status(StatusLine::Ready));
            return false;
        };
        self.barge_in();
        self.set_phase(TurnPhase::Transcribing);
        self.emit(SessionEvent::Status(StatusLine::Processing));
        let text = match self.backend.transcribe(&uri).await {
            Ok(text) => text,
            Err(VoiceError::EmptyTranscription) => {
                info!("no speech detected in take");
                self.emit(SessionEvent::TurnFailed(TurnFailure::EmptyTranscription));
                self.finish_turn();
                return false;
            }
            Err(e) => {
                warn!("transcription failed: {}", e);
                self.emit(SessionEvent::TurnFailed(TurnFailure::Transcription));
                self.finish_turn();
                return false;
            }
        };
        self.push_turn(ChatRole::User, text.clone());
        self.query_and_speak(&text).await;
        true
    }

    /// Run a turn from typed text. Returns `false` when ignored (busy or
    /// blank input).
    pub async fn submit_text(&mut self, query: &str) -> bool {
        if self.is_busy() {
            warn!("submission ignored: turn already in flight");
            return false;
        }
        let query = query.trim().to_string();
        if query.is_empty() {
            return false;
        }
        self.barge_in();
        self.push_turn(ChatRole::User, query.clone());
        self.query_and_speak(&query).await;
        true
    }

    async fn query_and_speak(&mut self, query: &str) {
        self.set_phase(TurnPhase::Querying);
        self.emit(SessionEvent::Status(StatusLine::Responding));
        match self.backend.answer(query).await {
            Ok(reply) => {
                self.push_turn(ChatRole::Bot, reply.text);
                if let Some(audio) = reply.audio_data {
                    self.set_phase(TurnPhase::AwaitingSpeech);
                    self.emit(SessionEvent::Status(StatusLine::Speaking));
                    if let Err(e) = self.playback.play(&audio) {
                        warn!("reply playback failed: {}", e);
                        self.emit(SessionEvent::TurnFailed(TurnFailure::Playback));
                    }
                }
            }
            Err(e) => {
                warn!("query failed: {}", e);
                self.push_turn(ChatRole::Bot, QUERY_FAILURE_MESSAGE.to_string());
                self.emit(SessionEvent::TurnFailed(TurnFailure::Query));
            }
        }
        self.finish_turn();
    }

    fn push_turn(&mut self, role: ChatRole, text: String) {
        let event = match role {
            ChatRole::User => SessionEvent::UserTurn(text.clone()),
            ChatRole::Bot => SessionEvent::BotTurn(text.clone()),
        };
        self.transcript.push(ChatTurn { role, text });
        self.emit(event);
    }

    fn finish_turn(&mut self) {
        self.set_phase(TurnPhase::Idle);
        self.emit(SessionEvent::Status(StatusLine::Ready));
    }
}
