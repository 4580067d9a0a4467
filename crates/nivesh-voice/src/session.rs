//! The voice session: capture, pipeline and events under one handle.
//!
//! All session state lives here rather than in globals, and every change is
//! published on the event channel. The session is not `Send` (it owns audio
//! handles), so it is driven from one task; the event receiver can move
//! wherever the front end runs.

use crate::backend::AssistantBackend;
use crate::capture::Capture;
use crate::error::{VoiceError, VoiceResult};
use crate::pipeline::{SessionEvent, StatusLine, TurnFailure, TurnPhase, TurnPipeline};
use crate::playback::{Playback, SpeechSink};
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::warn;

/// Snapshot of what the session is doing right now.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SessionState {
    pub recording: bool,
    pub speaking: bool,
}

/// One user's voice-chat session.
pub struct VoiceSession {
    capture: Capture,
    pipeline: TurnPipeline,
    backend: Arc<dyn AssistantBackend>,
    events: mpsc::UnboundedSender<SessionEvent>,
    event_rx: Option<mpsc::UnboundedReceiver<SessionEvent>>,
}

impl VoiceSession {
    pub fn new(
        capture: Capture,
        sink: Box<dyn SpeechSink>,
        backend: Arc<dyn AssistantBackend>,
    ) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        let playback = Playback::new(sink, Arc::clone(&backend));
        Self {
            capture,
            pipeline: TurnPipeline::new(Arc::clone(&backend), playback, tx.clone()),
            backend,
            events: tx,
            event_rx: Some(rx),
        }
    }

    /// The event stream. Can only be taken once; later calls return `None`.
    pub fn take_event_receiver(&mut self) -> Option<mpsc::UnboundedReceiver<SessionEvent>> {
        self.event_rx.take()
    }

    pub fn state(&self) -> SessionState {
        SessionState {
            recording: self.capture.is_recording(),
            speaking: self.pipeline.is_speaking(),
        }
    }

    pub fn phase(&self) -> TurnPhase {
        self.pipeline.phase()
    }

    pub fn transcript(&self) -> &[crate::pipeline::ChatTurn] {
        self.pipeline.transcript()
    }

    fn emit(&self, event: SessionEvent) {
        let _ = self.events.send(event);
    }

    /// Mic button. Not recording: barge in on any playback, then start.
    /// Recording: stop and run the turn with the take.
    ///
    /// A denied microphone is reported through events and leaves the session
    /// usable for typed queries; other failures propagate.
    pub async fn toggle_mic(&mut self) -> VoiceResult<()> {
        if self.capture.is_recording() {
            let take = self.capture.stop_recording()?;
            self.pipeline.submit_audio(take).await;
            return Ok(());
        }
        if self.pipeline.is_busy() {
            warn!("mic ignored: turn already in flight");
            return Ok(());
        }
        self.pipeline.barge_in();
        match self.capture.start_recording() {
            Ok(()) => {
                self.emit(SessionEvent::Status(StatusLine::Recording));
                Ok(())
            }
            Err(VoiceError::PermissionDenied(reason)) => {
                warn!("microphone denied: {}", reason);
                self.emit(SessionEvent::TurnFailed(TurnFailure::MicDenied));
                self.emit(SessionEvent::Status(StatusLine::MicDenied));
                Ok(())
            }
            Err(e) => Err(e),
        }
    }

    /// Typed query. Returns `false` when ignored (busy or blank).
    pub async fn send_text(&mut self, query: &str) -> bool {
        self.pipeline.submit_text(query).await
    }

    /// Probe the backend and publish Connected or Disconnected.
    pub async fn check_health(&mut self) -> VoiceResult<bool> {
        let healthy = self.backend.health().await?;
        self.emit(SessionEvent::Status(if healthy {
            StatusLine::Connected
        } else {
            StatusLine::Disconnected
        }));
        Ok(healthy)
    }
}
