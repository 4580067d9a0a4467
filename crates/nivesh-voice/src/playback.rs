//! Speech playback with barge-in.
//!
//! [`SpeechSink`] is the seam over the audio output; [`RodioSink`] is the real
//! one. Cancellation is split in two: the local sink stops synchronously so
//! the speaker goes quiet at once, and the backend is notified on a spawned
//! task whose outcome never blocks or fails the caller.

use crate::backend::AssistantBackend;
use crate::error::{VoiceError, VoiceResult};
use base64::Engine;
use rodio::{Decoder, OutputStream, OutputStreamHandle, Sink, Source};
use std::cell::RefCell;
use std::io::Cursor;
use std::sync::Arc;
use tracing::{debug, warn};

/// Destination for synthesized speech. Not `Send`: the real sink owns an OS
/// audio handle pinned to its thread.
pub trait SpeechSink {
    /// Start playing an encoded audio clip, replacing anything in flight.
    fn play(&self, bytes: &[u8]) -> VoiceResult<()>;

    /// Stop immediately. A no-op when nothing is playing.
    fn stop(&self);

    fn is_playing(&self) -> bool;
}

/// Speech output through the system default device.
///
/// A fresh `Sink` is created per clip; a stopped rodio sink does not accept
/// new sources.
pub struct RodioSink {
    _stream: OutputStream,
    handle: OutputStreamHandle,
    sink: RefCell<Option<Sink>>,
}

impl RodioSink {
    pub fn try_default() -> VoiceResult<Self> {
        let (stream, handle) =
            OutputStream::try_default().map_err(|e| VoiceError::Playback(e.to_string()))?;
        Ok(Self {
            _stream: stream,
            handle,
            sink: RefCell::new(None),
        })
    }
}

impl SpeechSink for RodioSink {
    fn play(&self, bytes: &[u8]) -> VoiceResult<()> {
        let mut slot = self.sink.borrow_mut();
        if let Some(old) = slot.take() {
            old.stop();
        }
        let sink = Sink::try_new(&self.handle).map_err(|e| VoiceError::Playback(e.to_string()))?;
        let source = Decoder::new(Cursor::new(bytes.to_vec()))
            .map_err(|e| VoiceError::Playback(e.to_string()))?;
        sink.append(source.convert_samples::<f32>());
        *slot = Some(sink);
        Ok(())
    }

    fn stop(&self) {
        if let Some(sink) = self.sink.borrow_mut().take() {
            sink.stop();
        }
    }

    fn is_playing(&self) -> bool {
        self.sink
            .borrow()
            .as_ref()
            .map(|s| !s.empty())
            .unwrap_or(false)
    }
}

/// Discards audio. Stands in when no output device is available.
#[derive(Default)]
pub struct NullSink;

impl SpeechSink for NullSink {
    fn play(&self, _bytes: &[u8]) -> VoiceResult<()> {
        Ok(())
    }

    fn stop(&self) {}

    fn is_playing(&self) -> bool {
        false
    }
}

/// Playback controller: decodes reply audio, drives the sink and handles
/// cancellation.
pub struct Playback {
    sink: Box<dyn SpeechSink>,
    backend: Arc<dyn AssistantBackend>,
}

impl Playback {
    pub fn new(sink: Box<dyn SpeechSink>, backend: Arc<dyn AssistantBackend>) -> Self {
        Self { sink, backend }
    }

    pub fn is_speaking(&self) -> bool {
        self.sink.is_playing()
    }

    /// Play a reply clip. Accepts a raw base64 payload or a data URI; an
    /// empty payload is silently skipped.
    pub fn play(&self, audio_data: &str) -> VoiceResult<()> {
        let payload = strip_data_uri(audio_data);
        if payload.is_empty() {
            return Ok(());
        }
        let bytes = base64::engine::general_purpose::STANDARD
            .decode(payload)
            .map_err(|e| VoiceError::Playback(format!("bad audio payload: {e}")))?;
        debug!("playing {} bytes of reply audio", bytes.len());
        self.sink.play(&bytes)
    }

    /// Barge-in. The sink stops before this returns; the backend notification
    /// runs on its own task and a failure there is only logged.
    pub fn cancel(&self) {
        if !self.sink.is_playing() {
            return;
        }
        self.sink.stop();
        let backend = Arc::clone(&self.backend);
        tokio::spawn(async move {
            if let Err(e) = backend.cancel_response().await {
                warn!("cancel notification failed: {}", e);
            }
        });
    }
}

fn strip_data_uri(audio_data: &str) -> &str {
    match audio_data.split_once("base64,") {
        Some((_, payload)) => payload.trim(),
        None => audio_data.trim(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::TurnReply;
    use async_trait::async_trait;

    struct NoBackend;

    #[async_trait]
    impl AssistantBackend for NoBackend {
        async fn transcribe(&self, _uri: &str) -> VoiceResult<String> {
            Ok(String::new())
        }

        async fn answer(&self, _query: &str) -> VoiceResult<TurnReply> {
            Ok(TurnReply {
                text: String::new(),
                audio_data: None,
            })
        }

        async fn cancel_response(&self) -> VoiceResult<()> {
            Ok(())
        }

        async fn health(&self) -> VoiceResult<bool> {
            Ok(true)
        }
    }

    #[test]
    fn data_uri_prefix_is_stripped() {
        assert_eq!(strip_data_uri("data:audio/mp3;base64,AAAA"), "AAAA");
        assert_eq!(strip_data_uri("AAAA"), "AAAA");
        assert_eq!(strip_data_uri("  "), "");
    }

    #[test]
    fn garbage_payload_is_a_playback_error() {
        let playback = Playback::new(Box::new(NullSink), Arc::new(NoBackend));
        assert!(matches!(
            playback.play("data:audio/mp3;not base64 at all"),
            Err(VoiceError::Playback(_))
        ));
    }

    #[test]
    fn empty_payload_is_skipped() {
        let playback = Playback::new(Box::new(NullSink), Arc::new(NoBackend));
        assert!(playback.play("").is_ok());
        assert!(playback.play("data:audio/mp3;base64,").is_ok());
        assert!(!playback.is_speaking());
    }
}
