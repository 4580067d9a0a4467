//! End-to-end session flows against fake audio and a fake backend.

use async_trait::async_trait;
use nivesh_voice::{
    AssistantBackend, Capture, MicSource, SessionEvent, SpeechSink, StatusLine, TurnReply,
    VoiceResult, VoiceSession,
};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::mpsc;

struct FakeMic {
    take: Vec<f32>,
    acquired: bool,
}

impl FakeMic {
    fn with_take(take: Vec<f32>) -> Self {
        Self {
            take,
            acquired: false,
        }
    }
}

impl MicSource for FakeMic {
    fn acquire(&mut self) -> VoiceResult<()> {
        self.acquired = true;
        Ok(())
    }

    fn is_acquired(&self) -> bool {
        self.acquired
    }

    fn start(&mut self) -> VoiceResult<()> {
        Ok(())
    }

    fn stop(&mut self) -> VoiceResult<Vec<f32>> {
        Ok(std::mem::take(&mut self.take))
    }

    fn sample_rate(&self) -> u32 {
        16_000
    }
}

/// Logs stop calls into a shared ordering journal.
struct JournalSink {
    playing: AtomicBool,
    journal: Arc<Mutex<Vec<&'static str>>>,
}

impl JournalSink {
    fn is_playing(&self) -> bool {
        self.playing.load(Ordering::SeqCst)
    }
}

/// Local wrapper so the foreign `SpeechSink` trait can be implemented for a
/// shared `JournalSink` handle without tripping the orphan rule.
struct JournalSinkHandle(Arc<JournalSink>);

impl SpeechSink for JournalSinkHandle {
    fn play(&self, _bytes: &[u8]) -> VoiceResult<()> {
        self.0.playing.store(true, Ordering::SeqCst);
        Ok(())
    }

    fn stop(&self) {
        self.0.playing.store(false, Ordering::SeqCst);
        self.0.journal.lock().unwrap().push("sink_stopped");
    }

    fn is_playing(&self) -> bool {
        self.0.playing.load(Ordering::SeqCst)
    }
}

struct ScriptedBackend {
    transcription: String,
    replies: Mutex<Vec<TurnReply>>,
    journal: Arc<Mutex<Vec<&'static str>>>,
}

#[async_trait]
impl AssistantBackend for ScriptedBackend {
    async fn transcribe(&self, audio_data_uri: &str) -> VoiceResult<String> {
        assert!(audio_data_uri.starts_with("data:audio/wav;base64,"));
        Ok(self.transcription.clone())
    }

    async fn answer(&self, _query: &str) -> VoiceResult<TurnReply> {
        Ok(self.replies.lock().unwrap().remove(0))
    }

    async fn cancel_response(&self) -> VoiceResult<()> {
        self.journal.lock().unwrap().push("backend_notified");
        Ok(())
    }

    async fn health(&self) -> VoiceResult<bool> {
        Ok(true)
    }
}

fn session_with(
    take: Vec<f32>,
    replies: Vec<TurnReply>,
) -> (
    VoiceSession,
    Arc<JournalSink>,
    Arc<Mutex<Vec<&'static str>>>,
    mpsc::UnboundedReceiver<SessionEvent>,
) {
    let journal = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::new(JournalSink {
        playing: AtomicBool::new(false),
        journal: Arc::clone(&journal),
    });
    let backend = Arc::new(ScriptedBackend {
        transcription: "how are the markets".to_string(),
        replies: Mutex::new(replies),
        journal: Arc::clone(&journal),
    });
    let mut session = VoiceSession::new(
        Capture::new(Box::new(FakeMic::with_take(take))),
        Box::new(JournalSinkHandle(Arc::clone(&sink))),
        backend,
    );
    let rx = session.take_event_receiver().unwrap();
    (session, sink, journal, rx)
}

fn reply(text: &str, audio: Option<&str>) -> TurnReply {
    TurnReply {
        text: text.to_string(),
        audio_data: audio.map(str::to_string),
    }
}

fn drain(rx: &mut mpsc::UnboundedReceiver<SessionEvent>) -> Vec<SessionEvent> {
    let mut events = Vec::new();
    while let Ok(ev) = rx.try_recv() {
        events.push(ev);
    }
    events
}

#[tokio::test]
async fn voice_turn_runs_record_transcribe_answer_speak() {
    let (mut session, sink, _journal, mut rx) = session_with(
        vec![0.1, -0.2, 0.3],
        vec![reply("Markets are up today.", Some("AAAA"))],
    );

    session.toggle_mic().await.unwrap();
    assert!(session.state().recording);
    assert_eq!(
        drain(&mut rx).last(),
        Some(&SessionEvent::Status(StatusLine::Recording))
    );

    session.toggle_mic().await.unwrap();
    assert!(!session.state().recording);
    assert!(sink.is_playing());

    let events = drain(&mut rx);
    let statuses: Vec<_> = events
        .iter()
        .filter_map(|e| match e {
            SessionEvent::Status(s) => Some(*s),
            _ => None,
        })
        .collect();
    assert_eq!(
        statuses,
        vec![
            StatusLine::Processing,
            StatusLine::Responding,
            StatusLine::Speaking,
            StatusLine::Ready,
        ]
    );
    assert!(events.contains(&SessionEvent::UserTurn("how are the markets".to_string())));
    assert!(events.contains(&SessionEvent::BotTurn("Markets are up today.".to_string())));
}

#[tokio::test]
async fn pressing_mic_while_speaking_stops_sink_before_notifying_backend() {
    let (mut session, sink, journal, mut rx) = session_with(
        vec![0.1],
        vec![reply("First answer.", Some("AAAA"))],
    );

    assert!(session.send_text("first question").await);
    assert!(sink.is_playing());
    drain(&mut rx);

    session.toggle_mic().await.unwrap();
    assert!(!sink.is_playing());
    assert!(session.state().recording);
    assert_eq!(drain(&mut rx).first(), Some(&SessionEvent::Interrupted));

    // The backend notification runs on its own task, after the sink stop.
    for _ in 0..100 {
        if journal.lock().unwrap().len() == 2 {
            break;
        }
        tokio::task::yield_now().await;
    }
    let order = journal.lock().unwrap().clone();
    assert_eq!(order, vec!["sink_stopped", "backend_notified"]);
}

#[tokio::test]
async fn empty_take_produces_no_turn() {
    let (mut session, sink, _journal, mut rx) = session_with(Vec::new(), Vec::new());

    session.toggle_mic().await.unwrap();
    session.toggle_mic().await.unwrap();

    assert!(session.transcript().is_empty());
    assert!(!sink.is_playing());
    assert_eq!(
        drain(&mut rx).last(),
        Some(&SessionEvent::Status(StatusLine::Ready))
    );
}

#[tokio::test]
async fn text_and_voice_share_one_transcript() {
    let (mut session, _sink, _journal, _rx) = session_with(
        vec![0.2],
        vec![
            reply("Typed answer.", None),
            reply("Spoken answer.", None),
        ],
    );

    assert!(session.send_text("typed question").await);
    session.toggle_mic().await.unwrap();
    session.toggle_mic().await.unwrap();

    let texts: Vec<_> = session.transcript().iter().map(|t| t.text.as_str()).collect();
    assert_eq!(
        texts,
        vec![
            "typed question",
            "Typed answer.",
            "how are the markets",
            "Spoken answer.",
        ]
    );
}
