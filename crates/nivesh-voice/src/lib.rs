//! Voice assistant session over the Nivesh backend.
//!
//! The flow mirrors a push-to-talk chat: [`capture::Capture`] records the
//! user, [`pipeline::TurnPipeline`] runs transcribe -> query -> speak, and
//! [`playback::Playback`] voices the reply with barge-in support. All of it
//! hangs off [`session::VoiceSession`], which publishes typed
//! [`pipeline::SessionEvent`]s instead of holding UI callbacks.

pub mod backend;
pub mod capture;
pub mod error;
pub mod pipeline;
pub mod playback;
pub mod session;

pub use backend::{AssistantBackend, HttpAssistant, TurnReply};
pub use capture::{Capture, CpalMic, MicSource};
pub use error::{VoiceError, VoiceResult};
pub use pipeline::{
    ChatRole, ChatTurn, SessionEvent, StatusLine, TurnFailure, TurnPhase, TurnPipeline,
    QUERY_FAILURE_MESSAGE,
};
pub use playback::{NullSink, Playback, RodioSink, SpeechSink};
pub use session::{SessionState, VoiceSession};
