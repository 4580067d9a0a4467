//! Microphone capture.
//!
//! [`MicSource`] is the seam over the audio backend; [`CpalMic`] is the real
//! device and tests substitute their own. Acquisition is idempotent: the
//! device is prompted for once and reused for every later recording.
//!
//! cpal streams are not `Send`, so capture lives on one task. The session
//! holds it directly rather than behind a handle.

use crate::error::{VoiceError, VoiceResult};
use base64::Engine;
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use std::io::Cursor;
use std::sync::{Arc, Mutex};
use tracing::{debug, info, warn};

/// Source of microphone audio. Not `Send`: implementations may own OS audio
/// handles pinned to the acquiring thread.
pub trait MicSource {
    /// Obtain the device. Must be a no-op when already acquired.
    fn acquire(&mut self) -> VoiceResult<()>;

    fn is_acquired(&self) -> bool;

    /// Begin buffering samples.
    fn start(&mut self) -> VoiceResult<()>;

    /// Stop buffering and hand back everything captured since `start`,
    /// mono at [`MicSource::sample_rate`].
    fn stop(&mut self) -> VoiceResult<Vec<f32>>;

    fn sample_rate(&self) -> u32;
}

/// The system default input device via cpal.
pub struct CpalMic {
    device: Option<cpal::Device>,
    stream: Option<cpal::Stream>,
    buffer: Arc<Mutex<Vec<f32>>>,
    sample_rate: u32,
    channels: u16,
}

impl Default for CpalMic {
    fn default() -> Self {
        Self::new()
    }
}

impl CpalMic {
    pub fn new() -> Self {
        Self {
            device: None,
            stream: None,
            buffer: Arc::new(Mutex::new(Vec::new())),
            sample_rate: 16_000,
            channels: 1,
        }
    }
}

impl MicSource for CpalMic {
    fn acquire(&mut self) -> VoiceResult<()> {
        if self.device.is_some() {
            return Ok(());
        }
        let host = cpal::default_host();
        let device = host
            .default_input_device()
            .ok_or_else(|| VoiceError::PermissionDenied("no input device".to_string()))?;
        let config = device.default_input_config()?;
        self.sample_rate = config.sample_rate().0;
        self.channels = config.channels();
        info!(
            "acquired input device {} ({} Hz, {} ch)",
            device.name().unwrap_or_else(|_| "unknown".to_string()),
            self.sample_rate,
            self.channels
        );
        self.device = Some(device);
        Ok(())
    }

    fn is_acquired(&self) -> bool {
        self.device.is_some()
    }

    fn start(&mut self) -> VoiceResult<()> {
        if self.stream.is_some() {
            return Ok(());
        }
        let device = self
            .device
            .as_ref()
            .ok_or_else(|| VoiceError::AudioDevice("input device not acquired".to_string()))?;
        let config = device.default_input_config()?;
        if let Ok(mut b) = self.buffer.lock() {
            b.clear();
        }
        let buffer = Arc::clone(&self.buffer);
        let channels = self.channels as usize;
        let stream = device.build_input_stream(
            &config.into(),
            move |data: &[f32], _| {
                if let Ok(mut buf) = buffer.lock() {
                    // Downmix interleaved frames to mono.
                    for frame in data.chunks(channels) {
                        let sum: f32 = frame.iter().sum();
                        buf.push(sum / channels as f32);
                    }
                }
            },
            |err| warn!("input stream error: {}", err),
            None,
        )?;
        stream.play()?;
        self.stream = Some(stream);
        debug!("recording started");
        Ok(())
    }

    fn stop(&mut self) -> VoiceResult<Vec<f32>> {
        // Dropping the stream stops the callback.
        self.stream = None;
        let samples = self
            .buffer
            .lock()
            .map(|mut b| std::mem::take(&mut *b))
            .unwrap_or_default();
        debug!("recording stopped ({} samples)", samples.len());
        Ok(samples)
    }

    fn sample_rate(&self) -> u32 {
        self.sample_rate
    }
}

/// Recording control on top of a [`MicSource`].
pub struct Capture {
    source: Box<dyn MicSource>,
    recording: bool,
}

impl Capture {
    pub fn new(source: Box<dyn MicSource>) -> Self {
        Self {
            source,
            recording: false,
        }
    }

    /// Capture over the system default microphone.
    pub fn cpal() -> Self {
        Self::new(Box::new(CpalMic::new()))
    }

    pub fn is_recording(&self) -> bool {
        self.recording
    }

    /// Prompt for the device if this is the first use, then start buffering.
    /// Starting while already recording is a no-op.
    pub fn start_recording(&mut self) -> VoiceResult<()> {
        if self.recording {
            return Ok(());
        }
        self.source.acquire()?;
        self.source.start()?;
        self.recording = true;
        Ok(())
    }

    /// Stop and encode the take as a WAV data URI ready for the transcribe
    /// endpoint. Returns `None` when nothing was recorded.
    pub fn stop_recording(&mut self) -> VoiceResult<Option<String>> {
        if !self.recording {
            return Ok(None);
        }
        self.recording = false;
        let samples = self.source.stop()?;
        if samples.is_empty() {
            return Ok(None);
        }
        encode_wav_data_uri(&samples, self.source.sample_rate()).map(Some)
    }
}

/// Encode mono f32 samples as 16-bit PCM WAV wrapped in a base64 data URI.
pub fn encode_wav_data_uri(samples: &[f32], sample_rate: u32) -> VoiceResult<String> {
    let spec = hound::WavSpec {
        channels: 1,
        sample_rate,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };
    let mut cursor = Cursor::new(Vec::new());
    {
        let mut writer = hound::WavWriter::new(&mut cursor, spec)?;
        for &s in samples {
            let clamped = (s.clamp(-1.0, 1.0) * i16::MAX as f32) as i16;
            writer.write_sample(clamped)?;
        }
        writer.finalize()?;
    }
    let encoded = base64::engine::general_purpose::STANDARD.encode(cursor.into_inner());
    Ok(format!("data:audio/wav;base64,{encoded}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;
    use std::rc::Rc;

    struct FakeMic {
        prompts: Rc<Cell<usize>>,
        acquired: bool,
        recording: bool,
        take: Vec<f32>,
    }

    impl FakeMic {
        fn new(prompts: Rc<Cell<usize>>, take: Vec<f32>) -> Self {
            Self {
                prompts,
                acquired: false,
                recording: false,
                take,
            }
        }
    }

    impl MicSource for FakeMic {
        fn acquire(&mut self) -> VoiceResult<()> {
            if !self.acquired {
                self.prompts.set(self.prompts.get() + 1);
                self.acquired = true;
            }
            Ok(())
        }

        fn is_acquired(&self) -> bool {
            self.acquired
        }

        fn start(&mut self) -> VoiceResult<()> {
            self.recording = true;
            Ok(())
        }

        fn stop(&mut self) -> VoiceResult<Vec<f32>> {
            self.recording = false;
            Ok(std::mem::take(&mut self.take))
        }

        fn sample_rate(&self) -> u32 {
            16_000
        }
    }

    #[test]
    fn device_is_prompted_for_once() {
        let prompts = Rc::new(Cell::new(0));
        let mut capture = Capture::new(Box::new(FakeMic::new(
            Rc::clone(&prompts),
            vec![0.1, -0.1],
        )));
        capture.start_recording().unwrap();
        capture.stop_recording().unwrap();
        capture.start_recording().unwrap();
        capture.stop_recording().unwrap();
        assert_eq!(prompts.get(), 1);
    }

    #[test]
    fn stop_without_start_yields_nothing() {
        let prompts = Rc::new(Cell::new(0));
        let mut capture = Capture::new(Box::new(FakeMic::new(prompts, vec![0.5])));
        assert!(capture.stop_recording().unwrap().is_none());
    }

    #[test]
    fn empty_take_yields_nothing() {
        let prompts = Rc::new(Cell::new(0));
        let mut capture = Capture::new(Box::new(FakeMic::new(prompts, Vec::new())));
        capture.start_recording().unwrap();
        assert!(capture.stop_recording().unwrap().is_none());
        assert!(!capture.is_recording());
    }

    #[test]
    fn take_encodes_as_wav_data_uri() {
        let prompts = Rc::new(Cell::new(0));
        let mut capture = Capture::new(Box::new(FakeMic::new(prompts, vec![0.0, 0.5, -0.5])));
        capture.start_recording().unwrap();
        let uri = capture.stop_recording().unwrap().unwrap();
        assert!(uri.starts_with("data:audio/wav;base64,"));
        let bytes = base64::engine::general_purpose::STANDARD
            .decode(uri.trim_start_matches("data:audio/wav;base64,"))
            .unwrap();
        assert_eq!(&bytes[..4], b"RIFF");
    }

    #[test]
    fn double_start_is_a_no_op() {
        let prompts = Rc::new(Cell::new(0));
        let mut capture = Capture::new(Box::new(FakeMic::new(
            Rc::clone(&prompts),
            vec![0.1],
        )));
        capture.start_recording().unwrap();
        capture.start_recording().unwrap();
        assert!(capture.is_recording());
        assert_eq!(prompts.get(), 1);
    }
}
