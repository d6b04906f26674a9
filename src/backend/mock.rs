use crate::backend::{Backend, Preload, VoiceKind, VoiceRef};
use crate::clip::{Clip, ClipFormat};
use crate::config::AuraSonicConfig;
use crate::error::{AuraSonicError, Result};
use crate::math::Vec3;
use std::collections::VecDeque;
use std::sync::Mutex;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Device-free backend that simulates playback timing.
///
/// One-shot voices report as playing for the wall-clock duration of the
/// attached clip; streaming voices drain their queued chunks at the rate
/// implied by the stream format. Useful for tests and headless hosts
/// that want real engine behavior without an audio device. Clones share
/// the same voice table, so a caller can keep one for inspection after
/// handing the other to the engine.
#[derive(Clone)]
pub struct MockBackend {
    voices: Arc<Mutex<Vec<MockVoice>>>,
}

enum MockContent {
    Empty,
    OneShot {
        duration: Duration,
        looping: bool,
    },
    Stream {
        format: ClipFormat,
        chunks: VecDeque<Duration>,
        /// Play time of chunks already drained.
        consumed: Duration,
        processed: usize,
    },
}

struct MockVoice {
    kind: VoiceKind,
    playing: bool,
    paused: bool,
    /// Play time accumulated before the last resume.
    played: Duration,
    resumed_at: Option<Instant>,
    content: MockContent,
    gain: f32,
    pan: f32,
    position: Vec3,
    preloads: usize,
}

impl MockVoice {
    fn new(kind: VoiceKind) -> Self {
        Self {
            kind,
            playing: false,
            paused: false,
            played: Duration::ZERO,
            resumed_at: None,
            content: MockContent::Empty,
            gain: 1.0,
            pan: 0.0,
            position: Vec3::ZERO,
            preloads: 0,
        }
    }

    fn elapsed(&self) -> Duration {
        let running = match self.resumed_at {
            Some(at) if self.playing && !self.paused => at.elapsed(),
            _ => Duration::ZERO,
        };
        self.played + running
    }

    /// Drains chunks whose play time has passed.
    fn advance(&mut self) {
        let elapsed = self.elapsed();
        if let MockContent::Stream {
            chunks,
            consumed,
            processed,
            ..
        } = &mut self.content
        {
            while let Some(front) = chunks.front() {
                if *consumed + *front > elapsed {
                    break;
                }
                *consumed += *front;
                *processed += 1;
                chunks.pop_front();
            }
        }
    }

    fn is_playing(&mut self) -> bool {
        if !self.playing || self.paused {
            return false;
        }
        if matches!(self.content, MockContent::Stream { .. }) {
            self.advance();
        }
        let elapsed = self.elapsed();
        match &self.content {
            MockContent::Empty => false,
            MockContent::OneShot { duration, looping } => *looping || elapsed < *duration,
            MockContent::Stream { chunks, .. } => !chunks.is_empty(),
        }
    }

    fn halt(&mut self) {
        if self.playing && !self.paused {
            self.played = self.elapsed();
        }
        self.resumed_at = None;
    }
}

impl MockBackend {
    pub fn new() -> Self {
        Self {
            voices: Arc::new(Mutex::new(Vec::new())),
        }
    }

    fn with_voice<R>(&self, voice: VoiceRef, f: impl FnOnce(&mut MockVoice) -> R) -> Option<R> {
        let mut voices = self.voices.lock().unwrap();
        voices.get_mut(voice).map(f)
    }

    /// How many times `preload` ran on this voice; a looping stream
    /// preloads once per wrap.
    pub fn preload_count(&self, voice: VoiceRef) -> usize {
        self.with_voice(voice, |v| v.preloads).unwrap_or(0)
    }

    /// Last gain pushed to this voice.
    pub fn voice_gain(&self, voice: VoiceRef) -> f32 {
        self.with_voice(voice, |v| v.gain).unwrap_or(0.0)
    }

    /// Last pan pushed to this voice.
    pub fn voice_pan(&self, voice: VoiceRef) -> f32 {
        self.with_voice(voice, |v| v.pan).unwrap_or(0.0)
    }

    /// Last position pushed to this voice.
    pub fn voice_position(&self, voice: VoiceRef) -> Vec3 {
        self.with_voice(voice, |v| v.position).unwrap_or(Vec3::ZERO)
    }
}

impl Default for MockBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl Backend for MockBackend {
    fn name(&self) -> &'static str {
        "mock"
    }

    fn is_supported(&self) -> bool {
        true
    }

    fn open(&mut self, _config: &AuraSonicConfig) -> Result<()> {
        Ok(())
    }

    fn shutdown(&self) {
        let mut voices = self.voices.lock().unwrap();
        for voice in voices.iter_mut() {
            voice.playing = false;
            voice.content = MockContent::Empty;
        }
    }

    fn native_3d(&self) -> bool {
        false
    }

    fn create_voice(&self, kind: VoiceKind) -> Option<VoiceRef> {
        let mut voices = self.voices.lock().unwrap();
        voices.push(MockVoice::new(kind));
        Some(voices.len() - 1)
    }

    fn attach_oneshot(&self, voice: VoiceRef, clip: &Arc<Clip>, looping: bool) -> Result<()> {
        let duration = clip.duration();
        self.with_voice(voice, |v| {
            if v.kind != VoiceKind::Normal {
                return Err(AuraSonicError::Backend(
                    "clips may only be attached to normal voices".into(),
                ));
            }
            v.playing = false;
            v.paused = false;
            v.played = Duration::ZERO;
            v.resumed_at = None;
            v.content = MockContent::OneShot { duration, looping };
            Ok(())
        })
        .unwrap_or(Err(AuraSonicError::Backend("no such voice".into())))
    }

    fn reset_stream(&self, voice: VoiceRef, format: ClipFormat) -> Result<()> {
        format.validate()?;
        self.with_voice(voice, |v| {
            if v.kind != VoiceKind::Streaming {
                return Err(AuraSonicError::Backend(
                    "buffers may only be queued on streaming voices".into(),
                ));
            }
            v.playing = false;
            v.paused = false;
            v.played = Duration::ZERO;
            v.resumed_at = None;
            v.content = MockContent::Stream {
                format,
                chunks: VecDeque::new(),
                consumed: Duration::ZERO,
                processed: 0,
            };
            Ok(())
        })
        .unwrap_or(Err(AuraSonicError::Backend("no such voice".into())))
    }

    fn preload(&self, voice: VoiceRef, new_chunks: Vec<Vec<u8>>) -> Result<Preload> {
        self.with_voice(voice, |v| {
            v.preloads += 1;
            match &mut v.content {
                MockContent::Stream { format, chunks, .. } => {
                    // Appends, so the tail of a looping stream keeps
                    // draining across the wrap.
                    if new_chunks.is_empty() {
                        return Ok(Preload::EndOfStream);
                    }
                    for chunk in &new_chunks {
                        chunks.push_back(format.duration_of(chunk.len()));
                    }
                    Ok(Preload::Queued)
                }
                _ => Err(AuraSonicError::Backend(
                    "preload on a voice without a stream".into(),
                )),
            }
        })
        .unwrap_or(Err(AuraSonicError::Backend("no such voice".into())))
    }

    fn queue(&self, voice: VoiceRef, chunk: &[u8]) -> Result<()> {
        self.with_voice(voice, |v| match &mut v.content {
            MockContent::Stream {
                format,
                chunks,
                processed,
                ..
            } => {
                chunks.push_back(format.duration_of(chunk.len()));
                *processed = processed.saturating_sub(1);
                Ok(())
            }
            _ => Err(AuraSonicError::Backend(
                "queue on a voice without a stream".into(),
            )),
        })
        .unwrap_or(Err(AuraSonicError::Backend("no such voice".into())))
    }

    fn buffers_processed(&self, voice: VoiceRef) -> usize {
        self.with_voice(voice, |v| {
            v.advance();
            match &v.content {
                MockContent::Stream { processed, .. } => *processed,
                _ => 0,
            }
        })
        .unwrap_or(0)
    }

    fn play(&self, voice: VoiceRef) {
        self.with_voice(voice, |v| {
            v.playing = true;
            v.paused = false;
            if v.resumed_at.is_none() {
                v.resumed_at = Some(Instant::now());
            }
        });
    }

    fn pause(&self, voice: VoiceRef) {
        self.with_voice(voice, |v| {
            v.halt();
            v.paused = true;
        });
    }

    fn stop(&self, voice: VoiceRef) {
        self.with_voice(voice, |v| {
            v.playing = false;
            v.paused = false;
            v.played = Duration::ZERO;
            v.resumed_at = None;
        });
    }

    fn rewind(&self, voice: VoiceRef) {
        self.with_voice(voice, |v| {
            v.played = Duration::ZERO;
            if v.playing && !v.paused {
                v.resumed_at = Some(Instant::now());
            }
        });
    }

    fn flush(&self, voice: VoiceRef) {
        self.with_voice(voice, |v| {
            if let MockContent::Stream {
                chunks,
                consumed,
                processed,
                ..
            } = &mut v.content
            {
                chunks.clear();
                *consumed = Duration::ZERO;
                *processed = 0;
            }
        });
    }

    fn close(&self, voice: VoiceRef) {
        self.with_voice(voice, |v| {
            v.playing = false;
            v.paused = false;
            v.played = Duration::ZERO;
            v.resumed_at = None;
            v.content = MockContent::Empty;
        });
    }

    fn is_playing(&self, voice: VoiceRef) -> bool {
        self.with_voice(voice, MockVoice::is_playing).unwrap_or(false)
    }

    fn set_gain(&self, voice: VoiceRef, gain: f32) {
        self.with_voice(voice, |v| v.gain = gain.clamp(0.0, 1.0));
    }

    fn set_pan(&self, voice: VoiceRef, pan: f32) {
        self.with_voice(voice, |v| v.pan = pan.clamp(-1.0, 1.0));
    }

    fn set_3d(&self, voice: VoiceRef, position: Vec3, _rolloff: f32, looping: bool) {
        self.with_voice(voice, |v| {
            v.position = position;
            if let MockContent::OneShot { looping: l, .. } = &mut v.content {
                *l = looping;
            }
        });
    }

    fn set_listener(&self, _position: Vec3, _look: Vec3, _up: Vec3) {}

    fn set_master_gain(&self, _gain: f32) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    fn short_clip(millis: u64) -> Arc<Clip> {
        let format = ClipFormat::new(8000, 1, 16).unwrap();
        let bytes = vec![0u8; format.bytes_per_second() * millis as usize / 1000];
        Arc::new(Clip::new(bytes, format).unwrap())
    }

    #[test]
    fn oneshot_plays_for_clip_duration() {
        let backend = MockBackend::new();
        let voice = backend.create_voice(VoiceKind::Normal).unwrap();
        backend
            .attach_oneshot(voice, &short_clip(40), false)
            .unwrap();
        backend.play(voice);
        assert!(backend.is_playing(voice));
        std::thread::sleep(Duration::from_millis(80));
        assert!(!backend.is_playing(voice));
    }

    #[test]
    fn looping_oneshot_never_finishes() {
        let backend = MockBackend::new();
        let voice = backend.create_voice(VoiceKind::Normal).unwrap();
        backend.attach_oneshot(voice, &short_clip(10), true).unwrap();
        backend.play(voice);
        std::thread::sleep(Duration::from_millis(50));
        assert!(backend.is_playing(voice));
        backend.stop(voice);
        assert!(!backend.is_playing(voice));
    }

    #[test]
    fn pause_freezes_elapsed_time() {
        let backend = MockBackend::new();
        let voice = backend.create_voice(VoiceKind::Normal).unwrap();
        backend
            .attach_oneshot(voice, &short_clip(60), false)
            .unwrap();
        backend.play(voice);
        std::thread::sleep(Duration::from_millis(20));
        backend.pause(voice);
        assert!(!backend.is_playing(voice));
        std::thread::sleep(Duration::from_millis(80));
        backend.play(voice);
        // Only ~20ms consumed before the pause; still playing.
        assert!(backend.is_playing(voice));
    }

    #[test]
    fn stream_drains_in_real_time() {
        let backend = MockBackend::new();
        let voice = backend.create_voice(VoiceKind::Streaming).unwrap();
        let format = ClipFormat::new(8000, 1, 16).unwrap();
        backend.reset_stream(voice, format).unwrap();
        // Two chunks of 25ms each.
        let chunk = vec![0u8; format.bytes_per_second() / 40];
        backend
            .preload(voice, vec![chunk.clone(), chunk.clone()])
            .unwrap();
        backend.play(voice);
        assert_eq!(backend.buffers_processed(voice), 0);
        assert!(backend.is_playing(voice));
        std::thread::sleep(Duration::from_millis(30));
        assert_eq!(backend.buffers_processed(voice), 1);
        backend.queue(voice, &chunk).unwrap();
        assert_eq!(backend.buffers_processed(voice), 0);
        std::thread::sleep(Duration::from_millis(60));
        assert!(!backend.is_playing(voice));
        assert_eq!(backend.buffers_processed(voice), 2);
    }
}
