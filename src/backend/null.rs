use crate::backend::{Backend, Preload, VoiceKind, VoiceRef};
use crate::clip::{Clip, ClipFormat};
use crate::config::AuraSonicConfig;
use crate::error::Result;
use crate::math::Vec3;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// Silent backend used as the last-resort fallback and for muting all
/// sound. Every operation succeeds and nothing ever reports as playing,
/// so one-shot sources complete immediately and the streaming pump drops
/// streams after their first pass.
pub struct NullBackend {
    voices: AtomicUsize,
}

impl NullBackend {
    pub fn new() -> Self {
        Self {
            voices: AtomicUsize::new(0),
        }
    }
}

impl Default for NullBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl Backend for NullBackend {
    fn name(&self) -> &'static str {
        "null"
    }

    fn is_supported(&self) -> bool {
        true
    }

    fn open(&mut self, _config: &AuraSonicConfig) -> Result<()> {
        Ok(())
    }

    fn shutdown(&self) {}

    fn native_3d(&self) -> bool {
        false
    }

    fn create_voice(&self, _kind: VoiceKind) -> Option<VoiceRef> {
        Some(self.voices.fetch_add(1, Ordering::Relaxed))
    }

    fn attach_oneshot(&self, _voice: VoiceRef, _clip: &Arc<Clip>, _looping: bool) -> Result<()> {
        Ok(())
    }

    fn reset_stream(&self, _voice: VoiceRef, _format: ClipFormat) -> Result<()> {
        Ok(())
    }

    fn preload(&self, _voice: VoiceRef, chunks: Vec<Vec<u8>>) -> Result<Preload> {
        if chunks.is_empty() {
            Ok(Preload::EndOfStream)
        } else {
            Ok(Preload::Queued)
        }
    }

    fn queue(&self, _voice: VoiceRef, _chunk: &[u8]) -> Result<()> {
        Ok(())
    }

    fn buffers_processed(&self, _voice: VoiceRef) -> usize {
        0
    }

    fn play(&self, _voice: VoiceRef) {}
    fn pause(&self, _voice: VoiceRef) {}
    fn stop(&self, _voice: VoiceRef) {}
    fn rewind(&self, _voice: VoiceRef) {}
    fn flush(&self, _voice: VoiceRef) {}
    fn close(&self, _voice: VoiceRef) {}

    fn is_playing(&self, _voice: VoiceRef) -> bool {
        false
    }

    fn set_gain(&self, _voice: VoiceRef, _gain: f32) {}
    fn set_pan(&self, _voice: VoiceRef, _pan: f32) {}
    fn set_3d(&self, _voice: VoiceRef, _position: Vec3, _rolloff: f32, _looping: bool) {}
    fn set_listener(&self, _position: Vec3, _look: Vec3, _up: Vec3) {}
    fn set_master_gain(&self, _gain: f32) {}
}
