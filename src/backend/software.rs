use crate::backend::mixer::MixerCore;
use crate::backend::{Backend, Preload, VoiceKind, VoiceRef};
use crate::clip::{Clip, ClipFormat};
use crate::config::AuraSonicConfig;
use crate::error::Result;
use crate::math::Vec3;
use std::sync::Arc;

/// Gain-control floor in decibels; linear gain 0 maps here.
const MIN_GAIN_DB: f64 = -80.0;
/// Gain-control ceiling in decibels; linear gain 1 maps here.
const MAX_GAIN_DB: f64 = 0.0;

/// Flat stereo mixer without native 3D.
///
/// The engine computes per-source gain and pan itself and pushes them
/// through [`set_gain`](Backend::set_gain) / [`set_pan`](Backend::set_pan);
/// `set_3d` and `set_listener` are no-ops here. Linear gain passes
/// through a logarithmic decibel mapping before reaching the mixer, so
/// volume changes track perceived loudness rather than raw amplitude.
pub struct SoftwareBackend {
    core: MixerCore,
}

impl SoftwareBackend {
    pub fn new() -> Self {
        Self {
            core: MixerCore::new(false),
        }
    }
}

impl Default for SoftwareBackend {
    fn default() -> Self {
        Self::new()
    }
}

/// Maps a linear gain in [0, 1] onto the backend's decibel range.
///
/// Boundary behavior: 0 maps to `min_db`, 1 maps to `max_db`.
pub(crate) fn gain_to_db(gain: f32, min_db: f64, max_db: f64) -> f64 {
    let gain = gain.clamp(0.0, 1.0) as f64;
    let amp_gain_db = 0.5 * max_db - min_db;
    let c = std::f64::consts::LN_10 / 20.0;
    min_db + (1.0 / c) * ((1.0 + ((c * amp_gain_db).exp() - 1.0) * gain).ln())
}

fn db_to_amplitude(db: f64) -> f32 {
    10f64.powf(db / 20.0) as f32
}

impl Backend for SoftwareBackend {
    fn name(&self) -> &'static str {
        "software-mixer"
    }

    fn is_supported(&self) -> bool {
        MixerCore::device_available()
    }

    fn open(&mut self, _config: &AuraSonicConfig) -> Result<()> {
        self.core.open()
    }

    fn shutdown(&self) {
        self.core.shutdown();
    }

    fn native_3d(&self) -> bool {
        false
    }

    fn trims_oneshot(&self) -> bool {
        true
    }

    fn create_voice(&self, kind: VoiceKind) -> Option<VoiceRef> {
        self.core.create_voice(kind)
    }

    fn attach_oneshot(&self, voice: VoiceRef, clip: &Arc<Clip>, looping: bool) -> Result<()> {
        self.core.attach_oneshot(voice, clip, looping)
    }

    fn reset_stream(&self, voice: VoiceRef, format: ClipFormat) -> Result<()> {
        self.core.reset_stream(voice, format)
    }

    fn preload(&self, voice: VoiceRef, chunks: Vec<Vec<u8>>) -> Result<Preload> {
        self.core.preload(voice, chunks)
    }

    fn queue(&self, voice: VoiceRef, chunk: &[u8]) -> Result<()> {
        self.core.queue(voice, chunk)
    }

    fn buffers_processed(&self, voice: VoiceRef) -> usize {
        self.core.buffers_processed(voice)
    }

    fn play(&self, voice: VoiceRef) {
        self.core.play(voice);
    }

    fn pause(&self, voice: VoiceRef) {
        self.core.pause(voice);
    }

    fn stop(&self, voice: VoiceRef) {
        self.core.stop(voice);
    }

    fn rewind(&self, voice: VoiceRef) {
        self.core.rewind(voice);
    }

    fn flush(&self, voice: VoiceRef) {
        self.core.flush(voice);
    }

    fn close(&self, voice: VoiceRef) {
        self.core.close(voice);
    }

    fn is_playing(&self, voice: VoiceRef) -> bool {
        self.core.is_playing(voice)
    }

    fn set_gain(&self, voice: VoiceRef, gain: f32) {
        let db = gain_to_db(gain, MIN_GAIN_DB, MAX_GAIN_DB);
        self.core.set_amplitude(voice, db_to_amplitude(db));
    }

    fn set_pan(&self, voice: VoiceRef, pan: f32) {
        self.core.set_pan(voice, pan);
    }

    fn set_3d(&self, _voice: VoiceRef, _position: Vec3, _rolloff: f32, _looping: bool) {}

    fn set_listener(&self, _position: Vec3, _look: Vec3, _up: Vec3) {}

    fn set_master_gain(&self, gain: f32) {
        self.core.set_master_gain(gain);
    }
}
