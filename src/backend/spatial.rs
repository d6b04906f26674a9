use crate::backend::mixer::MixerCore;
use crate::backend::{Backend, Preload, VoiceKind, VoiceRef};
use crate::clip::{Clip, ClipFormat};
use crate::config::AuraSonicConfig;
use crate::error::Result;
use crate::math::Vec3;
use std::sync::Arc;

/// Spatializing mixer: the native-3D backend role.
///
/// The engine pushes raw source positions and the listener pose through
/// [`set_3d`](Backend::set_3d) / [`set_listener`](Backend::set_listener);
/// rolloff attenuation and panning happen inside the render callback.
/// The engine still applies linear-fade attenuation itself (with rolloff
/// zeroed here), matching how native-3D drivers handle only their own
/// falloff curve.
pub struct SpatialBackend {
    core: MixerCore,
}

impl SpatialBackend {
    pub fn new() -> Self {
        Self {
            core: MixerCore::new(true),
        }
    }
}

impl Default for SpatialBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl Backend for SpatialBackend {
    fn name(&self) -> &'static str {
        "spatial-mixer"
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
        self.core.set_gain(voice, gain);
    }

    fn set_pan(&self, _voice: VoiceRef, _pan: f32) {
        // Pan is derived from positions in the render callback.
    }

    fn set_3d(&self, voice: VoiceRef, position: Vec3, rolloff: f32, looping: bool) {
        self.core.set_3d(voice, position, rolloff, looping);
    }

    fn set_listener(&self, position: Vec3, look: Vec3, up: Vec3) {
        self.core.set_listener(position, look, up);
    }

    fn set_master_gain(&self, gain: f32) {
        self.core.set_master_gain(gain);
    }
}
