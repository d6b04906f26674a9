//! Pluggable audio output layer.
//!
//! The engine core never talks to a host audio API directly; everything
//! goes through the [`Backend`] capability trait with voices as opaque
//! handles. Three implementations ship: a cpal-driven spatializing mixer,
//! a cpal-driven flat mixer, and a silent null fallback. A device-free
//! [`MockBackend`] simulates playback timing for tests and headless
//! hosts.

mod mixer;
mod mock;
mod null;
mod software;
mod spatial;

pub use mock::MockBackend;
pub use null::NullBackend;
pub use software::SoftwareBackend;
pub use spatial::SpatialBackend;

use crate::clip::{Clip, ClipFormat};
use crate::config::AuraSonicConfig;
use crate::error::Result;
use crate::math::Vec3;
use std::sync::Arc;

/// Opaque handle to a backend voice, valid for the backend that issued it.
pub type VoiceRef = usize;

/// Which pool a voice belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VoiceKind {
    /// Plays a whole attached clip.
    Normal,
    /// Drains a queue of PCM chunks.
    Streaming,
}

/// Outcome of queueing the initial chunks on a streaming voice.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Preload {
    /// Chunks queued; the voice is ready to play.
    Queued,
    /// Nothing to queue; the stream is already exhausted.
    EndOfStream,
}

/// Backend candidates for [`init`](crate::AuraSonic::init), tried in
/// priority order.
pub enum BackendChoice {
    /// Spatializing mixer on the default output device.
    Spatial,
    /// Flat stereo mixer on the default output device.
    Software,
    /// Silent fallback.
    Null,
    /// A caller-supplied backend instance.
    Custom(Box<dyn Backend>),
}

/// Capability contract implemented by every audio backend.
///
/// All per-voice operations are callable from any engine thread; backends
/// guard their voice tables internally. Only `preload` and
/// `attach_oneshot` may perform a driver syscall; everything else must
/// return promptly.
pub trait Backend: Send + Sync {
    /// Short name for diagnostics.
    fn name(&self) -> &'static str;

    /// Whether this backend can run on the host at all.
    fn is_supported(&self) -> bool;

    /// Acquires the output device and starts the real-time side.
    fn open(&mut self, config: &AuraSonicConfig) -> Result<()>;

    /// Releases the device. Voices become inert afterwards.
    fn shutdown(&self);

    /// True when the backend spatializes internally from positions; the
    /// engine then skips its own pan computation and pushes raw
    /// coordinates through [`set_3d`](Backend::set_3d) and
    /// [`set_listener`](Backend::set_listener).
    fn native_3d(&self) -> bool;

    /// True when one-shot clips must be trimmed to the configured
    /// maximum before attach.
    fn trims_oneshot(&self) -> bool {
        false
    }

    /// Reserves a voice, or `None` when the hardware has no more.
    fn create_voice(&self, kind: VoiceKind) -> Option<VoiceRef>;

    /// Loads a whole clip onto a normal voice.
    fn attach_oneshot(&self, voice: VoiceRef, clip: &Arc<Clip>, looping: bool) -> Result<()>;

    /// Clears a streaming voice and fixes its PCM format.
    fn reset_stream(&self, voice: VoiceRef, format: ClipFormat) -> Result<()>;

    /// Queues the initial chunks on a streaming voice.
    fn preload(&self, voice: VoiceRef, chunks: Vec<Vec<u8>>) -> Result<Preload>;

    /// Queues one more chunk on a streaming voice.
    fn queue(&self, voice: VoiceRef, chunk: &[u8]) -> Result<()>;

    /// Number of queued chunks consumed since the last refill.
    fn buffers_processed(&self, voice: VoiceRef) -> usize;

    fn play(&self, voice: VoiceRef);
    fn pause(&self, voice: VoiceRef);
    /// Stops and rewinds.
    fn stop(&self, voice: VoiceRef);
    fn rewind(&self, voice: VoiceRef);
    /// Drops queued stream data.
    fn flush(&self, voice: VoiceRef);
    /// Stops, flushes, and detaches content.
    fn close(&self, voice: VoiceRef);

    fn is_playing(&self, voice: VoiceRef) -> bool;

    /// Linear gain in [0, 1]. May be a no-op.
    fn set_gain(&self, voice: VoiceRef, gain: f32);
    /// Stereo pan in [-1, 1]. May be a no-op.
    fn set_pan(&self, voice: VoiceRef, pan: f32);
    /// Spatial attributes; no-op on non-3D backends.
    fn set_3d(&self, voice: VoiceRef, position: Vec3, rolloff: f32, looping: bool);
    /// Listener pose; no-op where not applicable.
    fn set_listener(&self, position: Vec3, look: Vec3, up: Vec3);
    /// Process-wide output gain in [0, 1].
    fn set_master_gain(&self, gain: f32);
}

/// Walks the priority list and opens the first compatible backend,
/// falling back to [`NullBackend`] when none works.
pub(crate) fn select_backend(
    choices: Vec<BackendChoice>,
    config: &AuraSonicConfig,
) -> Arc<dyn Backend> {
    for choice in choices {
        let mut candidate: Box<dyn Backend> = match choice {
            BackendChoice::Spatial => Box::new(SpatialBackend::new()),
            BackendChoice::Software => Box::new(SoftwareBackend::new()),
            BackendChoice::Null => Box::new(NullBackend::new()),
            BackendChoice::Custom(backend) => backend,
        };
        if !candidate.is_supported() {
            log::info!("backend '{}' not supported on this host", candidate.name());
            continue;
        }
        match candidate.open(config) {
            Ok(()) => {
                log::info!("initialized audio backend '{}'", candidate.name());
                return Arc::from(candidate);
            }
            Err(e) => {
                log::warn!("backend '{}' failed to open: {e}", candidate.name());
            }
        }
    }
    log::warn!("no audio backend available, falling back to silence");
    let mut null = NullBackend::new();
    // The null backend's open cannot fail.
    let _ = null.open(config);
    Arc::new(null)
}
