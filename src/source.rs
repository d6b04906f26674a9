//! Logical sound sources and their playback state.

use crate::attenuation::{self, Attenuation};
use crate::backend::VoiceRef;
use crate::clip::Clip;
use crate::listener::Listener;
use crate::math::Vec3;
use crate::voice::VoiceId;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

/// Playback lifecycle of a source. `Culled` is the suspended state: the
/// voice is released but every attribute survives until `activate`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaybackState {
    Stopped,
    Playing,
    Paused,
    Culled,
}

/// Byte cursor of a streaming source, advanced only by the pump.
#[derive(Debug, Default)]
pub struct StreamProgress {
    pub cursor: usize,
    pub pending_preload: bool,
}

/// State shared between the dispatcher and the streaming pump for one
/// playback of a streaming source.
///
/// The dispatcher owns the control flags and mirrors them here whenever
/// the source changes state; the pump reads them without touching the
/// registry, and only ever writes the progress cursor and the
/// `pending_play` latch.
pub struct StreamHandle {
    pub source: String,
    pub voice: VoiceRef,
    pub clip: Arc<Clip>,
    pub progress: Mutex<StreamProgress>,
    looping: AtomicBool,
    stopped: AtomicBool,
    paused: AtomicBool,
    culled: AtomicBool,
    pending_play: AtomicBool,
}

impl StreamHandle {
    pub fn new(source: String, voice: VoiceRef, clip: Arc<Clip>, looping: bool) -> Arc<Self> {
        Arc::new(Self {
            source,
            voice,
            clip,
            progress: Mutex::new(StreamProgress {
                cursor: 0,
                pending_preload: true,
            }),
            looping: AtomicBool::new(looping),
            stopped: AtomicBool::new(false),
            paused: AtomicBool::new(false),
            culled: AtomicBool::new(false),
            pending_play: AtomicBool::new(false),
        })
    }

    pub fn looping(&self) -> bool {
        self.looping.load(Ordering::Acquire)
    }

    pub fn stopped(&self) -> bool {
        self.stopped.load(Ordering::Acquire)
    }

    pub fn paused(&self) -> bool {
        self.paused.load(Ordering::Acquire)
    }

    pub fn culled(&self) -> bool {
        self.culled.load(Ordering::Acquire)
    }

    pub fn set_looping(&self, value: bool) {
        self.looping.store(value, Ordering::Release);
    }

    pub fn set_stopped(&self, value: bool) {
        self.stopped.store(value, Ordering::Release);
    }

    pub fn set_paused(&self, value: bool) {
        self.paused.store(value, Ordering::Release);
    }

    pub fn set_culled(&self, value: bool) {
        self.culled.store(value, Ordering::Release);
    }

    /// Latched by the pump when a culled looping stream leaves the watch
    /// list; consumed by the dispatcher's management pass.
    pub fn latch_pending_play(&self) {
        self.pending_play.store(true, Ordering::Release);
    }

    pub fn take_pending_play(&self) -> bool {
        self.pending_play.swap(false, Ordering::AcqRel)
    }

    pub fn stream_position(&self) -> usize {
        self.progress.lock().unwrap().cursor
    }
}

/// Construction parameters for a source, shared by `new_source` and
/// `quick_play`.
#[derive(Debug, Clone)]
pub struct SourceDesc {
    pub priority: bool,
    pub streaming: bool,
    pub looping: bool,
    pub name: String,
    pub file: String,
    pub position: Vec3,
    pub attenuation: Attenuation,
    pub dist_or_roll: f32,
    pub temporary: bool,
}

impl SourceDesc {
    /// Descriptor with everything defaulted; attenuation and its
    /// parameter usually come from the engine configuration via
    /// [`AuraSonic::source_desc`](crate::AuraSonic::source_desc).
    pub fn new(name: impl Into<String>, file: impl Into<String>) -> Self {
        Self {
            priority: false,
            streaming: false,
            looping: false,
            name: name.into(),
            file: file.into(),
            position: Vec3::ZERO,
            attenuation: Attenuation::default(),
            dist_or_roll: 0.0,
            temporary: false,
        }
    }

    pub fn priority(mut self, priority: bool) -> Self {
        self.priority = priority;
        self
    }

    pub fn streaming(mut self, streaming: bool) -> Self {
        self.streaming = streaming;
        self
    }

    pub fn looping(mut self, looping: bool) -> Self {
        self.looping = looping;
        self
    }

    pub fn temporary(mut self, temporary: bool) -> Self {
        self.temporary = temporary;
        self
    }

    pub fn position(mut self, position: Vec3) -> Self {
        self.position = position;
        self
    }

    pub fn attenuation(mut self, model: Attenuation) -> Self {
        self.attenuation = model;
        self
    }

    pub fn dist_or_roll(mut self, value: f32) -> Self {
        self.dist_or_roll = value;
        self
    }
}

/// A caller-visible sound source. All fields are owned by the dispatcher
/// worker and guarded by the registry lock; the streaming side talks to
/// the pump through [`StreamHandle`].
pub struct Source {
    pub name: String,
    pub file: String,
    pub priority: bool,
    pub streaming: bool,
    pub looping: bool,
    pub temporary: bool,
    pub position: Vec3,
    pub attenuation: Attenuation,
    pub dist_or_roll: f32,
    /// User-set volume scalar in [0, 1].
    pub source_volume: f32,
    /// Derived gain in [0, 1], refreshed on every position, volume,
    /// listener, or master change.
    pub computed_gain: f32,
    pub distance: f32,
    pub clip: Option<Arc<Clip>>,
    pub voice: Option<VoiceId>,
    /// Backend handle of the bound voice, kept alongside the pool index
    /// so queries can ask the backend without touching the pool.
    pub voice_handle: Option<VoiceRef>,
    pub state: PlaybackState,
    /// Wants to play again once reinstated (culled while looping).
    pub pending_play: bool,
    /// Live pump link for the current playback of a streaming source.
    pub stream: Option<Arc<StreamHandle>>,
}

impl Source {
    pub fn new(desc: SourceDesc) -> Self {
        Self {
            name: desc.name,
            file: desc.file,
            priority: desc.priority,
            streaming: desc.streaming,
            looping: desc.looping,
            temporary: desc.temporary,
            position: desc.position,
            attenuation: desc.attenuation,
            dist_or_roll: desc.dist_or_roll,
            source_volume: 1.0,
            computed_gain: 1.0,
            distance: 0.0,
            clip: None,
            voice: None,
            voice_handle: None,
            state: PlaybackState::Stopped,
            pending_play: false,
            stream: None,
        }
    }

    /// Re-targets this source, keeping its volume (matching the behavior
    /// of replacing a source in place).
    pub fn change(&mut self, desc: SourceDesc, clip: Option<Arc<Clip>>) {
        self.priority = desc.priority;
        self.streaming = desc.streaming;
        self.looping = desc.looping;
        self.file = desc.file;
        self.position = desc.position;
        self.attenuation = desc.attenuation;
        self.dist_or_roll = desc.dist_or_roll;
        self.temporary = desc.temporary;
        self.clip = clip;
        self.sync_stream_flags();
    }

    /// False while culled.
    pub fn is_active(&self) -> bool {
        self.state != PlaybackState::Culled
    }

    /// Refreshes `computed_gain` and `distance` against the listener.
    pub fn recompute(&mut self, listener: &Listener, master_gain: f32) {
        self.distance = self.position.distance(listener.position());
        self.computed_gain = attenuation::computed_gain(
            self.attenuation,
            self.distance,
            self.dist_or_roll,
            self.source_volume,
            master_gain,
        );
    }

    /// Per-voice gain for backends without native 3D: full distance
    /// falloff times source volume. Master gain is excluded because the
    /// backend applies it once through `set_master_gain`.
    pub fn mixed_gain(&self) -> f32 {
        let falloff =
            attenuation::base_gain(self.attenuation, self.distance, self.dist_or_roll);
        (falloff * self.source_volume).clamp(0.0, 1.0)
    }

    /// Per-voice gain for native-3D backends: the rolloff part stays
    /// backend-side, so only linear fade and source volume apply.
    /// Master gain is excluded here as well.
    pub fn native_gain(&self) -> f32 {
        let fade = match self.attenuation {
            Attenuation::Linear => {
                attenuation::base_gain(self.attenuation, self.distance, self.dist_or_roll)
            }
            _ => 1.0,
        };
        (fade * self.source_volume).clamp(0.0, 1.0)
    }

    /// Rolloff factor pushed to native-3D backends; zero unless the
    /// source uses rolloff attenuation.
    pub fn native_rolloff(&self) -> f32 {
        match self.attenuation {
            Attenuation::InverseRolloff => self.dist_or_roll,
            _ => 0.0,
        }
    }

    /// Mirrors the control flags into the pump-visible handle.
    pub fn sync_stream_flags(&self) {
        if let Some(handle) = &self.stream {
            handle.set_looping(self.looping);
            handle.set_stopped(self.state == PlaybackState::Stopped);
            handle.set_paused(self.state == PlaybackState::Paused);
            handle.set_culled(self.state == PlaybackState::Culled);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clip::ClipFormat;

    fn desc(name: &str) -> SourceDesc {
        SourceDesc {
            priority: false,
            streaming: false,
            looping: false,
            name: name.into(),
            file: "test.wav".into(),
            position: Vec3::new(3.0, 0.0, 4.0),
            attenuation: Attenuation::Linear,
            dist_or_roll: 10.0,
            temporary: false,
        }
    }

    #[test]
    fn recompute_updates_distance_and_gain() {
        let mut source = Source::new(desc("s"));
        let listener = Listener::new();
        source.recompute(&listener, 1.0);
        assert!((source.distance - 5.0).abs() < 1.0e-6);
        assert!((source.computed_gain - 0.5).abs() < 1.0e-6);
    }

    #[test]
    fn master_gain_zero_silences() {
        let mut source = Source::new(desc("s"));
        let listener = Listener::new();
        source.recompute(&listener, 0.0);
        assert_eq!(source.computed_gain, 0.0);
    }

    #[test]
    fn mixed_gain_excludes_master_but_keeps_falloff() {
        let mut source = Source::new(desc("s"));
        source.source_volume = 0.6;
        let listener = Listener::new();
        source.recompute(&listener, 0.25);
        // d = 5, fade distance 10: falloff 0.5. The registry-visible
        // gain folds master in; the pushed gain does not, since the
        // backend applies master once itself.
        assert!((source.computed_gain - 0.075).abs() < 1.0e-6);
        assert!((source.mixed_gain() - 0.3).abs() < 1.0e-6);
    }

    #[test]
    fn native_split_keeps_rolloff_backend_side() {
        let mut source = Source::new(desc("s"));
        source.attenuation = Attenuation::InverseRolloff;
        source.dist_or_roll = 0.03;
        source.source_volume = 0.5;
        let listener = Listener::new();
        source.recompute(&listener, 1.0);
        // Engine-side gain for a native backend excludes the rolloff.
        assert!((source.native_gain() - 0.5).abs() < 1.0e-6);
        assert!((source.native_rolloff() - 0.03).abs() < 1.0e-9);
        // The registry-visible computed gain still includes it.
        assert!(source.computed_gain < 0.5);
    }

    #[test]
    fn stream_flags_mirror_state() {
        let clip = Arc::new(
            Clip::new(vec![0; 8], ClipFormat::new(8000, 1, 16).unwrap()).unwrap(),
        );
        let mut source = Source::new(SourceDesc {
            streaming: true,
            looping: true,
            ..desc("s")
        });
        source.stream = Some(StreamHandle::new("s".into(), 0, clip, true));
        source.state = PlaybackState::Paused;
        source.sync_stream_flags();
        let handle = source.stream.as_ref().unwrap().clone();
        assert!(handle.paused());
        assert!(!handle.stopped());
        assert!(handle.looping());

        source.state = PlaybackState::Culled;
        source.looping = false;
        source.sync_stream_flags();
        assert!(handle.culled());
        assert!(!handle.looping());
    }

    #[test]
    fn pending_play_latch_is_consumed_once() {
        let clip = Arc::new(
            Clip::new(vec![0; 8], ClipFormat::new(8000, 1, 16).unwrap()).unwrap(),
        );
        let handle = StreamHandle::new("s".into(), 0, clip, true);
        handle.latch_pending_play();
        assert!(handle.take_pending_play());
        assert!(!handle.take_pending_play());
    }
}
