//! The public facade: thread-safe entry points that enqueue commands
//! and return immediately, plus synchronous queries over the registry.

use crate::attenuation::Attenuation;
use crate::backend::BackendChoice;
use crate::clip::{ClipLoader, SymphoniaLoader};
use crate::command::Command;
use crate::config::AuraSonicConfig;
use crate::dispatcher::{source_playing, Dispatcher, EngineShared};
use crate::error::{AuraSonicError, Result};
use crate::listener::Listener;
use crate::math::Vec3;
use crate::source::SourceDesc;
use crate::stream;
use crossbeam_channel::{unbounded, Sender};
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

/// How long shutdown waits for each worker thread before giving up.
const SHUTDOWN_GRACE: Duration = Duration::from_secs(5);
const SHUTDOWN_POLL: Duration = Duration::from_millis(100);

/// The 3D positional sound engine.
///
/// Construction spawns the dispatcher worker and the streaming pump;
/// [`init`](AuraSonic::init) then selects an audio backend. Every
/// command method enqueues onto the serialized command queue and returns
/// immediately, so calls are safe from any thread and take effect in
/// enqueue order. Queries read a consistent snapshot without waiting on
/// the worker.
///
/// ```no_run
/// use aurasonic::{AuraSonic, AuraSonicConfig, BackendChoice};
/// use aurasonic::math::Vec3;
///
/// let mut engine = AuraSonic::new(AuraSonicConfig::default());
/// engine.init(vec![BackendChoice::Spatial, BackendChoice::Software]);
/// engine.load_sound("steps.wav")?;
/// let desc = engine.source_desc("steps", "steps.wav")
///     .position(Vec3::new(4.0, 0.0, -2.0));
/// engine.new_source(desc)?;
/// engine.play("steps")?;
/// engine.set_listener_position(Vec3::new(1.0, 0.0, 0.0));
/// engine.shutdown();
/// # Ok::<(), aurasonic::AuraSonicError>(())
/// ```
pub struct AuraSonic {
    shared: Arc<EngineShared>,
    tx: Sender<Command>,
    worker: Option<JoinHandle<()>>,
    pump: Option<JoinHandle<()>>,
}

impl AuraSonic {
    /// Engine with the default Symphonia decoder.
    pub fn new(config: AuraSonicConfig) -> Self {
        let loader = Arc::new(SymphoniaLoader::new(config.file_chunk_bytes));
        Self::with_loader(config, loader)
    }

    /// Engine with a caller-supplied decoder collaborator.
    pub fn with_loader(config: AuraSonicConfig, loader: Arc<dyn ClipLoader>) -> Self {
        let shared = EngineShared::new(config);
        let (tx, rx) = unbounded();

        let pump_shared = shared.clone();
        let pump = std::thread::Builder::new()
            .name("aurasonic-stream".into())
            .spawn(move || stream::run(pump_shared))
            .expect("failed to spawn stream pump");

        let worker_shared = shared.clone();
        let worker = std::thread::Builder::new()
            .name("aurasonic-dispatch".into())
            .spawn(move || Dispatcher::new(worker_shared, rx, loader).run())
            .expect("failed to spawn dispatcher");

        Self {
            shared,
            tx,
            worker: Some(worker),
            pump: Some(pump),
        }
    }

    fn send(&self, command: Command) {
        let name = command.name();
        if self.tx.send(command).is_err() {
            log::error!("engine is shut down, dropping command {name}");
        }
    }

    fn named(&self, name: &str, command: Command) -> Result<()> {
        if name.is_empty() {
            return Err(AuraSonicError::InvalidArgument(
                "sourcename must not be empty".into(),
            ));
        }
        self.send(command);
        Ok(())
    }

    /// Selects and opens the first compatible backend from the priority
    /// list, falling back to silence when none works.
    pub fn init(&self, backends: Vec<BackendChoice>) {
        self.send(Command::Init(backends));
    }

    /// Descriptor pre-filled with this engine's configured attenuation
    /// defaults.
    pub fn source_desc(&self, name: impl Into<String>, file: impl Into<String>) -> SourceDesc {
        let config = &self.shared.config;
        let dist_or_roll = match config.default_attenuation {
            Attenuation::Linear => config.default_fade_distance,
            _ => config.default_rolloff,
        };
        SourceDesc::new(name, file)
            .attenuation(config.default_attenuation)
            .dist_or_roll(dist_or_roll)
    }

    // Clip cache -----------------------------------------------------

    /// Decodes a file into the clip cache; idempotent.
    pub fn load_sound(&self, file: &str) -> Result<()> {
        self.named(file, Command::LoadSound(file.to_string()))
    }

    /// Drops a cached clip. Sources already holding it keep playing.
    pub fn unload_sound(&self, file: &str) -> Result<()> {
        self.named(file, Command::UnloadSound(file.to_string()))
    }

    // Source management ----------------------------------------------

    pub fn new_source(&self, desc: SourceDesc) -> Result<()> {
        let name = desc.name.clone();
        self.named(&name, Command::NewSource(desc))
    }

    /// Inserts a source and plays it immediately; mark the descriptor
    /// temporary to have the reaper remove it after it finishes.
    pub fn quick_play(&self, desc: SourceDesc) -> Result<()> {
        let name = desc.name.clone();
        self.named(&name, Command::QuickPlay(desc))
    }

    /// Re-targets an existing source with new attributes and file.
    pub fn change_source(&self, desc: SourceDesc) -> Result<()> {
        let name = desc.name.clone();
        self.named(&name, Command::ChangeSource(desc))
    }

    pub fn remove_source(&self, name: &str) -> Result<()> {
        self.named(name, Command::RemoveSource(name.to_string()))
    }

    pub fn set_temporary(&self, name: &str, temporary: bool) -> Result<()> {
        self.named(name, Command::SetTemporary(name.to_string(), temporary))
    }

    // Attributes -----------------------------------------------------

    pub fn set_position(&self, name: &str, position: Vec3) -> Result<()> {
        self.named(name, Command::SetPosition(name.to_string(), position))
    }

    pub fn set_volume(&self, name: &str, volume: f32) -> Result<()> {
        self.named(name, Command::SetVolume(name.to_string(), volume))
    }

    /// Alias of [`set_volume`](AuraSonic::set_volume).
    pub fn set_gain(&self, name: &str, gain: f32) -> Result<()> {
        self.set_volume(name, gain)
    }

    pub fn set_priority(&self, name: &str, priority: bool) -> Result<()> {
        self.named(name, Command::SetPriority(name.to_string(), priority))
    }

    pub fn set_looping(&self, name: &str, looping: bool) -> Result<()> {
        self.named(name, Command::SetLooping(name.to_string(), looping))
    }

    pub fn set_attenuation(&self, name: &str, model: Attenuation) -> Result<()> {
        self.named(name, Command::SetAttenuation(name.to_string(), model))
    }

    pub fn set_dist_or_roll(&self, name: &str, value: f32) -> Result<()> {
        self.named(name, Command::SetDistOrRoll(name.to_string(), value))
    }

    // Playback -------------------------------------------------------

    pub fn play(&self, name: &str) -> Result<()> {
        self.named(name, Command::Play(name.to_string()))
    }

    pub fn pause(&self, name: &str) -> Result<()> {
        self.named(name, Command::Pause(name.to_string()))
    }

    pub fn stop(&self, name: &str) -> Result<()> {
        self.named(name, Command::Stop(name.to_string()))
    }

    pub fn rewind(&self, name: &str) -> Result<()> {
        self.named(name, Command::Rewind(name.to_string()))
    }

    /// Drops any queued stream data for the source.
    pub fn flush(&self, name: &str) -> Result<()> {
        self.named(name, Command::Flush(name.to_string()))
    }

    /// Suspends the source, releasing its voice but keeping attributes.
    pub fn cull(&self, name: &str) -> Result<()> {
        self.named(name, Command::Cull(name.to_string()))
    }

    /// Reinstates a culled source.
    pub fn activate(&self, name: &str) -> Result<()> {
        self.named(name, Command::Activate(name.to_string()))
    }

    // Listener -------------------------------------------------------

    pub fn move_listener(&self, delta: Vec3) {
        self.send(Command::MoveListener(delta));
    }

    pub fn set_listener_position(&self, position: Vec3) {
        self.send(Command::SetListenerPosition(position));
    }

    /// Turns the listener by `delta` radians counterclockwise about Y.
    pub fn turn_listener(&self, delta: f32) {
        self.send(Command::TurnListener(delta));
    }

    pub fn set_listener_angle(&self, angle: f32) {
        self.send(Command::SetListenerAngle(angle));
    }

    pub fn set_listener_orientation(&self, look: Vec3, up: Vec3) {
        self.send(Command::SetListenerOrientation(look, up));
    }

    // Master ---------------------------------------------------------

    pub fn set_master_volume(&self, volume: f32) {
        self.send(Command::SetMasterVolume(volume));
    }

    pub fn master_volume(&self) -> f32 {
        self.shared.master()
    }

    // Queries --------------------------------------------------------

    /// True while the named source is audibly playing. Unknown sources
    /// report false.
    pub fn playing(&self, name: &str) -> bool {
        let Ok(backend) = self.shared.backend() else {
            return false;
        };
        let registry = self.shared.registry.read().unwrap();
        registry
            .get(name)
            .map(|source| source_playing(source, backend.as_ref()))
            .unwrap_or(false)
    }

    pub fn get_volume(&self, name: &str) -> Result<f32> {
        let registry = self.shared.registry.read().unwrap();
        registry
            .get(name)
            .map(|source| source.source_volume)
            .ok_or_else(|| AuraSonicError::NotFound(name.to_string()))
    }

    pub fn get_position(&self, name: &str) -> Result<Vec3> {
        let registry = self.shared.registry.read().unwrap();
        registry
            .get(name)
            .map(|source| source.position)
            .ok_or_else(|| AuraSonicError::NotFound(name.to_string()))
    }

    /// Distance from the listener at the last gain computation.
    pub fn get_distance(&self, name: &str) -> Result<f32> {
        let registry = self.shared.registry.read().unwrap();
        registry
            .get(name)
            .map(|source| source.distance)
            .ok_or_else(|| AuraSonicError::NotFound(name.to_string()))
    }

    /// Derived gain of the source as of the last update.
    pub fn get_computed_gain(&self, name: &str) -> Result<f32> {
        let registry = self.shared.registry.read().unwrap();
        registry
            .get(name)
            .map(|source| source.computed_gain)
            .ok_or_else(|| AuraSonicError::NotFound(name.to_string()))
    }

    pub fn list_sources(&self) -> Vec<String> {
        self.shared.registry.read().unwrap().names()
    }

    /// Snapshot of the listener pose.
    pub fn listener(&self) -> Listener {
        *self.shared.registry.read().unwrap().listener()
    }

    // Lifecycle ------------------------------------------------------

    /// Stops both engine threads and releases the backend. Waits up to
    /// five seconds per thread, then proceeds best-effort.
    pub fn shutdown(&mut self) {
        if self.worker.is_none() && self.pump.is_none() {
            return;
        }
        log::info!("shutting down");
        self.shared.dying.store(true, Ordering::SeqCst);
        let _ = self.tx.send(Command::Quit);
        self.shared.pump.kill();

        for (name, handle) in [
            ("dispatcher", self.worker.take()),
            ("stream pump", self.pump.take()),
        ] {
            let Some(handle) = handle else { continue };
            let deadline = Instant::now() + SHUTDOWN_GRACE;
            while !handle.is_finished() && Instant::now() < deadline {
                std::thread::sleep(SHUTDOWN_POLL);
            }
            if handle.is_finished() {
                let _ = handle.join();
            } else {
                log::error!("{name} thread did not exit, continuing shutdown");
            }
        }
    }
}

impl Drop for AuraSonic {
    fn drop(&mut self) {
        self.shutdown();
    }
}
