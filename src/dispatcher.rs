//! The command dispatcher: one worker thread that drains the command
//! queue, mutates the registry, and issues all backend calls.
//!
//! Serializing every mutation on this thread is what makes the public
//! API thread-safe; queries only ever take the registry read lock. The
//! worker also runs the temporary-source reaper on a ten second cadence
//! and replays sources that latched `pending_play` while culled.

use crate::backend::{self, Backend, BackendChoice, VoiceKind};
use crate::clip::{Clip, ClipCache, ClipLoader};
use crate::command::Command;
use crate::config::AuraSonicConfig;
use crate::error::{AuraSonicError, Result};
use crate::listener::Listener;
use crate::math::Vec3;
use crate::registry::Registry;
use crate::source::{PlaybackState, Source, SourceDesc, StreamHandle};
use crate::stream::PumpShared;
use crate::voice::VoicePool;
use crate::{attenuation, math};
use crossbeam_channel::{Receiver, RecvTimeoutError};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::{Arc, Mutex, RwLock};
use std::time::{Duration, Instant};

/// Temporary sources are swept at most this often; also caps the
/// worker's wait so a quiet engine still reaps.
const REAP_INTERVAL: Duration = Duration::from_secs(10);

/// State shared between the facade, the dispatcher worker, and the pump.
pub(crate) struct EngineShared {
    pub config: AuraSonicConfig,
    pub registry: RwLock<Registry>,
    pub cache: Mutex<ClipCache>,
    pub backend: RwLock<Option<Arc<dyn Backend>>>,
    pub master_gain: AtomicU32,
    pub dying: AtomicBool,
    pub pump: Arc<PumpShared>,
}

impl EngineShared {
    pub fn new(config: AuraSonicConfig) -> Arc<Self> {
        let master = config.master_gain.clamp(0.0, 1.0);
        Arc::new(Self {
            config,
            registry: RwLock::new(Registry::new()),
            cache: Mutex::new(ClipCache::new()),
            backend: RwLock::new(None),
            master_gain: AtomicU32::new(master.to_bits()),
            dying: AtomicBool::new(false),
            pump: PumpShared::new(),
        })
    }

    pub fn master(&self) -> f32 {
        f32::from_bits(self.master_gain.load(Ordering::Relaxed))
    }

    pub fn set_master(&self, gain: f32) {
        self.master_gain
            .store(gain.clamp(0.0, 1.0).to_bits(), Ordering::Relaxed);
    }

    /// The active backend, shared with queries and the pump.
    pub fn backend(&self) -> Result<Arc<dyn Backend>> {
        self.backend
            .read()
            .unwrap()
            .clone()
            .ok_or(AuraSonicError::BackendUnsupported)
    }
}

/// Whether a source is audibly playing right now: in the playing state,
/// bound to a voice, and the backend confirms output.
pub(crate) fn source_playing(source: &Source, backend: &dyn Backend) -> bool {
    if source.state != PlaybackState::Playing {
        return false;
    }
    match source.voice_handle {
        Some(handle) => backend.is_playing(handle),
        None => false,
    }
}

pub(crate) struct Dispatcher {
    shared: Arc<EngineShared>,
    rx: Receiver<Command>,
    loader: Arc<dyn ClipLoader>,
    pool: Option<VoicePool>,
    last_reap: Instant,
}

impl Dispatcher {
    pub fn new(
        shared: Arc<EngineShared>,
        rx: Receiver<Command>,
        loader: Arc<dyn ClipLoader>,
    ) -> Self {
        Self {
            shared,
            rx,
            loader,
            pool: None,
            last_reap: Instant::now(),
        }
    }

    pub fn run(mut self) {
        log::debug!("dispatcher started");
        'main: loop {
            match self.rx.recv_timeout(REAP_INTERVAL) {
                Ok(command) => {
                    if self.handle(command) {
                        break 'main;
                    }
                    while let Ok(command) = self.rx.try_recv() {
                        if self.handle(command) {
                            break 'main;
                        }
                    }
                }
                Err(RecvTimeoutError::Timeout) => {}
                Err(RecvTimeoutError::Disconnected) => break 'main,
            }
            if self.shared.dying.load(Ordering::SeqCst) {
                break 'main;
            }
            self.manage_sources();
            self.maybe_reap();
        }
        self.cleanup();
        log::debug!("dispatcher exiting");
    }

    /// Returns true when the worker should exit.
    fn handle(&mut self, command: Command) -> bool {
        let name = command.name();
        match self.apply(command) {
            Ok(quit) => quit,
            Err(e) => {
                log::error!("command {name} failed: {e}");
                false
            }
        }
    }

    fn apply(&mut self, command: Command) -> Result<bool> {
        match command {
            Command::Init(choices) => self.init(choices)?,
            Command::LoadSound(file) => self.load_sound(&file)?,
            Command::UnloadSound(file) => self.shared.cache.lock().unwrap().unload(&file),
            Command::NewSource(desc) => self.new_source(desc)?,
            Command::QuickPlay(desc) => {
                let name = desc.name.clone();
                self.new_source(desc)?;
                self.play_source(&name)?;
            }
            Command::ChangeSource(desc) => self.change_source(desc)?,
            Command::SetPosition(name, position) => self.set_position(&name, position)?,
            Command::SetVolume(name, volume) => self.set_volume(&name, volume)?,
            Command::SetPriority(name, priority) => {
                self.with_source(&name, |source| source.priority = priority)?
            }
            Command::SetLooping(name, looping) => self.set_looping(&name, looping)?,
            Command::SetAttenuation(name, model) => {
                self.with_source(&name, |source| source.attenuation = model)?;
                self.refresh_source(&name)?;
            }
            Command::SetDistOrRoll(name, value) => {
                self.with_source(&name, |source| source.dist_or_roll = value)?;
                self.refresh_source(&name)?;
            }
            Command::Play(name) => self.play_source(&name)?,
            Command::Pause(name) => self.pause_source(&name)?,
            Command::Stop(name) => self.stop_source(&name)?,
            Command::Rewind(name) => self.rewind_source(&name)?,
            Command::Flush(name) => self.flush_source(&name)?,
            Command::Cull(name) => self.cull_source(&name)?,
            Command::Activate(name) => self.activate_source(&name)?,
            Command::SetTemporary(name, temporary) => {
                self.with_source(&name, |source| source.temporary = temporary)?
            }
            Command::RemoveSource(name) => self.remove_source(&name)?,
            Command::MoveListener(delta) => self.move_listener(delta)?,
            Command::SetListenerPosition(position) => self.set_listener_position(position)?,
            Command::TurnListener(delta) => self.turn_listener(delta)?,
            Command::SetListenerAngle(angle) => self.set_listener_angle(angle)?,
            Command::SetListenerOrientation(look, up) => {
                self.set_listener_orientation(look, up)?
            }
            Command::SetMasterVolume(volume) => self.set_master_volume(volume)?,
            Command::Quit => return Ok(true),
        }
        Ok(false)
    }

    fn init(&mut self, choices: Vec<BackendChoice>) -> Result<()> {
        if let Ok(previous) = self.shared.backend() {
            log::info!("re-initializing, shutting down '{}'", previous.name());
            self.close_all_voices(previous.as_ref());
            previous.shutdown();
            *self.shared.backend.write().unwrap() = None;
            self.pool = None;
        }

        let backend = backend::select_backend(choices, &self.shared.config);
        backend.set_master_gain(self.shared.master());
        let pool = VoicePool::create(
            backend.as_ref(),
            self.shared.config.num_normal_voices,
            self.shared.config.num_streaming_voices,
        );
        log::info!(
            "voice pools ready: {} normal, {} streaming",
            pool.normal_len(),
            pool.streaming_len()
        );
        self.pool = Some(pool);
        *self.shared.backend.write().unwrap() = Some(backend);
        Ok(())
    }

    fn load_sound(&mut self, file: &str) -> Result<()> {
        let trim = self.oneshot_trim();
        self.shared
            .cache
            .lock()
            .unwrap()
            .get_or_load(file, self.loader.as_ref(), trim)?;
        Ok(())
    }

    /// Trim cap for one-shot clips on backends with clip-size limits.
    fn oneshot_trim(&self) -> Option<usize> {
        match self.shared.backend() {
            Ok(backend) if backend.trims_oneshot() => Some(self.shared.config.max_clip_bytes),
            _ => None,
        }
    }

    fn load_clip(&self, desc: &SourceDesc) -> Result<Arc<Clip>> {
        let trim = if desc.streaming { None } else { self.oneshot_trim() };
        self.shared
            .cache
            .lock()
            .unwrap()
            .get_or_load(&desc.file, self.loader.as_ref(), trim)
    }

    fn new_source(&mut self, desc: SourceDesc) -> Result<()> {
        let clip = self.load_clip(&desc)?;
        let master = self.shared.master();
        let mut registry = self.shared.registry.write().unwrap();
        if registry.contains(&desc.name) {
            log::warn!("replacing existing source '{}'", desc.name);
        }
        let mut source = Source::new(desc);
        source.clip = Some(clip);
        source.recompute(registry.listener(), master);
        registry.insert(source);
        Ok(())
    }

    fn change_source(&mut self, desc: SourceDesc) -> Result<()> {
        self.stop_source(&desc.name)?;
        let clip = self.load_clip(&desc)?;
        let master = self.shared.master();
        let mut registry = self.shared.registry.write().unwrap();
        let listener = *registry.listener();
        let source = registry
            .get_mut(&desc.name)
            .ok_or_else(|| AuraSonicError::NotFound(desc.name.clone()))?;
        source.change(desc, Some(clip));
        source.recompute(&listener, master);
        Ok(())
    }

    fn with_source(&self, name: &str, f: impl FnOnce(&mut Source)) -> Result<()> {
        let mut registry = self.shared.registry.write().unwrap();
        let source = registry
            .get_mut(name)
            .ok_or_else(|| AuraSonicError::NotFound(name.to_string()))?;
        f(source);
        source.sync_stream_flags();
        Ok(())
    }

    /// Recomputes a source's gain and pushes the result to its voice.
    fn refresh_source(&self, name: &str) -> Result<()> {
        let backend = self.shared.backend()?;
        let master = self.shared.master();
        let mut registry = self.shared.registry.write().unwrap();
        let listener = *registry.listener();
        let source = registry
            .get_mut(name)
            .ok_or_else(|| AuraSonicError::NotFound(name.to_string()))?;
        source.recompute(&listener, master);
        push_spatial(source, &listener, backend.as_ref());
        Ok(())
    }

    fn set_position(&self, name: &str, position: Vec3) -> Result<()> {
        if !math::is_finite(position) {
            return Err(AuraSonicError::InvalidArgument(format!(
                "non-finite position for source '{name}'"
            )));
        }
        self.with_source(name, |source| source.position = position)?;
        self.refresh_source(name)
    }

    fn set_volume(&self, name: &str, volume: f32) -> Result<()> {
        let volume = volume.clamp(0.0, 1.0);
        self.with_source(name, |source| source.source_volume = volume)?;
        self.refresh_source(name)
    }

    fn set_looping(&self, name: &str, looping: bool) -> Result<()> {
        self.with_source(name, |source| source.looping = looping)?;
        // Native backends track looping as a voice attribute.
        self.refresh_source(name)
    }

    fn play_source(&mut self, name: &str) -> Result<()> {
        let backend = self.shared.backend()?;
        let pool = self
            .pool
            .as_mut()
            .ok_or(AuraSonicError::BackendUnsupported)?;
        let mut registry = self.shared.registry.write().unwrap();
        let master = self.shared.master();
        let listener = *registry.listener();

        let (active, looping, streaming, state, clip, handle, file) = {
            let source = registry
                .get(name)
                .ok_or_else(|| AuraSonicError::NotFound(name.to_string()))?;
            (
                source.is_active(),
                source.looping,
                source.streaming,
                source.state,
                source.clip.clone(),
                source.voice_handle,
                source.file.clone(),
            )
        };

        if !active {
            // Culled sources defer: looping ones remember they want to
            // play once reactivated.
            if looping {
                registry.get_mut(name).unwrap().pending_play = true;
            }
            return Ok(());
        }

        if state == PlaybackState::Playing {
            if let Some(handle) = handle {
                if backend.is_playing(handle) {
                    return Ok(());
                }
            }
        }

        if state == PlaybackState::Paused {
            if let Some(handle) = handle {
                backend.play(handle);
                let source = registry.get_mut(name).unwrap();
                source.state = PlaybackState::Playing;
                source.sync_stream_flags();
                return Ok(());
            }
        }

        let clip = clip.ok_or(AuraSonicError::NotFound(file))?;
        let kind = if streaming {
            VoiceKind::Streaming
        } else {
            VoiceKind::Normal
        };

        // Snapshot the playing/priority status of every current pool
        // occupant so the allocator can run without re-entering the
        // registry.
        let occupant_state: HashMap<String, (bool, bool)> = registry
            .iter()
            .filter(|s| s.voice.is_some())
            .map(|s| {
                (
                    s.name.clone(),
                    (source_playing(s, backend.as_ref()), s.priority),
                )
            })
            .collect();

        let allocation = match pool.allocate(
            name,
            kind,
            |occupant| occupant_state.get(occupant).map(|s| s.0).unwrap_or(false),
            |occupant| occupant_state.get(occupant).map(|s| s.1).unwrap_or(false),
        ) {
            Some(allocation) => allocation,
            None => {
                log::warn!("no free voice for source '{name}', play skipped");
                return Ok(());
            }
        };

        let voice_id = allocation.id;
        let handle = pool
            .handle(voice_id)
            .ok_or_else(|| AuraSonicError::Backend("allocated voice vanished".into()))?;

        // Disconnect the previous occupant; its source entry survives.
        if let Some(previous) = allocation.previous.as_deref() {
            if previous != name {
                if let Some(evicted) = registry.get_mut(previous) {
                    evicted.voice = None;
                    evicted.voice_handle = None;
                    if evicted.state == PlaybackState::Playing
                        || evicted.state == PlaybackState::Paused
                    {
                        evicted.state = PlaybackState::Stopped;
                    }
                    evicted.sync_stream_flags();
                    log::debug!("source '{previous}' evicted from its voice by '{name}'");
                }
                backend.close(handle);
            }
        }

        let source = registry.get_mut(name).unwrap();
        source.voice = Some(voice_id);
        source.voice_handle = Some(handle);
        source.pending_play = false;
        source.recompute(&listener, master);

        if streaming {
            // Retire any previous playback's handle before the voice is
            // reset, so the pump cannot feed stale data into it.
            if let Some(old) = source.stream.take() {
                old.set_stopped(true);
            }
            // The pump performs the preload and starts the voice; the
            // worker never blocks on stream setup.
            backend.reset_stream(handle, clip.format())?;
            let stream = StreamHandle::new(name.to_string(), handle, clip, looping);
            source.stream = Some(stream.clone());
            source.state = PlaybackState::Playing;
            source.sync_stream_flags();
            push_spatial(source, &listener, backend.as_ref());
            drop(registry);
            self.shared.pump.watch(stream, backend.as_ref());
            return Ok(());
        }

        source.state = PlaybackState::Playing;
        push_spatial(source, &listener, backend.as_ref());
        drop(registry);

        // attach_oneshot may touch the audio driver; no engine lock is
        // held here.
        if let Err(e) = backend.attach_oneshot(handle, &clip, looping) {
            let mut registry = self.shared.registry.write().unwrap();
            if let Some(source) = registry.get_mut(name) {
                source.state = PlaybackState::Stopped;
                source.voice = None;
                source.voice_handle = None;
            }
            if let Some(pool) = self.pool.as_mut() {
                pool.unbind(voice_id, name);
            }
            return Err(e);
        }
        backend.play(handle);
        Ok(())
    }

    fn pause_source(&self, name: &str) -> Result<()> {
        let backend = self.shared.backend()?;
        let mut registry = self.shared.registry.write().unwrap();
        let source = registry
            .get_mut(name)
            .ok_or_else(|| AuraSonicError::NotFound(name.to_string()))?;
        if source.state != PlaybackState::Playing {
            return Ok(());
        }
        source.pending_play = false;
        if let Some(handle) = source.voice_handle {
            backend.pause(handle);
        }
        source.state = PlaybackState::Paused;
        source.sync_stream_flags();
        Ok(())
    }

    fn stop_source(&self, name: &str) -> Result<()> {
        let backend = self.shared.backend()?;
        let mut registry = self.shared.registry.write().unwrap();
        let source = registry
            .get_mut(name)
            .ok_or_else(|| AuraSonicError::NotFound(name.to_string()))?;
        source.pending_play = false;
        if source.state == PlaybackState::Playing || source.state == PlaybackState::Paused {
            if let Some(handle) = source.voice_handle {
                backend.stop(handle);
            }
            source.state = PlaybackState::Stopped;
            source.sync_stream_flags();
        }
        Ok(())
    }

    fn rewind_source(&mut self, name: &str) -> Result<()> {
        let (state, streaming, handle) = {
            let registry = self.shared.registry.read().unwrap();
            let source = registry
                .get(name)
                .ok_or_else(|| AuraSonicError::NotFound(name.to_string()))?;
            (source.state, source.streaming, source.voice_handle)
        };
        match state {
            // A paused source is stopped by a rewind; this includes the
            // streaming case, whose replay would otherwise be undefined.
            PlaybackState::Paused => self.stop_source(name),
            PlaybackState::Playing => {
                if streaming {
                    // Streams restart from byte zero via a fresh preload.
                    self.stop_source(name)?;
                    self.play_source(name)
                } else {
                    let backend = self.shared.backend()?;
                    if let Some(handle) = handle {
                        backend.rewind(handle);
                    }
                    Ok(())
                }
            }
            _ => Ok(()),
        }
    }

    fn flush_source(&self, name: &str) -> Result<()> {
        let backend = self.shared.backend()?;
        let registry = self.shared.registry.read().unwrap();
        let source = registry
            .get(name)
            .ok_or_else(|| AuraSonicError::NotFound(name.to_string()))?;
        if let Some(handle) = source.voice_handle {
            backend.flush(handle);
        }
        Ok(())
    }

    fn cull_source(&mut self, name: &str) -> Result<()> {
        let backend = self.shared.backend()?;
        let pool = self
            .pool
            .as_mut()
            .ok_or(AuraSonicError::BackendUnsupported)?;
        let mut registry = self.shared.registry.write().unwrap();
        let source = registry
            .get_mut(name)
            .ok_or_else(|| AuraSonicError::NotFound(name.to_string()))?;
        if source.state == PlaybackState::Culled {
            return Ok(());
        }
        if source.looping && source_playing(source, backend.as_ref()) {
            source.pending_play = true;
        }
        if let Some(handle) = source.voice_handle.take() {
            backend.close(handle);
        }
        if let Some(voice_id) = source.voice.take() {
            pool.unbind(voice_id, name);
        }
        source.state = PlaybackState::Culled;
        source.sync_stream_flags();
        Ok(())
    }

    fn activate_source(&self, name: &str) -> Result<()> {
        self.with_source(name, |source| {
            if source.state == PlaybackState::Culled {
                source.state = PlaybackState::Stopped;
            }
        })
    }

    fn remove_source(&mut self, name: &str) -> Result<()> {
        let mut registry = self.shared.registry.write().unwrap();
        let Some(mut source) = registry.remove(name) else {
            return Err(AuraSonicError::NotFound(name.to_string()));
        };
        drop(registry);
        if let Some(stream) = source.stream.take() {
            stream.set_stopped(true);
        }
        if let Some(handle) = source.voice_handle.take() {
            if let Ok(backend) = self.shared.backend() {
                backend.close(handle);
            }
        }
        if let Some(voice_id) = source.voice.take() {
            if let Some(pool) = self.pool.as_mut() {
                pool.unbind(voice_id, name);
            }
        }
        log::debug!("removed source '{name}'");
        Ok(())
    }

    fn move_listener(&self, delta: Vec3) -> Result<()> {
        let mut registry = self.shared.registry.write().unwrap();
        registry.listener_mut().move_by(delta)?;
        drop(registry);
        self.listener_changed()
    }

    fn set_listener_position(&self, position: Vec3) -> Result<()> {
        let mut registry = self.shared.registry.write().unwrap();
        registry.listener_mut().set_position(position)?;
        drop(registry);
        self.listener_changed()
    }

    fn turn_listener(&self, delta: f32) -> Result<()> {
        let mut registry = self.shared.registry.write().unwrap();
        registry.listener_mut().turn(delta)?;
        drop(registry);
        self.listener_changed()
    }

    fn set_listener_angle(&self, angle: f32) -> Result<()> {
        let mut registry = self.shared.registry.write().unwrap();
        registry.listener_mut().set_angle(angle)?;
        drop(registry);
        self.listener_changed()
    }

    fn set_listener_orientation(&self, look: Vec3, up: Vec3) -> Result<()> {
        let mut registry = self.shared.registry.write().unwrap();
        registry.listener_mut().set_orientation(look, up)?;
        drop(registry);
        self.listener_changed()
    }

    /// Recomputes every source and pushes fresh spatial state after any
    /// listener change.
    fn listener_changed(&self) -> Result<()> {
        let master = self.shared.master();
        let mut registry = self.shared.registry.write().unwrap();
        registry.recompute_all(master);
        let listener = *registry.listener();

        let Ok(backend) = self.shared.backend() else {
            return Ok(());
        };
        backend.set_listener(listener.position(), listener.look(), listener.up());
        for source in registry.iter_mut() {
            push_spatial(source, &listener, backend.as_ref());
        }
        Ok(())
    }

    fn set_master_volume(&self, volume: f32) -> Result<()> {
        let volume = volume.clamp(0.0, 1.0);
        self.shared.set_master(volume);
        if let Ok(backend) = self.shared.backend() {
            backend.set_master_gain(volume);
        }
        // Master volume participates in every computed gain.
        self.listener_changed()
    }

    /// Applies pump feedback and replays sources that want to play.
    fn manage_sources(&mut self) {
        let Ok(backend) = self.shared.backend() else {
            return;
        };
        let mut replay = Vec::new();
        {
            let mut registry = self.shared.registry.write().unwrap();
            for source in registry.iter_mut() {
                if let Some(handle) = &source.stream {
                    if handle.take_pending_play() {
                        source.pending_play = true;
                    }
                    // The pump stops entries on stream errors and EOS;
                    // fold that back into the registry state.
                    if handle.stopped() && source.state == PlaybackState::Playing {
                        source.state = PlaybackState::Stopped;
                    }
                }
                if source.pending_play
                    && source.is_active()
                    && !source_playing(source, backend.as_ref())
                {
                    source.pending_play = false;
                    replay.push(source.name.clone());
                }
            }
        }
        for name in replay {
            log::debug!("replaying source '{name}'");
            if let Err(e) = self.play_source(&name) {
                log::error!("replay of '{name}' failed: {e}");
            }
        }
    }

    /// Sweeps temporary sources that have finished playing.
    fn maybe_reap(&mut self) {
        if self.last_reap.elapsed() < REAP_INTERVAL {
            return;
        }
        self.last_reap = Instant::now();
        let Ok(backend) = self.shared.backend() else {
            return;
        };
        let expired: Vec<String> = {
            let registry = self.shared.registry.read().unwrap();
            registry
                .iter()
                .filter(|source| {
                    source.temporary
                        && !source.pending_play
                        && !source_playing(source, backend.as_ref())
                })
                .map(|source| source.name.clone())
                .collect()
        };
        for name in expired {
            log::debug!("reaping temporary source '{name}'");
            if let Err(e) = self.remove_source(&name) {
                log::error!("reaper failed to remove '{name}': {e}");
            }
        }
    }

    fn close_all_voices(&self, backend: &dyn Backend) {
        if let Some(pool) = self.pool.as_ref() {
            for handle in pool.all_handles() {
                backend.close(handle);
            }
        }
    }

    fn cleanup(&mut self) {
        if let Ok(backend) = self.shared.backend() {
            self.close_all_voices(backend.as_ref());
            backend.shutdown();
        }
        let mut registry = self.shared.registry.write().unwrap();
        for source in registry.iter_mut() {
            if let Some(stream) = source.stream.take() {
                stream.set_stopped(true);
            }
            source.voice = None;
            source.voice_handle = None;
        }
    }
}

/// Pushes a source's spatial state to its bound voice. Native-3D
/// backends receive raw coordinates and handle rolloff themselves;
/// everything else gets the engine-computed falloff gain and pan.
/// Both paths exclude master gain, which every backend applies once
/// via `set_master_gain`; `computed_gain` (which folds master in) is
/// the registry-visible value, never the pushed one.
fn push_spatial(source: &Source, listener: &Listener, backend: &dyn Backend) {
    let Some(handle) = source.voice_handle else {
        return;
    };
    if backend.native_3d() {
        backend.set_3d(
            handle,
            source.position,
            source.native_rolloff(),
            source.looping,
        );
        backend.set_gain(handle, source.native_gain());
    } else {
        backend.set_gain(handle, source.mixed_gain());
        backend.set_pan(handle, attenuation::pan(source.position, listener));
    }
}
