//! The streaming pump: a worker thread that keeps the PCM chunk queues
//! of all streaming voices topped up and handles end-of-stream and loop
//! transitions.
//!
//! The pump never touches the registry. Each watched entry is a
//! [`StreamHandle`] whose control flags the dispatcher mirrors on every
//! state change; the pump only advances the byte cursor and the preload
//! latch under the handle's own mutex.

use crate::backend::{Backend, Preload};
use crate::config::AuraSonicConfig;
use crate::dispatcher::EngineShared;
use crate::source::StreamHandle;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Condvar, Mutex};
use std::time::Duration;

/// Refill cadence while any stream is live.
const ACTIVE_TICK: Duration = Duration::from_millis(20);
/// Bounded sleep while the watch list is empty; a watch() always signals
/// long before this expires.
const IDLE_WAIT: Duration = Duration::from_secs(3600);

/// State shared between the pump thread, the dispatcher, and the facade.
pub(crate) struct PumpShared {
    watch: Mutex<Vec<Arc<StreamHandle>>>,
    signal: Condvar,
    dying: AtomicBool,
}

impl PumpShared {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            watch: Mutex::new(Vec::new()),
            signal: Condvar::new(),
            dying: AtomicBool::new(false),
        })
    }

    /// Starts watching a source. Any other watched source bound to the
    /// same voice is stopped and dropped first.
    pub fn watch(&self, entry: Arc<StreamHandle>, backend: &dyn Backend) {
        let mut watch = self.watch.lock().unwrap();
        watch.retain(|existing| {
            if Arc::ptr_eq(existing, &entry) {
                return false;
            }
            if existing.voice == entry.voice {
                log::debug!(
                    "stream '{}' displaced from voice {} by '{}'",
                    existing.source,
                    entry.voice,
                    entry.source
                );
                existing.set_stopped(true);
                backend.stop(existing.voice);
                return false;
            }
            true
        });
        watch.push(entry);
        self.signal.notify_all();
    }

    pub fn kill(&self) {
        self.dying.store(true, Ordering::SeqCst);
        self.signal.notify_all();
    }

    #[cfg(test)]
    pub fn watched(&self, name: &str) -> bool {
        self.watch
            .lock()
            .unwrap()
            .iter()
            .any(|entry| entry.source == name)
    }
}

/// Pump thread main loop.
pub(crate) fn run(engine: Arc<EngineShared>) {
    log::debug!("stream pump started");
    let pump = engine.pump.clone();
    let config = engine.config.clone();
    let mut watch = pump.watch.lock().unwrap();
    loop {
        let timeout = if watch.is_empty() { IDLE_WAIT } else { ACTIVE_TICK };
        let (guard, _) = pump.signal.wait_timeout(watch, timeout).unwrap();
        watch = guard;
        if pump.dying.load(Ordering::SeqCst) {
            break;
        }
        let Ok(backend) = engine.backend() else {
            continue;
        };
        watch.retain(|entry| service(entry, backend.as_ref(), &config));
    }
    log::debug!("stream pump exiting");
}

/// Services one watched stream; returns false to drop it from the list.
fn service(entry: &Arc<StreamHandle>, backend: &dyn Backend, config: &AuraSonicConfig) -> bool {
    if entry.stopped() {
        return false;
    }
    if entry.culled() {
        if entry.looping() {
            entry.latch_pending_play();
        }
        return false;
    }
    if entry.paused() {
        return true;
    }

    let mut progress = entry.progress.lock().unwrap();

    if progress.pending_preload {
        progress.cursor = 0;
        let mut chunks = Vec::with_capacity(config.num_stream_buffers);
        for _ in 0..config.num_stream_buffers {
            let remaining = entry.clip.len() - progress.cursor;
            if remaining == 0 {
                break;
            }
            let len = remaining.min(config.stream_buffer_bytes);
            chunks.push(entry.clip.bytes()[progress.cursor..progress.cursor + len].to_vec());
            progress.cursor += len;
        }
        return match backend.preload(entry.voice, chunks) {
            Ok(Preload::Queued) => {
                progress.pending_preload = false;
                backend.play(entry.voice);
                true
            }
            Ok(Preload::EndOfStream) => {
                // Zero-length clip: nothing will ever play.
                log::debug!("stream '{}' has no data, dropping", entry.source);
                entry.set_stopped(true);
                false
            }
            Err(e) => {
                log::error!("preload failed for stream '{}': {e}", entry.source);
                backend.stop(entry.voice);
                entry.set_stopped(true);
                false
            }
        };
    }

    let processed = backend.buffers_processed(entry.voice);
    for _ in 0..processed {
        let remaining = entry.clip.len() - progress.cursor;
        if remaining == 0 {
            if entry.looping() {
                progress.pending_preload = true;
            } else if !backend.is_playing(entry.voice) {
                entry.set_stopped(true);
                return false;
            }
            break;
        }
        let len = remaining.min(config.stream_buffer_bytes);
        let chunk = &entry.clip.bytes()[progress.cursor..progress.cursor + len];
        match backend.queue(entry.voice, chunk) {
            Ok(()) => progress.cursor += len,
            Err(e) => {
                log::error!("queue failed for stream '{}': {e}", entry.source);
                backend.stop(entry.voice);
                entry.set_stopped(true);
                return false;
            }
        }
    }

    // Fully queued and fully drained without a refill opportunity.
    if processed == 0
        && progress.cursor >= entry.clip.len()
        && !entry.looping()
        && !backend.is_playing(entry.voice)
    {
        entry.set_stopped(true);
        return false;
    }

    true
}
