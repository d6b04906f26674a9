//! Shared helpers for the integration suites: a synthetic clip loader
//! and polling utilities.

use aurasonic::{AuraSonic, AuraSonicConfig, BackendChoice, Clip, ClipFormat, ClipLoader,
    MockBackend, Result};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Decoder stand-in that synthesizes a clip whose duration is encoded in
/// the filename, e.g. `"120ms.wav"` yields 120 milliseconds of tone at
/// 8 kHz mono 16-bit. `"0ms.wav"` yields an empty clip.
pub struct ToneLoader;

impl ClipLoader for ToneLoader {
    fn load(&self, path: &str) -> Result<Clip> {
        let millis: u64 = path
            .split("ms")
            .next()
            .and_then(|head| head.parse().ok())
            .unwrap_or(100);
        let format = ClipFormat::new(8000, 1, 16)?;
        let frames = (format.sample_rate as u64 * millis / 1000) as usize;
        let mut bytes = Vec::with_capacity(frames * 2);
        for i in 0..frames {
            let sample = if (i / 20) % 2 == 0 { 6000i16 } else { -6000 };
            bytes.extend_from_slice(&sample.to_le_bytes());
        }
        Clip::new(bytes, format)
    }
}

/// Engine wired to a mock backend; returns the engine and a handle on
/// the backend for inspection.
pub fn mock_engine(config: AuraSonicConfig) -> (AuraSonic, MockBackend) {
    let backend = MockBackend::new();
    let engine = AuraSonic::with_loader(config, Arc::new(ToneLoader));
    engine.init(vec![BackendChoice::Custom(Box::new(backend.clone()))]);
    (engine, backend)
}

/// Polls `predicate` until it holds or `timeout` elapses.
pub fn wait_until(timeout: Duration, mut predicate: impl FnMut() -> bool) -> bool {
    let deadline = Instant::now() + timeout;
    loop {
        if predicate() {
            return true;
        }
        if Instant::now() >= deadline {
            return false;
        }
        std::thread::sleep(Duration::from_millis(5));
    }
}
