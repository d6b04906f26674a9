use crate::clip::Clip;
use crate::error::Result;

/// Trait for decoding audio files into PCM clips.
///
/// The engine never parses containers itself; `load_sound` hands the
/// filename to whichever loader the engine was built with. The default
/// is the Symphonia-based [`SymphoniaLoader`](super::SymphoniaLoader);
/// hosts with their own decoders or virtual filesystems can substitute
/// anything that produces little-endian signed interleaved PCM.
pub trait ClipLoader: Send + Sync {
    /// Decodes the file at `path` into a complete in-memory clip.
    fn load(&self, path: &str) -> Result<Clip>;
}
