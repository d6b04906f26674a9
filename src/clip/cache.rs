use crate::clip::{Clip, ClipLoader};
use crate::error::Result;
use std::collections::HashMap;
use std::sync::Arc;

/// Map of decoded clips keyed by filename or URL.
///
/// Entries live until [`unload`](ClipCache::unload); sources holding an
/// `Arc` to a clip keep it alive past removal.
#[derive(Default)]
pub struct ClipCache {
    clips: HashMap<String, Arc<Clip>>,
}

impl ClipCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the cached clip, decoding and inserting on a miss.
    ///
    /// `trim_to` caps the stored byte length for backends with platform
    /// clip-size limits; pass `None` for streaming sources. A failed
    /// decode leaves the cache unchanged, so a later call retries.
    pub fn get_or_load(
        &mut self,
        name: &str,
        loader: &dyn ClipLoader,
        trim_to: Option<usize>,
    ) -> Result<Arc<Clip>> {
        if let Some(clip) = self.clips.get(name) {
            return Ok(clip.clone());
        }
        let mut clip = loader.load(name)?;
        if let Some(max_bytes) = trim_to {
            clip = clip.trimmed(max_bytes);
        }
        log::debug!(
            "loaded '{}': {} bytes, {} Hz, {} ch",
            name,
            clip.len(),
            clip.format().sample_rate,
            clip.format().channels
        );
        let clip = Arc::new(clip);
        self.clips.insert(name.to_string(), clip.clone());
        Ok(clip)
    }

    pub fn get(&self, name: &str) -> Option<Arc<Clip>> {
        self.clips.get(name).cloned()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.clips.contains_key(name)
    }

    pub fn unload(&mut self, name: &str) {
        self.clips.remove(name);
    }

    pub fn clear(&mut self) {
        self.clips.clear();
    }

    pub fn len(&self) -> usize {
        self.clips.len()
    }

    pub fn is_empty(&self) -> bool {
        self.clips.is_empty()
    }
}
