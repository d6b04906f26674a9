//! Decoded PCM clips and their cache.

mod cache;
mod loader;
mod symphonia_loader;

pub use cache::ClipCache;
pub use loader::ClipLoader;
pub use symphonia_loader::SymphoniaLoader;

use crate::error::{AuraSonicError, Result};
use std::time::Duration;

/// Sample layout of a decoded clip: signed little-endian interleaved PCM.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClipFormat {
    /// Samples per second.
    pub sample_rate: u32,
    /// 1 (mono) or 2 (stereo).
    pub channels: u16,
    /// 8 or 16.
    pub bits_per_sample: u16,
}

impl ClipFormat {
    pub fn new(sample_rate: u32, channels: u16, bits_per_sample: u16) -> Result<Self> {
        let format = Self {
            sample_rate,
            channels,
            bits_per_sample,
        };
        format.validate()?;
        Ok(format)
    }

    pub fn validate(&self) -> Result<()> {
        if self.sample_rate == 0 {
            return Err(AuraSonicError::FormatUnsupported(
                "sample rate must be positive".into(),
            ));
        }
        if self.channels != 1 && self.channels != 2 {
            return Err(AuraSonicError::FormatUnsupported(format!(
                "{} channels (only mono and stereo)",
                self.channels
            )));
        }
        if self.bits_per_sample != 8 && self.bits_per_sample != 16 {
            return Err(AuraSonicError::FormatUnsupported(format!(
                "{} bits per sample (only 8 and 16)",
                self.bits_per_sample
            )));
        }
        Ok(())
    }

    /// Bytes occupied by one interleaved frame.
    pub fn bytes_per_frame(&self) -> usize {
        self.channels as usize * (self.bits_per_sample as usize / 8)
    }

    /// Bytes of PCM per second of audio.
    pub fn bytes_per_second(&self) -> usize {
        self.bytes_per_frame() * self.sample_rate as usize
    }

    /// Play time of `len` bytes of PCM in this format.
    pub fn duration_of(&self, len: usize) -> Duration {
        Duration::from_secs_f64(len as f64 / self.bytes_per_second() as f64)
    }

    /// Largest length `<= len` that is a whole number of frames.
    pub fn frame_aligned(&self, len: usize) -> usize {
        len - len % self.bytes_per_frame()
    }
}

/// Immutable decoded PCM payload, shared by reference between the cache
/// and any playing source.
#[derive(Debug, Clone)]
pub struct Clip {
    bytes: Vec<u8>,
    format: ClipFormat,
}

impl Clip {
    pub fn new(bytes: Vec<u8>, format: ClipFormat) -> Result<Self> {
        format.validate()?;
        Ok(Self { bytes, format })
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    pub fn format(&self) -> ClipFormat {
        self.format
    }

    pub fn duration(&self) -> Duration {
        self.format.duration_of(self.bytes.len())
    }

    /// Returns a copy truncated to at most `max_bytes`, aligned down to a
    /// whole frame. Returns the clip unchanged when it already fits.
    pub fn trimmed(&self, max_bytes: usize) -> Self {
        if self.bytes.len() <= max_bytes {
            return self.clone();
        }
        let keep = self.format.frame_aligned(max_bytes);
        log::info!(
            "trimming clip from {} to {} bytes",
            self.bytes.len(),
            keep
        );
        Self {
            bytes: self.bytes[..keep].to_vec(),
            format: self.format,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn format_validation() {
        assert!(ClipFormat::new(44100, 2, 16).is_ok());
        assert!(ClipFormat::new(0, 2, 16).is_err());
        assert!(ClipFormat::new(44100, 3, 16).is_err());
        assert!(ClipFormat::new(44100, 1, 24).is_err());
    }

    #[test]
    fn frame_geometry() {
        let format = ClipFormat::new(44100, 2, 16).unwrap();
        assert_eq!(format.bytes_per_frame(), 4);
        assert_eq!(format.bytes_per_second(), 176400);
        assert_eq!(format.frame_aligned(10), 8);
    }

    #[test]
    fn duration_of_one_second() {
        let format = ClipFormat::new(8000, 1, 8).unwrap();
        assert_eq!(format.duration_of(8000), Duration::from_secs(1));
    }

    #[test]
    fn trim_aligns_to_frames() {
        let format = ClipFormat::new(44100, 2, 16).unwrap();
        let clip = Clip::new(vec![0; 100], format).unwrap();
        let trimmed = clip.trimmed(10);
        assert_eq!(trimmed.len(), 8);
        // Already small enough: untouched.
        assert_eq!(clip.trimmed(100).len(), 100);
        assert_eq!(clip.trimmed(1000).len(), 100);
    }
}
