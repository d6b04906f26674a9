//! Configuration for AuraSonic

use crate::attenuation::Attenuation;

/// Static engine configuration, fixed at construction.
///
/// Runtime-tunable state (the master volume) lives on the engine itself;
/// everything here is read-only once the engine threads are running.
#[derive(Debug, Clone)]
pub struct AuraSonicConfig {
    /// Size of the non-streaming voice pool.
    pub num_normal_voices: usize,
    /// Size of the streaming voice pool.
    pub num_streaming_voices: usize,
    /// Initial master volume, 0.0 - 1.0.
    pub master_gain: f32,
    /// Attenuation model used when a source does not specify one.
    pub default_attenuation: Attenuation,
    /// Rolloff factor used when a source does not specify one.
    pub default_rolloff: f32,
    /// Linear fade distance used when a source does not specify one.
    pub default_fade_distance: f32,
    /// Size in bytes of each PCM chunk fed to a streaming voice.
    pub stream_buffer_bytes: usize,
    /// Number of chunks queued ahead on a streaming voice.
    pub num_stream_buffers: usize,
    /// One-shot clips are trimmed to this many bytes on backends with
    /// platform clip-size limits. Streaming sources are never trimmed.
    pub max_clip_bytes: usize,
    /// Read granularity handed to the decoder collaborator.
    pub file_chunk_bytes: usize,
}

impl Default for AuraSonicConfig {
    fn default() -> Self {
        Self {
            num_normal_voices: 28,
            num_streaming_voices: 4,
            master_gain: 1.0,
            default_attenuation: Attenuation::InverseRolloff,
            default_rolloff: 0.03,
            default_fade_distance: 1000.0,
            stream_buffer_bytes: 131072,
            num_stream_buffers: 2,
            max_clip_bytes: 268435456,
            file_chunk_bytes: 1048576,
        }
    }
}

impl AuraSonicConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn num_normal_voices(mut self, count: usize) -> Self {
        self.num_normal_voices = count;
        self
    }

    pub fn num_streaming_voices(mut self, count: usize) -> Self {
        self.num_streaming_voices = count;
        self
    }

    pub fn master_gain(mut self, gain: f32) -> Self {
        self.master_gain = gain.clamp(0.0, 1.0);
        self
    }

    pub fn default_attenuation(mut self, model: Attenuation) -> Self {
        self.default_attenuation = model;
        self
    }

    pub fn default_rolloff(mut self, rolloff: f32) -> Self {
        self.default_rolloff = rolloff;
        self
    }

    pub fn default_fade_distance(mut self, distance: f32) -> Self {
        self.default_fade_distance = distance;
        self
    }

    pub fn stream_buffer_bytes(mut self, bytes: usize) -> Self {
        self.stream_buffer_bytes = bytes;
        self
    }

    pub fn num_stream_buffers(mut self, count: usize) -> Self {
        self.num_stream_buffers = count;
        self
    }

    pub fn max_clip_bytes(mut self, bytes: usize) -> Self {
        self.max_clip_bytes = bytes;
        self
    }

    pub fn file_chunk_bytes(mut self, bytes: usize) -> Self {
        self.file_chunk_bytes = bytes;
        self
    }
}
