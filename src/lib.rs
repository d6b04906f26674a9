//! # AuraSonic
//!
//! A 3D positional sound engine: a moving listener and a set of named
//! sound sources placed in 3D space, rendered as an attenuated, panned,
//! multi-voice mix through a pluggable audio backend.
//!
//! ## Quick start
//!
//! ```no_run
//! use aurasonic::{AuraSonic, AuraSonicConfig, BackendChoice};
//! use aurasonic::math::Vec3;
//!
//! let mut engine = AuraSonic::new(AuraSonicConfig::default());
//! engine.init(vec![BackendChoice::Spatial, BackendChoice::Software]);
//!
//! engine.load_sound("ambience.ogg")?;
//! let desc = engine
//!     .source_desc("ambience", "ambience.ogg")
//!     .streaming(true)
//!     .looping(true)
//!     .position(Vec3::new(0.0, 0.0, -5.0));
//! engine.new_source(desc)?;
//! engine.play("ambience")?;
//!
//! // As the player moves, the mix follows.
//! engine.set_listener_position(Vec3::new(2.0, 0.0, -1.0));
//! engine.turn_listener(0.3);
//!
//! engine.shutdown();
//! # Ok::<(), aurasonic::AuraSonicError>(())
//! ```
//!
//! ## Architecture
//!
//! Three engine threads cooperate:
//!
//! 1. **Dispatcher worker**: drains the serialized command queue,
//!    mutates the source registry, allocates voices, and issues backend
//!    calls. Also reaps finished temporary sources.
//! 2. **Streaming pump**: keeps the PCM chunk queues of streaming
//!    voices topped up and handles end-of-stream and loop wraps.
//! 3. **Backend output thread**: owned by the cpal-based backends;
//!    runs the real-time mix callback and never touches engine state.
//!
//! Public commands enqueue and return immediately; queries read a
//! consistent registry snapshot. Voices live in two fixed pools
//! (one-shot and streaming) with a round-robin allocator that respects
//! per-source priority.

pub mod attenuation;
pub mod backend;
pub mod clip;
pub mod command;
pub mod config;
pub mod error;
pub mod listener;
pub mod math;
pub mod registry;
pub mod source;
pub mod voice;

mod dispatcher;
mod stream;
mod system;

pub use attenuation::Attenuation;
pub use backend::{Backend, BackendChoice, MockBackend, NullBackend, Preload, SoftwareBackend,
    SpatialBackend, VoiceKind, VoiceRef};
pub use clip::{Clip, ClipCache, ClipFormat, ClipLoader, SymphoniaLoader};
pub use config::AuraSonicConfig;
pub use error::{AuraSonicError, Result};
pub use listener::Listener;
pub use source::{PlaybackState, SourceDesc};
pub use system::AuraSonic;
