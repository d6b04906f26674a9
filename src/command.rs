//! The serialized command set.
//!
//! Every public facade method maps to one variant; the dispatcher worker
//! drains them in enqueue order, which makes the whole API thread-safe
//! and its effects deterministic.

use crate::attenuation::Attenuation;
use crate::backend::BackendChoice;
use crate::math::Vec3;
use crate::source::SourceDesc;

pub enum Command {
    /// Select and open the first compatible backend, then build the
    /// voice pools.
    Init(Vec<BackendChoice>),
    LoadSound(String),
    UnloadSound(String),
    NewSource(SourceDesc),
    /// Insert and immediately play.
    QuickPlay(SourceDesc),
    /// Re-target an existing source.
    ChangeSource(SourceDesc),
    SetPosition(String, Vec3),
    SetVolume(String, f32),
    SetPriority(String, bool),
    SetLooping(String, bool),
    SetAttenuation(String, Attenuation),
    SetDistOrRoll(String, f32),
    Play(String),
    Pause(String),
    Stop(String),
    Rewind(String),
    Flush(String),
    Cull(String),
    Activate(String),
    SetTemporary(String, bool),
    RemoveSource(String),
    MoveListener(Vec3),
    SetListenerPosition(Vec3),
    TurnListener(f32),
    SetListenerAngle(f32),
    SetListenerOrientation(Vec3, Vec3),
    SetMasterVolume(f32),
    /// Internal: shut the worker down.
    Quit,
}

impl Command {
    /// Short identifier for diagnostics.
    pub fn name(&self) -> &'static str {
        match self {
            Command::Init(_) => "Init",
            Command::LoadSound(_) => "LoadSound",
            Command::UnloadSound(_) => "UnloadSound",
            Command::NewSource(_) => "NewSource",
            Command::QuickPlay(_) => "QuickPlay",
            Command::ChangeSource(_) => "ChangeSource",
            Command::SetPosition(..) => "SetPosition",
            Command::SetVolume(..) => "SetVolume",
            Command::SetPriority(..) => "SetPriority",
            Command::SetLooping(..) => "SetLooping",
            Command::SetAttenuation(..) => "SetAttenuation",
            Command::SetDistOrRoll(..) => "SetDistOrRoll",
            Command::Play(_) => "Play",
            Command::Pause(_) => "Pause",
            Command::Stop(_) => "Stop",
            Command::Rewind(_) => "Rewind",
            Command::Flush(_) => "Flush",
            Command::Cull(_) => "Cull",
            Command::Activate(_) => "Activate",
            Command::SetTemporary(..) => "SetTemporary",
            Command::RemoveSource(_) => "RemoveSource",
            Command::MoveListener(_) => "MoveListener",
            Command::SetListenerPosition(_) => "SetListenerPosition",
            Command::TurnListener(_) => "TurnListener",
            Command::SetListenerAngle(_) => "SetListenerAngle",
            Command::SetListenerOrientation(..) => "SetListenerOrientation",
            Command::SetMasterVolume(_) => "SetMasterVolume",
            Command::Quit => "Quit",
        }
    }
}
