//! Distance attenuation and stereo pan math.
//!
//! All gain computation for backends without native 3D happens here; the
//! spatial backend receives raw positions instead and applies the same
//! rolloff curve inside its mixer.

use crate::listener::Listener;
use crate::math::{unit_clamp, Vec3};

/// Scales the squared distance in the inverse-rolloff curve.
pub const ROLLOFF_TWEAK_FACTOR: f32 = 0.0005;

/// How a source's gain falls off with distance from the listener.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Attenuation {
    /// Full volume everywhere.
    None,
    /// `1 / (1 + rolloff * d^2 * k)` falloff.
    InverseRolloff,
    /// Linear fade reaching silence at the fade distance.
    Linear,
}

impl Default for Attenuation {
    fn default() -> Self {
        Self::InverseRolloff
    }
}

/// Distance-only gain in [0, 1], before source and master volume.
///
/// `dist_or_roll` is the fade distance under [`Attenuation::Linear`] and
/// the rolloff factor under [`Attenuation::InverseRolloff`].
pub fn base_gain(model: Attenuation, distance: f32, dist_or_roll: f32) -> f32 {
    match model {
        Attenuation::None => 1.0,
        Attenuation::Linear => {
            if distance <= 0.0 {
                1.0
            } else if distance >= dist_or_roll {
                0.0
            } else {
                1.0 - distance / dist_or_roll
            }
        }
        Attenuation::InverseRolloff => {
            if distance <= 0.0 {
                1.0
            } else {
                let attenuation =
                    (dist_or_roll * distance * distance * ROLLOFF_TWEAK_FACTOR).max(0.0);
                1.0 / (1.0 + attenuation)
            }
        }
    }
}

/// Final per-source gain: distance falloff scaled by source and master
/// volume, clamped to the unit interval.
pub fn computed_gain(
    model: Attenuation,
    distance: f32,
    dist_or_roll: f32,
    source_volume: f32,
    master_gain: f32,
) -> f32 {
    unit_clamp(base_gain(model, distance, dist_or_roll) * source_volume * master_gain)
}

/// Stereo pan in [-1, 1] for a source position relative to the listener,
/// -1 full left and +1 full right.
pub fn pan(source_position: Vec3, listener: &Listener) -> f32 {
    let side = listener.up().cross(listener.look()).normalize_or_zero();
    let offset = source_position - listener.position();
    let x = offset.dot(side);
    let z = offset.dot(listener.look());
    (-f32::atan2(x, z).sin()).clamp(-1.0, 1.0)
}
