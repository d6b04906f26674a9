//! Listener pose: the virtual ear position and orientation used for 3D
//! gain and pan.

use crate::error::{AuraSonicError, Result};
use crate::math::{is_finite, Vec3, DEGENERATE_EPSILON};

/// Position and orientation of the listener.
///
/// The look-at and up vectors are kept normalized; the yaw angle rotates
/// the look direction counterclockwise about the Y axis and is tracked
/// alongside the vectors so `turn`/`set_angle` compose predictably.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Listener {
    position: Vec3,
    look: Vec3,
    up: Vec3,
    angle: f32,
}

impl Listener {
    /// Listener at the origin, looking down -Z with +Y up.
    pub fn new() -> Self {
        Self {
            position: Vec3::ZERO,
            look: Vec3::NEG_Z,
            up: Vec3::Y,
            angle: 0.0,
        }
    }

    pub fn position(&self) -> Vec3 {
        self.position
    }

    pub fn look(&self) -> Vec3 {
        self.look
    }

    pub fn up(&self) -> Vec3 {
        self.up
    }

    /// Yaw in radians, counterclockwise about Y.
    pub fn angle(&self) -> f32 {
        self.angle
    }

    pub fn set_position(&mut self, position: Vec3) -> Result<()> {
        if !is_finite(position) {
            return Err(AuraSonicError::InvalidArgument(
                "listener position must be finite".into(),
            ));
        }
        self.position = position;
        Ok(())
    }

    pub fn move_by(&mut self, delta: Vec3) -> Result<()> {
        self.set_position(self.position + delta)
    }

    /// Replaces the orientation, normalizing both vectors. Rejects
    /// degenerate or colinear look/up pairs.
    pub fn set_orientation(&mut self, look: Vec3, up: Vec3) -> Result<()> {
        if !is_finite(look) || !is_finite(up) {
            return Err(AuraSonicError::InvalidArgument(
                "listener orientation must be finite".into(),
            ));
        }
        if look.length_squared() <= DEGENERATE_EPSILON
            || up.length_squared() <= DEGENERATE_EPSILON
        {
            return Err(AuraSonicError::InvalidArgument(
                "listener orientation vectors must be non-zero".into(),
            ));
        }
        let look = look.normalize();
        let up = up.normalize();
        if look.cross(up).length_squared() <= DEGENERATE_EPSILON {
            return Err(AuraSonicError::InvalidArgument(
                "listener look and up must not be colinear".into(),
            ));
        }
        self.look = look;
        self.up = up;
        Ok(())
    }

    /// Sets the absolute yaw angle, rotating the default -Z look
    /// direction about Y. The up vector is left untouched.
    pub fn set_angle(&mut self, angle: f32) -> Result<()> {
        if !angle.is_finite() {
            return Err(AuraSonicError::InvalidArgument(
                "listener angle must be finite".into(),
            ));
        }
        self.angle = angle;
        self.look = Vec3::new(-angle.sin(), 0.0, -angle.cos());
        Ok(())
    }

    /// Turns by a relative yaw delta.
    pub fn turn(&mut self, delta: f32) -> Result<()> {
        self.set_angle(self.angle + delta)
    }
}

impl Default for Listener {
    fn default() -> Self {
        Self::new()
    }
}
