//! Orbiting follow camera (accumulated look input, smoothed angles).
#![forbid(unsafe_code)]

use motion_math::smooth_damp2;
use rapier3d::math::Vector;
use rapier3d::prelude::Real;
use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OrbitCameraConfig {
    pub mouse_sensitivity: Real,
    pub distance_from_target: Real,
    /// Lower pitch bound in degrees (looking up).
    pub min_pitch: Real,
    /// Upper pitch bound in degrees (looking down from above).
    pub max_pitch: Real,
    pub rotation_smooth_time: Real,
    /// Pointer-capture hint for the windowing layer; no effect on the math.
    pub lock_cursor: bool,
}

impl Default for OrbitCameraConfig {
    fn default() -> Self {
        Self {
            mouse_sensitivity: 5.0,
            distance_from_target: 2.0,
            min_pitch: -40.0,
            max_pitch: 85.0,
            rotation_smooth_time: 0.12,
            lock_cursor: true,
        }
    }
}

impl OrbitCameraConfig {
    pub fn normalize(&mut self) {
        self.distance_from_target = self.distance_from_target.max(0.0);
        self.rotation_smooth_time = self.rotation_smooth_time.max(0.0);
        if self.max_pitch < self.min_pitch {
            std::mem::swap(&mut self.min_pitch, &mut self.max_pitch);
        }
    }
}

/// Camera placement for one tick: eye position plus smoothed euler angles
/// (degrees, roll fixed at zero).
#[derive(Clone, Copy, Debug)]
pub struct CameraPose {
    pub eye: Vector<Real>,
    pub yaw: Real,
    pub pitch: Real,
}

pub struct OrbitCamera {
    config: OrbitCameraConfig,
    /// Raw accumulated look target; yaw is unbounded, pitch hard-clamped.
    yaw: Real,
    pitch: Real,
    /// Smoothed (pitch, yaw) pair; one coupled state for both axes.
    smoothed: [Real; 2],
    smooth_rate: [Real; 2],
}

impl OrbitCamera {
    pub fn new(mut config: OrbitCameraConfig) -> Self {
        config.normalize();
        Self {
            config,
            yaw: 0.0,
            pitch: 0.0,
            smoothed: [0.0, 0.0],
            smooth_rate: [0.0, 0.0],
        }
    }

    pub fn config(&self) -> OrbitCameraConfig {
        self.config
    }

    /// Smoothed yaw in degrees; this is the movement frame the motor uses.
    pub fn yaw(&self) -> Real {
        self.smoothed[1]
    }

    pub fn pitch(&self) -> Real {
        self.smoothed[0]
    }

    /// Raw (unsmoothed) look target, mostly useful for assertions and HUDs.
    pub fn look_target(&self) -> (Real, Real) {
        (self.pitch, self.yaw)
    }

    pub fn wants_pointer_lock(&self) -> bool {
        self.config.lock_cursor
    }

    /// Snaps both the raw target and the smoothed state, for spawning.
    pub fn set_look(&mut self, yaw: Real, pitch: Real) {
        self.yaw = yaw;
        self.pitch = pitch.clamp(self.config.min_pitch, self.config.max_pitch);
        self.smoothed = [self.pitch, self.yaw];
        self.smooth_rate = [0.0, 0.0];
    }

    /// Accumulates a raw pointer delta. Moving the pointer up looks up;
    /// pitch is rejected exactly at its bounds.
    pub fn apply_look_delta(&mut self, delta: [Real; 2]) {
        self.yaw += delta[0] * self.config.mouse_sensitivity;
        self.pitch = (self.pitch - delta[1] * self.config.mouse_sensitivity)
            .clamp(self.config.min_pitch, self.config.max_pitch);
    }

    /// Advances the smoothed angles and re-derives the orbit placement at a
    /// fixed radius behind `target`. The target is read-only; the camera
    /// never owns or moves it.
    pub fn advance(&mut self, dt: Real, target: Vector<Real>) -> CameraPose {
        (self.smoothed, self.smooth_rate) = smooth_damp2(
            self.smoothed,
            [self.pitch, self.yaw],
            self.smooth_rate,
            self.config.rotation_smooth_time,
            dt.max(0.0),
        );
        let eye = target - self.forward() * self.config.distance_from_target;
        CameraPose {
            eye,
            yaw: self.smoothed[1],
            pitch: self.smoothed[0],
        }
    }

    /// View direction of the smoothed orientation (pitch, yaw, roll 0).
    pub fn forward(&self) -> Vector<Real> {
        let pitch = self.smoothed[0].to_radians();
        let yaw = self.smoothed[1].to_radians();
        Vector::new(
            pitch.cos() * yaw.sin(),
            -pitch.sin(),
            pitch.cos() * yaw.cos(),
        )
    }
}
