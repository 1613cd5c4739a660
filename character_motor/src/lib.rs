//! Walk/run movement motor (smoothed heading and speed, gravity + jump).
#![forbid(unsafe_code)]

use motion_math::{smooth_damp, smooth_damp_angle, FROZEN_SMOOTH_TIME};
use rapier3d::math::Vector;
use rapier3d::prelude::Real;
use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MotorConfig {
    pub walk_speed: Real,
    pub run_speed: Real,
    pub speed_smooth_time: Real,
    /// Roughly the number of seconds to settle on a new heading.
    pub turn_smooth_time: Real,
    /// Vertical acceleration in m/s^2; negative.
    pub gravity: Real,
    pub jump_height: Real,
    /// Fraction of turn/speed responsiveness kept while airborne, 0..1.
    /// Zero freezes heading and speed for the whole airborne phase.
    pub air_control_percent: Real,
    /// Keep accumulating gravity while grounded, so the collision body is
    /// under constant downward pressure (slope sticking). When false,
    /// vertical velocity holds at zero on the ground instead.
    pub ground_gravity_bias: bool,
}

impl Default for MotorConfig {
    fn default() -> Self {
        Self {
            walk_speed: 2.0,
            run_speed: 3.0,
            speed_smooth_time: 0.1,
            turn_smooth_time: 0.2,
            gravity: -12.0,
            jump_height: 1.0,
            air_control_percent: 0.0,
            ground_gravity_bias: true,
        }
    }
}

impl MotorConfig {
    pub fn normalize(&mut self) {
        self.walk_speed = self.walk_speed.max(0.0);
        self.run_speed = self.run_speed.max(self.walk_speed);
        self.speed_smooth_time = self.speed_smooth_time.max(0.0);
        self.turn_smooth_time = self.turn_smooth_time.max(0.0);
        self.gravity = self.gravity.min(0.0);
        self.jump_height = self.jump_height.max(0.0);
        self.air_control_percent = self.air_control_percent.clamp(0.0, 1.0);
    }
}

#[derive(Clone, Copy, Debug, Default)]
pub struct MotorInput {
    /// Screen-relative movement axis (x = strafe, y = forward), length <= 1.
    pub move_axis: [Real; 2],
    pub run: bool,
    /// Jump edge; held-state repetition is the input layer's concern.
    pub jump: bool,
}

#[derive(Clone, Copy, Debug)]
pub struct MotorTick {
    pub dt: Real,
    /// Camera yaw in degrees; rotates the movement axis into world space.
    pub camera_yaw: Real,
    /// Grounded flag reported by the collision body for the previous move.
    pub grounded: bool,
}

#[derive(Clone, Copy, Debug)]
pub struct MotorOutput {
    /// World-space displacement to hand to the collision body.
    pub desired_translation: Vector<Real>,
    /// Character facing after this tick's heading smoothing, degrees.
    pub yaw: Real,
    pub jumped: bool,
}

/// Walk/run blend target plus the smoothing parameters the animation sink
/// applies on its own side.
#[derive(Clone, Copy, Debug, Default)]
pub struct AnimationBlend {
    pub target: Real,
    pub smooth_time: Real,
    pub dt: Real,
}

pub struct CharacterMotor {
    config: MotorConfig,
    yaw: Real,
    current_speed: Real,
    vertical_velocity: Real,
    turn_rate: Real,
    speed_rate: Real,
    running: bool,
}

impl CharacterMotor {
    pub fn new(mut config: MotorConfig) -> Self {
        config.normalize();
        Self {
            config,
            yaw: 0.0,
            current_speed: 0.0,
            vertical_velocity: 0.0,
            turn_rate: 0.0,
            speed_rate: 0.0,
            running: false,
        }
    }

    pub fn config(&self) -> MotorConfig {
        self.config
    }

    pub fn yaw(&self) -> Real {
        self.yaw
    }

    /// Spawn facing, degrees.
    pub fn set_yaw(&mut self, yaw: Real) {
        self.yaw = yaw;
        self.turn_rate = 0.0;
    }

    pub fn current_speed(&self) -> Real {
        self.current_speed
    }

    pub fn vertical_velocity(&self) -> Real {
        self.vertical_velocity
    }

    pub fn reset(&mut self) {
        self.current_speed = 0.0;
        self.vertical_velocity = 0.0;
        self.turn_rate = 0.0;
        self.speed_rate = 0.0;
        self.running = false;
    }

    pub fn step(&mut self, input: MotorInput, tick: MotorTick) -> MotorOutput {
        let dt = tick.dt.max(0.0);
        let axis = clamp_axis(input.move_axis);
        let mag = (axis[0] * axis[0] + axis[1] * axis[1]).sqrt();
        self.running = input.run;

        // Zero input holds the last facing; direction is undefined at rest.
        if mag > 0.0 {
            let target_heading = axis[0].atan2(axis[1]).to_degrees() + tick.camera_yaw;
            (self.yaw, self.turn_rate) = smooth_damp_angle(
                self.yaw,
                target_heading,
                self.turn_rate,
                self.effective_smooth_time(self.config.turn_smooth_time, tick.grounded),
                dt,
            );
        }

        let top_speed = if input.run {
            self.config.run_speed
        } else {
            self.config.walk_speed
        };
        (self.current_speed, self.speed_rate) = smooth_damp(
            self.current_speed,
            top_speed * mag,
            self.speed_rate,
            self.effective_smooth_time(self.config.speed_smooth_time, tick.grounded),
            dt,
        );

        if tick.grounded && !self.config.ground_gravity_bias {
            self.vertical_velocity = 0.0;
        } else {
            self.vertical_velocity += self.config.gravity * dt;
        }
        let mut jumped = false;
        if input.jump && tick.grounded {
            // Kinematic takeoff speed for the configured apex: v^2 = -2gh.
            self.vertical_velocity = (-2.0 * self.config.gravity * self.config.jump_height).sqrt();
            jumped = true;
        }

        let velocity =
            heading_forward(self.yaw) * self.current_speed + Vector::y() * self.vertical_velocity;
        MotorOutput {
            desired_translation: velocity * dt,
            yaw: self.yaw,
            jumped,
        }
    }

    /// Folds the collision body's resolved move back into the motor.
    ///
    /// Speed is re-derived from the actual horizontal velocity so a wall
    /// hit drops it the same frame instead of waiting out the smoothing.
    pub fn absorb(&mut self, actual_velocity: Vector<Real>, grounded: bool) {
        self.current_speed =
            (actual_velocity.x * actual_velocity.x + actual_velocity.z * actual_velocity.z).sqrt();
        if grounded {
            self.vertical_velocity = 0.0;
        }
    }

    /// Walk range is 0..0.5, run range 0..1; the sink smooths the target
    /// itself using the attached time constant.
    pub fn animation_blend(&self, dt: Real) -> AnimationBlend {
        let top_speed = if self.running {
            self.config.run_speed
        } else {
            self.config.walk_speed
        };
        let scale = if self.running { 1.0 } else { 0.5 };
        let target = if top_speed > 0.0 {
            self.current_speed / top_speed * scale
        } else {
            0.0
        };
        AnimationBlend {
            target,
            smooth_time: self.config.speed_smooth_time,
            dt,
        }
    }

    /// Airborne responsiveness degrades in inverse proportion to the air
    /// control percent; zero air control commits to the pre-jump trajectory.
    pub fn effective_smooth_time(&self, base: Real, grounded: bool) -> Real {
        if grounded {
            base
        } else if self.config.air_control_percent <= 0.0 {
            FROZEN_SMOOTH_TIME
        } else {
            base / self.config.air_control_percent
        }
    }
}

/// Facing direction for a yaw given in degrees.
pub fn heading_forward(yaw: Real) -> Vector<Real> {
    let yaw = yaw.to_radians();
    Vector::new(yaw.sin(), 0.0, yaw.cos())
}

fn clamp_axis(axis: [Real; 2]) -> [Real; 2] {
    let len = (axis[0] * axis[0] + axis[1] * axis[1]).sqrt();
    if len > 1.0 {
        [axis[0] / len, axis[1] / len]
    } else {
        axis
    }
}
