//! Player composition (input + motor + collision + camera), one tick at a
//! time in the fixed order the camera needs to avoid a one-frame lag.
#![forbid(unsafe_code)]

pub mod settings;

use character_collision::{BodyProfile, CharacterBody, MoveResolution};
use character_motor::{
    heading_forward, AnimationBlend, CharacterMotor, MotorInput, MotorOutput, MotorTick,
};
use collision_scene::CollisionScene;
use orbit_camera::{CameraPose, OrbitCamera};
use rapier3d::math::{Isometry, Vector};
use rapier3d::prelude::Real;

/// Upper bound on one simulation tick. A pause or debugger stall comes
/// back as a single clamped step instead of a destabilizing dt spike.
pub const MAX_TICK_DT: Real = 0.25;

#[derive(Clone, Copy, Debug, Default)]
pub struct RawInput {
    pub move_x: Real,
    pub move_z: Real,
    pub run: bool,
    /// Jump just-pressed edge from the input source.
    pub jump: bool,
    /// Raw pointer delta (x, y) for this tick.
    pub look_delta: [Real; 2],
}

#[derive(Clone, Copy, Debug, Default)]
pub struct InputIntent {
    pub move_axis: [Real; 2],
    pub run: bool,
    pub jump: bool,
    pub look_delta: [Real; 2],
}

pub trait InputAdapter {
    fn intent(&mut self, raw: RawInput) -> InputIntent;
}

#[derive(Default)]
pub struct DirectInputAdapter;

impl DirectInputAdapter {
    fn clamp_axis(axis: [Real; 2]) -> [Real; 2] {
        let len = (axis[0] * axis[0] + axis[1] * axis[1]).sqrt();
        if len > 1.0 {
            [axis[0] / len, axis[1] / len]
        } else {
            axis
        }
    }
}

impl InputAdapter for DirectInputAdapter {
    fn intent(&mut self, raw: RawInput) -> InputIntent {
        InputIntent {
            move_axis: Self::clamp_axis([raw.move_x, raw.move_z]),
            run: raw.run,
            jump: raw.jump,
            look_delta: raw.look_delta,
        }
    }
}

pub trait Motor {
    fn step(&mut self, intent: &InputIntent, tick: MotorTick) -> MotorOutput;

    /// Folds the resolved move back in; motors without speed memory ignore
    /// it.
    fn absorb(&mut self, _actual_velocity: Vector<Real>, _grounded: bool) {}

    fn animation_blend(&self, _dt: Real) -> AnimationBlend {
        AnimationBlend::default()
    }
}

impl Motor for CharacterMotor {
    fn step(&mut self, intent: &InputIntent, tick: MotorTick) -> MotorOutput {
        CharacterMotor::step(
            self,
            MotorInput {
                move_axis: intent.move_axis,
                run: intent.run,
                jump: intent.jump,
            },
            tick,
        )
    }

    fn absorb(&mut self, actual_velocity: Vector<Real>, grounded: bool) {
        CharacterMotor::absorb(self, actual_velocity, grounded);
    }

    fn animation_blend(&self, dt: Real) -> AnimationBlend {
        CharacterMotor::animation_blend(self, dt)
    }
}

/// The simple half of the motor pair: fixed speed, instant heading, no
/// vertical motion of its own. Useful for ghosts and debug flythroughs.
#[derive(Clone, Copy, Debug)]
pub struct BasicMotor {
    pub move_speed: Real,
    yaw: Real,
}

impl BasicMotor {
    pub fn new(move_speed: Real) -> Self {
        Self {
            move_speed,
            yaw: 0.0,
        }
    }
}

impl Default for BasicMotor {
    fn default() -> Self {
        Self::new(2.0)
    }
}

impl Motor for BasicMotor {
    fn step(&mut self, intent: &InputIntent, tick: MotorTick) -> MotorOutput {
        let axis = intent.move_axis;
        let mag = (axis[0] * axis[0] + axis[1] * axis[1]).sqrt();
        if mag > 0.0 {
            self.yaw = axis[0].atan2(axis[1]).to_degrees() + tick.camera_yaw;
        }
        let velocity = heading_forward(self.yaw) * (self.move_speed * mag.min(1.0));
        MotorOutput {
            desired_translation: velocity * tick.dt,
            yaw: self.yaw,
            jumped: false,
        }
    }
}

#[derive(Clone, Copy, Debug)]
pub struct PlayerKinematics {
    pub position: Isometry<Real>,
    /// Actual velocity from the last resolved move.
    pub velocity: Vector<Real>,
    pub grounded: bool,
    /// Character facing, degrees.
    pub yaw: Real,
}

impl PlayerKinematics {
    pub fn new(position: Isometry<Real>) -> Self {
        Self {
            position,
            velocity: Vector::zeros(),
            grounded: false,
            yaw: 0.0,
        }
    }
}

#[derive(Clone, Copy, Debug)]
pub struct PlayerFrame {
    pub kinematics: PlayerKinematics,
    pub resolution: MoveResolution,
    pub camera: CameraPose,
    pub animation: AnimationBlend,
}

pub struct PlayerController<A: InputAdapter, M: Motor> {
    input: A,
    motor: M,
    body: CharacterBody,
    camera: OrbitCamera,
    state: PlayerKinematics,
}

impl<A: InputAdapter, M: Motor> PlayerController<A, M> {
    pub fn new(
        input: A,
        motor: M,
        profile: BodyProfile,
        camera: OrbitCamera,
        position: Isometry<Real>,
    ) -> Self {
        Self {
            input,
            motor,
            body: CharacterBody::new(profile),
            camera,
            state: PlayerKinematics::new(position),
        }
    }

    pub fn state(&self) -> &PlayerKinematics {
        &self.state
    }

    pub fn state_mut(&mut self) -> &mut PlayerKinematics {
        &mut self.state
    }

    pub fn motor(&self) -> &M {
        &self.motor
    }

    pub fn motor_mut(&mut self) -> &mut M {
        &mut self.motor
    }

    pub fn camera(&self) -> &OrbitCamera {
        &self.camera
    }

    pub fn camera_mut(&mut self) -> &mut OrbitCamera {
        &mut self.camera
    }

    pub fn body(&self) -> &CharacterBody {
        &self.body
    }

    pub fn body_mut(&mut self) -> &mut CharacterBody {
        &mut self.body
    }

    /// Pointer-capture hint for the windowing layer.
    pub fn wants_pointer_lock(&self) -> bool {
        self.camera.wants_pointer_lock()
    }

    /// One simulation tick: motor, then synchronous collision resolution,
    /// then the camera reading the post-resolution position.
    pub fn tick(&mut self, scene: &CollisionScene, raw: RawInput, dt: Real) -> PlayerFrame {
        let dt = dt.clamp(0.0, MAX_TICK_DT);
        let intent = self.input.intent(raw);
        // Movement frame: the camera yaw the player currently sees,
        // sampled before the camera advances this tick.
        let camera_yaw = self.camera.yaw();
        let grounded = self.state.grounded;
        let output = self.motor.step(
            &intent,
            MotorTick {
                dt,
                camera_yaw,
                grounded,
            },
        );
        let allow_step = grounded && !output.jumped;
        // A zero-dt tick has nothing to resolve; absorbing a made-up zero
        // velocity would wipe the smoothed speed state for free.
        let resolution = if dt > 0.0 {
            let resolution = self.body.resolve_move(
                scene,
                self.state.position,
                output.desired_translation,
                allow_step,
                dt,
            );
            self.state.position = resolution.position;
            let actual_velocity = resolution.translation / dt;
            self.motor.absorb(actual_velocity, resolution.grounded);
            self.state.velocity = actual_velocity;
            self.state.grounded = resolution.grounded;
            resolution
        } else {
            MoveResolution {
                position: self.state.position,
                translation: Vector::zeros(),
                grounded: self.state.grounded,
                hit_wall: false,
            }
        };
        self.state.yaw = output.yaw;

        self.camera.apply_look_delta(intent.look_delta);
        let camera = self
            .camera
            .advance(dt, self.state.position.translation.vector);
        PlayerFrame {
            kinematics: self.state,
            resolution,
            camera,
            animation: self.motor.animation_blend(dt),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use character_motor::MotorConfig;
    use orbit_camera::OrbitCameraConfig;
    use rapier3d::prelude::*;

    const DT: Real = 1.0 / 60.0;

    fn floor_scene() -> CollisionScene {
        let mut scene = CollisionScene::new(vector![0.0, -12.0, 0.0]);
        let floor = ColliderBuilder::cuboid(20.0, 0.1, 20.0)
            .translation(vector![0.0, -0.1, 0.0])
            .build();
        scene.insert_collider(floor);
        scene.refresh();
        scene
    }

    fn default_controller() -> PlayerController<DirectInputAdapter, CharacterMotor> {
        PlayerController::new(
            DirectInputAdapter,
            CharacterMotor::new(MotorConfig::default()),
            BodyProfile::humanoid_default(),
            OrbitCamera::new(OrbitCameraConfig::default()),
            Isometry::translation(0.0, 1.2, 0.0),
        )
    }

    fn settle(
        controller: &mut PlayerController<DirectInputAdapter, CharacterMotor>,
        scene: &CollisionScene,
        ticks: usize,
    ) {
        for _ in 0..ticks {
            controller.tick(scene, RawInput::default(), DT);
        }
    }

    #[test]
    fn walks_forward_at_walk_speed() {
        let scene = floor_scene();
        let mut controller = default_controller();
        settle(&mut controller, &scene, 5);
        let start_z = controller.state().position.translation.z;

        let mut frame = None;
        for _ in 0..180 {
            frame = Some(controller.tick(
                &scene,
                RawInput {
                    move_z: 1.0,
                    ..Default::default()
                },
                DT,
            ));
        }
        let frame = frame.unwrap();
        assert!(frame.kinematics.grounded);
        assert!(controller.state().position.translation.z > start_z + 4.0);
        let horizontal =
            (frame.kinematics.velocity.x.powi(2) + frame.kinematics.velocity.z.powi(2)).sqrt();
        assert!((horizontal - 2.0).abs() < 0.1);
        // Walk blend settles at the top of the walk range.
        assert!((frame.animation.target - 0.5).abs() < 0.05);
    }

    #[test]
    fn run_modifier_raises_speed() {
        let scene = floor_scene();
        let mut controller = default_controller();
        settle(&mut controller, &scene, 5);
        let mut frame = None;
        for _ in 0..180 {
            frame = Some(controller.tick(
                &scene,
                RawInput {
                    move_z: 1.0,
                    run: true,
                    ..Default::default()
                },
                DT,
            ));
        }
        let frame = frame.unwrap();
        let horizontal =
            (frame.kinematics.velocity.x.powi(2) + frame.kinematics.velocity.z.powi(2)).sqrt();
        assert!((horizontal - 3.0).abs() < 0.1);
        assert!((frame.animation.target - 1.0).abs() < 0.05);
    }

    #[test]
    fn jump_leaves_and_regains_ground() {
        let scene = floor_scene();
        let mut controller = default_controller();
        settle(&mut controller, &scene, 5);
        assert!(controller.state().grounded);
        let rest_y = controller.state().position.translation.y;

        controller.tick(
            &scene,
            RawInput {
                jump: true,
                ..Default::default()
            },
            DT,
        );
        let mut peak = rest_y;
        let mut airborne_ticks = 0;
        for _ in 0..240 {
            let frame = controller.tick(&scene, RawInput::default(), DT);
            peak = peak.max(frame.kinematics.position.translation.y);
            if !frame.kinematics.grounded {
                airborne_ticks += 1;
            } else if airborne_ticks > 0 {
                break;
            }
        }
        assert!(airborne_ticks > 20, "airborne for {airborne_ticks} ticks");
        // Configured jump height is 1m; discrete integration lands close.
        assert!(peak - rest_y > 0.8, "peak {peak} rest {rest_y}");
        assert!(controller.state().grounded);
        assert!((controller.state().position.translation.y - rest_y).abs() < 0.05);
    }

    #[test]
    fn wall_hit_kills_speed_same_frame() {
        let mut scene = floor_scene();
        let wall = ColliderBuilder::cuboid(0.1, 2.0, 8.0)
            .translation(vector![2.0, 2.0, 0.0])
            .build();
        scene.insert_collider(wall);
        scene.refresh();

        let mut controller = default_controller();
        settle(&mut controller, &scene, 5);
        let mut frame = None;
        for _ in 0..240 {
            frame = Some(controller.tick(
                &scene,
                RawInput {
                    move_x: 1.0,
                    ..Default::default()
                },
                DT,
            ));
        }
        let frame = frame.unwrap();
        assert!(frame.resolution.hit_wall);
        let horizontal =
            (frame.kinematics.velocity.x.powi(2) + frame.kinematics.velocity.z.powi(2)).sqrt();
        assert!(horizontal < 0.1);
        // Blocked motion shows up in the blend immediately, not smoothed.
        assert!(frame.animation.target < 0.1);
    }

    #[test]
    fn camera_orbits_behind_resolved_position() {
        let scene = floor_scene();
        let mut controller = default_controller();
        let mut frame = None;
        for _ in 0..120 {
            frame = Some(controller.tick(
                &scene,
                RawInput {
                    move_z: 1.0,
                    ..Default::default()
                },
                DT,
            ));
        }
        let frame = frame.unwrap();
        let offset = frame.camera.eye - frame.kinematics.position.translation.vector;
        assert!((offset.norm() - 2.0).abs() < 1.0e-4);
        // Level yaw-zero camera trails on -z while the character walks +z.
        assert!(offset.z < 0.0);
    }

    #[test]
    fn look_input_steers_movement_frame() {
        let scene = floor_scene();
        let mut controller = default_controller();
        settle(&mut controller, &scene, 5);
        // Swing the camera a quarter turn, let its smoothing settle.
        for _ in 0..120 {
            controller.tick(
                &scene,
                RawInput {
                    look_delta: [0.15, 0.0],
                    ..Default::default()
                },
                DT,
            );
        }
        settle(&mut controller, &scene, 60);
        let yaw = controller.camera().yaw();
        assert!((yaw - 90.0).abs() < 2.0, "camera yaw {yaw}");
        // "Forward" input now walks along +x.
        for _ in 0..180 {
            controller.tick(
                &scene,
                RawInput {
                    move_z: 1.0,
                    ..Default::default()
                },
                DT,
            );
        }
        let position = controller.state().position.translation;
        assert!(position.x > 2.0, "x {}", position.x);
        assert!(position.z.abs() < 1.0, "z {}", position.z);
    }

    #[test]
    fn zero_dt_tick_preserves_speed_state() {
        let scene = floor_scene();
        let mut controller = default_controller();
        settle(&mut controller, &scene, 5);
        for _ in 0..180 {
            controller.tick(
                &scene,
                RawInput {
                    move_z: 1.0,
                    ..Default::default()
                },
                DT,
            );
        }
        let speed = controller.motor().current_speed();
        assert!(speed > 1.9);
        let position = controller.state().position;

        // No time elapsed: no motion was blocked, nothing may change.
        let frame = controller.tick(
            &scene,
            RawInput {
                move_z: 1.0,
                ..Default::default()
            },
            0.0,
        );
        assert_eq!(controller.motor().current_speed(), speed);
        assert_eq!(
            controller.state().position.translation.vector,
            position.translation.vector
        );
        assert!(frame.kinematics.grounded);
        assert_eq!(frame.resolution.translation, Vector::zeros());
    }

    #[test]
    fn oversized_dt_is_clamped() {
        let scene = floor_scene();
        let mut controller = default_controller();
        settle(&mut controller, &scene, 5);
        let before = controller.state().position.translation.vector;
        controller.tick(
            &scene,
            RawInput {
                move_z: 1.0,
                ..Default::default()
            },
            10.0,
        );
        let moved = (controller.state().position.translation.vector - before).norm();
        // One clamped step, not ten seconds of travel.
        assert!(moved < 2.0 * MAX_TICK_DT + 0.1, "moved {moved}");
    }

    #[test]
    fn basic_motor_moves_instantly() {
        let scene = floor_scene();
        let mut controller = PlayerController::new(
            DirectInputAdapter,
            BasicMotor::new(4.0),
            BodyProfile::humanoid_default(),
            OrbitCamera::new(OrbitCameraConfig::default()),
            Isometry::translation(0.0, 1.12, 0.0),
        );
        let frame = controller.tick(
            &scene,
            RawInput {
                move_z: 1.0,
                ..Default::default()
            },
            DT,
        );
        let horizontal =
            (frame.kinematics.velocity.x.powi(2) + frame.kinematics.velocity.z.powi(2)).sqrt();
        assert!((horizontal - 4.0).abs() < 0.2);
        assert_eq!(frame.kinematics.yaw, 0.0);
    }
}
