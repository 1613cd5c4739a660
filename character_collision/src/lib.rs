//! Kinematic capsule mover: resolves requested displacements into actual
//! ones and reports authoritative grounding.
//!
//! Policy: stepping and sliding use the Rapier KCC; do not reimplement them.
#![forbid(unsafe_code)]

use collision_scene::CollisionScene;
use rapier3d::control::{CharacterAutostep, CharacterLength, KinematicCharacterController};
use rapier3d::math::{Isometry, Point, Translation, UnitVector, Vector};
use rapier3d::prelude::{Capsule, QueryFilter, Ray, Real};

#[derive(Clone, Copy, Debug)]
pub struct BodyProfile {
    /// Capsule radius in meters.
    pub capsule_radius: Real,
    /// Capsule cylinder height in meters (distance between sphere centers).
    pub capsule_height: Real,
    /// Maximum auto-step height in meters (0 disables stepping).
    pub step_height: Real,
    /// Minimum free width required after a step.
    pub step_min_width: Real,
    /// Maximum walkable slope angle in radians.
    pub max_slope_angle: Real,
    /// Distance to snap down to ground in meters.
    pub ground_snap_distance: Real,
    /// Separation kept between the capsule and the environment.
    pub offset: Real,
}

impl BodyProfile {
    pub fn humanoid_default() -> Self {
        Self {
            capsule_radius: 0.4,
            capsule_height: 1.4,
            step_height: 0.35,
            step_min_width: 0.2,
            max_slope_angle: 45.0_f32.to_radians(),
            ground_snap_distance: 0.2,
            offset: 0.02,
        }
    }

    fn capsule(&self) -> Capsule {
        Capsule::new_y(self.capsule_height * 0.5, self.capsule_radius)
    }

    fn apply_to(&self, controller: &mut KinematicCharacterController) {
        controller.autostep = if self.step_height > 0.0 {
            Some(CharacterAutostep {
                max_height: CharacterLength::Absolute(self.step_height),
                min_width: CharacterLength::Absolute(self.step_min_width),
                include_dynamic_bodies: false,
            })
        } else {
            None
        };
        controller.max_slope_climb_angle = self.max_slope_angle;
        controller.snap_to_ground = if self.ground_snap_distance > 0.0 {
            Some(CharacterLength::Absolute(self.ground_snap_distance))
        } else {
            None
        };
        controller.offset = CharacterLength::Absolute(self.offset);
    }
}

/// What the motor consumes after resolution: the actual translation this
/// tick and whether the body rests on walkable ground. The motor treats
/// both as authoritative.
#[derive(Clone, Copy, Debug)]
pub struct MoveResolution {
    pub position: Isometry<Real>,
    pub translation: Vector<Real>,
    pub grounded: bool,
    pub hit_wall: bool,
}

pub struct CharacterBody {
    profile: BodyProfile,
    controller: KinematicCharacterController,
    capsule: Capsule,
}

impl CharacterBody {
    pub fn new(profile: BodyProfile) -> Self {
        let capsule = profile.capsule();
        let mut controller = KinematicCharacterController::default();
        profile.apply_to(&mut controller);
        Self {
            profile,
            controller,
            capsule,
        }
    }

    pub fn profile(&self) -> BodyProfile {
        self.profile
    }

    pub fn set_profile(&mut self, profile: BodyProfile) {
        self.profile = profile;
        self.capsule = profile.capsule();
        profile.apply_to(&mut self.controller);
    }

    pub fn capsule(&self) -> &Capsule {
        &self.capsule
    }

    /// Resolves one tick's requested displacement against the scene.
    ///
    /// `allow_step` should be false while the body is deliberately moving
    /// up (jump takeoff), so stepping and ground snap do not eat the
    /// ascent.
    pub fn resolve_move(
        &mut self,
        scene: &CollisionScene,
        position: Isometry<Real>,
        desired_translation: Vector<Real>,
        allow_step: bool,
        dt: Real,
    ) -> MoveResolution {
        let up_vec = scene.up();
        let up = UnitVector::new_normalize(up_vec);
        self.controller.up = up;
        let wall_dot = self.controller.max_slope_climb_angle.cos();
        let moving_up = desired_translation.y > 0.0 && !allow_step;

        let original_autostep = self.controller.autostep;
        let original_snap = self.controller.snap_to_ground;
        if !allow_step {
            self.controller.autostep = None;
        }
        if moving_up {
            self.controller.snap_to_ground = None;
        }

        let mut hit_wall = false;
        let output = self.controller.move_shape(
            dt,
            scene.bodies(),
            scene.colliders(),
            scene.query_pipeline(),
            &self.capsule,
            &position,
            desired_translation,
            QueryFilter::default(),
            |collision| {
                let up_dot = collision.hit.normal1.dot(&up);
                if up_dot.abs() <= wall_dot {
                    hit_wall = true;
                }
            },
        );
        self.controller.autostep = original_autostep;
        self.controller.snap_to_ground = original_snap;

        let next_position = Translation::from(output.translation) * position;
        let mut grounded = output.grounded;
        if !moving_up && !grounded {
            grounded = self.probe_ground(scene, next_position);
        }
        if moving_up {
            grounded = false;
        }
        MoveResolution {
            position: next_position,
            translation: output.translation,
            grounded,
            hit_wall,
        }
    }

    /// Downward ray from the capsule foot, within snap distance and the
    /// walkable slope limit.
    fn probe_ground(&self, scene: &CollisionScene, position: Isometry<Real>) -> bool {
        let snap_distance = self.profile.ground_snap_distance.max(0.0);
        if snap_distance <= 0.0 {
            return false;
        }
        let up = scene.up();
        // Smaller foot probe to avoid counting wall grazes as support.
        let foot_radius = self.profile.capsule_radius * 0.75;
        let foot_offset =
            -(self.profile.capsule_height * 0.5 + self.profile.capsule_radius) + foot_radius;
        let foot_center = position.translation.vector + up * foot_offset;
        let ray = Ray::new(Point::from(foot_center), -up);
        let max_toi = foot_radius + snap_distance + self.profile.offset + 1.0e-3;
        let Some((_, hit)) = scene.query_pipeline().cast_ray_and_get_normal(
            scene.bodies(),
            scene.colliders(),
            &ray,
            max_toi,
            true,
            QueryFilter::default(),
        ) else {
            return false;
        };
        let up_dot = hit.normal.dot(&up);
        up_dot > 0.0 && up_dot >= self.controller.max_slope_climb_angle.cos()
    }
}
