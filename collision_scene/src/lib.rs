//! Static collision geometry the character body resolves against.
#![forbid(unsafe_code)]

use rapier3d::prelude::*;

/// Collider container for a kinematic character: no dynamics stepping,
/// just shapes and the query pipeline the character mover casts against.
pub struct CollisionScene {
    gravity: Vector<Real>,
    bodies: RigidBodySet,
    colliders: ColliderSet,
    query_pipeline: QueryPipeline,
}

impl CollisionScene {
    pub fn new(gravity: Vector<Real>) -> Self {
        Self {
            gravity,
            bodies: RigidBodySet::new(),
            colliders: ColliderSet::new(),
            query_pipeline: QueryPipeline::new(),
        }
    }

    pub fn gravity(&self) -> Vector<Real> {
        self.gravity
    }

    /// World up axis, opposing gravity.
    pub fn up(&self) -> Vector<Real> {
        if self.gravity.norm_squared() > 1.0e-6 {
            -self.gravity.normalize()
        } else {
            Vector::y()
        }
    }

    pub fn bodies(&self) -> &RigidBodySet {
        &self.bodies
    }

    pub fn colliders(&self) -> &ColliderSet {
        &self.colliders
    }

    pub fn query_pipeline(&self) -> &QueryPipeline {
        &self.query_pipeline
    }

    pub fn insert_collider(&mut self, collider: Collider) -> ColliderHandle {
        self.colliders.insert(collider)
    }

    /// Rebuilds the query acceleration structure after collider edits.
    /// Call once after scene setup, before the first character move.
    pub fn refresh(&mut self) {
        self.query_pipeline.update(&self.colliders);
    }
}
