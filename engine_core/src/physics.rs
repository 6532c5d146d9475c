//! Physics abstraction.
//!
//! The step walks the entity registry directly. `SimplePhysics` integrates
//! gravity over non-static [`RigidBody`] entities and nothing else.

use crate::{
    entity::{EntityFlags, EntityRegistry, RigidBody},
    math::Vec3,
};

/// Physics parameters.
#[derive(Debug, Clone, Copy)]
pub struct PhysicsConfig {
    pub gravity: Vec3,
}

impl Default for PhysicsConfig {
    fn default() -> Self {
        Self {
            gravity: Vec3::new(0.0, 0.0, -9.81),
        }
    }
}

/// Physics stepper trait.
pub trait PhysicsBackend: Send + Sync {
    fn step(&mut self, entities: &mut EntityRegistry, dt_sec: f32);
}

/// No-op physics.
#[derive(Default)]
pub struct NullPhysics;

impl PhysicsBackend for NullPhysics {
    fn step(&mut self, _entities: &mut EntityRegistry, _dt_sec: f32) {}
}

/// Explicit Euler integration.
#[derive(Debug, Default)]
pub struct SimplePhysics {
    pub cfg: PhysicsConfig,
}

impl SimplePhysics {
    pub fn new(cfg: PhysicsConfig) -> Self {
        Self { cfg }
    }
}

impl PhysicsBackend for SimplePhysics {
    fn step(&mut self, entities: &mut EntityRegistry, dt_sec: f32) {
        let gravity = self.cfg.gravity;
        entities.for_each_specific_mut::<RigidBody>(|_, body| {
            let flags = body.common.flags;
            if flags.contains(EntityFlags::STATIC) || !flags.contains(EntityFlags::ACTIVE) {
                return;
            }
            body.velocity += gravity * dt_sec;
            body.common.position += body.velocity * dt_sec;
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn gravity_moves_dynamic_bodies_only() {
        let mut reg = EntityRegistry::new();
        let falling = reg.create_rigid_body();
        let pinned = reg.create_rigid_body();
        reg.get_mut(pinned).unwrap().common_mut().flags |= EntityFlags::STATIC;
        let plain = reg.create_entity();

        let mut physics = SimplePhysics::default();
        physics.step(&mut reg, 1.0);

        assert_eq!(reg.get_specific::<RigidBody>(falling).unwrap().common.position.z, -9.81);
        assert_eq!(reg.get(pinned).unwrap().common().position, Vec3::ZERO);
        assert_eq!(reg.get(plain).unwrap().common().position, Vec3::ZERO);
    }
}
