//! Entity registry.
//!
//! The authoritative set of live simulation objects for one execution
//! context. Entities are stored as `dyn Entity` and keep their concrete type,
//! so gameplay code that spawned a [`RigidBody`] can get one back while the
//! per-tick systems only see the shared [`EntityCommon`] surface.

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::{
    error::{EngineError, Result},
    handle::Handle,
    handle_map::{AsAny, HandleMap, Subtype},
    math::{Quat, Vec3},
};

bitflags::bitflags! {
    /// Per-entity state flags.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
    pub struct EntityFlags: u32 {
        const ACTIVE = 1 << 0;
        const VISIBLE = 1 << 1;
        const STATIC = 1 << 2;     // Skipped by physics
        const REPLICATED = 1 << 3; // Server -> client
    }
}

impl Default for EntityFlags {
    fn default() -> Self {
        Self::ACTIVE | Self::VISIBLE
    }
}

/// Type tag exposed across the interop boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u32)]
pub enum EntityKind {
    Base = 0,
    ModelMesh = 1,
    RigidBody = 2,
}

impl TryFrom<u32> for EntityKind {
    type Error = EngineError;

    fn try_from(raw: u32) -> Result<Self> {
        match raw {
            0 => Ok(Self::Base),
            1 => Ok(Self::ModelMesh),
            2 => Ok(Self::RigidBody),
            other => Err(EngineError::UnknownEntityKind(other)),
        }
    }
}

/// State every entity carries.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct EntityCommon {
    pub name: String,
    pub position: Vec3,
    pub rotation: Quat,
    pub flags: EntityFlags,
}

/// Polymorphic base of everything stored in an [`EntityRegistry`].
pub trait Entity: AsAny {
    fn common(&self) -> &EntityCommon;
    fn common_mut(&mut self) -> &mut EntityCommon;
    fn kind(&self) -> EntityKind;
}

/// Entity with no behaviour beyond the common state.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct BaseEntity {
    pub common: EntityCommon,
}

/// Entity drawn through a scene object.
#[derive(Debug, Clone, PartialEq)]
pub struct ModelMesh {
    pub common: EntityCommon,
    /// Handle into the scene registry, not this one.
    pub scene_object: Handle,
    /// Handle into the texture cache.
    pub texture: Handle,
}

impl Default for ModelMesh {
    fn default() -> Self {
        Self {
            common: EntityCommon::default(),
            scene_object: Handle::INVALID,
            texture: Handle::INVALID,
        }
    }
}

/// Entity moved by the physics step.
#[derive(Debug, Clone, PartialEq)]
pub struct RigidBody {
    pub common: EntityCommon,
    pub velocity: Vec3,
    pub mass: f32,
}

impl Default for RigidBody {
    fn default() -> Self {
        Self {
            common: EntityCommon::default(),
            velocity: Vec3::ZERO,
            mass: 1.0,
        }
    }
}

macro_rules! impl_entity {
    ($($ty:ident => $kind:ident),+ $(,)?) => {
        $(
            impl Entity for $ty {
                fn common(&self) -> &EntityCommon {
                    &self.common
                }

                fn common_mut(&mut self) -> &mut EntityCommon {
                    &mut self.common
                }

                fn kind(&self) -> EntityKind {
                    EntityKind::$kind
                }
            }
        )+
    };
}

impl_entity!(BaseEntity => Base, ModelMesh => ModelMesh, RigidBody => RigidBody);

crate::subtype!(dyn Entity => BaseEntity, ModelMesh, RigidBody);

/// Entity store for one execution context.
#[derive(Debug, Default)]
pub struct EntityRegistry {
    entities: HandleMap<dyn Entity>,
}

impl EntityRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Logs registry startup. Existing entries are kept.
    pub fn startup(&mut self) {
        info!("Entity registry started");
    }

    /// Drops every entity. Handles issued before shutdown stay dead.
    pub fn shutdown(&mut self) {
        info!(entities = self.entities.len(), "Entity registry shutting down");
        self.entities.clear();
    }

    /// Registers a concrete entity.
    pub fn spawn<S: Subtype<dyn Entity>>(&mut self, entity: S) -> Handle {
        let handle = self.entities.add_specific(entity);
        debug!(%handle, ty = std::any::type_name::<S>(), "Spawned entity");
        handle
    }

    /// Creates a default [`BaseEntity`].
    pub fn create_entity(&mut self) -> Handle {
        self.spawn(BaseEntity::default())
    }

    /// Creates a [`ModelMesh`] with no scene object or texture attached.
    pub fn create_model_mesh(&mut self) -> Handle {
        self.spawn(ModelMesh::default())
    }

    /// Creates a unit-mass [`RigidBody`] at rest.
    pub fn create_rigid_body(&mut self) -> Handle {
        self.spawn(RigidBody::default())
    }

    /// Creates a default instance of `kind`.
    pub fn create_kind(&mut self, kind: EntityKind) -> Handle {
        match kind {
            EntityKind::Base => self.create_entity(),
            EntityKind::ModelMesh => self.create_model_mesh(),
            EntityKind::RigidBody => self.create_rigid_body(),
        }
    }

    /// Removes an entity. Returns whether it was live.
    pub fn destroy(&mut self, handle: Handle) -> bool {
        let removed = self.entities.remove(handle).is_some();
        if removed {
            debug!(%handle, "Destroyed entity");
        }
        removed
    }

    /// Looks up an entity through its base interface.
    pub fn get(&self, handle: Handle) -> Option<&dyn Entity> {
        self.entities.get(handle)
    }

    /// Mutable counterpart of [`get`](Self::get).
    pub fn get_mut(&mut self, handle: Handle) -> Option<&mut (dyn Entity + 'static)> {
        self.entities.get_mut(handle)
    }

    /// Looks up an entity as its concrete type. `None` on a kind mismatch.
    pub fn get_specific<S: Subtype<dyn Entity>>(&self, handle: Handle) -> Option<&S> {
        self.entities.get_specific(handle)
    }

    /// Mutable counterpart of [`get_specific`](Self::get_specific).
    pub fn get_specific_mut<S: Subtype<dyn Entity>>(&mut self, handle: Handle) -> Option<&mut S> {
        self.entities.get_specific_mut(handle)
    }

    /// Whether `handle` names a live entity.
    pub fn contains(&self, handle: Handle) -> bool {
        self.entities.contains(handle)
    }

    /// Number of live entities.
    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    /// Snapshot of live handles, safe to walk while spawning or destroying.
    pub fn handles(&self) -> Vec<Handle> {
        self.entities.handles()
    }

    /// Visits every live entity once.
    pub fn for_each(&self, visit: impl FnMut(&(dyn Entity + 'static))) {
        self.entities.for_each(visit);
    }

    /// Visits every live entity once, mutably.
    pub fn for_each_mut(&mut self, visit: impl FnMut(&mut (dyn Entity + 'static))) {
        self.entities.for_each_mut(visit);
    }

    /// Like [`for_each`](Self::for_each) but also passes the handle.
    pub fn for_each_with_handle(&self, visit: impl FnMut(Handle, &(dyn Entity + 'static))) {
        self.entities.for_each_with_handle(visit);
    }

    /// Visits only entities stored as `S`.
    pub fn for_each_specific<S: Subtype<dyn Entity>>(&self, visit: impl FnMut(Handle, &S)) {
        self.entities.for_each_specific(visit);
    }

    /// Mutable counterpart of [`for_each_specific`](Self::for_each_specific).
    pub fn for_each_specific_mut<S: Subtype<dyn Entity>>(&mut self, visit: impl FnMut(Handle, &mut S)) {
        self.entities.for_each_specific_mut(visit);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn create_returns_usable_handle() {
        let mut reg = EntityRegistry::new();
        let h = reg.create_rigid_body();
        assert!(h.is_valid());
        assert_eq!(reg.get(h).map(|e| e.kind()), Some(EntityKind::RigidBody));
        assert_eq!(reg.get_specific::<RigidBody>(h).map(|b| b.mass), Some(1.0));
    }

    #[test]
    fn common_state_is_mutable_through_base() {
        let mut reg = EntityRegistry::new();
        let h = reg.create_model_mesh();
        {
            let e = reg.get_mut(h).unwrap();
            e.common_mut().name = "crate".into();
            e.common_mut().position = Vec3::new(1.0, 2.0, 3.0);
        }
        let mesh = reg.get_specific::<ModelMesh>(h).unwrap();
        assert_eq!(mesh.common.name, "crate");
        assert_eq!(mesh.common.position.z, 3.0);
    }

    #[test]
    fn filtered_visit_skips_other_kinds() {
        let mut reg = EntityRegistry::new();
        reg.create_entity();
        let body = reg.create_rigid_body();
        reg.create_model_mesh();

        let mut hits = Vec::new();
        reg.for_each_specific::<RigidBody>(|h, _| hits.push(h));
        assert_eq!(hits, vec![body]);
    }

    #[test]
    fn kind_round_trips_through_raw_tag() {
        assert_eq!(EntityKind::try_from(1).unwrap(), EntityKind::ModelMesh);
        assert!(matches!(
            EntityKind::try_from(99),
            Err(EngineError::UnknownEntityKind(99))
        ));
    }

    #[test]
    fn destroy_and_shutdown() {
        let mut reg = EntityRegistry::new();
        let a = reg.create_entity();
        let b = reg.create_entity();
        assert!(reg.destroy(a));
        assert!(!reg.destroy(a));
        assert!(reg.get(a).is_none());

        reg.shutdown();
        assert!(reg.is_empty());
        assert!(reg.get(b).is_none());
    }
}
