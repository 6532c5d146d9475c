//! Scene-mesh registry.
//!
//! Holds the renderable objects the render loop walks every frame. Interop
//! creates and moves them by handle; the renderer only sees [`DrawCall`]s.

use bytes::Bytes;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::{
    error::Result,
    handle::Handle,
    handle_map::{AsAny, HandleMap, Subtype},
    interop::ArrayTransfer,
    math::{Mat4, Quat, Vec3},
};

/// Placement of a scene object.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Transform {
    pub position: Vec3,
    pub rotation: Quat,
    pub scale: Vec3,
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            position: Vec3::ZERO,
            rotation: Quat::IDENTITY,
            scale: Vec3::ONE,
        }
    }
}

impl Transform {
    /// Model matrix from scale and translation.
    pub fn matrix(&self) -> Mat4 {
        Mat4::from_scale_translation(self.scale, self.position)
    }
}

/// One submission to a render backend.
#[derive(Debug, Clone, PartialEq)]
pub struct DrawCall {
    pub object: Handle,
    pub model: Mat4,
    pub rotation: Quat,
    pub vertex_count: u32,
    /// Texture cache handle, `INVALID` for untextured draws.
    pub texture: Handle,
    pub color: [f32; 4],
}

/// Polymorphic base of everything stored in a [`SceneRegistry`].
pub trait SceneObject: AsAny {
    fn transform(&self) -> &Transform;
    fn transform_mut(&mut self) -> &mut Transform;
    fn is_visible(&self) -> bool;
    fn set_visible(&mut self, visible: bool);
    /// `None` when there is nothing to draw.
    fn draw_call(&self, handle: Handle) -> Option<DrawCall>;
}

/// Mesh with vertex data copied out of an interop transfer.
#[derive(Debug, Clone, PartialEq)]
pub struct StaticMesh {
    pub transform: Transform,
    pub vertex_count: u32,
    pub vertex_stride: u32,
    pub vertex_data: Bytes,
    pub texture: Handle,
    pub visible: bool,
}

impl SceneObject for StaticMesh {
    fn transform(&self) -> &Transform {
        &self.transform
    }

    fn transform_mut(&mut self) -> &mut Transform {
        &mut self.transform
    }

    fn is_visible(&self) -> bool {
        self.visible
    }

    fn set_visible(&mut self, visible: bool) {
        self.visible = visible;
    }

    fn draw_call(&self, handle: Handle) -> Option<DrawCall> {
        if self.vertex_count == 0 {
            return None;
        }
        Some(DrawCall {
            object: handle,
            model: self.transform.matrix(),
            rotation: self.transform.rotation,
            vertex_count: self.vertex_count,
            texture: self.texture,
            color: [1.0; 4],
        })
    }
}

/// Single-point debug marker.
#[derive(Debug, Clone, PartialEq)]
pub struct DebugMarker {
    pub transform: Transform,
    pub color: [f32; 4],
    pub visible: bool,
}

impl SceneObject for DebugMarker {
    fn transform(&self) -> &Transform {
        &self.transform
    }

    fn transform_mut(&mut self) -> &mut Transform {
        &mut self.transform
    }

    fn is_visible(&self) -> bool {
        self.visible
    }

    fn set_visible(&mut self, visible: bool) {
        self.visible = visible;
    }

    fn draw_call(&self, handle: Handle) -> Option<DrawCall> {
        Some(DrawCall {
            object: handle,
            model: self.transform.matrix(),
            rotation: self.transform.rotation,
            vertex_count: 1,
            texture: Handle::INVALID,
            color: self.color,
        })
    }
}

crate::subtype!(dyn SceneObject => StaticMesh, DebugMarker);

#[derive(Debug, Default)]
pub struct SceneRegistry {
    objects: HandleMap<dyn SceneObject>,
}

impl SceneRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a mesh from a vertex transfer. The transfer is copied before
    /// returning.
    pub fn create_static_mesh(&mut self, vertices: &ArrayTransfer<'_>, texture: Handle) -> Result<Handle> {
        vertices.validate()?;
        let mesh = StaticMesh {
            transform: Transform::default(),
            vertex_count: vertices.count,
            vertex_stride: vertices.stride(),
            vertex_data: vertices.to_bytes(),
            texture,
            visible: true,
        };
        let handle = self.objects.add_specific(mesh);
        debug!(%handle, vertices = vertices.count, "Created static mesh");
        Ok(handle)
    }

    /// Creates a visible marker at the origin.
    pub fn create_debug_marker(&mut self, color: [f32; 4]) -> Handle {
        self.objects.add_specific(DebugMarker {
            transform: Transform::default(),
            color,
            visible: true,
        })
    }

    /// Registers a concrete scene object.
    pub fn add_specific<S: Subtype<dyn SceneObject>>(&mut self, object: S) -> Handle {
        self.objects.add_specific(object)
    }

    /// Removes an object. Returns whether it was live.
    pub fn remove(&mut self, handle: Handle) -> bool {
        self.objects.remove(handle).is_some()
    }

    /// Looks up an object through its base interface.
    pub fn get(&self, handle: Handle) -> Option<&dyn SceneObject> {
        self.objects.get(handle)
    }

    /// Mutable counterpart of [`get`](Self::get).
    pub fn get_mut(&mut self, handle: Handle) -> Option<&mut (dyn SceneObject + 'static)> {
        self.objects.get_mut(handle)
    }

    /// Looks up an object as its concrete type.
    pub fn get_specific<S: Subtype<dyn SceneObject>>(&self, handle: Handle) -> Option<&S> {
        self.objects.get_specific(handle)
    }

    /// Mutable counterpart of [`get_specific`](Self::get_specific).
    pub fn get_specific_mut<S: Subtype<dyn SceneObject>>(&mut self, handle: Handle) -> Option<&mut S> {
        self.objects.get_specific_mut(handle)
    }

    /// Returns whether the handle was live.
    pub fn set_transform(&mut self, handle: Handle, transform: Transform) -> bool {
        match self.objects.get_mut(handle) {
            Some(obj) => {
                *obj.transform_mut() = transform;
                true
            }
            None => false,
        }
    }

    /// Number of live objects.
    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    /// Drops every object. Handles stay retired.
    pub fn clear(&mut self) {
        self.objects.clear();
    }

    /// Visits every live object once.
    pub fn for_each(&self, visit: impl FnMut(&(dyn SceneObject + 'static))) {
        self.objects.for_each(visit);
    }

    /// Like [`for_each`](Self::for_each) but also passes the handle.
    pub fn for_each_with_handle(&self, visit: impl FnMut(Handle, &(dyn SceneObject + 'static))) {
        self.objects.for_each_with_handle(visit);
    }

    /// Visits only objects stored as `S`.
    pub fn for_each_specific<S: Subtype<dyn SceneObject>>(&self, visit: impl FnMut(Handle, &S)) {
        self.objects.for_each_specific(visit);
    }

    /// Draw calls for every visible object, in handle order.
    pub fn collect_draw_calls(&self) -> Vec<DrawCall> {
        self.objects
            .iter()
            .filter(|(_, obj)| obj.is_visible())
            .filter_map(|(h, obj)| obj.draw_call(h))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn triangle() -> Vec<u8> {
        [0.0f32, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0, 0.0]
            .iter()
            .flat_map(|f| f.to_le_bytes())
            .collect()
    }

    #[test]
    fn static_mesh_copies_transfer() -> anyhow::Result<()> {
        let data = triangle();
        let mut scene = SceneRegistry::new();
        let h = {
            let transfer = ArrayTransfer::new(3, &data);
            scene.create_static_mesh(&transfer, Handle::INVALID)?
        };
        drop(data);

        let mesh = scene.get_specific::<StaticMesh>(h).unwrap();
        assert_eq!(mesh.vertex_count, 3);
        assert_eq!(mesh.vertex_stride, 12);
        assert_eq!(mesh.vertex_data.len(), 36);
        assert!(scene.get_specific::<DebugMarker>(h).is_none());
        Ok(())
    }

    #[test]
    fn malformed_transfer_is_rejected() {
        let data = [0u8; 10];
        let mut scene = SceneRegistry::new();
        assert!(scene
            .create_static_mesh(&ArrayTransfer::new(3, &data), Handle::INVALID)
            .is_err());
        assert!(scene.is_empty());
    }

    #[test]
    fn draw_calls_skip_hidden_objects() {
        let mut scene = SceneRegistry::new();
        let shown = scene.create_debug_marker([1.0, 0.0, 0.0, 1.0]);
        let hidden = scene.create_debug_marker([0.0, 1.0, 0.0, 1.0]);
        scene.get_mut(hidden).unwrap().set_visible(false);

        let calls = scene.collect_draw_calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].object, shown);
    }

    #[test]
    fn set_transform_reports_liveness() {
        let mut scene = SceneRegistry::new();
        let h = scene.create_debug_marker([1.0; 4]);
        let t = Transform {
            position: Vec3::new(4.0, 5.0, 6.0),
            ..Default::default()
        };
        assert!(scene.set_transform(h, t));
        assert!(!scene.set_transform(Handle::from_raw(42), t));
        assert_eq!(scene.collect_draw_calls()[0].model.translation(), t.position);
    }
}
