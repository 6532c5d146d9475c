//! Flat entry points exposed to the managed runtime.
//!
//! Everything here takes and returns raw `u32` handles and plain values. A
//! failed call answers with [`Handle::INVALID`] (or `false`) and a warning;
//! nothing on this surface panics or hands out a reference into a store.

use bytes::Bytes;
use tracing::warn;

use crate::{
    callback::ManagedCallback,
    context::EngineContext,
    entity::{EntityFlags, EntityKind, ModelMesh},
    error::{EngineError, Result},
    handle::Handle,
    math::{Quat, Vec3},
    texture::{Texture, TextureFormat},
};

/// Returned by [`entity_get_kind`] for dead handles.
pub const KIND_NONE: u32 = u32::MAX;

/// Borrowed bulk payload: `{count, byte_size, data}`.
///
/// Valid only for the duration of the call that receives it; callees copy
/// out what they keep.
#[derive(Debug, Clone, Copy)]
pub struct ArrayTransfer<'a> {
    pub count: u32,
    pub byte_size: u32,
    pub data: &'a [u8],
}

impl<'a> ArrayTransfer<'a> {
    pub fn new(count: u32, data: &'a [u8]) -> Self {
        Self {
            count,
            byte_size: u32::try_from(data.len()).unwrap_or(u32::MAX),
            data,
        }
    }

    pub fn from_parts(count: u32, byte_size: u32, data: &'a [u8]) -> Self {
        Self { count, byte_size, data }
    }

    pub fn empty() -> Self {
        Self::new(0, &[])
    }

    /// Checks that the header describes the payload.
    pub fn validate(&self) -> Result<()> {
        if self.byte_size as usize != self.data.len() {
            return Err(EngineError::InvalidTransfer(format!(
                "byte_size {} does not match payload length {}",
                self.byte_size,
                self.data.len()
            )));
        }
        match self.count {
            0 if self.byte_size != 0 => Err(EngineError::InvalidTransfer(format!(
                "zero elements but {} bytes",
                self.byte_size
            ))),
            0 => Ok(()),
            n if self.byte_size % n != 0 => Err(EngineError::InvalidTransfer(format!(
                "{} bytes do not divide into {n} elements",
                self.byte_size
            ))),
            _ => Ok(()),
        }
    }

    /// Bytes per element.
    pub fn stride(&self) -> u32 {
        match self.count {
            0 => 0,
            n => self.byte_size / n,
        }
    }

    pub fn to_bytes(&self) -> Bytes {
        Bytes::copy_from_slice(self.data)
    }
}

fn reject(op: &'static str, e: EngineError) -> u32 {
    warn!(op, error = %e, "Interop call failed");
    Handle::INVALID.to_raw()
}

pub fn entity_create(ctx: &mut EngineContext, kind: u32) -> u32 {
    match EntityKind::try_from(kind) {
        Ok(kind) => ctx.entities.create_kind(kind).to_raw(),
        Err(e) => reject("entity_create", e),
    }
}

pub fn entity_destroy(ctx: &mut EngineContext, entity: u32) -> bool {
    ctx.entities.destroy(Handle::from_raw(entity))
}

pub fn entity_get_kind(ctx: &EngineContext, entity: u32) -> u32 {
    ctx.entities
        .get(Handle::from_raw(entity))
        .map_or(KIND_NONE, |e| e.kind() as u32)
}

pub fn entity_set_position(ctx: &mut EngineContext, entity: u32, x: f32, y: f32, z: f32) -> bool {
    match ctx.entities.get_mut(Handle::from_raw(entity)) {
        Some(e) => {
            e.common_mut().position = Vec3::new(x, y, z);
            true
        }
        None => false,
    }
}

pub fn entity_get_position(ctx: &EngineContext, entity: u32) -> Option<[f32; 3]> {
    ctx.entities
        .get(Handle::from_raw(entity))
        .map(|e| e.common().position.to_array())
}

pub fn entity_set_rotation(ctx: &mut EngineContext, entity: u32, x: f32, y: f32, z: f32, w: f32) -> bool {
    match ctx.entities.get_mut(Handle::from_raw(entity)) {
        Some(e) => {
            e.common_mut().rotation = Quat::from_xyzw(x, y, z, w);
            true
        }
        None => false,
    }
}

/// Unknown bits are dropped.
pub fn entity_set_flags(ctx: &mut EngineContext, entity: u32, flags: u32) -> bool {
    match ctx.entities.get_mut(Handle::from_raw(entity)) {
        Some(e) => {
            e.common_mut().flags = EntityFlags::from_bits_truncate(flags);
            true
        }
        None => false,
    }
}

/// `0` for dead handles.
pub fn entity_get_flags(ctx: &EngineContext, entity: u32) -> u32 {
    ctx.entities
        .get(Handle::from_raw(entity))
        .map_or(0, |e| e.common().flags.bits())
}

pub fn entity_set_name(ctx: &mut EngineContext, entity: u32, name: &str) -> bool {
    match ctx.entities.get_mut(Handle::from_raw(entity)) {
        Some(e) => {
            e.common_mut().name = name.to_string();
            true
        }
        None => false,
    }
}

/// Points a `ModelMesh` entity at its scene object and texture. `false` when
/// the entity is missing or of another kind.
pub fn entity_attach_mesh(ctx: &mut EngineContext, entity: u32, scene_object: u32, texture: u32) -> bool {
    match ctx.entities.get_specific_mut::<ModelMesh>(Handle::from_raw(entity)) {
        Some(mesh) => {
            mesh.scene_object = Handle::from_raw(scene_object);
            mesh.texture = Handle::from_raw(texture);
            true
        }
        None => false,
    }
}

pub fn scene_create_static_mesh(ctx: &mut EngineContext, vertices: ArrayTransfer<'_>, texture: u32) -> u32 {
    match ctx.scene.create_static_mesh(&vertices, Handle::from_raw(texture)) {
        Ok(handle) => handle.to_raw(),
        Err(e) => reject("scene_create_static_mesh", e),
    }
}

pub fn scene_create_debug_marker(ctx: &mut EngineContext, r: f32, g: f32, b: f32, a: f32) -> u32 {
    ctx.scene.create_debug_marker([r, g, b, a]).to_raw()
}

pub fn scene_set_position(ctx: &mut EngineContext, object: u32, x: f32, y: f32, z: f32) -> bool {
    match ctx.scene.get_mut(Handle::from_raw(object)) {
        Some(obj) => {
            obj.transform_mut().position = Vec3::new(x, y, z);
            true
        }
        None => false,
    }
}

pub fn scene_set_visible(ctx: &mut EngineContext, object: u32, visible: bool) -> bool {
    match ctx.scene.get_mut(Handle::from_raw(object)) {
        Some(obj) => {
            obj.set_visible(visible);
            true
        }
        None => false,
    }
}

fn texture_format(tag: u32) -> Result<TextureFormat> {
    match tag {
        0 => Ok(TextureFormat::Rgba8),
        1 => Ok(TextureFormat::Rgba8Srgb),
        2 => Ok(TextureFormat::R8),
        other => Err(EngineError::UnknownTextureFormat(other)),
    }
}

/// Caches a single-mip texture under `path`.
pub fn texture_load(
    ctx: &mut EngineContext,
    path: &str,
    width: u32,
    height: u32,
    format: u32,
    mip: ArrayTransfer<'_>,
) -> u32 {
    let result = (|| -> Result<Handle> {
        mip.validate()?;
        let format = texture_format(format)?;
        let expected = u64::from(width) * u64::from(height) * u64::from(format.bytes_per_pixel());
        if u64::from(mip.byte_size) != expected {
            return Err(EngineError::InvalidTransfer(format!(
                "{width}x{height} {format:?} needs {expected} bytes, got {}",
                mip.byte_size
            )));
        }
        ctx.textures
            .add_texture(path, Texture::new(width, height, format, mip.to_bytes()))
    })();

    match result {
        Ok(handle) => handle.to_raw(),
        Err(e) => reject("texture_load", e),
    }
}

pub fn texture_get_handle(ctx: &EngineContext, path: &str) -> u32 {
    ctx.textures.get_handle(path).to_raw()
}

/// Binds the per-tick managed hook. Passing `u32::MAX` unbinds it.
pub fn callback_register_tick(ctx: &mut EngineContext, callback: u32) {
    ctx.on_tick = ManagedCallback::new(Handle::from_raw(callback));
}
