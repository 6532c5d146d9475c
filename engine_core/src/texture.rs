//! Path-keyed texture cache.
//!
//! Wraps a `HandleMap<Texture>` with a `path -> handle` index so repeated
//! loads of one asset path resolve to one stored texture. While a path is
//! cached it always maps to the same handle.

use std::collections::HashMap;

use bytes::Bytes;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::{
    error::{EngineError, Result},
    handle::Handle,
    handle_map::HandleMap,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TextureFormat {
    #[default]
    Rgba8,
    Rgba8Srgb,
    R8,
}

impl TextureFormat {
    /// Size of one texel in bytes.
    pub fn bytes_per_pixel(self) -> u32 {
        match self {
            TextureFormat::Rgba8 | TextureFormat::Rgba8Srgb => 4,
            TextureFormat::R8 => 1,
        }
    }
}

/// CPU-side texture: mip chain, largest first.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Texture {
    pub width: u32,
    pub height: u32,
    pub format: TextureFormat,
    pub mips: Vec<Bytes>,
}

impl Texture {
    pub fn new(width: u32, height: u32, format: TextureFormat, base_mip: Bytes) -> Self {
        Self {
            width,
            height,
            format,
            mips: vec![base_mip],
        }
    }

    /// Total bytes across all mips.
    pub fn byte_size(&self) -> usize {
        self.mips.iter().map(Bytes::len).sum()
    }
}

/// What [`TextureCache::add_texture`] does when the path is already cached.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DuplicatePolicy {
    /// Fail with [`EngineError::DuplicateTexturePath`].
    #[default]
    Reject,
    /// Return the cached handle and drop the incoming texture.
    Reuse,
}

#[derive(Debug, Default)]
pub struct TextureCache {
    textures: HandleMap<Texture>,
    by_path: HashMap<String, Handle>,
    policy: DuplicatePolicy,
}

impl TextureCache {
    pub fn new(policy: DuplicatePolicy) -> Self {
        Self {
            policy,
            ..Default::default()
        }
    }

    /// Policy applied when a path is added twice.
    pub fn policy(&self) -> DuplicatePolicy {
        self.policy
    }

    /// Registers `texture` under `path`.
    ///
    /// A path that is already cached never creates a second entry; the
    /// outcome depends on the cache's [`DuplicatePolicy`].
    pub fn add_texture(&mut self, path: &str, texture: Texture) -> Result<Handle> {
        if let Some(&existing) = self.by_path.get(path) {
            return match self.policy {
                DuplicatePolicy::Reuse => {
                    debug!(path, handle = %existing, "Texture already cached, reusing");
                    Ok(existing)
                }
                DuplicatePolicy::Reject => {
                    warn!(path, handle = %existing, "Rejected duplicate texture path");
                    Err(EngineError::DuplicateTexturePath {
                        path: path.to_string(),
                        existing,
                    })
                }
            };
        }

        let handle = self.textures.try_add(Box::new(texture))?;
        self.by_path.insert(path.to_string(), handle);
        debug!(path, %handle, "Cached texture");
        Ok(handle)
    }

    /// Returns the cached handle for `path`, loading it with `load` on a
    /// miss.
    pub fn get_or_insert_with(&mut self, path: &str, load: impl FnOnce() -> Texture) -> Result<Handle> {
        match self.by_path.get(path) {
            Some(&handle) => Ok(handle),
            None => {
                let handle = self.textures.try_add(Box::new(load()))?;
                self.by_path.insert(path.to_string(), handle);
                Ok(handle)
            }
        }
    }

    /// Swaps the texture stored for `path`, keeping its handle. Caches the
    /// texture as new when the path is unknown.
    pub fn replace_texture(&mut self, path: &str, texture: Texture) -> Result<Handle> {
        let existing = self.get_handle(path);
        match self.textures.get_mut(existing) {
            Some(slot) => {
                *slot = texture;
                debug!(path, handle = %existing, "Replaced texture");
                Ok(existing)
            }
            None => self.add_texture(path, texture),
        }
    }

    /// Cached handle for `path`, or [`Handle::INVALID`]. Never inserts.
    pub fn get_handle(&self, path: &str) -> Handle {
        self.by_path.get(path).copied().unwrap_or(Handle::INVALID)
    }

    /// Cached texture for `path`, if any.
    pub fn get_texture(&self, path: &str) -> Option<&Texture> {
        self.textures.get(self.get_handle(path))
    }

    /// Texture behind `handle`, if live.
    pub fn get(&self, handle: Handle) -> Option<&Texture> {
        self.textures.get(handle)
    }

    /// Whether `path` is cached.
    pub fn contains(&self, path: &str) -> bool {
        self.by_path.contains_key(path)
    }

    /// Evicts `path`. Its handle is retired.
    pub fn remove(&mut self, path: &str) -> Option<Texture> {
        let handle = self.by_path.remove(path)?;
        self.textures.remove(handle).map(|boxed| *boxed)
    }

    /// Number of cached textures.
    pub fn len(&self) -> usize {
        self.textures.len()
    }

    pub fn is_empty(&self) -> bool {
        self.textures.is_empty()
    }

    /// Cached paths in no particular order.
    pub fn paths(&self) -> impl Iterator<Item = &str> + '_ {
        self.by_path.keys().map(String::as_str)
    }

    /// Evicts everything. Issued handles stay retired.
    pub fn clear(&mut self) {
        self.by_path.clear();
        self.textures.clear();
    }
}
