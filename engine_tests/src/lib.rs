//! Shared fixtures for the cross-crate tests.

use bytes::Bytes;
use engine_core::{
    config::EngineConfig,
    texture::{Texture, TextureFormat},
    EngineContext,
};

/// Installs a test-writer subscriber once per test binary.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter("debug")
        .with_test_writer()
        .try_init();
}

pub fn context() -> EngineContext {
    init_tracing();
    EngineContext::new(EngineConfig::default())
}

/// 1x1 RGBA texture filled with `fill`.
pub fn pixel_texture(fill: u8) -> Texture {
    Texture::new(1, 1, TextureFormat::Rgba8, Bytes::from(vec![fill; 4]))
}

/// `n` position-only vertices laid out as little-endian `f32` triples.
pub fn vertex_bytes(n: usize) -> Vec<u8> {
    (0..n)
        .flat_map(|i| [i as f32, 0.0, 0.0])
        .flat_map(f32::to_le_bytes)
        .collect()
}
