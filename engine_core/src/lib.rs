//! `engine_core`
//!
//! Handle-indexed object stores shared by client and server contexts.
//!
//! Design goals:
//! - Engine objects are addressed only by opaque 32-bit [`Handle`]s.
//! - One generic store ([`HandleMap`]) with checked subtype access.
//! - Registries live in an explicit [`EngineContext`], never in globals.
//! - No `unsafe`.

pub mod callback;
pub mod config;
pub mod context;
pub mod entity;
pub mod error;
pub mod handle;
pub mod handle_map;
pub mod interop;
pub mod math;
pub mod physics;
pub mod render;
pub mod scene;
pub mod texture;

pub use context::EngineContext;
pub use handle::Handle;
pub use handle_map::HandleMap;

pub mod prelude {
    //! Commonly used exports.

    pub use crate::callback::*;
    pub use crate::config::*;
    pub use crate::context::*;
    pub use crate::entity::*;
    pub use crate::error::EngineError;
    pub use crate::handle::*;
    pub use crate::handle_map::*;
    pub use crate::math::*;
    pub use crate::scene::*;
    pub use crate::texture::*;
}
