//! Error types.
//!
//! Everything in this crate fails locally and non-fatally. Lookups that miss
//! return `None` or [`Handle::INVALID`] instead of an error; the variants here
//! cover the cases a caller has to decide about.

use thiserror::Error;

use crate::handle::Handle;

/// Errors surfaced by the engine core.
#[derive(Debug, Error)]
pub enum EngineError {
    /// A texture was registered under a path that is already cached.
    #[error("texture path '{path}' is already registered as {existing}")]
    DuplicateTexturePath { path: String, existing: Handle },

    /// A bulk transfer's header does not describe its payload.
    #[error("invalid array transfer: {0}")]
    InvalidTransfer(String),

    /// Interop asked for an entity kind the registry cannot construct.
    #[error("unknown entity kind tag {0}")]
    UnknownEntityKind(u32),

    /// Interop named a pixel format the texture cache does not know.
    #[error("unknown texture format tag {0}")]
    UnknownTextureFormat(u32),

    /// The store has issued every representable handle.
    #[error("handle space exhausted")]
    HandleSpaceExhausted,

    #[error("config parse error: {0}")]
    Config(#[from] serde_json::Error),

    #[error("config read error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T, E = EngineError> = std::result::Result<T, E>;
