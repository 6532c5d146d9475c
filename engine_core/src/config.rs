//! Configuration system.
//!
//! Loads engine configuration from JSON strings/files. Every field has a
//! default, so `{}` is a valid config.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::{error::Result, math::Vec3, texture::DuplicatePolicy};

/// Which side of the simulation a context runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExecutionContext {
    #[default]
    Client,
    Server,
}

/// Root configuration for one [`EngineContext`](crate::context::EngineContext).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    #[serde(default)]
    pub execution: ExecutionContext,
    /// Fixed simulation tick rate.
    #[serde(default = "default_tick_hz")]
    pub tick_hz: u32,
    /// Outcome of caching a texture path twice.
    #[serde(default)]
    pub duplicate_textures: DuplicatePolicy,
    /// `tracing` filter used when `RUST_LOG` is unset.
    #[serde(default = "default_log_filter")]
    pub log_filter: String,
    #[serde(default = "default_gravity")]
    pub gravity: Vec3,
}

fn default_tick_hz() -> u32 {
    64
}

fn default_log_filter() -> String {
    "info".to_string()
}

fn default_gravity() -> Vec3 {
    Vec3::new(0.0, 0.0, -9.81)
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            execution: ExecutionContext::default(),
            tick_hz: default_tick_hz(),
            duplicate_textures: DuplicatePolicy::default(),
            log_filter: default_log_filter(),
            gravity: default_gravity(),
        }
    }
}

impl EngineConfig {
    /// Parses config from JSON.
    pub fn from_json_str(s: &str) -> serde_json::Result<Self> {
        serde_json::from_str(s)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Ok(Self::from_json_str(&text)?)
    }

    /// Seconds per tick.
    pub fn tick_dt(&self) -> f32 {
        1.0 / self.tick_hz.max(1) as f32
    }
}
