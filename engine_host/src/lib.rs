//! `engine_host`
//!
//! Host-side wiring around one engine context:
//! - Fixed timestep tick loop
//! - Physics step, scene sync and render submission each tick
//! - In-process managed runtime stand-in for callback handles

pub mod host;
pub mod script;

pub use host::Host;
pub use script::ScriptHost;
