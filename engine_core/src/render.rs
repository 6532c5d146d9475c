//! Rendering abstraction.
//!
//! This crate intentionally does not depend on a graphics backend. The render
//! loop walks the scene registry and hands each visible object's
//! [`DrawCall`] to a backend implementing this trait.

use crate::scene::DrawCall;

/// A minimal rendering API.
pub trait RenderBackend: Send + Sync {
    fn begin_frame(&mut self);
    fn submit(&mut self, call: &DrawCall);
    fn end_frame(&mut self);
}

/// A no-op renderer useful for headless runs.
#[derive(Default)]
pub struct NullRenderer;

impl RenderBackend for NullRenderer {
    fn begin_frame(&mut self) {}
    fn submit(&mut self, _call: &DrawCall) {}
    fn end_frame(&mut self) {}
}

/// Keeps the calls of the last completed frame.
#[derive(Debug, Default)]
pub struct RecordingRenderer {
    pub frames: u64,
    pub last_frame: Vec<DrawCall>,
    pending: Vec<DrawCall>,
}

impl RenderBackend for RecordingRenderer {
    fn begin_frame(&mut self) {
        self.pending.clear();
    }

    fn submit(&mut self, call: &DrawCall) {
        self.pending.push(call.clone());
    }

    fn end_frame(&mut self) {
        self.last_frame = std::mem::take(&mut self.pending);
        self.frames += 1;
    }
}
