//! Managed callback bridge.
//!
//! The managed runtime registers a callback on its own side and hands native
//! code a [`Handle`] for it. Native code keeps only that handle and invokes it
//! through a [`HostBridge`]; resolving the handle to a delegate, running it,
//! and reporting its failures all belong to the host.

use tracing::trace;

use crate::{context::EngineContext, handle::Handle, interop::ArrayTransfer};

/// Native-to-managed call surface. Handle in, nothing out.
///
/// The bridge gets the engine context so the managed side can call back into
/// the registries before returning. Such calls happen on the invoking thread.
pub trait HostBridge {
    fn invoke_callback(&mut self, ctx: &mut EngineContext, callback: Handle, args: Option<ArrayTransfer<'_>>);
}

/// Bridge for headless runs with no managed runtime attached.
#[derive(Debug, Default)]
pub struct NullBridge;

impl HostBridge for NullBridge {
    fn invoke_callback(&mut self, _ctx: &mut EngineContext, _callback: Handle, _args: Option<ArrayTransfer<'_>>) {}
}

/// Native holder of a managed callback handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ManagedCallback {
    handle: Handle,
}

impl ManagedCallback {
    pub const UNBOUND: Self = Self {
        handle: Handle::INVALID,
    };

    pub fn new(handle: Handle) -> Self {
        Self { handle }
    }

    pub fn handle(&self) -> Handle {
        self.handle
    }

    pub fn is_bound(&self) -> bool {
        self.handle.is_valid()
    }

    /// Calls into the host. Unbound callbacks are a no-op.
    pub fn invoke(&self, bridge: &mut dyn HostBridge, ctx: &mut EngineContext) {
        self.dispatch(bridge, ctx, None);
    }

    /// Calls into the host with a payload borrowed for the call.
    pub fn invoke_with(&self, bridge: &mut dyn HostBridge, ctx: &mut EngineContext, args: ArrayTransfer<'_>) {
        self.dispatch(bridge, ctx, Some(args));
    }

    fn dispatch(&self, bridge: &mut dyn HostBridge, ctx: &mut EngineContext, args: Option<ArrayTransfer<'_>>) {
        if !self.is_bound() {
            trace!("Skipping unbound managed callback");
            return;
        }
        bridge.invoke_callback(ctx, self.handle, args);
    }
}
