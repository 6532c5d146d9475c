//! In-process stand-in for the managed runtime.
//!
//! `ScriptHost` plays the managed side of the callback boundary: scripts are
//! registered here and native code only ever receives their handles. It
//! resolves handles on invocation and owns every failure a script produces.

use engine_core::{
    callback::HostBridge,
    interop::ArrayTransfer,
    EngineContext, Handle, HandleMap,
};
use tracing::{trace, warn};

/// A registered managed callback.
pub type ScriptFn = Box<dyn FnMut(&mut EngineContext, Option<ArrayTransfer<'_>>) -> anyhow::Result<()>>;

#[derive(Default)]
pub struct ScriptHost {
    scripts: HandleMap<ScriptFn>,
    invocations: u64,
    failures: u64,
}

impl ScriptHost {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a script and returns the handle native code will hold.
    pub fn register(
        &mut self,
        script: impl FnMut(&mut EngineContext, Option<ArrayTransfer<'_>>) -> anyhow::Result<()> + 'static,
    ) -> Handle {
        self.scripts.insert(Box::new(script))
    }

    pub fn unregister(&mut self, handle: Handle) -> bool {
        self.scripts.remove(handle).is_some()
    }

    pub fn len(&self) -> usize {
        self.scripts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scripts.is_empty()
    }

    pub fn invocations(&self) -> u64 {
        self.invocations
    }

    pub fn failures(&self) -> u64 {
        self.failures
    }
}

impl HostBridge for ScriptHost {
    fn invoke_callback(&mut self, ctx: &mut EngineContext, callback: Handle, args: Option<ArrayTransfer<'_>>) {
        let Some(script) = self.scripts.get_mut(callback) else {
            warn!(%callback, "Managed callback handle does not resolve");
            self.failures += 1;
            return;
        };
        self.invocations += 1;
        trace!(%callback, "Invoking managed callback");
        if let Err(e) = script(ctx, args) {
            warn!(%callback, error = %e, "Managed callback failed");
            self.failures += 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use engine_core::{callback::ManagedCallback, config::EngineConfig};

    #[test]
    fn registered_script_runs_through_callback() {
        let mut ctx = EngineContext::new(EngineConfig::default());
        let mut host = ScriptHost::new();
        let h = host.register(|ctx, _| {
            ctx.entities.create_entity();
            Ok(())
        });

        ManagedCallback::new(h).invoke(&mut host, &mut ctx);
        assert_eq!(ctx.entities.len(), 1);
        assert_eq!(host.invocations(), 1);
    }

    #[test]
    fn failures_stay_on_the_host_side() {
        let mut ctx = EngineContext::new(EngineConfig::default());
        let mut host = ScriptHost::new();
        let h = host.register(|_, _| anyhow::bail!("script error"));

        ManagedCallback::new(h).invoke(&mut host, &mut ctx);
        ManagedCallback::new(Handle::from_raw(99)).invoke(&mut host, &mut ctx);
        assert_eq!(host.failures(), 2);
    }

    #[test]
    fn unregistered_handle_no_longer_resolves() {
        let mut ctx = EngineContext::new(EngineConfig::default());
        let mut host = ScriptHost::new();
        let h = host.register(|_, _| Ok(()));
        assert!(host.unregister(h));

        ManagedCallback::new(h).invoke(&mut host, &mut ctx);
        assert_eq!(host.invocations(), 0);
        assert_eq!(host.failures(), 1);
    }
}
