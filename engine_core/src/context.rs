//! Engine context.
//!
//! One `EngineContext` per execution context (client or server) owns every
//! registry. It is built at startup and passed explicitly to systems and
//! interop entry points, so tests can run any number of isolated contexts.
//!
//! A context belongs to the thread that created it: the registries hold
//! non-`Send` trait objects, so the compiler rejects moving it elsewhere.

use tracing::{debug, info};

use crate::{
    callback::{HostBridge, ManagedCallback},
    config::{EngineConfig, ExecutionContext},
    entity::{EntityFlags, EntityRegistry, ModelMesh},
    physics::PhysicsBackend,
    render::RenderBackend,
    scene::SceneRegistry,
    texture::TextureCache,
};

pub struct EngineContext {
    pub config: EngineConfig,
    pub entities: EntityRegistry,
    pub scene: SceneRegistry,
    pub textures: TextureCache,
    /// Managed hook run once per tick.
    pub on_tick: ManagedCallback,
    tick: u64,
}

impl EngineContext {
    pub fn new(config: EngineConfig) -> Self {
        Self {
            textures: TextureCache::new(config.duplicate_textures),
            config,
            entities: EntityRegistry::new(),
            scene: SceneRegistry::new(),
            on_tick: ManagedCallback::UNBOUND,
            tick: 0,
        }
    }

    pub fn execution(&self) -> ExecutionContext {
        self.config.execution
    }

    pub fn tick(&self) -> u64 {
        self.tick
    }

    pub fn startup(&mut self) {
        info!(execution = ?self.config.execution, tick_hz = self.config.tick_hz, "Engine context starting");
        self.entities.startup();
    }

    pub fn shutdown(&mut self) {
        info!(
            tick = self.tick,
            scene_objects = self.scene.len(),
            textures = self.textures.len(),
            "Engine context shutting down"
        );
        self.on_tick = ManagedCallback::UNBOUND;
        self.entities.shutdown();
        self.scene.clear();
        self.textures.clear();
    }

    /// Copies `ModelMesh` entity state into the scene objects they reference.
    /// Returns how many scene objects were updated.
    pub fn sync_scene(&mut self) -> usize {
        let scene = &mut self.scene;
        let mut synced = 0;
        self.entities.for_each_specific::<ModelMesh>(|handle, mesh| {
            let Some(obj) = scene.get_mut(mesh.scene_object) else {
                debug!(entity = %handle, scene_object = %mesh.scene_object, "ModelMesh has no live scene object");
                return;
            };
            let t = obj.transform_mut();
            t.position = mesh.common.position;
            t.rotation = mesh.common.rotation;
            obj.set_visible(mesh.common.flags.contains(EntityFlags::VISIBLE));
            synced += 1;
        });
        synced
    }

    pub fn step_physics(&mut self, physics: &mut dyn PhysicsBackend, dt_sec: f32) {
        physics.step(&mut self.entities, dt_sec);
    }

    /// Submits one frame. Returns the number of draw calls.
    pub fn render(&self, backend: &mut dyn RenderBackend) -> usize {
        let calls = self.scene.collect_draw_calls();
        backend.begin_frame();
        for call in &calls {
            backend.submit(call);
        }
        backend.end_frame();
        calls.len()
    }

    /// Runs one tick: physics, the managed hook, scene sync, render.
    pub fn advance(
        &mut self,
        bridge: &mut dyn HostBridge,
        physics: &mut dyn PhysicsBackend,
        renderer: &mut dyn RenderBackend,
        dt_sec: f32,
    ) -> usize {
        self.step_physics(physics, dt_sec);
        let hook = self.on_tick;
        hook.invoke(bridge, self);
        self.sync_scene();
        let draws = self.render(renderer);
        self.tick += 1;
        draws
    }
}
