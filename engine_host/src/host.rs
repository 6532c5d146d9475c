//! Host loop.
//!
//! Owns one [`EngineContext`] plus the collaborators a tick needs (physics,
//! renderer, the managed runtime stand-in) and drives them at a fixed
//! timestep.
//!
//! Determinism notes:
//! - Keep simulation in a fixed timestep.
//! - Demo content comes from a seeded RNG.

use std::time::Duration;

use anyhow::Context;
use engine_core::{
    config::EngineConfig,
    entity::{EntityFlags, ModelMesh, RigidBody},
    interop::{self, ArrayTransfer},
    math::Vec3,
    physics::{PhysicsConfig, SimplePhysics},
    render::RecordingRenderer,
    texture::{Texture, TextureFormat},
    EngineContext, Handle,
};
use rand::{rngs::StdRng, Rng, SeedableRng};
use tokio::time::Instant;
use tracing::{debug, info};

use crate::script::ScriptHost;

/// Height bodies fall from, and are reset to once they pass the floor.
pub const SPAWN_HEIGHT: f32 = 10.0;

pub struct Host {
    pub ctx: EngineContext,
    pub scripts: ScriptHost,
    pub renderer: RecordingRenderer,
    physics: SimplePhysics,
}

impl Host {
    pub fn new(cfg: EngineConfig) -> Self {
        let physics = SimplePhysics::new(PhysicsConfig { gravity: cfg.gravity });
        let mut ctx = EngineContext::new(cfg);
        ctx.startup();
        Self {
            ctx,
            scripts: ScriptHost::new(),
            renderer: RecordingRenderer::default(),
            physics,
        }
    }

    /// Spawns `bodies` falling rigid bodies, one textured model, and the
    /// managed respawn script.
    pub fn populate_demo(&mut self, bodies: usize, seed: u64) -> anyhow::Result<()> {
        let mut rng = StdRng::seed_from_u64(seed);

        let mut body_handles = Vec::with_capacity(bodies);
        for i in 0..bodies {
            let h = self.ctx.entities.spawn(RigidBody {
                velocity: Vec3::new(rng.gen_range(-1.0..1.0), rng.gen_range(-1.0..1.0), 0.0),
                ..Default::default()
            });
            let body = self.ctx.entities.get_mut(h).context("spawned body missing")?;
            body.common_mut().name = format!("body_{i}");
            body.common_mut().position = Vec3::new(
                rng.gen_range(-8.0..8.0),
                rng.gen_range(-8.0..8.0),
                rng.gen_range(1.0..SPAWN_HEIGHT),
            );
            body_handles.push(h.to_raw());
        }

        let pixels = [255u8; 4 * 4 * 4];
        let texture = self.ctx.textures.get_or_insert_with("textures/white.png", || {
            Texture::new(4, 4, TextureFormat::Rgba8, pixels.to_vec().into())
        })?;

        let vertices: Vec<u8> = [0.0f32, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0, 0.0]
            .iter()
            .flat_map(|f| f.to_le_bytes())
            .collect();
        let mesh_object = interop::scene_create_static_mesh(
            &mut self.ctx,
            ArrayTransfer::new(3, &vertices),
            texture.to_raw(),
        );
        let model = self.ctx.entities.spawn(ModelMesh {
            scene_object: Handle::from_raw(mesh_object),
            texture,
            ..Default::default()
        });
        if let Some(e) = self.ctx.entities.get_mut(model) {
            e.common_mut().name = "model".into();
            e.common_mut().flags |= EntityFlags::STATIC;
        }

        let respawn = self.scripts.register(move |ctx, _args| {
            for &raw in &body_handles {
                let Some([x, y, z]) = interop::entity_get_position(ctx, raw) else {
                    continue;
                };
                if z >= 0.0 {
                    continue;
                }
                interop::entity_set_position(ctx, raw, x, y, SPAWN_HEIGHT);
                if let Some(body) = ctx.entities.get_specific_mut::<RigidBody>(Handle::from_raw(raw)) {
                    body.velocity.z = 0.0;
                }
                debug!(entity = raw, "Respawned body");
            }
            Ok(())
        });
        interop::callback_register_tick(&mut self.ctx, respawn.to_raw());

        info!(
            bodies,
            entities = self.ctx.entities.len(),
            scene_objects = self.ctx.scene.len(),
            "Demo content ready"
        );
        Ok(())
    }

    /// Executes one fixed simulation step. Returns the frame's draw count.
    pub fn step(&mut self, dt_sec: f32) -> usize {
        self.ctx
            .advance(&mut self.scripts, &mut self.physics, &mut self.renderer, dt_sec)
    }

    /// Runs the host for a number of ticks at the configured rate.
    pub async fn run_for_ticks(&mut self, ticks: u32) -> anyhow::Result<()> {
        let dt = Duration::from_secs_f32(self.ctx.config.tick_dt());
        let mut next = Instant::now();

        for _ in 0..ticks {
            next += dt;
            self.step(dt.as_secs_f32());
            tokio::time::sleep_until(next).await;
        }
        Ok(())
    }

    pub fn status(&self) -> Vec<String> {
        let mut out = Vec::new();
        out.push(format!("Execution: {:?}", self.ctx.execution()));
        out.push(format!("Tick: {}", self.ctx.tick()));
        out.push(format!("Entities: {}", self.ctx.entities.len()));
        out.push(format!("Scene objects: {}", self.ctx.scene.len()));
        out.push(format!("Textures: {}", self.ctx.textures.len()));
        out.push(format!("Last frame draws: {}", self.renderer.last_frame.len()));
        out.push(format!(
            "Scripts: {} (invocations={} failures={})",
            self.scripts.len(),
            self.scripts.invocations(),
            self.scripts.failures()
        ));
        out
    }

    pub fn shutdown(&mut self) {
        self.ctx.shutdown();
    }
}
