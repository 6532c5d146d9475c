//! Store-level properties exercised through the public registry API.

use std::collections::HashSet;

use engine_core::{
    callback::{HostBridge, ManagedCallback},
    config::EngineConfig,
    entity::{BaseEntity, EntityRegistry, ModelMesh, RigidBody},
    error::EngineError,
    interop::{self, ArrayTransfer},
    math::Vec3,
    scene::StaticMesh,
    texture::{DuplicatePolicy, TextureCache},
    EngineContext, Handle,
};
use engine_tests::{context, init_tracing, pixel_texture, vertex_bytes};

#[test]
fn get_after_add_returns_the_stored_object() {
    let mut reg = EntityRegistry::new();
    let body = RigidBody {
        velocity: Vec3::new(1.0, 2.0, 3.0),
        mass: 4.0,
        ..Default::default()
    };
    let h = reg.spawn(body.clone());
    assert_ne!(h, Handle::INVALID);
    assert_eq!(reg.get_specific::<RigidBody>(h), Some(&body));
    assert_eq!(reg.get(h).map(|e| e.common().clone()), Some(body.common));
}

#[test]
fn handles_are_unique_and_increasing() {
    let mut reg = EntityRegistry::new();
    let handles: Vec<Handle> = (0..100)
        .map(|i| match i % 3 {
            0 => reg.create_entity(),
            1 => reg.create_model_mesh(),
            _ => reg.create_rigid_body(),
        })
        .collect();
    assert!(handles.windows(2).all(|w| w[0] < w[1]));
    assert_eq!(handles.iter().collect::<HashSet<_>>().len(), 100);
    assert!(handles.iter().all(|h| h.is_valid() && h.to_raw() > 0));
}

#[test]
fn subtype_lookup_is_checked() {
    let mut reg = EntityRegistry::new();
    let mesh = reg.spawn(ModelMesh {
        texture: Handle::from_raw(12),
        ..Default::default()
    });
    assert_eq!(reg.get_specific::<ModelMesh>(mesh).map(|m| m.texture), Some(Handle::from_raw(12)));
    assert!(reg.get_specific::<RigidBody>(mesh).is_none());
    assert!(reg.get_specific::<BaseEntity>(mesh).is_none());
}

#[test]
fn for_each_visits_every_entry_exactly_once() {
    let mut reg = EntityRegistry::new();
    let mut expected = HashSet::new();
    for _ in 0..10 {
        expected.insert(reg.create_entity());
        expected.insert(reg.create_rigid_body());
    }

    let mut seen = Vec::new();
    reg.for_each_with_handle(|h, _| seen.push(h));
    assert_eq!(seen.len(), 20);
    assert_eq!(seen.into_iter().collect::<HashSet<_>>(), expected);

    let mut count = 0;
    reg.for_each(|_| count += 1);
    assert_eq!(count, 20);
}

#[test]
fn filtered_visit_sees_only_model_meshes() {
    init_tracing();
    let mut reg = EntityRegistry::new();
    let a = reg.create_entity();
    let b = reg.create_entity();
    let c = reg.create_model_mesh();

    let mut meshes = Vec::new();
    reg.for_each_specific::<ModelMesh>(|h, _| meshes.push(h));
    assert_eq!(meshes, vec![c]);

    let mut all = HashSet::new();
    reg.for_each_with_handle(|h, _| {
        all.insert(h);
    });
    assert_eq!(all, HashSet::from([a, b, c]));
}

#[test]
fn stale_handle_is_rejected_after_destroy() {
    let mut reg = EntityRegistry::new();
    let old = reg.create_entity();
    assert!(reg.destroy(old));
    let fresh = reg.create_entity();

    assert_ne!(old, fresh);
    assert!(reg.get(old).is_none());
    assert!(reg.get(fresh).is_some());
}

#[test]
fn texture_path_resolves_to_one_handle() -> anyhow::Result<()> {
    let mut cache = TextureCache::default();
    cache.add_texture("a.png", pixel_texture(7))?;
    let h1 = cache.get_handle("a.png");
    let h2 = cache.get_handle("a.png");
    assert_eq!(h1, h2);
    assert_eq!(cache.get(h1), Some(&pixel_texture(7)));
    assert_eq!(cache.get_texture("a.png"), cache.get(h2));
    Ok(())
}

#[test]
fn duplicate_texture_path_policies() -> anyhow::Result<()> {
    let mut reject = TextureCache::new(DuplicatePolicy::Reject);
    let first = reject.add_texture("x", pixel_texture(1))?;
    match reject.add_texture("x", pixel_texture(2)) {
        Err(EngineError::DuplicateTexturePath { path, existing }) => {
            assert_eq!(path, "x");
            assert_eq!(existing, first);
        }
        other => panic!("expected duplicate error, got {other:?}"),
    }
    assert_eq!(reject.len(), 1);

    let mut reuse = TextureCache::new(DuplicatePolicy::Reuse);
    let first = reuse.add_texture("x", pixel_texture(1))?;
    assert_eq!(reuse.add_texture("x", pixel_texture(2))?, first);
    assert_eq!(reuse.len(), 1);
    assert_eq!(reuse.get_texture("x"), Some(&pixel_texture(1)));
    Ok(())
}

#[test]
fn config_selects_texture_policy() -> anyhow::Result<()> {
    let cfg = EngineConfig::from_json_str(r#"{"duplicate_textures":"reuse"}"#)?;
    let mut ctx = EngineContext::new(cfg);
    let a = ctx.textures.add_texture("t", pixel_texture(0))?;
    let b = ctx.textures.add_texture("t", pixel_texture(1))?;
    assert_eq!(a, b);
    Ok(())
}

#[derive(Default)]
struct CountingBridge {
    calls: usize,
}

impl HostBridge for CountingBridge {
    fn invoke_callback(&mut self, _ctx: &mut EngineContext, _callback: Handle, _args: Option<ArrayTransfer<'_>>) {
        self.calls += 1;
    }
}

#[test]
fn unbound_callback_is_a_silent_no_op() {
    let mut ctx = context();
    let mut bridge = CountingBridge::default();
    let cb = ManagedCallback::default();
    assert!(!cb.is_bound());
    cb.invoke(&mut bridge, &mut ctx);
    cb.invoke_with(&mut bridge, &mut ctx, ArrayTransfer::empty());
    assert_eq!(bridge.calls, 0);
}

/// Managed code re-entering the registry while native code walks a handle
/// snapshot.
struct Cloner;

impl HostBridge for Cloner {
    fn invoke_callback(&mut self, ctx: &mut EngineContext, callback: Handle, _args: Option<ArrayTransfer<'_>>) {
        let Some(pos) = ctx.entities.get(callback).map(|e| e.common().position) else {
            return;
        };
        let h = ctx.entities.create_entity();
        if let Some(e) = ctx.entities.get_mut(h) {
            e.common_mut().position = pos;
        }
    }
}

#[test]
fn callbacks_may_add_during_snapshot_iteration() {
    let mut ctx = context();
    for _ in 0..3 {
        ctx.entities.create_entity();
    }
    for h in ctx.entities.handles() {
        ManagedCallback::new(h).invoke(&mut Cloner, &mut ctx);
    }
    assert_eq!(ctx.entities.len(), 6);
}

#[test]
fn interop_builds_a_renderable_scene() {
    let mut ctx = context();
    let verts = vertex_bytes(4);
    let pixels = [0u8; 4];

    let tex = interop::texture_load(&mut ctx, "px.png", 1, 1, 0, ArrayTransfer::new(1, &pixels));
    let obj = interop::scene_create_static_mesh(&mut ctx, ArrayTransfer::new(4, &verts), tex);
    let ent = interop::entity_create(&mut ctx, 1);
    assert!(interop::entity_attach_mesh(&mut ctx, ent, obj, tex));
    assert!(interop::entity_set_position(&mut ctx, ent, 0.0, 5.0, 0.0));

    ctx.sync_scene();
    let mesh = ctx.scene.get_specific::<StaticMesh>(Handle::from_raw(obj)).unwrap();
    assert_eq!(mesh.vertex_count, 4);
    assert_eq!(mesh.transform.position, Vec3::new(0.0, 5.0, 0.0));
    assert_eq!(mesh.texture.to_raw(), tex);

    let calls = ctx.scene.collect_draw_calls();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].object.to_raw(), obj);
}

#[test]
fn handles_from_different_stores_do_not_alias() {
    let mut ctx = context();
    let entity = ctx.entities.create_entity();
    let object = ctx.scene.create_debug_marker([1.0; 4]);
    // Both stores start counting at 1.
    assert_eq!(entity.to_raw(), object.to_raw());
    assert!(ctx.entities.get_specific::<BaseEntity>(entity).is_some());
    assert!(ctx.scene.get(object).is_some());
    assert!(ctx.scene.get(Handle::from_raw(2)).is_none());
}
