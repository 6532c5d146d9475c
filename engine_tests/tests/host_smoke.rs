use engine_core::{config::EngineConfig, entity::RigidBody};
use engine_host::Host;
use engine_tests::init_tracing;

/// Smoke test: host can run a few ticks without panicking.
#[tokio::test]
async fn host_runs_few_ticks() -> anyhow::Result<()> {
    init_tracing();
    let mut host = Host::new(EngineConfig {
        tick_hz: 256,
        ..Default::default()
    });
    host.populate_demo(4, 3)?;
    host.run_for_ticks(8).await?;

    assert_eq!(host.ctx.tick(), 8);
    assert_eq!(host.scripts.invocations(), 8);
    assert_eq!(host.renderer.frames, 8);
    Ok(())
}

#[test]
fn bodies_fall_between_ticks() -> anyhow::Result<()> {
    let mut host = Host::new(EngineConfig::default());
    host.populate_demo(3, 11)?;

    let mut before = Vec::new();
    host.ctx
        .entities
        .for_each_specific::<RigidBody>(|h, b| before.push((h, b.common.position.z)));
    host.step(1.0 / 64.0);

    for (h, z) in before {
        let body = host.ctx.entities.get_specific::<RigidBody>(h).unwrap();
        assert!(body.common.position.z < z);
    }
    Ok(())
}

#[test]
fn shutdown_leaves_an_empty_context() -> anyhow::Result<()> {
    let mut host = Host::new(EngineConfig::default());
    host.populate_demo(2, 5)?;
    host.shutdown();
    assert!(host.ctx.entities.is_empty());
    assert!(host.ctx.scene.is_empty());
    assert!(!host.ctx.on_tick.is_bound());
    // The unbound hook must not reach the script host.
    host.step(1.0 / 64.0);
    assert_eq!(host.scripts.invocations(), 0);
    Ok(())
}
