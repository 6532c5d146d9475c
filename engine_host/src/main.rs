//! Standalone host binary.
//!
//! Usage:
//!   cargo run -p engine_host -- [--config engine.json] [--tick-hz 64] [--ticks 256]
//!                               [--bodies 16] [--seed 1] [--server]
//!
//! Spawns demo content into a fresh engine context and runs the fixed-tick
//! loop. `--ticks 0` runs until interrupted.

use std::env;

use anyhow::Context;
use engine_core::config::{EngineConfig, ExecutionContext};
use engine_host::Host;
use tracing::info;

struct Args {
    cfg: EngineConfig,
    ticks: u32,
    bodies: usize,
    seed: u64,
}

fn parse_args() -> anyhow::Result<Args> {
    let argv: Vec<String> = env::args().collect();

    let mut cfg = EngineConfig::default();
    if let Some(i) = argv.iter().position(|a| a == "--config") {
        let path = argv.get(i + 1).context("--config needs a path")?;
        cfg = EngineConfig::load(path).with_context(|| format!("load config {path}"))?;
    }

    let mut args = Args {
        cfg,
        ticks: 256,
        bodies: 16,
        seed: 1,
    };
    let mut i = 1;
    while i < argv.len() {
        match argv[i].as_str() {
            "--tick-hz" if i + 1 < argv.len() => {
                args.cfg.tick_hz = argv[i + 1].parse().unwrap_or(64);
                i += 2;
            }
            "--ticks" if i + 1 < argv.len() => {
                args.ticks = argv[i + 1].parse().unwrap_or(256);
                i += 2;
            }
            "--bodies" if i + 1 < argv.len() => {
                args.bodies = argv[i + 1].parse().unwrap_or(16);
                i += 2;
            }
            "--seed" if i + 1 < argv.len() => {
                args.seed = argv[i + 1].parse().unwrap_or(1);
                i += 2;
            }
            "--server" => {
                args.cfg.execution = ExecutionContext::Server;
                i += 1;
            }
            _ => i += 1,
        }
    }
    Ok(args)
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    let args = parse_args()?;

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| args.cfg.log_filter.as_str().into()),
        )
        .init();

    info!(
        execution = ?args.cfg.execution,
        tick_hz = args.cfg.tick_hz,
        ticks = args.ticks,
        "Starting host"
    );

    let mut host = Host::new(args.cfg);
    host.populate_demo(args.bodies, args.seed).context("populate demo")?;

    if args.ticks == 0 {
        loop {
            host.run_for_ticks(host.ctx.config.tick_hz.max(1)).await?;
            for line in host.status() {
                info!("{line}");
            }
        }
    }

    host.run_for_ticks(args.ticks).await?;
    for line in host.status() {
        println!("{line}");
    }
    host.shutdown();
    Ok(())
}
