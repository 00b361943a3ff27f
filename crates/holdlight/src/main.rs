//! Holdlight - LED climbing-wall panel controller
//!
//! `holdlight run` drives a panel with the configured fill and transport;
//! `holdlight check` validates a layout file.

mod cli;
mod config;
mod logging_setup;
mod setup;

use anyhow::{Context, Result};
use clap::Parser;
use std::path::Path;
use std::time::Duration;
use tracing::{info, warn};

use holdlight_control::{shared, Controller};
use holdlight_core::layout;

use crate::cli::{CliArgs, CliCommand};
use crate::config::AppConfig;

fn main() -> Result<()> {
    let args = CliArgs::parse();
    match args.command {
        CliCommand::Run {
            config,
            frames,
            interval_ms,
        } => run(config.as_deref(), frames, interval_ms),
        CliCommand::Check { layout, panel_id } => check(&layout, panel_id),
    }
}

fn run(config_path: Option<&Path>, frames: Option<u64>, interval_ms: Option<u64>) -> Result<()> {
    let mut config = match config_path {
        Some(path) => AppConfig::load(path)?,
        None => AppConfig::default(),
    };
    if frames.is_some() {
        config.runner.max_frames = frames;
    }
    if let Some(interval_ms) = interval_ms {
        config.runner.interval_ms = interval_ms;
    }

    let _log_guard = logging_setup::init(&config.log)?;
    info!("Holdlight {} starting", env!("CARGO_PKG_VERSION"));

    let panel = setup::build_panel(&config.panel)?;
    let renderer = setup::build_renderer(&config.renderer, &panel)?;

    let mut controller = Controller::new(shared(panel), renderer);
    controller
        .run(config.fill.build(), config.runner.clone())
        .context("Failed to start runner")?;

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("Failed to create signal runtime")?;
    runtime.block_on(wait_for_shutdown(&controller));

    let Some(report) = controller.stop() else {
        return Ok(());
    };
    info!(
        "Finished: {} frames, {} dropped",
        report.frames, report.dropped_frames
    );
    report.result.context("Runner stopped with an error")
}

/// Resolve on Ctrl-C or when the runner stops on its own.
async fn wait_for_shutdown(controller: &Controller) {
    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);
    let mut signals = true;
    let mut poll = tokio::time::interval(Duration::from_millis(100));

    loop {
        tokio::select! {
            result = &mut ctrl_c, if signals => match result {
                Ok(()) => {
                    info!("Interrupted, stopping");
                    return;
                }
                Err(e) => {
                    warn!("Ctrl-C handler unavailable: {}", e);
                    signals = false;
                }
            },
            _ = poll.tick() => {
                if !controller.is_running() {
                    return;
                }
            }
        }
    }
}

fn check(path: &Path, panel_id: Option<i32>) -> Result<()> {
    let panel = match panel_id {
        Some(id) => layout::load_panel(path, id),
        None => layout::load(path),
    }
    .with_context(|| format!("Invalid layout {:?}", path))?;

    println!(
        "{}: {} pixels, {}x{}",
        path.display(),
        panel.len(),
        panel.width(),
        panel.height()
    );
    for (universe, channels) in panel.addresses_by_universe() {
        let first = channels.first().copied().unwrap_or_default();
        let last = channels.last().copied().unwrap_or_default();
        println!(
            "  universe {}: {} channels in use ({}..={})",
            universe,
            channels.len(),
            first,
            last
        );
    }
    for (group, locations) in panel.groups() {
        println!("  group {}: {} pixels", group, locations.len());
    }
    Ok(())
}
