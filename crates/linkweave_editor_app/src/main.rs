// SPDX-License-Identifier: MIT OR Apache-2.0
//! `Linkweave` Editor - headless connection driver
//!
//! Builds a small scene and replays a scripted editing session against the
//! connection core: creating links by dragging from ports, re-dragging an
//! end, abandoning drags and deleting nodes.
//!
//! Usage: `linkweave_editor [scene-config.ron]`

mod catalog;
mod replay;

use linkweave_editor_graph::SceneConfig;
use std::path::PathBuf;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

fn main() {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("linkweave_editor=info,linkweave_editor_graph=debug"));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting Linkweave Editor v{}", env!("CARGO_PKG_VERSION"));

    if let Err(e) = run(std::env::args_os().nth(1).map(PathBuf::from)) {
        tracing::error!("Replay failed: {e}");
        std::process::exit(1);
    }
}

fn run(config_path: Option<PathBuf>) -> Result<(), replay::AppError> {
    let config = match config_path {
        Some(path) => {
            tracing::info!("Loading scene config from {}", path.display());
            SceneConfig::load(&path)?
        }
        None => SceneConfig::default(),
    };

    let catalog = catalog::create_demo_catalog();
    let report = replay::replay(config, &catalog)?;

    tracing::info!(
        "{} node(s), {} connection(s); {} drop(s) accepted, {} rejected",
        report.nodes,
        report.connections,
        report.accepted,
        report.rejected
    );
    Ok(())
}
