//! lyricsync - time-synced lyrics for whatever is playing
//!
//! Follows an MPRIS player through `playerctl`, fetches lyrics from lrclib
//! and keeps a centered window of lines around the one being sung.

mod cache;
mod config;
mod diagnostics;
mod lyrics;
mod player;
mod render;
mod sync;
mod window;

use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;

use crate::config::{Args, Config};
use crate::diagnostics::{Diagnostics, FileDiagnostics, NullDiagnostics};
use crate::lyrics::LrclibClient;
use crate::player::{PlayerctlPlayer, choose_player};
use crate::render::TerminalRenderer;
use crate::sync::{LyricsResolver, SyncOrchestrator};

fn open_diagnostics(config: &Config) -> Arc<dyn Diagnostics> {
    match FileDiagnostics::open(&config.log_file) {
        Ok(log) => {
            tracing::debug!("Diagnostic log at {:?}", log.path());
            Arc::new(log)
        }
        Err(e) => {
            tracing::warn!(
                "Failed to open diagnostic log {:?}: {}",
                config.log_file,
                e
            );
            Arc::new(NullDiagnostics)
        }
    }
}

async fn run(config: Config) -> Result<()> {
    let diagnostics = open_diagnostics(&config);
    let mut renderer = TerminalRenderer::new();

    let player_name = match choose_player(config.player.as_deref()).await {
        Ok(name) => name,
        Err(e) => {
            tracing::info!("Player discovery failed: {}", e);
            renderer.message("❌ No active player found")?;
            return Ok(());
        }
    };

    let source = LrclibClient::new().context("Failed to create lyrics client")?;
    let resolver = Arc::new(LyricsResolver::new(
        source,
        config.cache_size,
        Arc::clone(&diagnostics),
    ));
    let player = PlayerctlPlayer::new(player_name, diagnostics);
    tracing::info!(
        "Following {} with a {}-line window and {} cached songs",
        player.name(),
        config.window.size(),
        config.cache_size
    );

    let mut sync = SyncOrchestrator::new(player, resolver, renderer, config.window);
    sync.run(async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::warn!("Failed to listen for Ctrl-C: {}", e);
            std::future::pending::<()>().await;
        }
    })
    .await;

    sync.renderer_mut()
        .finish("Exited lyrics display")
        .context("Failed to restore terminal")?;
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let config = match Config::from_args(args) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("error: {}", e);
            std::process::exit(2);
        }
    };

    tracing_subscriber::fmt()
        .with_max_level(config.log_level())
        .with_writer(std::io::stderr)
        .init();

    run(config).await
}
