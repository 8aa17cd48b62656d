use anyhow::{Context, Result};
use clap::Parser;
use multiban::tui::{Outcome, TerminalGame, TerminalInput, TerminalRenderer};
use multiban::{GameMap, GameState};
use std::io;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;

#[derive(Parser)]
#[command(name = "multiban")]
#[command(about = "A multi-player Sokoban game", long_about = None)]
struct Args {
    /// Path to the map file (first line is the undo limit, -1 for unlimited)
    #[arg(value_name = "MAP")]
    map_file: PathBuf,

    /// Default log level when RUST_LOG is not set
    #[arg(long, default_value = "warn")]
    log_level: tracing::Level,
}

fn main() -> Result<()> {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env().add_directive(args.log_level.into()),
        )
        .with_writer(io::stderr)
        .init();

    let map = GameMap::from_file(&args.map_file)
        .with_context(|| format!("failed to load map {}", args.map_file.display()))?;
    let state = GameState::new(Arc::new(map));

    let stdin = io::stdin();
    let mut game = TerminalGame::new(
        state,
        TerminalInput::new(stdin.lock()),
        TerminalRenderer::new(io::stdout()),
    )?;

    match game.run()? {
        Outcome::Won => info!("game won"),
        Outcome::Exited => info!("game exited"),
    }
    Ok(())
}
