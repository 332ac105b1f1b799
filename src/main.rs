use std::sync::Arc;

use clap::Parser;
use sketchboard::shell::{CliError, Flow, Shell};
use sketchboard::{
    BoardId, Config, ConsoleSink, ErrorCode, HttpShapeStore, MemoryShapeStore, ShapeStore, SyncEngine,
};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "sketchboard", about = "Multi-board sketch shell backed by a shape store")]
struct Cli {
    /// Shapes endpoint of the store API.
    #[arg(long, env = "SKETCHBOARD_API_URL")]
    api_url: Option<String>,

    /// Keep shapes in memory instead of talking to the API.
    #[arg(long)]
    offline: bool,

    /// Board to open at startup.
    #[arg(long, env = "SKETCHBOARD_DEFAULT_BOARD")]
    board: Option<String>,
}

#[tokio::main]
async fn main() -> Result<(), CliError> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let mut config = Config::from_env()?;
    if let Some(url) = cli.api_url {
        config.api_url = url.trim_end_matches('/').to_owned();
    }
    if let Some(board) = cli.board {
        config.default_board = BoardId::parse(&board).map_err(sketchboard::ConfigError::from)?;
    }

    let store: Arc<dyn ShapeStore> = if cli.offline {
        Arc::new(MemoryShapeStore::new())
    } else {
        Arc::new(HttpShapeStore::from_config(&config)?)
    };
    let engine = SyncEngine::with_initial_board(store, Arc::new(ConsoleSink::new()), config.default_board.clone());
    tracing::info!(board = %config.default_board, api_url = %config.api_url, offline = cli.offline, "sketchboard starting");

    if let Err(e) = engine.switch_board(&config.default_board).await {
        report(&CliError::from(e));
    }

    let mut shell = Shell::new(engine, config.style, std::io::stdout());
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        match shell.run_line(&line).await {
            Ok(Flow::Continue) => {}
            Ok(Flow::Quit) => break,
            Err(e) => report(&e),
        }
    }
    Ok(())
}

fn report(e: &CliError) {
    let hint = if e.retryable() { " (retryable)" } else { "" };
    eprintln!("error [{}]: {e}{hint}", e.error_code());
}
