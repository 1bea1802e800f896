//! fordon-server - Fordonsfil registry service
//!
//! Accepts uploads of fixed-width Swedish vehicle registry files,
//! reconciles them into SQLite and serves a browse/upload web UI.

use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;
use tracing::info;

use fordon_common::config::Settings;
use fordon_server::{build_router, AppState};

#[derive(Parser, Debug)]
#[command(name = "fordon-server", about = "Fordonsfil registry service")]
struct Args {
    /// Root folder for persistent data (overrides FORDON_ROOT and config file)
    #[arg(long)]
    root_folder: Option<PathBuf>,

    /// HTTP listen port (overrides FORDON_PORT and config file)
    #[arg(long)]
    port: Option<u16>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    info!("Starting fordon-server v{}", env!("CARGO_PKG_VERSION"));

    let args = Args::parse();
    let settings = Settings::resolve(args.root_folder, args.port)?;
    settings.ensure_root_folder()?;

    let db_path = settings.database_path();
    info!("Database: {}", db_path.display());

    // A database that cannot be opened is fatal; per-line trouble never is
    let pool = fordon_common::db::init_database(&db_path).await?;

    let state = AppState::new(pool);
    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind(("0.0.0.0", settings.port)).await?;
    info!("fordon-server listening on http://0.0.0.0:{}", settings.port);
    info!("Web UI: http://localhost:{}/", settings.port);

    axum::serve(listener, app).await?;

    Ok(())
}
