//! Black Stories web server: streams AI games and hosts per-turn sessions.

mod routes;
mod state;
mod stream;

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use axum::http::HeaderName;
use clap::Parser;
use game::io::config::{ProviderSettings, load_config};
use game::io::provider::HttpProvider;
use game::modes::GameContext;
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::ServeDir;
use tracing::info;

use crate::state::AppState;

#[derive(Parser)]
#[command(name = "black-stories-ui")]
#[command(about = "Web server for Black Stories games")]
struct Args {
    /// Address to bind the server to
    #[arg(long, default_value = "127.0.0.1")]
    bind: String,

    /// Port to listen on
    #[arg(long, default_value = "5000")]
    port: u16,

    /// TOML configuration file. Missing file means defaults.
    #[arg(long, env = "BLACK_STORIES_CONFIG", default_value = "black-stories.toml")]
    config: PathBuf,

    /// Write a transcript of each finished single-detective game here.
    #[arg(long)]
    transcript_dir: Option<PathBuf>,

    /// Directory containing UI static files (defaults to ./web)
    #[arg(long)]
    ui_dir: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("game_ui=info".parse()?)
                .add_directive("game=info".parse()?),
        )
        .init();

    let args = Args::parse();

    let mut config = load_config(&args.config)?;
    if let Some(dir) = args.transcript_dir {
        config.transcript_dir = Some(dir);
    }
    let settings = ProviderSettings::from_env(&config);
    // The blocking HTTP client must be built off the async runtime.
    let provider = tokio::task::spawn_blocking(move || HttpProvider::new(settings))
        .await
        .context("join provider setup")?
        .context("create provider")?;
    let state = AppState::new(GameContext::new(Arc::new(provider), config));

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any)
        .expose_headers([HeaderName::from_static(routes::SESSION_HEADER)]);

    let mut app = routes::router().layer(cors).with_state(state);

    let ui_dir = args.ui_dir.unwrap_or_else(|| PathBuf::from("web"));
    if ui_dir.exists() {
        info!(ui_dir = %ui_dir.display(), "serving static UI files");
        app = app.fallback_service(ServeDir::new(ui_dir).append_index_html_on_directories(true));
    } else {
        info!(ui_dir = %ui_dir.display(), "UI directory not found, API-only mode");
    }

    let addr: SocketAddr = format!("{}:{}", args.bind, args.port).parse()?;
    info!(addr = %addr, "listening");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
