use std::net::SocketAddr;
use std::path::PathBuf;

use anyhow::Context;
use axum::Router;
use clap::Parser;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use chathub::config::Config;
use chathub::routes;
use chathub::storage::{create_store, StoreConfig};
use chathub::ws::ChatHub;
use chathub::AppState;

#[derive(Parser, Debug)]
#[command(name = "chathub")]
#[command(about = "Real-time chat server with object-store file sharing")]
#[command(version)]
struct Cli {
    /// Port to listen on
    #[arg(short, long, env = "CHATHUB_PORT", default_value = "8080")]
    port: u16,

    /// Address to bind to
    #[arg(short, long, env = "CHATHUB_BIND", default_value = "0.0.0.0")]
    bind: String,

    /// Root directory for stored files
    #[arg(short, long, env = "CHATHUB_STORAGE_ROOT", default_value = "./chat-data")]
    storage_root: PathBuf,

    /// Directory holding the browser UI
    #[arg(long, env = "CHATHUB_STATIC_DIR", default_value = "./static")]
    static_dir: PathBuf,

    /// Enable verbose logging
    #[arg(long, env = "CHATHUB_VERBOSE")]
    verbose: bool,

    /// Config file path (optional)
    #[arg(short, long, env = "CHATHUB_CONFIG")]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize tracing
    let filter = if cli.verbose {
        "chathub=debug,tower_http=debug"
    } else {
        "chathub=info,tower_http=info"
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| filter.into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load config from file if provided, otherwise use defaults
    let config = if let Some(config_path) = &cli.config {
        Config::from_file(config_path)?
    } else {
        Config::default()
    };

    // Object storage must be reachable before we accept any traffic.
    let store = create_store(StoreConfig::Local {
        root: cli.storage_root.clone(),
        bucket: config.bucket.clone(),
    });
    store
        .ensure_bucket()
        .await
        .context("failed to initialize object storage")?;
    info!(
        "Object storage ready: {}/{}",
        cli.storage_root.display(),
        config.bucket
    );

    let hub = ChatHub::start();
    let state = AppState::new(hub, store, config);

    // Build CORS layer
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    // Build router
    let app = Router::new()
        .merge(routes::app_routes(
            &cli.static_dir,
            state.config.max_upload_size,
        ))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    // Start server
    let addr: SocketAddr = format!("{}:{}", cli.bind, cli.port).parse()?;
    info!("Starting chathub on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
