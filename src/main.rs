//! Buildstamp: a status page for container smoke tests.
//!
//! This is the application entry point. It initializes tracing, loads
//! configuration, captures build metadata from the environment, sets up the
//! Axum router and starts the HTTP server.

use std::sync::Arc;

use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use buildstamp::config::{AppConfig, BuildInfo, DEFAULT_LOG_FILTER};
use buildstamp::http::start_server;
use buildstamp::routes::create_router;
use buildstamp::runtime::{DisabledConnector, DockerConnector, RuntimeConnector};
use buildstamp::state::AppState;
use buildstamp::templates::init_templates;

/// Buildstamp: build metadata and container identity status page
#[derive(Parser, Debug)]
#[command(name = "buildstamp", version, about)]
struct Args {
    /// Path to configuration file (built-in defaults when omitted)
    #[arg(short, long)]
    config: Option<String>,

    /// Log level filter (e.g., "buildstamp=debug,tower_http=info")
    #[arg(short, long)]
    log_level: Option<String>,

    /// Address to listen on (overrides http.host)
    #[arg(long)]
    host: Option<String>,

    /// Port to listen on (overrides http.port)
    #[arg(short, long)]
    port: Option<u16>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    // Load configuration before tracing so the log format is known
    let mut config = match &args.config {
        Some(path) => AppConfig::load(path)?,
        None => AppConfig::default(),
    };

    // Initialize tracing with priority: CLI > env > default
    let log_filter = args
        .log_level
        .or_else(|| std::env::var("RUST_LOG").ok())
        .unwrap_or_else(|| DEFAULT_LOG_FILTER.to_string());

    let registry =
        tracing_subscriber::registry().with(tracing_subscriber::EnvFilter::new(&log_filter));
    if config.logging.is_json() {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }

    if let Some(host) = args.host {
        config.http.host = host;
    }
    if let Some(port) = args.port {
        config.http.port = port;
    }

    tracing::info!(
        config = args.config.as_deref().unwrap_or("<defaults>"),
        "Loaded configuration"
    );

    let build = BuildInfo::from_env();
    tracing::info!(
        image = %build.image_name,
        commit = %build.git_commit,
        built = %build.build_date,
        "Captured build metadata"
    );

    let runtime: Arc<dyn RuntimeConnector> = if config.docker.enabled {
        tracing::info!(
            socket = config.docker.socket.as_deref().unwrap_or("<local default>"),
            timeout_secs = config.docker.timeout_seconds,
            "Docker lookup enabled"
        );
        Arc::new(DockerConnector::new(&config.docker))
    } else {
        tracing::info!("Docker lookup disabled");
        Arc::new(DisabledConnector)
    };

    let tera = init_templates()?;
    tracing::info!("Initialized templates");

    let http_config = config.http.clone();
    let state = AppState::new(config, build, tera, runtime);
    let app = create_router(state);

    start_server(app, &http_config).await?;

    Ok(())
}
