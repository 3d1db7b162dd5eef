use std::env;
use std::net::SocketAddr;
use tokio::net::TcpListener;
use tokio::signal;
use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};

use employee_hierarchy::config::{DatabaseType, LogFormat};
use employee_hierarchy::{db, routes, AppState, Config};

const DEFAULT_CONFIG_PATH: &str = "./etc/employee-hierarchy.toml";
const DEFAULT_ADDR: &str = "0.0.0.0:3000";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Parse command line arguments
    let args: Vec<String> = env::args().collect();
    if args.iter().any(|arg| arg == "-help" || arg == "--help") {
        println!("Usage: employee-hierarchy [OPTIONS]");
        println!("Options:");
        println!("  -config <path>  Path to configuration file (default: {})", DEFAULT_CONFIG_PATH);
        println!("  -help, --help   Print this help message");
        return Ok(());
    }

    let config_path = args
        .iter()
        .skip_while(|arg| arg.as_str() != "-config")
        .nth(1)
        .map(|s| s.to_string())
        .unwrap_or_else(|| DEFAULT_CONFIG_PATH.to_string());

    // Load configuration first (before logging init)
    let config = Config::load(&config_path).unwrap_or_else(|e| {
        eprintln!("Could not load config file: {}, using defaults", e);
        let mut config = Config::default();
        config.apply_env();
        config
    });

    init_logging(&config);

    info!("Starting Employee Hierarchy server...");
    info!("Loading configuration from: {}", config_path);

    let state = match config.database.db_type {
        DatabaseType::Postgres => {
            let db_conn = db::init_database(&config.database).await.map_err(|e| {
                tracing::error!("Database initialization failed: {}", e);
                anyhow::anyhow!("Database initialization failed: {}", e)
            })?;
            AppState::with_database(config.clone(), db_conn)
        }
        DatabaseType::Memory => {
            tracing::warn!("Using in-memory storage; data is lost on shutdown");
            AppState::in_memory(config.clone())
        }
    };

    let app = routes::create_router(state);

    let addr: SocketAddr = match config.addr.parse() {
        Ok(addr) => addr,
        Err(_) => {
            tracing::warn!("Invalid address '{}', using default {}", config.addr, DEFAULT_ADDR);
            DEFAULT_ADDR.parse()?
        }
    };

    info!("Server listening on {}", addr);

    let listener = TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server stopped");
    Ok(())
}

/// Priority: RUST_LOG env var > config file > default "info"
fn init_logging(config: &Config) {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log.level));

    match config.log.format {
        LogFormat::Pretty => fmt::fmt()
            .with_env_filter(env_filter)
            .with_target(true)
            .with_thread_ids(true)
            .with_file(true)
            .with_line_number(true)
            .init(),
        LogFormat::Json => fmt::fmt()
            .json()
            .with_env_filter(env_filter)
            .with_current_span(false)
            .init(),
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Shutdown signal received, draining connections");
}
