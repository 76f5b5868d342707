// ABOUTME: Entry point for the frameio binary.
// ABOUTME: Parses CLI arguments, loads env config, initializes tracing, and runs the gateway.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use frameio_server::{AppState, FrameioConfig, SharedState, create_router};
use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;

const SWEEP_INTERVAL: Duration = Duration::from_secs(5 * 60);

/// Frameio gateway: gates dashboard and admin routes and proxies admin calls to the backend.
#[derive(Parser)]
#[command(name = "frameio")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the gateway (default)
    Serve {
        /// Address to listen on (overrides FRAMEIO_BIND)
        #[arg(long)]
        bind: Option<SocketAddr>,

        /// Backend API base URL (overrides FRAMEIO_BACKEND_URL)
        #[arg(long)]
        backend_url: Option<String>,

        /// Pre-built page bundle to serve (overrides FRAMEIO_STATIC_DIR)
        #[arg(long)]
        static_dir: Option<PathBuf>,
    },

    /// Print an Argon2 hash for FRAMEIO_ADMIN_PASSWORD_HASH
    HashPassword {
        /// Password to hash
        password: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(
                "frameio=debug,frameio_server=debug,frameio_core=debug,tower_http=debug",
            )
        }))
        .init();

    let cli = Cli::parse();
    match cli.command {
        Some(Commands::HashPassword { password }) => {
            let phc = frameio_core::hash_password(&password).context("failed to hash password")?;
            println!("{phc}");
            Ok(())
        }
        Some(Commands::Serve {
            bind,
            backend_url,
            static_dir,
        }) => serve(bind, backend_url, static_dir).await,
        None => serve(None, None, None).await,
    }
}

async fn serve(
    bind: Option<SocketAddr>,
    backend_url: Option<String>,
    static_dir: Option<PathBuf>,
) -> Result<()> {
    let mut config = FrameioConfig::from_env().context("invalid configuration")?;
    if let Some(bind) = bind {
        config.set_bind(bind);
    }
    if let Some(url) = backend_url {
        config
            .set_backend_url(url)
            .context("invalid --backend-url")?;
    }
    if let Some(dir) = static_dir {
        config.static_dir = Some(dir);
    }

    let state: SharedState = Arc::new(
        AppState::from_config(config).context("failed to initialize gateway state")?,
    );

    if state.admin.is_none() {
        tracing::warn!("no admin account configured; admin login is disabled");
    }
    if state.identity.is_none() {
        tracing::warn!("no identity key configured; protected routes will reject every request");
    }

    let sweeper = tokio::spawn(sweep_sessions(SharedState::clone(&state)));

    let bind = state.config.bind;
    let listener = TcpListener::bind(bind)
        .await
        .with_context(|| format!("failed to bind {bind}"))?;
    tracing::info!(
        %bind,
        backend = %state.backend.base_url(),
        static_dir = ?state.config.static_dir,
        "frameio gateway listening"
    );

    axum::serve(listener, create_router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    sweeper.abort();
    tracing::info!("frameio gateway stopped");
    Ok(())
}

/// Periodically drop expired admin sessions.
async fn sweep_sessions(state: SharedState) {
    let mut ticker = tokio::time::interval(SWEEP_INTERVAL);
    ticker.tick().await;
    loop {
        ticker.tick().await;
        let removed = state.sessions.sweep().await;
        if removed > 0 {
            tracing::debug!(removed, "swept expired admin sessions");
        }
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{SignalKind, signal};
        match signal(SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to listen for SIGTERM");
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
    tracing::info!("shutdown signal received");
}
