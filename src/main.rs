//! MangaDex facade - a read-only JSON gateway over the MangaDex catalog.
//!
//! This binary loads configuration, binds the HTTP listener, starts the
//! one-time service-account login and serves until SIGINT/SIGTERM.

use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;
use tokio::signal;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use mangadex_facade::{config::Config, create_router, Bootstrapper, MangaDexClient, Session};

#[tokio::main]
async fn main() -> ExitCode {
    // A missing .env file is not an error
    dotenvy::dotenv().ok();

    let config = Config::parse();

    init_logging(config.verbose);

    if let Err(e) = config.validate() {
        error!("Configuration error: {}", e);
        return ExitCode::FAILURE;
    }

    print_banner();

    info!("Configuration:");
    info!("  Upstream API: {}", config.api_url);
    info!("  Auth endpoint: {}", config.auth_url);
    match config.upstream_timeout {
        Some(secs) => info!("  Upstream timeout: {}s", secs),
        None => info!("  Upstream timeout: none"),
    }
    info!(
        "  JSON output: {}",
        if config.compact_json { "compact" } else { "pretty" }
    );
    info!(
        "  Account: {}",
        if config.username.is_empty() {
            "<unset>"
        } else {
            config.username.as_str()
        }
    );

    let missing = config.missing_credentials();
    if !missing.is_empty() {
        warn!("  Credentials not set: {}", missing.join(", "));
        warn!("        Login will fail; upstream calls will be made without a session");
    }

    let session = Arc::new(Session::new());
    let client = match MangaDexClient::new(
        config.api_url.clone(),
        config.auth_url.clone(),
        config.upstream_timeout(),
        Arc::clone(&session),
    ) {
        Ok(client) => Arc::new(client),
        Err(e) => {
            error!("Failed to create upstream client: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let router = create_router(Arc::clone(&client), Arc::clone(&session), config.router_config());

    let addr = config.bind_address();
    let listener = match tokio::net::TcpListener::bind(&addr).await {
        Ok(listener) => listener,
        Err(e) => {
            error!("Failed to bind to {}: {}", addr, e);
            return ExitCode::FAILURE;
        }
    };

    info!("");
    info!("────────────────────────────────────────────────────────────────");
    info!("  Server listening on: http://{}", addr);
    info!("");
    info!("  Try these endpoints:");
    info!("    curl http://{}/health", addr);
    info!("    curl http://{}/manga?title=berserk", addr);
    info!("");
    info!("  Route documentation:");
    info!("    open http://{}/", addr);
    info!("────────────────────────────────────────────────────────────────");
    info!("");

    // Login runs once the port is open; requests are served meanwhile.
    tokio::spawn(Bootstrapper::new(client, session, config.credentials()).run());

    if let Err(e) = axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await
    {
        error!("Server error: {}", e);
        return ExitCode::FAILURE;
    }

    info!("Server shutdown complete");
    ExitCode::SUCCESS
}

/// Print the startup banner.
fn print_banner() {
    let version = env!("CARGO_PKG_VERSION");
    info!("");
    info!("┌──────────────────────────────────────┐");
    info!("│   MangaDex Facade  v{:<17}│", version);
    info!("│   read-only catalog gateway          │");
    info!("└──────────────────────────────────────┘");
    info!("");
}

/// Initialize the tracing/logging subsystem.
fn init_logging(verbose: bool) {
    let env_filter = if verbose {
        "mangadex_facade=debug,tower_http=debug"
    } else {
        "mangadex_facade=info,tower_http=info"
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| env_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}

/// Resolve on SIGINT or, on Unix, SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => info!("Received Ctrl+C, shutting down"),
        () = terminate => info!("Received SIGTERM, shutting down"),
    }
}
