//! webssh-server binary: load config, bind, serve until Ctrl-C.

mod cli;

use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use tokio::net::TcpListener;
use tokio::sync::watch;
use webssh_config::{config_to_json, validation, ServerConfig};
use webssh_remote::{SshConnector, SshOptions};
use webssh_server::registry::SessionRegistry;

use crate::cli::Args;

/// How long live sessions get to wind down after Ctrl-C.
const SHUTDOWN_GRACE: Duration = Duration::from_secs(5);

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    let config = load(&args)?;

    if args.print_config {
        println!("{}", config_to_json(&config));
        return Ok(());
    }

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| config.logging.directive().into()),
        )
        .init();

    let addr = config.server.bind_address();
    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;

    tracing::info!(
        %addr,
        mode = ?config.server.mode,
        ws_path = %config.server.ws_path,
        "webssh-server listening"
    );

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("Ctrl-C received, shutting down");
            let _ = shutdown_tx.send(true);
        }
    });

    let registry = SessionRegistry::new();

    let stats = registry.clone();
    tokio::spawn(async move {
        loop {
            tokio::time::sleep(Duration::from_secs(60)).await;
            stats.log_counts().await;
        }
    });

    let options = SshOptions {
        term: config.ssh.term.clone(),
        keepalive_interval: config.ssh.keepalive_interval(),
    };
    webssh_server::serve(
        listener,
        &config,
        move || SshConnector::new(options.clone()),
        registry.clone(),
        shutdown_rx,
    )
    .await;

    let deadline = tokio::time::Instant::now() + SHUTDOWN_GRACE;
    while registry.count().await > 0 && tokio::time::Instant::now() < deadline {
        tokio::time::sleep(Duration::from_millis(50)).await;
    }
    let remaining = registry.count().await;
    if remaining > 0 {
        tracing::warn!(sessions = remaining, "Exiting with sessions still open");
    }

    Ok(())
}

/// Config file, then environment, then command-line overrides.
fn load(args: &Args) -> anyhow::Result<ServerConfig> {
    let mut config = webssh_config::load_config(args.config.as_deref())
        .context("failed to load configuration")?;

    if let Some(port) = args.port {
        config.server.port = port;
    }
    if let Some(level) = &args.log_level {
        config.logging.level = level.clone();
    }
    validation::validate(&config).context("invalid command-line override")?;

    Ok(config)
}
