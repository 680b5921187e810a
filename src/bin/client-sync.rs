//! OAuth client sync host binary.
//!
//! Opens the configured client registry and, for `sync`, loads client
//! definitions from the environment and converges the registry onto them.
//! Also lists the registered clients and checks a client's credentials
//! against the registry.
//!
//! ```bash
//! OAUTH_CLIENT_0_ID=billing OAUTH_CLIENT_0_SECRET=... \
//! OAUTH_CLIENT_0_GRANT_TYPES=client_credentials \
//! STORAGE_BACKEND=sqlite client-sync sync
//!
//! STORAGE_BACKEND=sqlite client-sync list
//! STORAGE_BACKEND=sqlite client-sync verify --client-id billing --client-secret ...
//! ```

use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use client_sync::{
    config::{ClientDefinitions, Config},
    oauth::{ClientSyncService, authenticate_client_credentials},
    storage::{ClientRegistry, create_client_registry, parse_storage_backend},
};
use futures::TryStreamExt;
use std::sync::Arc;
use tokio::signal;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::prelude::*;

#[derive(Parser)]
#[command(
    name = "client-sync",
    about = "Converge the OAuth client registry onto configured client definitions",
    version = env!("CARGO_PKG_VERSION")
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Reconcile the registry with the configured definitions (default)
    Sync,
    /// List registered clients without their secrets
    List,
    /// Check a client's credentials for the client credentials grant
    Verify(VerifyArgs),
}

#[derive(Args)]
struct VerifyArgs {
    #[arg(long, help = "OAuth client identifier")]
    client_id: String,

    #[arg(long, help = "OAuth client secret")]
    client_secret: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "client_sync=debug,info".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();
    let config = Config::new()?;

    tracing::info!(version = %config.version, backend = %config.storage_backend, "Starting client sync");

    let backend = parse_storage_backend(&config.storage_backend, config.database_url.as_deref())?;
    let registry = create_client_registry(backend).await?;

    match cli.command.unwrap_or(Commands::Sync) {
        Commands::Sync => sync_clients(&config, registry).await,
        Commands::List => list_clients(registry.as_ref()).await,
        Commands::Verify(args) => verify_client(registry.as_ref(), &args).await,
    }
}

async fn sync_clients(config: &Config, registry: Arc<dyn ClientRegistry>) -> Result<()> {
    if !*config.auth_enabled.as_ref() {
        tracing::info!("OAuth is disabled; skipping client sync");
        return Ok(());
    }

    let clients = ClientDefinitions::from_env()?;

    let token = CancellationToken::new();
    spawn_shutdown_listener(token.clone());

    let service = ClientSyncService::new(registry);
    let report = service.run(clients.as_ref(), &token).await?;

    if report.is_cancelled() {
        tracing::warn!(
            created = report.created.len(),
            updated = report.updated.len(),
            removed = report.removed.len(),
            "client sync stopped before completion"
        );
    }

    Ok(())
}

async fn list_clients(registry: &dyn ClientRegistry) -> Result<()> {
    let clients: Vec<_> = registry.list_all().try_collect().await?;

    if clients.is_empty() {
        println!("No registered clients");
        return Ok(());
    }

    for client in clients {
        let permissions: Vec<&str> = client.permissions.iter().map(|p| p.as_str()).collect();
        println!(
            "{}\t{}\t{}\t{}",
            client.client_id,
            client.display_name,
            permissions.join(","),
            client.updated_at.to_rfc3339()
        );
    }

    Ok(())
}

async fn verify_client(registry: &dyn ClientRegistry, args: &VerifyArgs) -> Result<()> {
    let client =
        authenticate_client_credentials(registry, &args.client_id, &args.client_secret).await?;
    println!("Client '{}' is authorized for client_credentials", client.client_id);
    Ok(())
}

fn spawn_shutdown_listener(token: CancellationToken) {
    let ctrl_c = async {
        if let Err(err) = signal::ctrl_c().await {
            tracing::error!(error = %err, "failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(err) => {
                tracing::error!(error = %err, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::spawn(async move {
        tokio::select! {
            () = token.cancelled() => {},
            _ = terminate => {},
            _ = ctrl_c => {},
        }

        tracing::info!("shutdown requested");
        token.cancel();
    });
}
