//! Serve command - run the HTTP API

use std::future::IntoFuture;
use std::path::PathBuf;
use std::sync::Arc;

use clap::Args;
use reviewer_core::{AssignmentService, Config, InMemoryStore, ReviewStore};
use reviewer_db::Database;
use tokio::net::TcpListener;
use tokio::signal;
use tokio::sync::Notify;
use tracing::{info, warn};

use crate::http;

/// Run the reviewer assignment HTTP server
#[derive(Args, Debug)]
pub struct ServeArgs {
    /// Address to listen on (overrides config and env)
    #[arg(long)]
    bind: Option<String>,

    /// SQLite database file (overrides config and env)
    #[arg(long)]
    db: Option<PathBuf>,

    /// Keep all state in memory instead of SQLite
    #[arg(long, conflicts_with = "db")]
    in_memory: bool,
}

impl ServeArgs {
    /// Execute the serve command
    pub async fn execute(&self, config: Config) -> anyhow::Result<()> {
        let config = config.with_cli_overrides(self.bind.clone(), self.db.clone());

        let database = if self.in_memory {
            None
        } else {
            let db = Database::connect(&config.database).await.map_err(|e| {
                anyhow::anyhow!(
                    "Failed to open database {}: {}",
                    config.database.path.display(),
                    e
                )
            })?;
            Some(db)
        };

        let store: Arc<dyn ReviewStore> = match &database {
            Some(db) => Arc::new(db.clone()),
            None => {
                warn!("Using in-memory store, state is lost on exit");
                Arc::new(InMemoryStore::new())
            }
        };

        let app = http::router(
            AssignmentService::new(store),
            config.server.request_timeout,
        );

        let listener = TcpListener::bind(&config.server.bind).await?;
        info!(bind = %config.server.bind, "Server listening");

        let shutdown = Arc::new(Notify::new());
        let server = axum::serve(listener, app).with_graceful_shutdown({
            let shutdown = shutdown.clone();
            async move { shutdown.notified().await }
        });
        let mut server = tokio::spawn(server.into_future());

        tokio::select! {
            result = &mut server => {
                result??;
                return Ok(());
            }
            _ = shutdown_signal() => {}
        }

        info!(
            timeout = ?config.server.shutdown_timeout,
            "Shutting down, draining in-flight requests"
        );
        shutdown.notify_one();

        match tokio::time::timeout(config.server.shutdown_timeout, server).await {
            Ok(result) => result??,
            Err(_) => warn!("Shutdown timeout elapsed, dropping remaining requests"),
        }

        if let Some(db) = database {
            db.close().await;
        }
        info!("Server stopped");
        Ok(())
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "Failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }
}
