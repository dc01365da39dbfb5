use super::open_service_stores;
use crate::cli::args::ServeArgs;
use crate::exit_codes::SUCCESS;
use crate::http::{self, AppState};
use anyhow::{Context, Result};
use phonemap_core::import::{ImportStatus, ImportWorker};
use phonemap_core::LookupService;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::sync::watch;

pub async fn run(args: ServeArgs) -> Result<i32> {
    let config = args.import.to_config()?;
    let addr: SocketAddr = args
        .bind
        .parse()
        .with_context(|| format!("invalid bind address {}", args.bind))?;
    let (import_store, lookup_store) = open_service_stores(&args.store)?;
    let status = Arc::new(ImportStatus::new());
    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    let worker = if args.no_worker {
        tracing::info!("import worker disabled");
        None
    } else {
        let worker = Arc::new(ImportWorker::new(config, import_store, status.clone())?);
        Some(tokio::spawn(worker.run_forever(shutdown_rx.clone())))
    };

    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                tracing::info!("shutdown requested");
                let _ = shutdown_tx.send(true);
            }
            Err(e) => {
                // keep the sender alive so nothing shuts down
                tracing::error!(error = %e, "cannot listen for ctrl-c");
                std::future::pending::<()>().await;
            }
        }
    });

    let app = http::router(AppState {
        lookup: LookupService::new(lookup_store),
        status,
    });
    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    tracing::info!(addr = %listener.local_addr()?, "listening");

    let mut server_shutdown = shutdown_rx;
    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            let _ = server_shutdown.wait_for(|stop| *stop).await;
        })
        .await
        .context("http server failed")?;

    if let Some(worker) = worker {
        worker.await.context("import worker panicked")?;
    }
    tracing::info!("stopped");
    Ok(SUCCESS)
}
