use std::future::Future;
use std::io::ErrorKind;
use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use tokio::net::TcpListener;
use tokio::sync::broadcast::{self, error::RecvError};
use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::app::{AppState, Saver, SharedState};
use crate::clipboard::{spawn_worker, ClipboardBackend, SystemClipboard};
use crate::config::Config;
use crate::control::schemas::SERVICE_NAME;
use crate::control::{router, ControlService, DaemonClient, HistoryControl};
use crate::storage::{FileStorage, Persistence};
use crate::watcher::{command_channel, Watcher};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Startup {
    /// This process ran the daemon until shutdown.
    Served,
    /// Another daemon already owns the port and was asked to show itself.
    AlreadyRunning,
}

/// Run the daemon on the configured port until Ctrl-C.
pub async fn run(config: &Config) -> Result<Startup> {
    let addr = SocketAddr::from(([127, 0, 0, 1], config.control_port));

    let listener = match TcpListener::bind(addr).await {
        Ok(listener) => listener,
        Err(e) if e.kind() == ErrorKind::AddrInUse => {
            return signal_running_instance(config).await;
        }
        Err(e) => {
            return Err(e).with_context(|| format!("Failed to bind control API on {addr}"));
        }
    };

    serve(config, listener, SystemClipboard::new, shutdown_signal()).await?;
    Ok(Startup::Served)
}

async fn signal_running_instance(config: &Config) -> Result<Startup> {
    let client = DaemonClient::new(&config.control_url())?;
    match client.health().await {
        Ok(health) if health.service == SERVICE_NAME => {
            client
                .show()
                .await
                .context("Failed to reach the running daemon")?;
            info!(url = %client.base_url(), "clipkeep is already running, asked it to show itself");
            Ok(Startup::AlreadyRunning)
        }
        _ => bail!(
            "Port {} is in use by another program; set control_port in config.toml",
            config.control_port
        ),
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "Failed to listen for Ctrl-C");
        std::future::pending::<()>().await;
    }
    info!("Shutdown requested");
}

/// Run every daemon task on `listener` until `shutdown` resolves, then
/// stop the watcher and write the final save.
pub async fn serve<B, F>(
    config: &Config,
    listener: TcpListener,
    make_clipboard: F,
    shutdown: impl Future<Output = ()> + Send + 'static,
) -> Result<()>
where
    B: ClipboardBackend + 'static,
    F: FnOnce() -> B + Send + 'static,
{
    let storage = Arc::new(FileStorage::new(config.data_paths()?, config.initial_settings()));
    let state = AppState::from_persisted(storage.load());
    let status = state.status();
    let shared = SharedState::new(state);

    let clipboard = spawn_worker(make_clipboard, config.clipboard_timeout())?;
    let (watcher_handle, commands) = command_channel();
    let (stop_tx, stop_rx) = watch::channel(false);

    let watcher = tokio::spawn(Watcher::new(shared.clone(), clipboard).run(commands, stop_rx.clone()));
    let saver = tokio::spawn(
        Saver::new(shared.clone(), storage.clone(), config.save_debounce()).run(stop_rx),
    );

    let service = ControlService::new(shared, watcher_handle);
    tokio::spawn(log_show_requests(service.subscribe_show()));

    let addr = listener.local_addr().context("Failed to read listener address")?;
    info!(
        %addr,
        dir = %storage.paths().dir().display(),
        entries = status.entries,
        capacity = status.capacity,
        paused = status.paused,
        "clipkeep daemon started"
    );

    let served = axum::serve(listener, router(service))
        .with_graceful_shutdown(shutdown)
        .await
        .context("Control API failed");

    let _ = stop_tx.send(true);
    if let Err(e) = watcher.await {
        warn!(error = %e, "Watcher task ended abnormally");
    }
    if let Err(e) = saver.await {
        warn!(error = %e, "Saver task ended abnormally");
    }

    info!("clipkeep daemon stopped");
    served
}

/// Log show requests until the service is gone. Returns how many were seen.
async fn log_show_requests(mut requests: broadcast::Receiver<()>) -> usize {
    let mut seen = 0;
    loop {
        match requests.recv().await {
            Ok(()) => {
                seen += 1;
                info!("Show request received; no window is attached to this daemon");
            }
            Err(RecvError::Lagged(missed)) => {
                debug!(missed, "Show requests arrived faster than they were logged");
            }
            Err(RecvError::Closed) => break,
        }
    }
    seen
}
