//! Orchestrator wiring
//!
//! Loads the configuration, connects the session controller to the shell
//! bridge and runs both until the user quits, asks for a relaunch, or the
//! process is interrupted.

use anyhow::{bail, Context, Result};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, warn};

use orbit_core::config::ConfigFile;
use orbit_core::ipc::{self, IpcSurfaceBackend, ShellLink, ShellServer};
use orbit_core::session::{AppSignal, Collaborators, SessionController};

/// How long teardown may take before the host gives up waiting
const SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(5);

/// Launch options
pub struct Options {
    pub config: Option<PathBuf>,
    pub socket: Option<PathBuf>,
}

/// Run the orchestrator until quit
pub async fn run(options: Options) -> Result<()> {
    let file = match &options.config {
        Some(path) => ConfigFile::load_from(path.clone())
            .with_context(|| format!("Failed to load {}", path.display()))?,
        None => ConfigFile::load_or_default(),
    };
    let config = file
        .to_recorder_config()
        .context("Invalid configuration")?;
    info!(
        "Recording {} at {}fps into {}",
        config.container,
        config.fps,
        config.output_dir.display()
    );

    let socket = options.socket.unwrap_or_else(ipc::socket_path);
    if ipc::orchestrator_running(&socket).await {
        bail!("Orbit is already running (socket {})", socket.display());
    }

    let (link, commands) = ShellLink::new(config.request_timeout);
    let collaborators = Collaborators {
        surfaces: Box::new(IpcSurfaceBackend::new(Arc::clone(&link))),
        directory: link.clone(),
        bounds: link.clone(),
        permission: link.clone(),
    };
    let (controller, mut signals) = SessionController::new(collaborators, config);
    let handle = controller.handle();

    let mut server = ShellServer::new(&socket, link, commands, handle.clone());
    server.start().await.context("Failed to start shell server")?;
    let stop_server = server.shutdown_sender();

    let controller_task = tokio::spawn(controller.run());
    let server_task = tokio::spawn(async move {
        if let Err(e) = server.run().await {
            error!("Shell server failed: {}", e);
        }
    });

    println!("Orbit is waiting for its shell on {}", socket.display());

    let signal = tokio::select! {
        result = tokio::signal::ctrl_c() => {
            if let Err(e) = result {
                warn!("Failed to listen for Ctrl+C: {}", e);
            }
            info!("Interrupted, shutting down");
            AppSignal::Quit
        }
        signal = signals.recv() => signal.unwrap_or(AppSignal::Quit),
    };

    // Quit already tore everything down; this covers Ctrl+C and relaunch
    let _ = handle.shutdown().await;
    if tokio::time::timeout(SHUTDOWN_TIMEOUT, controller_task).await.is_err() {
        warn!("Session controller did not stop in time");
    }

    let _ = stop_server.send(());
    if tokio::time::timeout(SHUTDOWN_TIMEOUT, server_task).await.is_err() {
        warn!("Shell server did not stop in time");
    }

    if signal == AppSignal::Relaunch {
        relaunch()?;
    }

    Ok(())
}

/// Start a fresh copy of this process with the same arguments
fn relaunch() -> Result<()> {
    let exe = std::env::current_exe().context("Failed to locate the Orbit executable")?;
    let args: Vec<String> = std::env::args().skip(1).collect();
    info!("Relaunching {}", exe.display());
    std::process::Command::new(&exe)
        .args(&args)
        .spawn()
        .with_context(|| format!("Failed to relaunch {}", exe.display()))?;
    Ok(())
}
