//! Shell bridge
//!
//! Surfaces, the tray and every OS query live in an external shell process.
//! The orchestrator talks to it over a Unix socket with newline-delimited
//! JSON: the shell reports intents and events, the orchestrator answers with
//! surface commands and platform requests.

mod bridge;
mod client;
mod protocol;
mod server;

pub use bridge::{IpcSurfaceBackend, ShellLink};
pub use client::ShellClient;
pub use protocol::{ShellCommand, ShellEvent, ShellReply, ShellRequest};
pub use server::ShellServer;

use std::path::PathBuf;

/// Get the shell socket path
///
/// Uses XDG_RUNTIME_DIR if available, otherwise /tmp
pub fn socket_path() -> PathBuf {
    if let Ok(runtime_dir) = std::env::var("XDG_RUNTIME_DIR") {
        PathBuf::from(runtime_dir).join("orbit.sock")
    } else {
        // SAFETY: libc::getuid() is a simple syscall that returns the real user ID.
        // It has no preconditions and cannot fail (always returns a valid uid_t).
        let uid = unsafe { libc::getuid() };
        PathBuf::from(format!("/tmp/orbit-{}.sock", uid))
    }
}

/// Check whether an orchestrator is already listening
pub async fn orchestrator_running(path: &std::path::Path) -> bool {
    path.exists() && tokio::net::UnixStream::connect(path).await.is_ok()
}
