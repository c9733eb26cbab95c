//! Screen recording permission

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::{OrbitError, Result};

/// Shown when permission is refused; granting only takes effect after a restart
pub const RELAUNCH_HINT: &str = "Please grant permission in System Settings > Privacy & Security > \
Screen Recording. Orbit must be restarted for the change to take effect.";

/// OS screen capture permission status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ScreenAccess {
    Granted,
    Denied,
    /// Never asked; a request may prompt the user
    NotDetermined,
}

/// Platform permission collaborator
#[async_trait]
pub trait PermissionGate: Send + Sync {
    async fn screen_access_status(&self) -> ScreenAccess;

    /// Prompt for access; returns whether it was granted
    async fn request_screen_access(&self) -> bool;
}

/// Platforms without a capture permission
#[derive(Debug, Clone, Copy, Default)]
pub struct Ungated;

#[async_trait]
impl PermissionGate for Ungated {
    async fn screen_access_status(&self) -> ScreenAccess {
        ScreenAccess::Granted
    }

    async fn request_screen_access(&self) -> bool {
        true
    }
}

/// Check screen access, requesting it when not yet granted
pub async fn ensure_screen_access(gate: &dyn PermissionGate) -> Result<()> {
    match gate.screen_access_status().await {
        ScreenAccess::Granted => Ok(()),
        status => {
            info!("Screen access is {:?}, requesting", status);
            if gate.request_screen_access().await {
                Ok(())
            } else {
                warn!("Screen recording permission refused");
                Err(OrbitError::permission("screen recording"))
            }
        }
    }
}
