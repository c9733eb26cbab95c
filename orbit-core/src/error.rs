//! Error types for Orbit

use thiserror::Error;

/// Result type alias using OrbitError
pub type Result<T> = std::result::Result<T, OrbitError>;

/// Main error type for Orbit operations
#[derive(Debug, Error)]
pub enum OrbitError {
    /// Selected source no longer exists in the directory
    #[error("Source not found: {0}")]
    SourceNotFound(String),

    /// Camera or microphone acquisition was rejected
    #[error("Device unavailable: {0}")]
    DeviceUnavailable(String),

    /// OS-level screen capture permission refused
    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    /// Encoder reported a failure
    #[error("Encoder error: {0}")]
    Encode(String),

    /// Platform windowing failed to create a surface
    #[error("Surface creation failed: {0}")]
    SurfaceCreation(String),

    /// Saving the finished recording failed
    #[error("Save error: {0}")]
    Save(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Shell bridge communication error
    #[error("IPC error: {0}")]
    Ipc(String),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Generic error with context
    #[error("{context}: {source}")]
    WithContext {
        context: String,
        #[source]
        source: Box<OrbitError>,
    },
}

impl OrbitError {
    /// Create a source-not-found error
    pub fn source_not_found(id: impl Into<String>) -> Self {
        Self::SourceNotFound(id.into())
    }

    /// Create a device-unavailable error
    pub fn device(msg: impl Into<String>) -> Self {
        Self::DeviceUnavailable(msg.into())
    }

    /// Create a permission error
    pub fn permission(msg: impl Into<String>) -> Self {
        Self::PermissionDenied(msg.into())
    }

    /// Create an encoder error
    pub fn encode(msg: impl Into<String>) -> Self {
        Self::Encode(msg.into())
    }

    /// Create a surface creation error
    pub fn surface(msg: impl Into<String>) -> Self {
        Self::SurfaceCreation(msg.into())
    }

    /// Create a save error
    pub fn save(msg: impl Into<String>) -> Self {
        Self::Save(msg.into())
    }

    /// Create a config error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create an IPC error
    pub fn ipc(msg: impl Into<String>) -> Self {
        Self::Ipc(msg.into())
    }

    /// Add context to an error
    pub fn with_context(self, context: impl Into<String>) -> Self {
        Self::WithContext {
            context: context.into(),
            source: Box::new(self),
        }
    }

    /// The innermost error, with all context layers removed
    pub fn root(&self) -> &OrbitError {
        match self {
            Self::WithContext { source, .. } => source.root(),
            other => other,
        }
    }

    /// The message without its kind prefix, context layers kept.
    /// Used when only the kind travels separately, as in capture events.
    pub fn detail(&self) -> String {
        match self {
            Self::SourceNotFound(msg)
            | Self::DeviceUnavailable(msg)
            | Self::PermissionDenied(msg)
            | Self::Encode(msg)
            | Self::SurfaceCreation(msg)
            | Self::Save(msg)
            | Self::Config(msg)
            | Self::Ipc(msg) => msg.clone(),
            Self::Io(e) => e.to_string(),
            Self::WithContext { context, source } => format!("{}: {}", context, source.detail()),
        }
    }

    /// A short suggestion shown to the user next to the failure message
    pub fn user_hint(&self) -> Option<&'static str> {
        match self.root() {
            Self::SourceNotFound(_) => {
                Some("The window or screen is gone. Pick the source again.")
            }
            Self::DeviceUnavailable(_) => {
                Some("Check that the camera and microphone are connected and allowed.")
            }
            Self::PermissionDenied(_) => Some(
                "Grant screen recording permission in system settings, then relaunch Orbit.",
            ),
            Self::Encode(_) => Some("The recording could not be encoded."),
            Self::SurfaceCreation(_) => Some("A window could not be opened."),
            Self::Save(_) => Some("Check that the output directory is writable."),
            Self::Config(_) => Some("Check ~/.config/orbit/config.toml for errors."),
            Self::Ipc(_) => Some("The Orbit shell lost its connection."),
            Self::Io(_) | Self::WithContext { .. } => None,
        }
    }

    /// Message for the control surface: the error plus its hint
    pub fn user_message(&self) -> String {
        match self.user_hint() {
            Some(hint) => format!("{}. {}", self, hint),
            None => self.to_string(),
        }
    }
}

/// Extension trait for adding context to Results
pub trait ResultExt<T> {
    /// Add context to an error
    fn context(self, context: impl Into<String>) -> Result<T>;
}

impl<T> ResultExt<T> for Result<T> {
    fn context(self, context: impl Into<String>) -> Result<T> {
        self.map_err(|e| e.with_context(context))
    }
}

impl From<serde_json::Error> for OrbitError {
    fn from(err: serde_json::Error) -> Self {
        Self::Ipc(format!("Malformed message: {}", err))
    }
}
