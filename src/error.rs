use thiserror::Error;

/// Error type returned by plugin hooks and bus listeners.
///
/// Anything implementing `std::error::Error` converts into it with `?` or `.into()`.
pub type BoxError = Box<dyn std::error::Error + 'static>;

/// Result type for plugin hooks and bus listeners
pub type HandlerResult = Result<(), BoxError>;

/// Errors raised by the plugin registry
#[derive(Debug, Error)]
pub enum PluginError {
    #[error("Plugin '{0}' is already registered")]
    DuplicatePlugin(String),

    #[error("Plugin '{name}' failed to initialize: {source}")]
    PluginInit {
        name: String,
        #[source]
        source: BoxError,
    },

    /// Only ever logged: handler failures are isolated per plugin.
    #[error("Plugin '{name}' failed while handling '{topic}': {source}")]
    PluginHandler {
        name: String,
        topic: String,
        #[source]
        source: BoxError,
    },
}

/// Errors that can occur while restoring a surface from a snapshot
#[derive(Debug, Error)]
pub enum RestoreError {
    #[error("Malformed snapshot: {0}")]
    Malformed(#[from] serde_json::Error),

    #[error("Unsupported snapshot version {found} (expected {expected})")]
    Version { found: u32, expected: u32 },
}

/// Errors that can occur while serializing a surface into a snapshot
#[derive(Debug, Error)]
pub enum SerializeError {
    #[error("Failed to serialize surface: {0}")]
    Json(#[from] serde_json::Error),
}

/// Errors surfaced by the public session API
#[derive(Debug, Error)]
pub enum SessionError {
    #[error(transparent)]
    Plugin(#[from] PluginError),

    #[error("Failed to restore snapshot: {0}")]
    Restore(#[from] RestoreError),

    #[error(transparent)]
    Serialize(#[from] SerializeError),

    /// The surface was already borrowed, i.e. a surface call re-entered the session.
    #[error("Drawing surface is busy")]
    SurfaceBusy,
}

/// Errors that can occur while loading a session configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to parse configuration: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Result type for session operations
pub type SessionResult<T> = Result<T, SessionError>;
