use std::path::PathBuf;

use tandem_script::{ContextId, ScriptError};
use thiserror::Error;

/// Errors raised while bootstrapping or bridging.
#[derive(Debug, Error)]
pub enum BridgeError {
    #[error(transparent)]
    Script(#[from] ScriptError),

    #[error("secondary runtime bootstrap failed: {reason}")]
    BootstrapFailed { reason: String },

    #[error("secondary runtime bootstrap was entered again before it finished")]
    BootstrapInProgress,

    #[error("secondary runtime must start inside its own entered context {expected}")]
    ContextNotEntered { expected: ContextId },

    #[error("failed to read settings from {path}: {source}")]
    SettingsIo {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed settings: {0}")]
    SettingsFormat(#[from] serde_json::Error),

    #[error("invalid settings: {0}")]
    InvalidSettings(String),
}
