use std::path::PathBuf;

use thiserror::Error;

/// Errors raised while locating or reading a packaged application.
#[derive(Debug, Error)]
pub enum PackageError {
    #[error("the package descriptor was already released")]
    Released,

    #[error("no packaged application was found")]
    NoPackage,

    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed manifest: {0}")]
    Json(#[from] serde_json::Error),

    #[error("a manifest must be a JSON object")]
    NotAnObject,
}
