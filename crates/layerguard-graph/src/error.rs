//! Input errors
//!
//! Raised only for problems with the analyzed input as a whole. Individual
//! packages that cannot be scanned are recorded in the graph instead.

use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum InputError {
    #[error("Input not found: {0}")]
    RootNotFound(PathBuf),

    #[error("Failed to read {path}: {message}")]
    Io { path: String, message: String },

    #[error("Failed to walk source tree: {0}")]
    Walk(String),

    #[error("Invalid description: {0}")]
    Description(String),

    #[error("Scanning task failed: {0}")]
    TaskFailed(String),
}

impl InputError {
    pub(crate) fn io(path: &std::path::Path, err: std::io::Error) -> Self {
        Self::Io {
            path: path.display().to_string(),
            message: err.to_string(),
        }
    }
}
