//! # Layered Configuration Errors
//!
//! Error taxonomy shared by the resolver, the loaders, the composition root
//! and the CLI.
//!
//! - Uses `thiserror` for structured error definitions
//! - Every variant names the resource it failed on so operators can act on
//!   the message alone

use std::path::{Path, PathBuf};

use thiserror::Error;

/// Result alias used across the workspace.
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    /// An optional resource is absent. Never fatal on its own.
    #[error("Configuration resource not found: {}", path.display())]
    NotFound { path: PathBuf },

    /// A resource exists but could not be turned into a mapping.
    #[error("Invalid {format} in {}: {reason}", path.display())]
    InvalidFormat {
        path: PathBuf,
        format: String,
        reason: String
    },

    /// A layer file failed to load; wraps the underlying parse failure.
    #[error("Failed to load {layer} layer file {}: {source}", path.display())]
    LayerLoad {
        layer: String,
        path: PathBuf,
        #[source]
        source: Box<ConfigError>
    },

    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error
    },

    #[error("Unsupported deployment target: {target}")]
    UnsupportedTarget { target: String }
}

impl ConfigError {
    pub fn not_found(path: impl Into<PathBuf>) -> Self {
        Self::NotFound { path: path.into() }
    }

    pub fn invalid_format(
        path: impl Into<PathBuf>,
        format: impl Into<String>,
        reason: impl ToString
    ) -> Self {
        Self::InvalidFormat {
            path: path.into(),
            format: format.into(),
            reason: reason.to_string()
        }
    }

    pub fn io(path: &Path, source: std::io::Error) -> Self {
        Self::Io {
            path: path.to_path_buf(),
            source
        }
    }

    pub fn layer_load(layer: impl Into<String>, path: impl Into<PathBuf>, source: Self) -> Self {
        Self::LayerLoad {
            layer: layer.into(),
            path: path.into(),
            source: Box::new(source)
        }
    }

    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    #[must_use]
    pub fn is_invalid_format(&self) -> bool {
        matches!(self, Self::InvalidFormat { .. })
    }
}
