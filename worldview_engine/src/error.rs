//! Error types for the Worldview engine
//!
//! This module defines the error types used throughout the engine,
//! covering asset streaming, descriptor checks and BSP validation.

use std::fmt;

/// Result type for Worldview engine operations
pub type Result<T> = std::result::Result<T, Error>;

/// Worldview engine errors
#[derive(Debug, Clone, PartialEq)]
pub enum Error {
    /// The streaming collaborator does not know the requested asset
    AssetNotFound(String),

    /// The asset exists but could not be fetched or decoded
    AssetLoadFailed(String),

    /// BSP node data is cyclic or references out-of-range children
    MalformedBsp(String),

    /// Invalid resource (descriptor with inconsistent ranges, bad handle, etc.)
    InvalidResource(String),
}

impl Error {
    /// True for the two load-failure variants reported by an asset streamer.
    pub fn is_load_failure(&self) -> bool {
        matches!(self, Error::AssetNotFound(_) | Error::AssetLoadFailed(_))
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::AssetNotFound(name) => write!(f, "Asset not found: {}", name),
            Error::AssetLoadFailed(msg) => write!(f, "Asset load failed: {}", msg),
            Error::MalformedBsp(msg) => write!(f, "Malformed BSP tree: {}", msg),
            Error::InvalidResource(msg) => write!(f, "Invalid resource: {}", msg),
        }
    }
}

impl std::error::Error for Error {}

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;
