//! Error types
//!
//! `GatewayError` covers every failed exchange with the remote service.
//! `SyncError` is what the controller and push registration return.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Errors from the remote product service
///
/// Variants exist for log messages only; callers treat them alike.
#[derive(Error, Debug)]
pub enum GatewayError {
    /// Request never completed (DNS, connect, TLS, timeout)
    #[error("Request to {endpoint} failed: {source}")]
    Transport {
        endpoint: String,
        #[source]
        source: reqwest::Error,
    },

    /// Service answered with a non-success status
    #[error("{endpoint} returned HTTP {status}")]
    Status { endpoint: String, status: u16 },

    /// Response body could not be decoded
    #[error("Invalid response from {endpoint}: {source}")]
    Decode {
        endpoint: String,
        #[source]
        source: reqwest::Error,
    },
}

/// Errors from sync and push registration
#[derive(Error, Debug)]
pub enum SyncError {
    #[error(transparent)]
    Gateway(#[from] GatewayError),

    /// Local key-value store could not be read or written
    #[error("Token store '{path}' failed: {source}")]
    Storage {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Token store file exists but is not valid JSON
    #[error("Token store '{path}' is corrupted: {details}")]
    CorruptStore { path: PathBuf, details: String },

    /// Push provider could not complete a request
    #[error("Push provider error: {0}")]
    Push(String),
}

pub type GatewayResult<T> = std::result::Result<T, GatewayError>;
pub type Result<T> = std::result::Result<T, SyncError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_message() {
        let err = GatewayError::Status {
            endpoint: "/product/accept".to_string(),
            status: 502,
        };
        assert_eq!(err.to_string(), "/product/accept returned HTTP 502");
    }

    #[test]
    fn test_gateway_error_converts() {
        let err: SyncError = GatewayError::Status {
            endpoint: "/products".to_string(),
            status: 500,
        }
        .into();
        assert!(matches!(err, SyncError::Gateway(_)));
        assert_eq!(err.to_string(), "/products returned HTTP 500");
    }

    #[test]
    fn test_storage_message_names_path() {
        let err = SyncError::Storage {
            path: PathBuf::from("/data/storage.json"),
            source: io::Error::new(io::ErrorKind::PermissionDenied, "denied"),
        };
        assert!(err.to_string().contains("/data/storage.json"));
    }
}
