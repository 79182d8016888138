//! Error type for port allocation and the port registry.

use std::path::PathBuf;

type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Failures surfaced by the port subsystem.
///
/// Every variant aborts the allocation attempt that produced it. Nothing is
/// retried automatically and nothing is written to the registry after one
/// of these is returned.
#[derive(Debug, thiserror::Error)]
pub enum PortError {
    /// The registry document exists but could not be read or parsed.
    #[error("Failed to read port registry at {}: {source}", .path.display())]
    StoreRead {
        path: PathBuf,
        #[source]
        source: BoxError,
    },

    /// The registry document could not be serialized.
    #[error("Failed to write port registry at {}: {source}", .path.display())]
    StoreWrite {
        path: PathBuf,
        #[source]
        source: BoxError,
    },

    /// The operating system refused to answer whether a port is free.
    #[error("Failed to probe port {port}: {source}")]
    Probe {
        port: u16,
        #[source]
        source: std::io::Error,
    },

    /// No free port was found in the scan window above `start`.
    #[error("No free port found in {limit} ports starting at {start}")]
    Exhausted { start: u16, limit: u16 },
}

pub type PortResult<T> = std::result::Result<T, PortError>;
