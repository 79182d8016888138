//! Trait abstractions for port probing and registry persistence.

use super::error::PortResult;
use super::models::PortRegistry;
use async_trait::async_trait;

/// Asks the operating system whether ports are free.
///
/// # Implementations
///
/// - [`OsPortProber`](super::OsPortProber): binds a TCP listener to find out
/// - [`MockPortProber`](super::MockPortProber): scripted occupied ports, counts calls
#[async_trait]
pub trait PortProber: Send + Sync {
    /// Return `candidate` when it is free, otherwise the closest free port
    /// above it.
    ///
    /// # Errors
    ///
    /// Returns [`PortError::Probe`](super::PortError::Probe) when the OS query
    /// itself fails and [`PortError::Exhausted`](super::PortError::Exhausted)
    /// when no free port is found. Never returns an unchecked candidate.
    async fn find_available(&self, candidate: u16) -> PortResult<u16>;
}

/// Durable storage for the port registry.
pub trait RegistryStore {
    /// Read the registry. A missing document is an empty registry.
    fn load(&self) -> PortResult<PortRegistry>;

    /// Replace the stored document with `registry`.
    fn save(&mut self, registry: &PortRegistry) -> PortResult<()>;
}
