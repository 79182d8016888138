//! Port prober backed by real socket binds.

use super::error::{PortError, PortResult};
use super::traits::PortProber;
use async_trait::async_trait;
use std::io::ErrorKind;
use tokio::net::TcpListener;
use tracing::debug;

/// Default number of ports scanned above an occupied candidate.
pub const DEFAULT_SCAN_LIMIT: u16 = 100;

/// Hosts a port must be bindable on to count as free. Checking both catches
/// services that only listen on loopback.
const PROBE_HOSTS: [&str; 2] = ["0.0.0.0", "127.0.0.1"];

/// Probes ports by binding a listener and dropping it immediately.
#[derive(Debug, Clone)]
pub struct OsPortProber {
    scan_limit: u16,
}

impl OsPortProber {
    pub fn new(scan_limit: u16) -> Self {
        Self {
            scan_limit: scan_limit.max(1),
        }
    }

    /// `Ok(true)` when every probe host accepts a bind on `port`.
    async fn is_free(port: u16) -> PortResult<bool> {
        for host in PROBE_HOSTS {
            match TcpListener::bind((host, port)).await {
                Ok(listener) => drop(listener),
                Err(e) if e.kind() == ErrorKind::AddrInUse => return Ok(false),
                Err(source) => return Err(PortError::Probe { port, source }),
            }
        }
        Ok(true)
    }
}

impl Default for OsPortProber {
    fn default() -> Self {
        Self::new(DEFAULT_SCAN_LIMIT)
    }
}

#[async_trait]
impl PortProber for OsPortProber {
    async fn find_available(&self, candidate: u16) -> PortResult<u16> {
        let mut port = candidate;
        for _ in 0..self.scan_limit {
            if Self::is_free(port).await? {
                if port != candidate {
                    debug!(candidate, port, "Candidate port busy, using next free port");
                }
                return Ok(port);
            }
            port = match port.checked_add(1) {
                Some(next) => next,
                None => break,
            };
        }
        Err(PortError::Exhausted {
            start: candidate,
            limit: self.scan_limit,
        })
    }
}
