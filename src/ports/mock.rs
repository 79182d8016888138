//! Mock port prober for tests
//!
//! Treats a configurable set of ports as occupied and counts every call,
//! so tests can assert both collision handling and "no re-probing".

use super::error::{PortError, PortResult};
use super::traits::PortProber;
use async_trait::async_trait;
use std::collections::BTreeSet;
use std::io;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

/// Deterministic prober: every port not marked occupied is free.
///
/// # Example
///
/// ```rust
/// use nxsupabase::ports::{MockPortProber, PortProber};
///
/// # tokio_test::block_on(async {
/// let prober = MockPortProber::with_occupied([54321, 54322]);
/// assert_eq!(prober.find_available(54321).await.unwrap(), 54323);
/// assert_eq!(prober.find_available(60000).await.unwrap(), 60000);
/// assert_eq!(prober.calls(), 2);
/// # });
/// ```
#[derive(Debug, Default)]
pub struct MockPortProber {
    occupied: Mutex<BTreeSet<u16>>,
    failing: Mutex<BTreeSet<u16>>,
    calls: AtomicUsize,
    probed: Mutex<Vec<u16>>,
}

impl MockPortProber {
    /// A prober that reports every port as free.
    pub fn new() -> Self {
        Self::default()
    }

    /// A prober that reports `ports` as occupied.
    pub fn with_occupied(ports: impl IntoIterator<Item = u16>) -> Self {
        let prober = Self::new();
        prober.occupied.lock().unwrap().extend(ports);
        prober
    }

    pub fn occupy(&self, port: u16) {
        self.occupied.lock().unwrap().insert(port);
    }

    /// Make probing `port` fail as if the OS query errored.
    pub fn fail_on(&self, port: u16) {
        self.failing.lock().unwrap().insert(port);
    }

    /// Number of `find_available` invocations so far.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Candidates passed to `find_available`, in call order.
    pub fn probed(&self) -> Vec<u16> {
        self.probed.lock().unwrap().clone()
    }
}

#[async_trait]
impl PortProber for MockPortProber {
    async fn find_available(&self, candidate: u16) -> PortResult<u16> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.probed.lock().unwrap().push(candidate);

        if self.failing.lock().unwrap().contains(&candidate) {
            return Err(PortError::Probe {
                port: candidate,
                source: io::Error::new(io::ErrorKind::PermissionDenied, "mock probe failure"),
            });
        }

        let occupied = self.occupied.lock().unwrap();
        (candidate..=u16::MAX)
            .find(|port| !occupied.contains(port))
            .ok_or(PortError::Exhausted {
                start: candidate,
                limit: u16::MAX - candidate,
            })
    }
}
