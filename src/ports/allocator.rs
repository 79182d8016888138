//! Port allocation service.
//!
//! Resolution order for a project's ports (first match wins):
//! 1. Explicit override: database, API and studio ports all supplied
//! 2. Existing registry entry: returned unchanged, never re-probed
//! 3. Fresh allocation: calculate candidates, probe each while avoiding
//!    ports other registered projects hold, persist

use super::calculator::calculate_ports;
use super::error::{PortError, PortResult};
use super::models::{PartialPortSet, PortRegistry, PortSet};
use super::traits::{PortProber, RegistryStore};
use std::collections::BTreeSet;
use tracing::{debug, info};

/// Hands out port sets, backed by a [`PortProber`].
pub struct PortAllocator<P: PortProber> {
    prober: P,
}

impl<P: PortProber> PortAllocator<P> {
    pub fn new(prober: P) -> Self {
        Self { prober }
    }

    pub fn prober(&self) -> &P {
        &self.prober
    }

    /// Get or allocate the ports for `project`.
    ///
    /// Only a fresh allocation writes to `store`; explicit overrides do not
    /// even read it.
    pub async fn get_ports(
        &self,
        store: &mut dyn RegistryStore,
        project: &str,
        explicit: Option<&PartialPortSet>,
    ) -> PortResult<PortSet> {
        if let Some(partial) = explicit {
            if let Some(ports) = partial.complete() {
                debug!(project, "Using explicit ports");
                return Ok(ports);
            }
            if !partial.is_empty() {
                debug!(
                    project,
                    "Incomplete explicit ports (database, API and studio are required together), ignoring"
                );
            }
        }

        let mut registry = store.load()?;
        if let Some(ports) = registry.get(project) {
            debug!(project, "Reusing registered ports");
            return Ok(*ports);
        }

        let candidates = calculate_ports(project);
        let ports = self.probe_all(&candidates, &registry).await?;

        registry.insert(project, ports);
        store.save(&registry)?;

        info!(
            project,
            db = ports.db_port,
            api = ports.api_port,
            studio = ports.studio_port,
            "Allocated ports"
        );
        Ok(ports)
    }

    /// Probe every candidate in allocation order.
    ///
    /// A probed port that lands on another member's candidate, on a port
    /// already claimed earlier in this set, or on a port another registered
    /// project holds is skipped and probing resumes above it. A busy
    /// candidate therefore never displaces the others.
    async fn probe_all(&self, candidates: &PortSet, registry: &PortRegistry) -> PortResult<PortSet> {
        let wanted = candidates.as_array();
        let registered: BTreeSet<u16> = registry
            .projects
            .values()
            .flat_map(|ports| ports.as_array())
            .collect();
        let mut claimed: BTreeSet<u16> = BTreeSet::new();
        let mut resolved = [0u16; 6];

        for (idx, candidate) in wanted.iter().copied().enumerate() {
            let mut start = candidate;
            let port = loop {
                let port = self.prober.find_available(start).await?;
                let reserved = claimed.contains(&port)
                    || registered.contains(&port)
                    || wanted
                        .iter()
                        .enumerate()
                        .any(|(other, c)| other != idx && *c == port);
                if !reserved {
                    break port;
                }
                start = port.checked_add(1).ok_or(PortError::Exhausted {
                    start: candidate,
                    limit: u16::MAX - candidate,
                })?;
            };
            claimed.insert(port);
            resolved[idx] = port;
        }

        Ok(PortSet::from_array(resolved))
    }

    /// Drop `project`'s entry so its ports can be handed out again.
    pub fn release_ports(&self, store: &mut dyn RegistryStore, project: &str) -> PortResult<()> {
        let mut registry = store.load()?;
        if registry.remove(project).is_some() {
            info!(project, "Released ports");
        }
        store.save(&registry)
    }

    /// Current registry contents.
    pub fn list_allocated(&self, store: &dyn RegistryStore) -> PortResult<PortRegistry> {
        store.load()
    }
}
