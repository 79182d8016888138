//! Port set and registry data structures.
//!
//! Field names are persisted in camelCase so the registry file stays
//! readable by the rest of the JavaScript-side tooling in a workspace.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// The six coordinated ports one project's local Supabase stack listens on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PortSet {
    /// Postgres
    pub db_port: u16,
    /// API gateway (Kong)
    pub api_port: u16,
    /// Studio admin UI
    pub studio_port: u16,
    /// Inbucket mail catcher UI
    pub inbucket_port: u16,
    /// Shadow database used for schema diffing
    pub shadow_port: u16,
    /// Connection pooler
    pub pooler_port: u16,
}

impl PortSet {
    /// All six ports, in allocation order.
    pub fn as_array(&self) -> [u16; 6] {
        [
            self.db_port,
            self.api_port,
            self.studio_port,
            self.inbucket_port,
            self.shadow_port,
            self.pooler_port,
        ]
    }

    /// Build a set from ports given in allocation order.
    pub fn from_array(ports: [u16; 6]) -> Self {
        Self {
            db_port: ports[0],
            api_port: ports[1],
            studio_port: ports[2],
            inbucket_port: ports[3],
            shadow_port: ports[4],
            pooler_port: ports[5],
        }
    }

    /// True when no two members share a port and none is 0.
    pub fn is_valid(&self) -> bool {
        let ports = self.as_array();
        ports.iter().all(|p| *p != 0)
            && ports
                .iter()
                .enumerate()
                .all(|(i, p)| !ports[i + 1..].contains(p))
    }
}

/// User-supplied port overrides.
///
/// Only takes effect when database, API and studio ports are all present;
/// the remaining three are derived when absent. A value of `0` counts as
/// absent.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PartialPortSet {
    pub db_port: Option<u16>,
    pub api_port: Option<u16>,
    pub studio_port: Option<u16>,
    pub inbucket_port: Option<u16>,
    pub shadow_port: Option<u16>,
    pub pooler_port: Option<u16>,
}

impl PartialPortSet {
    /// Resolve into a full set, or `None` when the override is incomplete
    /// or a derived port would overflow the port range.
    pub fn complete(&self) -> Option<PortSet> {
        let db = nonzero(self.db_port)?;
        let api = nonzero(self.api_port)?;
        let studio = nonzero(self.studio_port)?;

        let inbucket = match nonzero(self.inbucket_port) {
            Some(port) => port,
            None => studio.checked_add(1)?,
        };
        let shadow = match nonzero(self.shadow_port) {
            Some(port) => port,
            None => db.checked_add(50)?,
        };
        let pooler = match nonzero(self.pooler_port) {
            Some(port) => port,
            None => db.checked_add(10)?,
        };

        Some(PortSet {
            db_port: db,
            api_port: api,
            studio_port: studio,
            inbucket_port: inbucket,
            shadow_port: shadow,
            pooler_port: pooler,
        })
    }

    /// True when no field was supplied.
    pub fn is_empty(&self) -> bool {
        [
            self.db_port,
            self.api_port,
            self.studio_port,
            self.inbucket_port,
            self.shadow_port,
            self.pooler_port,
        ]
        .iter()
        .all(|p| nonzero(*p).is_none())
    }
}

fn nonzero(port: Option<u16>) -> Option<u16> {
    port.filter(|p| *p != 0)
}

/// Persisted mapping from project name to its allocated ports.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PortRegistry {
    #[serde(default)]
    pub projects: BTreeMap<String, PortSet>,
}

impl PortRegistry {
    pub fn get(&self, project: &str) -> Option<&PortSet> {
        self.projects.get(project)
    }

    pub fn insert(&mut self, project: impl Into<String>, ports: PortSet) {
        self.projects.insert(project.into(), ports);
    }

    /// Remove a project's entry, returning the ports it held.
    pub fn remove(&mut self, project: &str) -> Option<PortSet> {
        self.projects.remove(project)
    }

    pub fn len(&self) -> usize {
        self.projects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.projects.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn explicit(db: u16, api: u16, studio: u16) -> PartialPortSet {
        PartialPortSet {
            db_port: Some(db),
            api_port: Some(api),
            studio_port: Some(studio),
            ..Default::default()
        }
    }

    #[test]
    fn test_complete_derives_missing_ports() {
        let ports = explicit(5000, 5001, 5002).complete().unwrap();
        assert_eq!(
            ports,
            PortSet {
                db_port: 5000,
                api_port: 5001,
                studio_port: 5002,
                inbucket_port: 5003,
                shadow_port: 5050,
                pooler_port: 5010,
            }
        );
    }

    #[test]
    fn test_complete_keeps_supplied_optional_ports() {
        let partial = PartialPortSet {
            inbucket_port: Some(6000),
            shadow_port: Some(6001),
            pooler_port: Some(6002),
            ..explicit(5000, 5001, 5002)
        };
        let ports = partial.complete().unwrap();
        assert_eq!(ports.inbucket_port, 6000);
        assert_eq!(ports.shadow_port, 6001);
        assert_eq!(ports.pooler_port, 6002);
    }

    #[test]
    fn test_complete_requires_all_three() {
        let partial = PartialPortSet {
            db_port: Some(5000),
            studio_port: Some(5002),
            ..Default::default()
        };
        assert!(partial.complete().is_none());
        assert!(PartialPortSet::default().complete().is_none());
    }

    #[test]
    fn test_zero_counts_as_absent() {
        assert!(explicit(0, 5001, 5002).complete().is_none());
        assert!(PartialPortSet {
            db_port: Some(0),
            ..Default::default()
        }
        .is_empty());
    }

    #[test]
    fn test_complete_rejects_overflowing_derivation() {
        assert!(explicit(65500, 5001, 5002).complete().is_none());
        assert!(explicit(5000, 5001, 65535).complete().is_none());
    }

    #[test]
    fn test_registry_serializes_camel_case() {
        let mut registry = PortRegistry::default();
        registry.insert("app", explicit(5000, 5001, 5002).complete().unwrap());

        let json = serde_json::to_value(&registry).unwrap();
        assert_eq!(json["projects"]["app"]["dbPort"], 5000);
        assert_eq!(json["projects"]["app"]["inbucketPort"], 5003);
        assert_eq!(json["projects"]["app"]["poolerPort"], 5010);
    }

    #[test]
    fn test_registry_missing_projects_key() {
        let registry: PortRegistry = serde_json::from_str("{}").unwrap();
        assert!(registry.is_empty());
    }

    #[test]
    fn test_is_valid_detects_duplicates() {
        let mut ports = explicit(5000, 5001, 5002).complete().unwrap();
        assert!(ports.is_valid());
        ports.pooler_port = ports.api_port;
        assert!(!ports.is_valid());
    }
}
