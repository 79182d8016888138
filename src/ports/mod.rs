//! Deterministic local port allocation
//!
//! Every project gets its own block of six ports so several local Supabase
//! stacks can run side by side. Allocation is split into a pure proposal
//! stage (`calculator`) and a corrective probing stage (`PortProber`), with
//! results kept in a registry so a project's ports stay stable across
//! sessions.
//!
//! Architecture follows the project pattern (trait + impl + mock):
//! - `PortProber` trait: async "is this port free" query
//! - `OsPortProber`: real implementation binding TCP listeners
//! - `MockPortProber`: scripted occupied ports, call counting
//! - `RegistryStore` trait with `TreeRegistryStore` and `MemoryRegistryStore`

pub mod allocator;
pub mod calculator;
pub mod error;
pub mod mock;
pub mod models;
pub mod prober;
pub mod store;
pub mod traits;

pub use allocator::PortAllocator;
pub use calculator::calculate_ports;
pub use error::{PortError, PortResult};
pub use mock::MockPortProber;
pub use models::{PartialPortSet, PortRegistry, PortSet};
pub use prober::OsPortProber;
pub use store::{MemoryRegistryStore, TreeRegistryStore, REGISTRY_PATH};
pub use traits::{PortProber, RegistryStore};
