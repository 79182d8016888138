//! Deterministic port proposal from a project name.
//!
//! The same name always maps to the same candidates on every machine, so
//! team members get matching ports without coordinating. Different names
//! land in one of 100 buckets; bucket collisions are resolved later by
//! probing, not here.

use super::models::PortSet;
use sha2::{Digest, Sha256};

/// Supabase CLI defaults that every offset is applied to.
pub const BASE_DB_PORT: u16 = 54322;
pub const BASE_API_PORT: u16 = 54321;
pub const BASE_STUDIO_PORT: u16 = 54323;
pub const BASE_INBUCKET_PORT: u16 = 54324;

/// Distance between neighbouring projects' port blocks.
pub const PORT_RANGE_SIZE: u16 = 10;
/// Number of distinct blocks.
pub const PORT_BUCKETS: u16 = 100;

const SHADOW_OFFSET: u16 = 50;
const POOLER_OFFSET: u16 = 10;

/// Offset applied to every base port for `project`.
///
/// Uses the first 16 bits of a SHA-256 digest, bounded to
/// `0..=(PORT_BUCKETS - 1) * PORT_RANGE_SIZE`.
pub fn project_port_offset(project: &str) -> u16 {
    let digest = Sha256::digest(project.as_bytes());
    let hash = u16::from_be_bytes([digest[0], digest[1]]);
    (hash % PORT_BUCKETS) * PORT_RANGE_SIZE
}

/// Candidate ports for `project`, before any availability check.
pub fn calculate_ports(project: &str) -> PortSet {
    let offset = project_port_offset(project);
    let db = BASE_DB_PORT + offset;

    PortSet {
        db_port: db,
        api_port: BASE_API_PORT + offset,
        studio_port: BASE_STUDIO_PORT + offset,
        inbucket_port: BASE_INBUCKET_PORT + offset,
        shadow_port: db + SHADOW_OFFSET,
        pooler_port: db + POOLER_OFFSET,
    }
}
