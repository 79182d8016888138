//! Wrappers around the Supabase CLI and the container runtime.

pub mod docker;
pub mod status;
pub mod supabase;

pub use docker::Docker;
pub use status::{format_status_key, parse_status_output, SupabaseStatus};
pub use supabase::SupabaseCli;
