//! nxsupabase
//!
//! Monorepo build-graph plugin for the Supabase CLI:
//! - Deterministic, collision-free local port allocation per project
//! - Executors wrapping `supabase` commands (start, stop, deploy, ...)
//! - Generators scaffolding Supabase stacks, migrations, seeds and functions
//! - Project detection from `supabase/config.toml` files

pub mod env;
pub mod executors;
pub mod generators;
pub mod platform;
pub mod ports;
pub mod process;
pub mod tree;
pub mod workspace;

#[cfg(test)]
pub(crate) mod test_helpers;

use anyhow::Result;
use executors::ExecutorContext;
use platform::{Docker, SupabaseCli};
use ports::{OsPortProber, PortAllocator};
use process::{CommandRunner, ProcessRunner};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

/// Config file looked up in the current directory when none is given.
pub const DEFAULT_CONFIG_FILE: &str = "nxsupabase.yaml";

// ============================================================================
// YAML config structs (deserialization targets)
// ============================================================================

/// Top-level YAML configuration file structure
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct YamlConfig {
    pub workspace: WorkspaceYamlConfig,
    pub cli: CliYamlConfig,
    pub ports: PortsYamlConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct WorkspaceYamlConfig {
    pub root: String,
}

impl Default for WorkspaceYamlConfig {
    fn default() -> Self {
        Self { root: ".".into() }
    }
}

/// External commands and how long to wait on their probes
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CliYamlConfig {
    /// Supabase CLI invocation, may carry a prefix (`npx supabase`)
    pub supabase_command: String,
    pub docker_command: String,
    /// Applies to `supabase status` and `docker info`
    pub status_timeout_secs: u64,
}

impl Default for CliYamlConfig {
    fn default() -> Self {
        Self {
            supabase_command: "npx supabase".into(),
            docker_command: "docker".into(),
            status_timeout_secs: 10,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PortsYamlConfig {
    /// Upper bound on ports probed when looking for a free one
    pub probe_scan_limit: u16,
}

impl Default for PortsYamlConfig {
    fn default() -> Self {
        Self {
            probe_scan_limit: ports::prober::DEFAULT_SCAN_LIMIT,
        }
    }
}

// ============================================================================
// Runtime config (what the application actually uses)
// ============================================================================

/// Application configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub workspace_root: PathBuf,
    pub supabase_command: String,
    pub docker_command: String,
    pub status_timeout_secs: u64,
    pub probe_scan_limit: u16,
}

impl Config {
    /// Equivalent to `from_yaml_and_env(None)`.
    pub fn from_env() -> Result<Self> {
        Self::from_yaml_and_env(None)
    }

    /// Load configuration from an optional YAML file, then override with env vars.
    ///
    /// Priority: env var > YAML > default
    ///
    /// If `yaml_path` is None, tries `nxsupabase.yaml` in CWD. A missing or
    /// unparsable file falls back to env vars / defaults.
    pub fn from_yaml_and_env(yaml_path: Option<&Path>) -> Result<Self> {
        let yaml = Self::load_yaml(yaml_path);

        Ok(Self {
            workspace_root: std::env::var("NX_WORKSPACE_ROOT")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from(yaml.workspace.root)),
            supabase_command: std::env::var("NXSUPABASE_CLI")
                .unwrap_or(yaml.cli.supabase_command),
            docker_command: std::env::var("NXSUPABASE_DOCKER").unwrap_or(yaml.cli.docker_command),
            status_timeout_secs: std::env::var("NXSUPABASE_STATUS_TIMEOUT_SECS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(yaml.cli.status_timeout_secs),
            probe_scan_limit: std::env::var("NXSUPABASE_PROBE_SCAN_LIMIT")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(yaml.ports.probe_scan_limit),
        })
    }

    /// Try to load and parse a YAML config file. Returns defaults on any failure.
    fn load_yaml(yaml_path: Option<&Path>) -> YamlConfig {
        let default_path = Path::new(DEFAULT_CONFIG_FILE);
        let path = yaml_path.unwrap_or(default_path);

        match std::fs::read_to_string(path) {
            Ok(contents) => match serde_yaml::from_str(&contents) {
                Ok(config) => {
                    tracing::info!("Loaded config from {}", path.display());
                    config
                }
                Err(e) => {
                    tracing::warn!("Failed to parse {}: {}. Using defaults.", path.display(), e);
                    YamlConfig::default()
                }
            },
            Err(_) => {
                tracing::debug!(
                    "No config file at {}, using env vars / defaults",
                    path.display()
                );
                YamlConfig::default()
            }
        }
    }

    pub fn status_timeout(&self) -> Duration {
        Duration::from_secs(self.status_timeout_secs)
    }
}

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub runner: Arc<dyn CommandRunner>,
}

impl AppState {
    /// State backed by real child processes.
    pub fn new(config: Config) -> Self {
        Self::with_runner(config, Arc::new(ProcessRunner::new()))
    }

    pub fn with_runner(config: Config, runner: Arc<dyn CommandRunner>) -> Self {
        Self {
            config: Arc::new(config),
            runner,
        }
    }

    pub fn supabase(&self) -> Result<SupabaseCli> {
        SupabaseCli::new(
            self.runner.clone(),
            &self.config.supabase_command,
            self.config.status_timeout(),
        )
    }

    pub fn docker(&self) -> Result<Docker> {
        Docker::new(
            self.runner.clone(),
            &self.config.docker_command,
            self.config.status_timeout(),
        )
    }

    /// Context for running an executor on behalf of `project_name`.
    pub fn executor_context(&self, project_name: &str) -> Result<ExecutorContext> {
        Ok(ExecutorContext {
            workspace_root: self.config.workspace_root.clone(),
            project_name: project_name.to_string(),
            supabase: self.supabase()?,
            docker: self.docker()?,
        })
    }

    pub fn port_allocator(&self) -> PortAllocator<OsPortProber> {
        PortAllocator::new(OsPortProber::new(self.config.probe_scan_limit))
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod config_tests {
    use super::*;
    use crate::process::MockCommandRunner;
    use std::io::Write;

    #[test]
    fn test_yaml_parsing_full() {
        let yaml = r#"
workspace:
  root: /repo
cli:
  supabase_command: supabase
  docker_command: podman
  status_timeout_secs: 3
ports:
  probe_scan_limit: 20
"#;
        let config: YamlConfig = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.workspace.root, "/repo");
        assert_eq!(config.cli.supabase_command, "supabase");
        assert_eq!(config.cli.docker_command, "podman");
        assert_eq!(config.cli.status_timeout_secs, 3);
        assert_eq!(config.ports.probe_scan_limit, 20);
    }

    #[test]
    fn test_yaml_partial_sections_keep_defaults() {
        let yaml = r#"
cli:
  docker_command: podman
"#;
        let config: YamlConfig = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.cli.docker_command, "podman");
        assert_eq!(config.cli.supabase_command, "npx supabase");
        assert_eq!(config.cli.status_timeout_secs, 10);
        assert_eq!(config.workspace.root, ".");
        assert_eq!(config.ports.probe_scan_limit, 100);
    }

    /// YAML loading, env overrides and fallbacks in one test so the env
    /// mutations don't race with each other.
    #[test]
    fn test_yaml_and_env_lifecycle() {
        fn clear_env() {
            for var in &[
                "NX_WORKSPACE_ROOT",
                "NXSUPABASE_CLI",
                "NXSUPABASE_DOCKER",
                "NXSUPABASE_STATUS_TIMEOUT_SECS",
                "NXSUPABASE_PROBE_SCAN_LIMIT",
            ] {
                std::env::remove_var(var);
            }
        }

        // --- Phase 1: YAML values loaded correctly ---
        let yaml = r#"
workspace:
  root: /yaml/root
cli:
  supabase_command: supabase
  status_timeout_secs: 4
"#;
        let dir = tempfile::tempdir().unwrap();
        let file_path = dir.path().join("nxsupabase.yaml");
        let mut file = std::fs::File::create(&file_path).unwrap();
        file.write_all(yaml.as_bytes()).unwrap();

        clear_env();

        let config = Config::from_yaml_and_env(Some(&file_path)).unwrap();
        assert_eq!(config.workspace_root, PathBuf::from("/yaml/root"));
        assert_eq!(config.supabase_command, "supabase");
        assert_eq!(config.docker_command, "docker");
        assert_eq!(config.status_timeout(), Duration::from_secs(4));

        // --- Phase 2: Env vars override YAML ---
        std::env::set_var("NXSUPABASE_CLI", "bunx supabase");
        std::env::set_var("NXSUPABASE_PROBE_SCAN_LIMIT", "7");
        std::env::set_var("NXSUPABASE_STATUS_TIMEOUT_SECS", "not-a-number");

        let config = Config::from_yaml_and_env(Some(&file_path)).unwrap();
        assert_eq!(config.supabase_command, "bunx supabase");
        assert_eq!(config.probe_scan_limit, 7);
        // Unparsable numbers fall back to YAML
        assert_eq!(config.status_timeout_secs, 4);
        assert_eq!(config.workspace_root, PathBuf::from("/yaml/root"));

        clear_env();

        // --- Phase 3: Broken YAML -> defaults ---
        std::fs::write(&file_path, "cli: [unterminated").unwrap();
        let config = Config::from_yaml_and_env(Some(&file_path)).unwrap();
        assert_eq!(config.supabase_command, "npx supabase");

        // --- Phase 4: No YAML file -> defaults ---
        let nonexistent = dir.path().join("missing.yaml");
        let config = Config::from_yaml_and_env(Some(&nonexistent)).unwrap();
        assert_eq!(config.workspace_root, PathBuf::from("."));
        assert_eq!(config.status_timeout_secs, 10);
        assert_eq!(config.probe_scan_limit, 100);
    }

    #[tokio::test]
    async fn test_app_state_builds_executor_context() {
        let config = Config {
            workspace_root: PathBuf::from("/ws"),
            supabase_command: "npx supabase".into(),
            docker_command: "docker".into(),
            status_timeout_secs: 2,
            probe_scan_limit: 5,
        };
        let mock = Arc::new(MockCommandRunner::new());
        mock.respond_ok("supabase --version", "1.200.3\n");
        let state = AppState::with_runner(config, mock.clone());

        let ctx = state.executor_context("web").unwrap();
        assert_eq!(ctx.project_name, "web");
        assert_eq!(ctx.workspace_root, PathBuf::from("/ws"));
        assert_eq!(ctx.supabase.version().await.as_deref(), Some("1.200.3"));
        assert_eq!(mock.command_lines(), vec!["npx supabase --version"]);
    }

    #[test]
    fn test_blank_cli_command_is_an_error() {
        let config = Config {
            workspace_root: PathBuf::from("/ws"),
            supabase_command: "   ".into(),
            docker_command: "docker".into(),
            status_timeout_secs: 2,
            probe_scan_limit: 5,
        };
        let state = AppState::with_runner(config, Arc::new(MockCommandRunner::new()));
        assert!(state.executor_context("web").is_err());
    }
}
