//! nxsupabase - command-line entry point
//!
//! Runs the generators against the workspace on disk, the executors either
//! directly or through a project's `project.json` target, and the port
//! registry operations.

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use nxsupabase::executors::{
    run_executor, DbPushOptions, DbResetOptions, DeployOptions, ExecutorKind, FunctionsServeOptions,
    GenTypesOptions, MigrateOptions, StartOptions, StatusOptions, StopOptions,
};
use nxsupabase::generators::{
    self, FunctionOptions, InitOptions, MigrationOptions, ProjectOptions, SeedOptions,
};
use nxsupabase::ports::TreeRegistryStore;
use nxsupabase::tree::{FsTree, Tree};
use nxsupabase::workspace::{self, create_nodes, find_config_files, PluginOptions, WorkspaceLock};
use nxsupabase::{AppState, Config};
use serde::Serialize;
use serde_json::Value;
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "nxsupabase")]
#[command(about = "Supabase executors, generators and port allocation for Nx workspaces")]
struct Cli {
    /// YAML config file (default: nxsupabase.yaml in the current directory)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Workspace root (overrides NX_WORKSPACE_ROOT and the config file)
    #[arg(long, global = true)]
    workspace_root: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Register the plugin in nx.json and prepare the workspace
    Init {
        #[command(flatten)]
        options: InitOptions,

        /// List the changes without writing them
        #[arg(long)]
        dry_run: bool,
    },

    /// Add a Supabase stack to an existing project
    Project {
        #[command(flatten)]
        options: ProjectOptions,

        #[arg(long)]
        dry_run: bool,
    },

    /// Create a timestamped SQL migration
    Migration {
        #[command(flatten)]
        options: MigrationOptions,

        #[arg(long)]
        dry_run: bool,
    },

    /// Create a seed file
    Seed {
        #[command(flatten)]
        options: SeedOptions,

        #[arg(long)]
        dry_run: bool,
    },

    /// Scaffold an Edge Function
    Function {
        #[command(flatten)]
        options: FunctionOptions,

        #[arg(long)]
        dry_run: bool,
    },

    /// Run an executor with options given on the command line
    Exec {
        /// Project the executor runs for (used in hints)
        #[arg(long, default_value = "workspace")]
        project: String,

        #[command(subcommand)]
        executor: ExecCommand,
    },

    /// Run a target from a project's project.json, e.g. `web:supabase-start`
    Run {
        target: String,
    },

    /// Inspect and manage the port registry
    Ports {
        #[command(subcommand)]
        action: PortsAction,
    },

    /// Print the Supabase projects inferred from config.toml files as JSON
    Detect,

    /// Check the Supabase CLI and Docker installations
    Doctor,
}

#[derive(Subcommand)]
enum ExecCommand {
    Start(StartOptions),
    Stop(StopOptions),
    Status(StatusOptions),
    DbReset(DbResetOptions),
    Migrate(MigrateOptions),
    DbPush(DbPushOptions),
    Deploy(DeployOptions),
    FunctionsServe(FunctionsServeOptions),
    GenTypes(GenTypesOptions),
}

impl ExecCommand {
    /// Executor kind and its options as they would appear in `project.json`.
    fn into_parts(self) -> Result<(ExecutorKind, Value)> {
        fn json<T: Serialize>(options: T) -> Result<Value> {
            serde_json::to_value(options).context("Failed to serialize executor options")
        }
        Ok(match self {
            ExecCommand::Start(o) => (ExecutorKind::Start, json(o)?),
            ExecCommand::Stop(o) => (ExecutorKind::Stop, json(o)?),
            ExecCommand::Status(o) => (ExecutorKind::Status, json(o)?),
            ExecCommand::DbReset(o) => (ExecutorKind::DbReset, json(o)?),
            ExecCommand::Migrate(o) => (ExecutorKind::Migrate, json(o)?),
            ExecCommand::DbPush(o) => (ExecutorKind::DbPush, json(o)?),
            ExecCommand::Deploy(o) => (ExecutorKind::Deploy, json(o)?),
            ExecCommand::FunctionsServe(o) => (ExecutorKind::FunctionsServe, json(o)?),
            ExecCommand::GenTypes(o) => (ExecutorKind::GenTypes, json(o)?),
        })
    }
}

#[derive(Subcommand)]
enum PortsAction {
    /// Get (allocating if needed) the ports of a project
    Get { project: String },

    /// List every allocation in the registry
    List,

    /// Drop a project's allocation
    Release { project: String },
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file
    dotenvy::dotenv().ok();

    // Logs go to stderr so JSON output on stdout stays parseable
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "warn,nxsupabase=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    let mut config = Config::from_yaml_and_env(cli.config.as_deref())?;
    if let Some(root) = cli.workspace_root {
        config.workspace_root = root;
    }
    let state = AppState::new(config);

    match cli.command {
        Commands::Init { options, dry_run } => {
            run_generator(&state, dry_run, |tree| generators::init(tree, &options)).await
        }
        Commands::Project { options, dry_run } => {
            let allocator = state.port_allocator();
            let lock = acquire_lock(&state, dry_run).await?;
            let mut tree = FsTree::new(&state.config.workspace_root);
            generators::project(&mut tree, &options, &allocator).await?;
            finish(&mut tree, dry_run)?;
            drop(lock);
            Ok(())
        }
        Commands::Migration { options, dry_run } => {
            run_generator(&state, dry_run, |tree| {
                generators::migration(tree, &options).map(|_| ())
            })
            .await
        }
        Commands::Seed { options, dry_run } => {
            run_generator(&state, dry_run, |tree| generators::seed(tree, &options).map(|_| ())).await
        }
        Commands::Function { options, dry_run } => {
            run_generator(&state, dry_run, |tree| {
                generators::function(tree, &options).map(|_| ())
            })
            .await
        }
        Commands::Exec { project, executor } => {
            let (kind, options) = executor.into_parts()?;
            execute(&state, &project, kind, options).await
        }
        Commands::Run { target } => run_target(&state, &target).await,
        Commands::Ports { action } => run_ports(&state, action).await,
        Commands::Detect => detect(&state),
        Commands::Doctor => doctor(&state).await,
    }
}

async fn acquire_lock(state: &AppState, dry_run: bool) -> Result<Option<WorkspaceLock>> {
    if dry_run {
        return Ok(None);
    }
    Ok(Some(WorkspaceLock::acquire(&state.config.workspace_root).await?))
}

/// Run a synchronous generator against the workspace, then flush or list.
async fn run_generator<F>(state: &AppState, dry_run: bool, generate: F) -> Result<()>
where
    F: FnOnce(&mut dyn Tree) -> Result<()>,
{
    let _lock = acquire_lock(state, dry_run).await?;
    let mut tree = FsTree::new(&state.config.workspace_root);
    generate(&mut tree)?;
    finish(&mut tree, dry_run)
}

fn finish(tree: &mut FsTree, dry_run: bool) -> Result<()> {
    let changes = if dry_run {
        tree.list_changes()
    } else {
        tree.flush()?
    };
    for change in &changes {
        println!("{}", change);
    }
    if dry_run {
        println!("NOTE: The \"dryRun\" flag means no changes were made.");
    }
    Ok(())
}

async fn execute(state: &AppState, project: &str, kind: ExecutorKind, options: Value) -> Result<()> {
    let ctx = state.executor_context(project)?;
    let result = run_executor(kind, options, &ctx).await?;
    if !result.success {
        bail!("Executor '{}' failed for project '{}'", kind, project);
    }
    Ok(())
}

async fn run_target(state: &AppState, target: &str) -> Result<()> {
    let Some((project_name, target_name)) = target.split_once(':') else {
        bail!("Expected <project>:<target>, got '{}'", target);
    };

    let tree = FsTree::new(&state.config.workspace_root);
    let project = workspace::read_project(&tree, project_name)?;
    let Some(target_config) = project.config.targets.get(target_name) else {
        bail!("Project '{}' has no target '{}'", project_name, target_name);
    };
    let executor = target_config
        .executor
        .as_deref()
        .with_context(|| format!("Target '{}' has no executor", target))?;
    let kind: ExecutorKind = executor.parse()?;

    let options = match &target_config.options {
        Value::Null => Value::Object(Default::default()),
        options => options.clone(),
    };
    execute(state, project_name, kind, options).await
}

async fn run_ports(state: &AppState, action: PortsAction) -> Result<()> {
    let allocator = state.port_allocator();
    let root = &state.config.workspace_root;

    match action {
        PortsAction::Get { project } => {
            let _lock = WorkspaceLock::acquire(root).await?;
            let mut tree = FsTree::new(root);
            let ports = {
                let mut store = TreeRegistryStore::new(&mut tree);
                allocator.get_ports(&mut store, &project, None).await?
            };
            tree.flush()?;
            println!("{}", serde_json::to_string_pretty(&ports)?);
        }
        PortsAction::List => {
            // Read-only: no lock, nothing created on disk.
            let mut tree = FsTree::new(root);
            let store = TreeRegistryStore::new(&mut tree);
            let registry = allocator.list_allocated(&store)?;
            println!("{}", serde_json::to_string_pretty(&registry.projects)?);
        }
        PortsAction::Release { project } => {
            let _lock = WorkspaceLock::acquire(root).await?;
            let mut tree = FsTree::new(root);
            {
                let mut store = TreeRegistryStore::new(&mut tree);
                allocator.release_ports(&mut store, &project)?;
            }
            tree.flush()?;
        }
    }
    Ok(())
}

fn detect(state: &AppState) -> Result<()> {
    let root = &state.config.workspace_root;
    let options = PluginOptions::load(root)?;
    let nodes = create_nodes(root, &find_config_files(root), &options);
    println!("{}", serde_json::to_string_pretty(&nodes)?);
    Ok(())
}

async fn doctor(state: &AppState) -> Result<()> {
    let supabase = state.supabase()?;
    let docker = state.docker()?;

    let mut healthy = true;
    match supabase.version().await {
        Some(version) => println!("supabase: {}", version),
        None => {
            healthy = false;
            println!("supabase: not found (install with `npm install -g supabase`)");
        }
    }
    match docker.version().await {
        Some(version) => println!("docker:   {}", version),
        None => {
            healthy = false;
            println!("docker:   not found");
        }
    }
    if healthy && !docker.is_running().await {
        healthy = false;
        println!("docker:   installed but the daemon is not running");
    }

    if !healthy {
        bail!("Environment is not ready for local Supabase");
    }
    Ok(())
}
