//! Edge function scaffolding.

use super::names::file_name;
use super::{supabase_dir, templates};
use crate::tree::{join_path, Tree};
use crate::workspace::read_project;
use anyhow::{bail, Result};
use tracing::info;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum FunctionTemplate {
    #[default]
    Basic,
    Crud,
    Webhook,
}

#[derive(Debug, Clone, clap::Args)]
pub struct FunctionOptions {
    #[arg(long)]
    pub name: String,

    #[arg(long)]
    pub project: String,

    /// Require a valid JWT on requests
    #[arg(long, default_value_t = true, action = clap::ArgAction::Set)]
    pub verify_jwt: bool,

    #[arg(long, value_enum, default_value = "basic")]
    pub template: FunctionTemplate,

    #[arg(long)]
    pub directory: Option<String>,
}

impl FunctionOptions {
    pub fn new(name: impl Into<String>, project: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            project: project.into(),
            verify_jwt: true,
            template: FunctionTemplate::Basic,
            directory: None,
        }
    }
}

/// Create `functions/<name>/index.ts`, the shared CORS helper, and the
/// function's section in `config.toml`. Returns the function directory.
pub fn function(tree: &mut dyn Tree, options: &FunctionOptions) -> Result<String> {
    if options.name.trim().is_empty() {
        bail!("Function name must not be empty");
    }
    let function_name = file_name(options.name.trim());

    let project = read_project(tree, &options.project)?;
    let supabase_path = join_path(&[&project.root, supabase_dir(options.directory.as_deref())]);
    let functions_dir = join_path(&[&supabase_path, "functions"]);

    let cors = join_path(&[&functions_dir, "_shared", "cors.ts"]);
    if !tree.exists(&cors) {
        tree.write_str(&cors, templates::CORS_HELPER);
    }

    let function_dir = join_path(&[&functions_dir, &function_name]);
    let index = join_path(&[&function_dir, "index.ts"]);
    let body = match options.template {
        FunctionTemplate::Basic => templates::basic_function(&function_name),
        FunctionTemplate::Crud => templates::crud_function(&function_name),
        FunctionTemplate::Webhook => templates::webhook_function(&function_name),
    };
    tree.write_str(&index, &body);

    let config_path = join_path(&[&supabase_path, "config.toml"]);
    if let Some(mut config) = tree.read_to_string(&config_path)? {
        let header = format!("[functions.{}]", function_name);
        if !config.contains(&header) {
            config.push_str(&format!("\n{}\nverify_jwt = {}\n", header, options.verify_jwt));
            tree.write_str(&config_path, &config);
        }
    }

    info!("Edge Function '{}' created at {}", function_name, function_dir);
    info!("Next steps:");
    info!("  1. Edit the function at {}", index);
    info!("  2. Run 'nxsupabase run {}:supabase-start' to test locally", options.project);
    info!(
        "  3. Invoke locally: curl -i -X POST 'http://127.0.0.1:54321/functions/v1/{}' -H 'Authorization: Bearer <anon-key>' -H 'Content-Type: application/json' -d '{{\"name\":\"World\"}}'",
        function_name
    );
    Ok(function_dir)
}
