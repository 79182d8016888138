//! File templates written by the generators.

use crate::ports::PortSet;

/// `supabase/config.toml` for a project.
pub fn config_toml(project_id: &str, ports: &PortSet, edge_functions: bool) -> String {
    format!(
        r#"# Supabase local development configuration.
# Ports are allocated per project so several stacks can run side by side.

project_id = "{project_id}"

[api]
enabled = true
port = {api}
schemas = ["public", "graphql_public"]
extra_search_path = ["public", "extensions"]
max_rows = 1000

[db]
port = {db}
shadow_port = {shadow}
major_version = 15

[db.pooler]
enabled = false
port = {pooler}
pool_mode = "transaction"
default_pool_size = 20
max_client_conn = 100

[db.seed]
enabled = true
sql_paths = ["./seed.sql"]

[studio]
enabled = true
port = {studio}
api_url = "http://127.0.0.1"

[inbucket]
enabled = true
port = {inbucket}

[storage]
enabled = true
file_size_limit = "50MiB"

[auth]
enabled = true
site_url = "http://127.0.0.1:3000"
additional_redirect_urls = ["https://127.0.0.1:3000"]
jwt_expiry = 3600
enable_refresh_token_rotation = true
enable_signup = true

[auth.email]
enable_signup = true
double_confirm_changes = true
enable_confirmations = false

[edge_runtime]
enabled = {edge}
policy = "oneshot"
"#,
        project_id = project_id,
        api = ports.api_port,
        db = ports.db_port,
        shadow = ports.shadow_port,
        pooler = ports.pooler_port,
        studio = ports.studio_port,
        inbucket = ports.inbucket_port,
        edge = edge_functions,
    )
}

pub const SUPABASE_GITIGNORE: &str = "# Supabase\n.branches\n.temp\n.env\n";

/// Block appended to the workspace `.gitignore` by `init`.
pub const WORKSPACE_GITIGNORE_BLOCK: &str = "\n# Supabase\n.supabase/\nsupabase/.temp/\n*.local.toml\n";

pub fn migration_sql(migration_name: &str, created_at: &str) -> String {
    format!(
        r#"-- Migration: {migration_name}
-- Created at: {created_at}

-- Write your migration SQL here

-- Example: Create a table
-- CREATE TABLE public.example (
--   id uuid PRIMARY KEY DEFAULT gen_random_uuid(),
--   name text NOT NULL,
--   created_at timestamptz DEFAULT now()
-- );

-- Example: Add RLS policies
-- ALTER TABLE public.example ENABLE ROW LEVEL SECURITY;
-- CREATE POLICY "Enable read access for all users" ON public.example FOR SELECT USING (true);
"#
    )
}

pub const SEED_SQL: &str = r#"-- Supabase seed file
-- Runs after migrations on `supabase db reset`.
-- Insert initial data for local development here.

-- ============================================================================
-- SEED DATA
-- ============================================================================

-- Example: test users
-- INSERT INTO auth.users (id, email, encrypted_password, email_confirmed_at, created_at, updated_at)
-- VALUES
--   ('00000000-0000-0000-0000-000000000001', 'admin@example.com', '$2a$10$abcdefghijklmnopqrstuv', now(), now(), now()),
--   ('00000000-0000-0000-0000-000000000002', 'user@example.com', '$2a$10$abcdefghijklmnopqrstuv', now(), now(), now());

-- Example: profiles linked to users
-- INSERT INTO public.profiles (id, user_id, full_name)
-- VALUES
--   (gen_random_uuid(), '00000000-0000-0000-0000-000000000001', 'Admin User'),
--   (gen_random_uuid(), '00000000-0000-0000-0000-000000000002', 'Test User');

-- ============================================================================
-- ADD YOUR SEED DATA BELOW
-- ============================================================================

"#;

pub const CORS_HELPER: &str = r#"// CORS headers for Supabase Edge Functions
export const corsHeaders = {
  'Access-Control-Allow-Origin': '*',
  'Access-Control-Allow-Headers': 'authorization, x-client-info, apikey, content-type',
};
"#;

const JSON_HEADERS: &str = r#"{ ...corsHeaders, "Content-Type": "application/json" }"#;

pub fn basic_function(function_name: &str) -> String {
    format!(
        r#"import {{ serve }} from "https://deno.land/std@0.168.0/http/server.ts";
import {{ corsHeaders }} from "../_shared/cors.ts";

console.log("{function_name} function started");

serve(async (req) => {{
  if (req.method === "OPTIONS") {{
    return new Response("ok", {{ headers: corsHeaders }});
  }}

  try {{
    const {{ name }} = await req.json();
    const data = {{ message: `Hello ${{name || "World"}}!` }};

    return new Response(JSON.stringify(data), {{
      headers: {JSON_HEADERS},
      status: 200,
    }});
  }} catch (error) {{
    return new Response(JSON.stringify({{ error: error.message }}), {{
      headers: {JSON_HEADERS},
      status: 400,
    }});
  }}
}});
"#
    )
}

pub fn crud_function(function_name: &str) -> String {
    format!(
        r#"import {{ serve }} from "https://deno.land/std@0.168.0/http/server.ts";
import {{ createClient }} from "https://esm.sh/@supabase/supabase-js@2";
import {{ corsHeaders }} from "../_shared/cors.ts";

console.log("{function_name} CRUD function started");

const json = (body: unknown, status = 200) =>
  new Response(JSON.stringify(body), {{ headers: {JSON_HEADERS}, status }});

serve(async (req) => {{
  if (req.method === "OPTIONS") {{
    return new Response("ok", {{ headers: corsHeaders }});
  }}

  try {{
    const supabaseClient = createClient(
      Deno.env.get("SUPABASE_URL") ?? "",
      Deno.env.get("SUPABASE_ANON_KEY") ?? "",
      {{ global: {{ headers: {{ Authorization: req.headers.get("Authorization")! }} }} }}
    );

    const {{ data: {{ user }} }} = await supabaseClient.auth.getUser();
    if (!user) {{
      throw new Error("User not authenticated");
    }}

    const id = new URL(req.url).searchParams.get("id");
    const table = supabaseClient.from("your_table");

    switch (req.method) {{
      case "GET": {{
        const {{ data, error }} = id
          ? await table.select("*").eq("id", id).single()
          : await table.select("*");
        if (error) throw error;
        return json(data);
      }}
      case "POST": {{
        const {{ data, error }} = await table.insert(await req.json()).select().single();
        if (error) throw error;
        return json(data, 201);
      }}
      case "PUT": {{
        if (!id) throw new Error("ID required for update");
        const {{ data, error }} = await table.update(await req.json()).eq("id", id).select().single();
        if (error) throw error;
        return json(data);
      }}
      case "DELETE": {{
        if (!id) throw new Error("ID required for delete");
        const {{ error }} = await table.delete().eq("id", id);
        if (error) throw error;
        return new Response(null, {{ headers: corsHeaders, status: 204 }});
      }}
      default:
        return new Response("Method not allowed", {{ headers: corsHeaders, status: 405 }});
    }}
  }} catch (error) {{
    return json({{ error: error.message }}, 400);
  }}
}});
"#
    )
}

pub fn webhook_function(function_name: &str) -> String {
    format!(
        r#"import {{ serve }} from "https://deno.land/std@0.168.0/http/server.ts";
import {{ corsHeaders }} from "../_shared/cors.ts";

console.log("{function_name} webhook function started");

// Verify the webhook signature for your provider.
async function verifySignature(payload: string, signature: string): Promise<boolean> {{
  return true;
}}

serve(async (req) => {{
  if (req.method === "OPTIONS") {{
    return new Response("ok", {{ headers: corsHeaders }});
  }}
  if (req.method !== "POST") {{
    return new Response("Method not allowed", {{ headers: corsHeaders, status: 405 }});
  }}

  try {{
    const signature = req.headers.get("x-webhook-signature") || "";
    const payload = await req.text();

    if (!(await verifySignature(payload, signature))) {{
      return new Response(JSON.stringify({{ error: "Invalid signature" }}), {{
        headers: {JSON_HEADERS},
        status: 401,
      }});
    }}

    const event = JSON.parse(payload);
    switch (event.type) {{
      case "user.created":
        console.log("User created:", event.data);
        break;
      case "payment.completed":
        console.log("Payment completed:", event.data);
        break;
      default:
        console.log("Unhandled event type:", event.type);
    }}

    return new Response(JSON.stringify({{ received: true }}), {{
      headers: {JSON_HEADERS},
      status: 200,
    }});
  }} catch (error) {{
    console.error("Webhook error:", error);
    return new Response(JSON.stringify({{ error: error.message }}), {{
      headers: {JSON_HEADERS},
      status: 400,
    }});
  }}
}});
"#
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_toml_carries_every_port() {
        let ports = PortSet::from_array([54332, 54331, 54333, 54334, 54382, 54342]);
        let toml = config_toml("web", &ports, true);
        assert!(toml.contains("project_id = \"web\""));
        assert!(toml.contains("[api]\nenabled = true\nport = 54331\n"));
        assert!(toml.contains("[db]\nport = 54332\nshadow_port = 54382\n"));
        assert!(toml.contains("[db.pooler]\nenabled = false\nport = 54342\n"));
        assert!(toml.contains("[studio]\nenabled = true\nport = 54333\n"));
        assert!(toml.contains("[inbucket]\nenabled = true\nport = 54334\n"));
        assert!(toml.contains("[edge_runtime]\nenabled = true\n"));
    }

    #[test]
    fn test_function_templates_mention_name() {
        for body in [
            basic_function("hello"),
            crud_function("hello"),
            webhook_function("hello"),
        ] {
            assert!(body.contains("console.log(\"hello "));
            assert!(body.contains("../_shared/cors.ts"));
            assert!(body.contains(r#"headers: { ...corsHeaders, "Content-Type": "application/json" }"#));
        }
        assert!(basic_function("x").contains("`Hello ${name || \"World\"}!`"));
    }
}
