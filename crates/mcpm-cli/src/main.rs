//! mcpm - MCP server manager
//!
//! Usage:
//!   mcpm list                          # Servers of every client
//!   mcpm add fs --scope user -- npx -y @modelcontextprotocol/server-filesystem .
//!   mcpm disable fs                    # Scope is detected when unambiguous
//!   mcpm rescope fs --to project-mcp   # Consolidate every copy into one scope
//!   mcpm catalog search git

use std::process::ExitCode;

use anyhow::{Result, bail};
use clap::{Args, Parser, Subcommand, ValueEnum};
use console::style;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use mcpm_core::catalog::CatalogEntry;
use mcpm_core::prelude::*;

#[derive(Parser)]
#[command(name = "mcpm")]
#[command(about = "Manage MCP servers across client configuration scopes", long_about = None)]
struct Cli {
    /// Client to operate on (defaults to the detected default client)
    #[arg(long, global = true)]
    client: Option<String>,

    /// Output format
    #[arg(short, long, global = true, default_value = "table")]
    format: OutputFormat,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List configured servers
    ///
    /// Without --client, servers of every available client are listed.
    #[command(alias = "ls")]
    List {
        /// Only servers in this scope
        #[arg(long)]
        scope: Option<String>,

        /// Only servers in this state (enabled, disabled)
        #[arg(long)]
        state: Option<ServerState>,
    },

    /// Show the highest-priority definition of a server
    Info {
        /// Server id
        id: String,
    },

    /// Summary across every client
    Status,

    /// Add a server to a scope
    Add(ServerArgs),

    /// Replace the definition of a server in a scope
    Update(ServerArgs),

    /// Remove a server from a scope
    #[command(alias = "rm")]
    Remove {
        /// Server id
        id: String,

        /// Scope to remove from
        #[arg(long)]
        scope: String,
    },

    /// Enable a server
    Enable {
        /// Server id
        id: String,

        /// Scope holding the server (required when it lives in several)
        #[arg(long)]
        scope: Option<String>,
    },

    /// Disable a server without losing its definition
    Disable {
        /// Server id
        id: String,

        /// Scope holding the server (required when it lives in several)
        #[arg(long)]
        scope: Option<String>,
    },

    /// Move a server into one scope, removing it from every other scope
    Rescope {
        /// Server id
        id: String,

        /// Target scope
        #[arg(long)]
        to: String,

        /// Show what would change without writing anything
        #[arg(long)]
        dry_run: bool,
    },

    /// List registered clients
    Clients,

    /// List the scopes of a client
    Scopes,

    /// Browse the server catalog
    Catalog(CatalogArgs),
}

#[derive(Clone, Copy, ValueEnum, Default)]
enum OutputFormat {
    /// Human-readable table
    #[default]
    Table,
    /// Machine-readable JSON
    Json,
}

#[derive(Args)]
struct ServerArgs {
    /// Server id
    id: String,

    /// Scope to write to
    #[arg(long)]
    scope: String,

    /// Transport type (stdio, websocket or http)
    #[arg(long = "type", value_name = "TRANSPORT")]
    transport: Option<TransportType>,

    /// Endpoint for remote transports
    #[arg(long)]
    url: Option<String>,

    /// Environment variable (KEY=VALUE)
    #[arg(long, value_name = "KEY=VALUE")]
    env: Vec<String>,

    /// Stdio command and its arguments (after --)
    #[arg(last = true)]
    command: Vec<String>,
}

#[derive(Args)]
struct CatalogArgs {
    #[command(subcommand)]
    command: CatalogSubcommand,
}

#[derive(Subcommand)]
enum CatalogSubcommand {
    /// List every catalog entry
    List,

    /// Search ids, names, descriptions and tags
    Search {
        /// Case-insensitive query
        query: String,
    },

    /// Add a catalog entry to a scope
    Add {
        /// Catalog entry id
        entry: String,

        /// Scope to write to
        #[arg(long)]
        scope: String,

        /// Server id to use instead of the entry id
        #[arg(long)]
        id: Option<String>,
    },
}

fn main() -> ExitCode {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "mcpm=info,warn".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    match run(cli) {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(err) => {
            eprintln!("{} {err:#}", style("error:").red().bold());
            ExitCode::FAILURE
        }
    }
}

fn load_manager() -> Result<Manager> {
    let settings = match McpmSettings::default_path() {
        Some(path) => {
            tracing::debug!(path = %path.display(), "loading settings");
            McpmSettings::load(&path)?
        }
        None => McpmSettings::default(),
    };
    let ctx = ClientContext::from_env()?;
    Manager::from_settings(ctx, &settings)
}

/// Run one command; `Ok(false)` means the operation itself reported failure.
fn run(cli: Cli) -> Result<bool> {
    let manager = load_manager()?;
    let client = cli.client.as_deref();
    let format = cli.format;

    match cli.command {
        Commands::List { scope, state } => {
            let servers = manager.list_servers(client, scope.as_deref(), state)?;
            print_servers(&servers, format)?;
            Ok(true)
        }
        Commands::Info { id } => match manager.get_server_info(&id, client)? {
            Some(info) => {
                print_server_info(&info, format)?;
                Ok(true)
            }
            None => {
                let location = match client {
                    Some(name) => format!("in client '{name}'"),
                    None => "in any client".to_string(),
                };
                print_result(&McpmError::not_found(&id, location).into(), format)
            }
        },
        Commands::Status => {
            print_status(&manager.get_status_summary(), format)?;
            Ok(true)
        }
        Commands::Add(args) => {
            let config = build_config(&args)?;
            print_result(
                &manager.add_server(&args.id, &config, &args.scope, client),
                format,
            )
        }
        Commands::Update(args) => {
            let config = build_config(&args)?;
            print_result(
                &manager.update_server(&args.id, &config, &args.scope, client),
                format,
            )
        }
        Commands::Remove { id, scope } => {
            print_result(&manager.remove_server(&id, &scope, client), format)
        }
        Commands::Enable { id, scope } => print_result(
            &manager.enable_server(&id, scope.as_deref(), client),
            format,
        ),
        Commands::Disable { id, scope } => print_result(
            &manager.disable_server(&id, scope.as_deref(), client),
            format,
        ),
        Commands::Rescope { id, to, dry_run } => {
            let options = RescopeOptions { dry_run };
            print_result(&manager.rescope(&id, &to, client, options), format)
        }
        Commands::Clients => {
            let default = manager.default_client().map(str::to_string);
            print_clients(&manager.client_infos(), default.as_deref(), format)?;
            Ok(true)
        }
        Commands::Scopes => {
            let scopes = manager.get_scopes_for_client(client)?;
            print_scopes(&scopes, format)?;
            Ok(true)
        }
        Commands::Catalog(args) => run_catalog(&manager, args, client, format),
    }
}

fn run_catalog(
    manager: &Manager,
    args: CatalogArgs,
    client: Option<&str>,
    format: OutputFormat,
) -> Result<bool> {
    match args.command {
        CatalogSubcommand::List => {
            let entries: Vec<&CatalogEntry> = manager.catalog().entries().iter().collect();
            print_catalog(&entries, format)?;
            Ok(true)
        }
        CatalogSubcommand::Search { query } => {
            let entries = manager.catalog().search(&query);
            print_catalog(&entries, format)?;
            Ok(true)
        }
        CatalogSubcommand::Add { entry, scope, id } => print_result(
            &manager.add_from_catalog(&entry, id.as_deref(), &scope, client),
            format,
        ),
    }
}

/// Turn `add`/`update` arguments into a server definition.
fn build_config(args: &ServerArgs) -> Result<ServerConfig> {
    let transport = args.transport.unwrap_or(if args.url.is_some() {
        TransportType::Http
    } else {
        TransportType::Stdio
    });

    let mut config = if transport.is_remote() {
        let Some(url) = &args.url else {
            bail!("--url is required for {transport} servers");
        };
        if !args.command.is_empty() {
            bail!("{transport} servers take a --url, not a command");
        }
        ServerConfig::remote(transport, url)
    } else {
        if args.url.is_some() {
            bail!("--url only applies to remote transports (http, websocket)");
        }
        let Some((command, rest)) = args.command.split_first() else {
            bail!("Missing command: pass it after --, e.g. `-- npx -y <package>`");
        };
        ServerConfig::stdio(command, rest.to_vec())
    };

    for pair in &args.env {
        let Some((key, value)) = pair.split_once('=') else {
            bail!("Invalid --env '{pair}': expected KEY=VALUE");
        };
        if key.is_empty() {
            bail!("Invalid --env '{pair}': empty key");
        }
        config = config.with_env(key, value);
    }

    Ok(config)
}

fn print_json(value: &impl serde::Serialize) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn print_result(result: &OperationResult, format: OutputFormat) -> Result<bool> {
    match format {
        OutputFormat::Table => {
            if result.success {
                let symbol = if result.changed() { "✓" } else { "•" };
                println!("{} {}", style(symbol).green(), result.message);
            } else {
                println!("{} {}", style("✗").red(), result.message);
                for error in &result.errors {
                    println!("  {}", style(error).red());
                }
            }
        }
        OutputFormat::Json => print_json(result)?,
    }
    Ok(result.success)
}

fn print_servers(servers: &[ServerInfo], format: OutputFormat) -> Result<()> {
    if let OutputFormat::Json = format {
        return print_json(&servers);
    }

    if servers.is_empty() {
        println!("No servers configured");
        return Ok(());
    }

    println!(
        "  {:<20} {:<15} {:<15} {:<14} Command",
        "ID", "Client", "Scope", "State"
    );
    println!("  {}", "-".repeat(80));

    for server in servers {
        println!(
            "  {:<20} {:<15} {:<15} {:<14} {}",
            truncate(&server.id, 20),
            server.client,
            truncate(&server.scope, 15),
            state_label(server.state),
            truncate(&launch_summary(&server.config), 40)
        );
        for issue in &server.issues {
            println!("      {} {}", style("⚠").yellow(), issue);
        }
    }
    Ok(())
}

fn print_server_info(info: &ServerInfo, format: OutputFormat) -> Result<()> {
    if let OutputFormat::Json = format {
        return print_json(info);
    }

    println!("{}", style(info.qualified_id()).bold());
    println!("  State:    {}", state_label(info.state));
    println!("  Priority: {}", info.priority);
    println!("  Config:");
    for line in serde_json::to_string_pretty(&info.config)?.lines() {
        println!("    {line}");
    }
    for issue in &info.issues {
        println!("  {} {}", style("⚠").yellow(), issue);
    }
    Ok(())
}

fn print_status(summary: &StatusSummary, format: OutputFormat) -> Result<()> {
    if let OutputFormat::Json = format {
        return print_json(summary);
    }

    println!("{}", style("Servers").bold());
    println!(
        "  {} total, {} enabled, {} disabled",
        summary.total,
        summary.count(ServerState::Enabled),
        summary.count(ServerState::Disabled)
    );
    for (client, count) in &summary.by_client {
        println!("  {client:<15} {count}");
    }
    if summary.invalid > 0 {
        println!(
            "  {} {} with validation issues",
            style("⚠").yellow(),
            summary.invalid
        );
    }

    println!("\n{}", style("Clients").bold());
    println!(
        "  Default:     {}",
        summary.default_client.as_deref().unwrap_or("-")
    );
    println!("  Available:   {}", join_or_dash(&summary.clients));
    if !summary.unavailable_clients.is_empty() {
        println!("  Unavailable: {}", summary.unavailable_clients.join(", "));
    }

    println!("\n{}", style("Catalog").bold());
    let runtimes: Vec<String> = summary
        .catalog
        .by_runtime
        .iter()
        .map(|(runtime, count)| format!("{runtime} {count}"))
        .collect();
    println!(
        "  {} entries ({}), {} tags",
        summary.catalog.total,
        runtimes.join(", "),
        summary.catalog.tags
    );
    Ok(())
}

fn print_clients(
    clients: &[ClientInfo],
    default: Option<&str>,
    format: OutputFormat,
) -> Result<()> {
    if let OutputFormat::Json = format {
        return print_json(&serde_json::json!({
            "default_client": default,
            "clients": clients,
        }));
    }

    println!("  {:<16} {:<10} {:<10} Scopes", "Client", "Status", "Installed");
    println!("  {}", "-".repeat(60));
    for client in clients {
        let marker = if Some(client.name.as_str()) == default {
            "*"
        } else {
            " "
        };
        let status = if client.available {
            style("ok").green()
        } else {
            style("error").red()
        };
        let scopes: Vec<&str> = client.scopes.iter().map(|s| s.name.as_str()).collect();
        println!(
            "{} {:<16} {:<10} {:<10} {}",
            marker,
            client.name,
            status,
            if client.installed { "yes" } else { "no" },
            scopes.join(", ")
        );
        if let Some(error) = &client.error {
            println!("    {}", style(error).red());
        }
    }
    Ok(())
}

fn print_scopes(scopes: &[ScopeInfo], format: OutputFormat) -> Result<()> {
    if let OutputFormat::Json = format {
        return print_json(&scopes);
    }

    println!(
        "  {:<15} {:<4} {:<8} {:<9} {:<7} Path",
        "Scope", "Prio", "Level", "Strategy", "Flags"
    );
    println!("  {}", "-".repeat(80));
    for scope in scopes {
        let strategy = scope.strategy.map(|s| s.as_str()).unwrap_or("-");
        let mut flags = String::new();
        if scope.exists {
            flags.push('e');
        }
        if scope.readonly {
            flags.push('r');
        }
        let path = scope
            .path
            .as_ref()
            .map(|p| p.display().to_string())
            .unwrap_or_else(|| "(virtual)".to_string());
        println!(
            "  {:<15} {:<4} {:<8} {:<9} {:<7} {}",
            scope.name, scope.priority, scope.level, strategy, flags, path
        );
    }
    Ok(())
}

fn print_catalog(entries: &[&CatalogEntry], format: OutputFormat) -> Result<()> {
    if let OutputFormat::Json = format {
        return print_json(&entries);
    }

    if entries.is_empty() {
        println!("No catalog entries match");
        return Ok(());
    }

    println!(
        "  {:<20} {:<8} {:<40} Description",
        "ID", "Runtime", "Package"
    );
    println!("  {}", "-".repeat(90));
    for entry in entries {
        println!(
            "  {:<20} {:<8} {:<40} {}",
            entry.id,
            entry.runtime,
            truncate(&entry.package, 40),
            truncate(&entry.description, 50)
        );
    }
    Ok(())
}

fn state_label(state: ServerState) -> String {
    match state {
        ServerState::Enabled => style("enabled").green().to_string(),
        ServerState::Disabled => style("disabled").yellow().to_string(),
        ServerState::NotInstalled => style("-").dim().to_string(),
    }
}

/// `command args...` for stdio entries, the url for remote ones.
fn launch_summary(entry: &serde_json::Value) -> String {
    match ServerConfig::from_entry(entry) {
        Ok(config) if config.transport.is_remote() => {
            format!("{} {}", config.transport, config.url.unwrap_or_default())
        }
        Ok(config) => std::iter::once(config.command)
            .chain(config.args)
            .collect::<Vec<_>>()
            .join(" "),
        Err(_) => "(invalid)".to_string(),
    }
}

fn join_or_dash(items: &[String]) -> String {
    if items.is_empty() {
        "-".to_string()
    } else {
        items.join(", ")
    }
}

fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{kept}...")
    }
}
