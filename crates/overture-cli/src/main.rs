//! Overture - MCP server configuration sync
//!
//! Usage:
//!   overture sync            # Write overture servers into every detected client
//!   overture sync --dry-run  # Show what would change
//!   overture discover        # Show which clients are installed
//!   overture audit           # List servers configured outside overture

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use console::style;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use overture_core::audit::{AuditService, generate_suggestions};
use overture_core::client::{ClientAdapter, ClientKind, ClientRegistry};
use overture_core::config::{ConfigDiff, OvertureConfig};
use overture_core::context::AppContext;
use overture_core::discovery::{DiscoveryReport, DiscoveryStatus};
use overture_core::fs::{FileSystem, RealFs};
use overture_core::mcp::server_from_client_entry;
use overture_core::process::{ProcessPort, SystemProcess};
use overture_core::sync::{SyncAction, SyncEngine, SyncOptions, SyncReport};
use overture_core::types::SyncScope;

#[derive(Parser)]
#[command(name = "overture")]
#[command(about = "Sync MCP server definitions into AI coding clients", long_about = None)]
struct Cli {
    /// Use a different user config file
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Write overture servers into client configs
    Sync(SyncArgs),

    /// Detect installed clients
    Discover {
        /// Output format
        #[arg(short, long, default_value = "table")]
        format: OutputFormat,
    },

    /// List servers configured directly in clients
    Audit {
        /// Output format
        #[arg(short, long, default_value = "table")]
        format: OutputFormat,
    },

    /// Manage client config backups
    Backup(BackupArgs),

    /// Adopt a server from a client config into the user config
    Import {
        /// Server name as it appears in the client config
        name: String,

        /// Client to import from; searches all clients when omitted
        #[arg(long, value_name = "CLIENT")]
        from: Option<String>,

        /// Output format
        #[arg(short, long, default_value = "table")]
        format: OutputFormat,
    },
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
struct SyncArgs {
    /// Compute changes without writing
    #[arg(long)]
    dry_run: bool,

    /// Only sync these clients
    #[arg(long = "client", value_name = "CLIENT")]
    clients: Vec<String>,

    /// Which client config to write (user or project)
    #[arg(long, default_value = "user")]
    scope: SyncScope,

    /// Skip backups before overwriting
    #[arg(long)]
    no_backup: bool,

    /// Also write configs for clients that were not detected
    #[arg(long)]
    include_undetected: bool,

    /// Output format
    #[arg(short, long, default_value = "table")]
    format: OutputFormat,
}

#[derive(Args)]
struct BackupArgs {
    #[command(subcommand)]
    command: BackupSubcommand,
}

#[derive(Subcommand)]
enum BackupSubcommand {
    /// List backups, newest first
    List {
        /// Only show backups of this client
        #[arg(long)]
        client: Option<String>,

        /// Output format
        #[arg(short, long, default_value = "table")]
        format: OutputFormat,
    },

    /// Restore a client config from a backup
    Restore {
        /// Client whose config to restore
        client: String,

        /// Backup timestamp; defaults to the newest
        #[arg(long)]
        timestamp: Option<String>,

        /// Output format
        #[arg(short, long, default_value = "table")]
        format: OutputFormat,
    },
}

/// Ports and config shared by every command.
struct Runtime {
    app: AppContext,
    config: OvertureConfig,
    fs: Arc<dyn FileSystem>,
    process: Arc<dyn ProcessPort>,
    registry: ClientRegistry,
}

impl Runtime {
    fn load(config_path: Option<PathBuf>) -> Result<Self> {
        let mut app = AppContext::from_env()?;
        if let Some(path) = config_path {
            app = app.with_user_config(path);
        }
        let config = app.load_config()?;
        tracing::debug!(
            servers = config.mcp.len(),
            user_config = %app.config_store().user_path().display(),
            "Loaded configuration"
        );
        let process: Arc<dyn ProcessPort> = Arc::new(SystemProcess::new()?);
        Ok(Self {
            app,
            config,
            fs: Arc::new(RealFs),
            process,
            registry: ClientRegistry::with_default_clients(),
        })
    }

    fn engine(&self) -> SyncEngine {
        SyncEngine::new(
            Arc::clone(&self.fs),
            Arc::clone(&self.process),
            self.config.clone(),
            self.app.client_context(),
            self.app.backup_dir(&self.config),
        )
    }

    fn adapters(&self) -> Vec<&dyn ClientAdapter> {
        self.registry.all().iter().map(|a| a.as_ref()).collect()
    }

    fn adapter(&self, name: &str) -> Result<&dyn ClientAdapter> {
        let kind: ClientKind = name.parse()?;
        self.registry
            .get(kind.as_str())
            .ok_or_else(|| anyhow::anyhow!("Client not registered: {}", name))
    }

    fn audit_service(&self) -> AuditService {
        AuditService::new(
            Arc::clone(&self.fs),
            self.app.client_context(),
            self.process.platform(),
        )
    }
}

fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "overture=info,warn".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    let runtime = Runtime::load(cli.config)?;

    match cli.command {
        Commands::Sync(args) => run_sync(&runtime, args),
        Commands::Discover { format } => run_discover(&runtime, format),
        Commands::Audit { format } => run_audit(&runtime, format),
        Commands::Backup(args) => run_backup(&runtime, args),
        Commands::Import { name, from, format } => run_import(&runtime, &name, from, format),
    }
}

fn run_sync(runtime: &Runtime, args: SyncArgs) -> Result<()> {
    for client in &args.clients {
        runtime.adapter(client)?;
    }

    let options = SyncOptions {
        dry_run: args.dry_run,
        clients: args.clients,
        scope: args.scope,
        backup: args.no_backup.then_some(false),
        include_undetected: args.include_undetected,
    };

    let engine = runtime.engine();
    let adapters = runtime.registry.filter_by_names(&options.clients);
    let report = engine.sync_all(&adapters, &options);

    match args.format {
        OutputFormat::Table => print_sync_table(&report, options.dry_run),
        OutputFormat::Json => print_sync_json(&report)?,
    }

    if report.has_errors() {
        std::process::exit(1);
    }
    Ok(())
}

fn print_sync_table(report: &SyncReport, dry_run: bool) {
    if report.environment.is_wsl2 {
        println!("Environment: WSL2 ({})", report.environment.platform);
    }

    for result in &report.results {
        let result = match result {
            Ok(result) => result,
            Err(err) => {
                println!("{} {}", style("✗").red(), err);
                continue;
            }
        };

        let path = result
            .config_path
            .as_ref()
            .map(|p| p.display().to_string())
            .unwrap_or_else(|| "-".to_string());

        match result.action {
            SyncAction::Written => {
                println!("{} {} @ {}", style("✓").green(), result.client, path)
            }
            SyncAction::Unchanged => {
                println!("{} {} is up to date", style("•").dim(), result.client)
            }
            SyncAction::DryRun => println!("{} {} @ {}", style("~").cyan(), result.client, path),
            SyncAction::Skipped => {
                println!("{} {} skipped", style("-").dim(), result.client)
            }
        }

        if let Some(diff) = &result.diff
            && (dry_run || diff.has_changes)
        {
            print_diff(diff);
        }
        if let Some(backup) = &result.backup {
            println!("    backup: {}", backup.path.display());
        }
        if !result.preserved.is_empty() {
            println!("    preserved: {}", result.preserved.join(", "));
        }
        for warning in &result.warnings {
            println!("    {} {}", style("⚠").yellow(), warning);
        }
    }

    let errors = report.errors().count();
    let succeeded = report.succeeded().count();
    println!();
    if errors > 0 {
        println!("Summary: {} clients synced, {} failed", succeeded, errors);
    } else if dry_run {
        println!("Summary: dry run over {} clients, nothing written", succeeded);
    } else {
        println!("Summary: {} clients synced", succeeded);
    }
}

fn print_diff(diff: &ConfigDiff) {
    if !diff.has_changes {
        println!("    no changes");
        return;
    }
    for name in &diff.added {
        println!("    {}", style(format!("+ {}", name)).green());
    }
    for entry in &diff.modified {
        println!("    {}", style(format!("~ {}", entry.name)).yellow());
        for change in &entry.changes {
            println!(
                "        {}: {} -> {}",
                change.field,
                display_value(change.old.as_ref()),
                display_value(change.new.as_ref())
            );
        }
    }
    for name in &diff.removed {
        println!("    {}", style(format!("- {}", name)).red());
    }
}

fn display_value(value: Option<&serde_json::Value>) -> String {
    value
        .map(|v| v.to_string())
        .unwrap_or_else(|| "(none)".to_string())
}

fn print_sync_json(report: &SyncReport) -> Result<()> {
    let results: Vec<_> = report
        .results
        .iter()
        .map(|result| match result {
            Ok(result) => serde_json::to_value(result).unwrap_or_default(),
            Err(err) => serde_json::json!({
                "client": err.client(),
                "error": err.to_string(),
            }),
        })
        .collect();

    let output = serde_json::json!({
        "environment": report.environment,
        "results": results,
    });
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}

fn run_discover(runtime: &Runtime, format: OutputFormat) -> Result<()> {
    let engine = runtime.engine();
    let report = engine.discovery().discover_all(&runtime.adapters());

    match format {
        OutputFormat::Table => print_discovery_table(&report),
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&report)?),
    }
    Ok(())
}

fn print_discovery_table(report: &DiscoveryReport) {
    let env = &report.environment;
    match &env.distro_name {
        Some(distro) if env.is_wsl2 => println!("Environment: WSL2 ({})", distro),
        _ if env.is_wsl2 => println!("Environment: WSL2"),
        _ => println!("Environment: {}", env.platform),
    }
    if let Some(profile) = &env.windows_user_profile {
        println!("Windows profile: {}", profile.display());
    }
    println!();

    println!(
        "  {:<16} {:<10} {:<12} {:<15} Location",
        "Client", "Status", "Version", "Source"
    );
    println!("  {}", "-".repeat(76));

    for result in &report.clients {
        let status = match result.status() {
            DiscoveryStatus::Found => style(format!("{:<10}", "found")).green(),
            DiscoveryStatus::NotFound => style(format!("{:<10}", "not found")).dim(),
            DiscoveryStatus::Skipped => style(format!("{:<10}", "skipped")).yellow(),
        };
        let source = serde_json::to_value(result.source)
            .ok()
            .and_then(|v| v.as_str().map(str::to_string))
            .unwrap_or_default();
        let location = result
            .binary_path()
            .or(result.app_bundle_path())
            .map(|p| p.display().to_string())
            .unwrap_or_else(|| "-".to_string());

        println!(
            "  {:<16} {} {:<12} {:<15} {}",
            result.client,
            status,
            result.version.as_deref().unwrap_or("-"),
            source,
            location
        );
        for warning in &result.warnings {
            println!("      {} {}", style("⚠").yellow(), warning);
        }
    }

    let summary = &report.summary;
    println!();
    println!(
        "Summary: {} clients, {} found, {} not found, {} skipped",
        summary.total, summary.found, summary.not_found, summary.skipped
    );
}

fn run_audit(runtime: &Runtime, format: OutputFormat) -> Result<()> {
    let report = runtime
        .audit_service()
        .audit_all_clients(&runtime.adapters(), &runtime.config);
    let suggestions = generate_suggestions(&report);

    match format {
        OutputFormat::Table => {
            if report.is_empty() {
                println!("All client servers are managed by overture.");
                return Ok(());
            }
            for (client, names) in &report {
                println!("{}:", client);
                for name in names {
                    println!("  {}", name);
                }
            }
            println!();
            println!("To manage these with overture:");
            for suggestion in &suggestions {
                println!("  {}", style(suggestion).cyan());
            }
        }
        OutputFormat::Json => {
            let output = serde_json::json!({
                "unmanaged": report,
                "suggestions": suggestions,
            });
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
    }
    Ok(())
}

fn run_backup(runtime: &Runtime, args: BackupArgs) -> Result<()> {
    let engine = runtime.engine();
    let backups = engine.backups();

    match args.command {
        BackupSubcommand::List { client, format } => {
            let records = backups.list_backups(client.as_deref());
            match format {
                OutputFormat::Table => {
                    if records.is_empty() {
                        println!("No backups in {}", backups.backup_dir().display());
                        return Ok(());
                    }
                    println!("{:<16} {:<26} {:>8}", "Client", "Timestamp", "Size");
                    println!("{}", "-".repeat(52));
                    for record in &records {
                        println!(
                            "{:<16} {:<26} {:>8}",
                            record.client, record.timestamp, record.size
                        );
                    }
                }
                OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&records)?),
            }
        }
        BackupSubcommand::Restore {
            client,
            timestamp,
            format,
        } => {
            let adapter = runtime.adapter(&client)?;
            let target = engine.user_config_path(adapter);
            let record = backups.restore_backup(adapter.name(), timestamp.as_deref(), &target)?;

            match format {
                OutputFormat::Table => println!(
                    "✓ Restored {} from {} to {}",
                    adapter.name(),
                    record.timestamp,
                    target.display()
                ),
                OutputFormat::Json => {
                    let output = serde_json::json!({
                        "client": adapter.name(),
                        "timestamp": record.timestamp,
                        "target": target,
                    });
                    println!("{}", serde_json::to_string_pretty(&output)?);
                }
            }
        }
    }
    Ok(())
}

fn run_import(
    runtime: &Runtime,
    name: &str,
    from: Option<String>,
    format: OutputFormat,
) -> Result<()> {
    if runtime.config.mcp.contains_key(name) {
        anyhow::bail!("'{}' is already managed by overture", name);
    }

    let adapters = match &from {
        Some(client) => vec![runtime.adapter(client)?],
        None => runtime.adapters(),
    };

    let audit = runtime.audit_service();
    let mut found = None;
    for adapter in adapters {
        let entries = audit.unmanaged_entries(adapter, &runtime.config)?;
        if let Some(entry) = entries.get(name) {
            found = Some((adapter.name(), server_from_client_entry(name, entry)));
            break;
        }
    }
    let (client, definition) =
        found.ok_or_else(|| anyhow::anyhow!("No unmanaged server named '{}' found", name))?;

    let store = runtime.app.config_store();
    let mut user = store.load_user()?;
    user.mcp.insert(name.to_string(), definition.clone());
    user.validate()
        .with_context(|| format!("Imported server '{}' is not valid", name))?;
    store.save_user(&user)?;

    match format {
        OutputFormat::Table => println!(
            "✓ Imported '{}' from {} into {}",
            name,
            client,
            store.user_path().display()
        ),
        OutputFormat::Json => {
            let output = serde_json::json!({
                "name": name,
                "from": client,
                "definition": definition,
                "config": store.user_path(),
            });
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
    }
    Ok(())
}
