//! CLI argument handling (spec §6, collaborator): `bareclaw repl`,
//! `bareclaw cron <subcommand>`, `bareclaw gateway`, `bareclaw discord`,
//! `bareclaw telegram`, `bareclaw status`.

use crate::config::{default_config_path, load_config};
use crate::cron::task::CronStore;
use crate::cron::CronService;
use crate::runtime::{build_runtime, home_dir};
use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing::info;

#[derive(Parser)]
#[command(name = "bareclaw", about = "Self-hostable runtime for tool-using LLM agents")]
pub struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start an interactive stdin REPL.
    Repl,
    /// Run the minimal HTTP gateway (`/health`, `/webhook`).
    Gateway {
        #[arg(long, default_value = "127.0.0.1:8080")]
        bind: String,
    },
    /// Connect the Discord gateway adapter.
    Discord,
    /// Long-poll the Telegram bot API.
    Telegram,
    /// Manage recurring tasks.
    Cron {
        #[command(subcommand)]
        cmd: CronCommands,
    },
    /// Print workspace, provider, and cron diagnostics.
    Status,
}

#[derive(Subcommand)]
enum CronCommands {
    /// Schedule a shell command.
    Add {
        #[arg(long)]
        schedule: String,
        #[arg(long)]
        command: String,
    },
    /// Schedule an agent prompt.
    AddPrompt {
        #[arg(long)]
        schedule: String,
        #[arg(long)]
        prompt: String,
    },
    /// Remove a scheduled task by id.
    Remove { id: String },
    /// Disable a scheduled task without removing it.
    Pause { id: String },
    /// Re-enable a paused task.
    Resume { id: String },
    /// List every scheduled task.
    List,
    /// Execute every due, enabled task once.
    Run,
}

pub async fn run() -> Result<()> {
    let cli = Cli::parse();
    let home = home_dir();
    let config_path = default_config_path(&home);
    let config = load_config(&config_path)?;

    match cli.command {
        Commands::Repl => {
            let runtime = build_runtime(config, home).await?;
            crate::channels::repl::run(runtime).await
        }
        Commands::Gateway { bind } => {
            let runtime = build_runtime(config, home).await?;
            crate::gateway::serve(runtime, &bind).await
        }
        Commands::Discord => {
            let runtime = build_runtime(config, home).await?;
            crate::channels::discord::run(runtime).await
        }
        Commands::Telegram => {
            let runtime = build_runtime(config, home).await?;
            crate::channels::telegram::run(runtime).await
        }
        Commands::Cron { cmd } => run_cron(cmd, config, home).await,
        Commands::Status => {
            let runtime = build_runtime(config, home).await?;
            print_status(&runtime).await;
            Ok(())
        }
    }
}

async fn run_cron(cmd: CronCommands, config: crate::config::Config, home: std::path::PathBuf) -> Result<()> {
    let store = CronStore::new(CronStore::default_path(&home));
    let service = CronService::new(store);

    match cmd {
        CronCommands::Add { schedule, command } => {
            let task = service.add_shell(&schedule, &command).map_err(anyhow::Error::msg)?;
            println!("added task {} ({})", task.id, task.schedule);
        }
        CronCommands::AddPrompt { schedule, prompt } => {
            let task = service.add_prompt(&schedule, &prompt).map_err(anyhow::Error::msg)?;
            println!("added task {} ({})", task.id, task.schedule);
        }
        CronCommands::Remove { id } => {
            if service.remove(&id).map_err(anyhow::Error::msg)? {
                println!("removed {id}");
            } else {
                println!("no such task: {id}");
            }
        }
        CronCommands::Pause { id } => {
            service.set_enabled(&id, false).map_err(anyhow::Error::msg)?;
            println!("paused {id}");
        }
        CronCommands::Resume { id } => {
            service.set_enabled(&id, true).map_err(anyhow::Error::msg)?;
            println!("resumed {id}");
        }
        CronCommands::List => {
            for task in service.list().map_err(anyhow::Error::msg)? {
                println!(
                    "{}\t{}\t{}\tenabled={}\tnext_run={}",
                    task.id, task.schedule, if task.prompt.is_empty() { &task.command } else { &task.prompt }, task.enabled, task.next_run
                );
            }
        }
        CronCommands::Run => {
            let runtime = build_runtime(config, home).await?;
            let results = service
                .run_due(runtime.provider.as_ref(), &runtime.registry, &runtime.tool_ctx, &runtime.config.default_model)
                .await
                .map_err(anyhow::Error::msg)?;
            for (id, output) in results {
                info!("cron task {id} ran");
                println!("[{id}] {output}");
            }
        }
    }
    Ok(())
}

async fn print_status(runtime: &crate::runtime::Runtime) {
    println!("workspace: {}", runtime.tool_ctx.security.workspace_dir().display());
    println!("provider: {}", runtime.config.default_provider);
    println!("fallback providers: {}", runtime.config.fallback_providers.join(", "));
    println!("tools registered: {}", runtime.registry.len());
    println!("mcp servers configured: {}", runtime.config.mcp_servers.len());

    let home = crate::runtime::home_dir();
    let store = CronStore::new(CronStore::default_path(&home));
    match store.load() {
        Ok(tasks) => println!("cron tasks: {} ({} enabled)", tasks.len(), tasks.iter().filter(|t| t.enabled).count()),
        Err(e) => println!("cron tasks: unavailable ({e})"),
    }
}
