#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

//! # pmonctl
//!
//! Command-line front end for the Pmon control protocol. Talks to the
//! process monitor of a WinCC OA project over its TCP control port and
//! prints results as JSON, so the same operations the MCP tool layer
//! offers to agents are available to operators and scripts.
//!
//! ## Subcommands
//!
//! - `pmonctl status` — runtime status of all managers plus daemon mode
//! - `pmonctl list` — configured managers merged with runtime state
//! - `pmonctl start|stop|kill|remove <index>` — lifecycle and removal
//! - `pmonctl add <index> <manager> [flags]` — append a manager entry
//! - `pmonctl props <index>` — one manager's start configuration
//! - `pmonctl set-props <index> [flags]` — replace a start configuration
//! - `pmonctl tools` — dump the MCP tool definitions as JSON
//!
//! Connection settings resolve in order: command-line flags, then
//! `PMON_*` environment variables, then the TOML config file, then
//! compiled defaults.
//!
//! ## Architecture
//!
//! ```text
//! main.rs       — entry point, clap subcommands, output/exit conventions
//! config.rs     — TOML + env-var configuration
//! client.rs     — PmonClient, one method per Pmon operation
//! session.rs    — one-shot TCP round-trip, accumulate/salvage rules
//! codec.rs      — command framing and reply parsing
//! state.rs      — code labels and the config/status join
//! identity.rs   — own-manager resolution for the tool layer
//! tools.rs      — MCP tool definitions and handlers
//! ```

use clap::{Parser, Subcommand};

use mcp_pmon::client::{CommandOutcome, PmonClient};
use mcp_pmon::config::Config;
use mcp_pmon::error::PmonError;
use mcp_pmon::state::merge_overview;
use mcp_pmon::tools::tool_definitions;
use mcp_pmon::types::ManagerProperties;

/// Pmon manager control from the command line.
#[derive(Parser)]
#[command(name = "pmonctl", version)]
struct Cli {
    /// Path to TOML config file.
    #[arg(long, global = true)]
    config: Option<String>,

    /// Pmon host (overrides config file and environment).
    #[arg(long, global = true)]
    host: Option<String>,

    /// Pmon control port.
    #[arg(long, global = true)]
    port: Option<u16>,

    /// Pmon user name (empty for anonymous access).
    #[arg(long, global = true)]
    user: Option<String>,

    /// Pmon password.
    #[arg(long, global = true)]
    password: Option<String>,

    /// Round-trip timeout in milliseconds.
    #[arg(long, global = true)]
    timeout_ms: Option<u64>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show the runtime status of all managers.
    Status,
    /// List configured managers merged with runtime state.
    List,
    /// Start the manager at the given index.
    Start {
        /// Manager index from `status` or `list`.
        index: u32,
    },
    /// Stop the manager at the given index gracefully.
    Stop {
        /// Manager index from `status` or `list`.
        index: u32,
    },
    /// Kill the manager at the given index immediately.
    Kill {
        /// Manager index from `status` or `list`.
        index: u32,
    },
    /// Add a manager entry to the Pmon configuration.
    Add {
        /// Slot to insert the entry at (1 to 100).
        index: u32,
        /// Manager executable name, e.g. WCCOActrl.
        manager: String,
        /// Start mode: manual, once, or always.
        #[arg(long, default_value = "manual")]
        start_mode: String,
        /// Seconds Pmon waits after a stop before killing the manager.
        #[arg(long, default_value_t = 30)]
        sec_kill: u32,
        /// Restart attempts before Pmon blocks the manager.
        #[arg(long, default_value_t = 3)]
        restart_count: u32,
        /// Minutes after which the restart counter resets.
        #[arg(long, default_value_t = 5)]
        reset_min: u32,
        /// Command-line options passed to the manager.
        #[arg(long, default_value = "")]
        options: String,
    },
    /// Remove the manager entry at the given index.
    Remove {
        /// Manager index from `status` or `list`.
        index: u32,
    },
    /// Show the start configuration of one manager.
    Props {
        /// Manager index from `status` or `list`.
        index: u32,
    },
    /// Replace the start configuration of one manager.
    SetProps {
        /// Manager index from `status` or `list`.
        index: u32,
        /// Start mode: manual, once, or always.
        #[arg(long)]
        start_mode: String,
        /// Seconds Pmon waits after a stop before killing the manager.
        #[arg(long)]
        sec_kill: u32,
        /// Restart attempts before Pmon blocks the manager.
        #[arg(long)]
        restart_count: u32,
        /// Minutes after which the restart counter resets.
        #[arg(long)]
        reset_min: u32,
        /// Command-line options passed to the manager.
        #[arg(long, default_value = "")]
        options: String,
    },
    /// Print the MCP tool definitions as JSON.
    Tools,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let config = match resolved_config(&cli) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("pmonctl: configuration error: {e}");
            std::process::exit(1);
        }
    };

    // Logs go to stderr; stdout carries only the JSON results.
    let log_filter = std::env::var("RUST_LOG").unwrap_or_else(|_| config.logging.level.clone());
    tracing_subscriber::fmt()
        .with_env_filter(log_filter)
        .with_writer(std::io::stderr)
        .init();

    let client = PmonClient::new(config.pmon.clone());
    let exit = run_command(cli.command, &client).await;
    std::process::exit(exit);
}

/// Config file and environment first, then command-line flags on top.
fn resolved_config(cli: &Cli) -> Result<Config, String> {
    let mut config = Config::load(cli.config.as_deref())?;
    if let Some(host) = &cli.host {
        config.pmon.host = host.clone();
    }
    if let Some(port) = cli.port {
        config.pmon.port = port;
    }
    if let Some(user) = &cli.user {
        config.pmon.user = user.clone();
    }
    if let Some(password) = &cli.password {
        config.pmon.password = password.clone();
    }
    if let Some(timeout_ms) = cli.timeout_ms {
        config.pmon.timeout_ms = timeout_ms;
    }
    Ok(config)
}

async fn run_command(command: Commands, client: &PmonClient) -> i32 {
    match command {
        Commands::Status => match client.manager_status().await {
            Ok(status) => {
                print_json(&status);
                0
            }
            Err(e) => query_failure(&e),
        },
        Commands::List => {
            let list = match client.manager_list().await {
                Ok(l) => l,
                Err(e) => return query_failure(&e),
            };
            match client.manager_status().await {
                Ok(status) => {
                    print_json(&merge_overview(&list, &status));
                    0
                }
                Err(e) => query_failure(&e),
            }
        }
        Commands::Start { index } => mutation_exit(&client.start_manager(index).await),
        Commands::Stop { index } => mutation_exit(&client.stop_manager(index).await),
        Commands::Kill { index } => mutation_exit(&client.kill_manager(index).await),
        Commands::Remove { index } => mutation_exit(&client.remove_manager(index).await),
        Commands::Add {
            index,
            manager,
            start_mode,
            sec_kill,
            restart_count,
            reset_min,
            options,
        } => {
            let props = ManagerProperties {
                start_mode,
                sec_kill,
                restart_count,
                reset_min,
                commandline_options: options,
            };
            mutation_exit(&client.add_manager(index, &manager, &props).await)
        }
        Commands::Props { index } => match client.manager_properties(index).await {
            Ok(props) => {
                print_json(&props);
                0
            }
            Err(e) => query_failure(&e),
        },
        Commands::SetProps {
            index,
            start_mode,
            sec_kill,
            restart_count,
            reset_min,
            options,
        } => {
            let props = ManagerProperties {
                start_mode,
                sec_kill,
                restart_count,
                reset_min,
                commandline_options: options,
            };
            mutation_exit(&client.update_manager_properties(index, &props).await)
        }
        Commands::Tools => {
            print_json(&tool_definitions());
            0
        }
    }
}

fn print_json<T: serde::Serialize>(value: &T) {
    println!("{}", serde_json::to_string_pretty(value).unwrap_or_default());
}

fn query_failure(e: &PmonError) -> i32 {
    eprintln!("pmonctl: {e}");
    1
}

fn mutation_exit(outcome: &CommandOutcome) -> i32 {
    print_json(outcome);
    i32::from(!outcome.success)
}
