// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! # Confluence Guard
//!
//! The `confluence-guard` binary puts an allow-list policy between an AI agent
//! and a Confluence site.
//!
//! ## Commands
//!
//! - `confluence-guard serve` - MCP server over stdio
//! - `confluence-guard search|page|children|create|update|prepare-merge` - one-shot tool calls
//! - `confluence-guard config show|validate|generate` - Policy file management
//!
//! Logs always go to stderr; stdout carries protocol messages or command output.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::Colorize;
use std::path::PathBuf;

use confluence_guard::commands::{self, ConfigCommand, PageCommand};
use confluence_guard::connection::{build_dispatcher, ConnectionArgs};

/// Confluence Guard - policy-enforcing Confluence access for AI agents
#[derive(Parser, Debug)]
#[command(name = "confluence-guard")]
#[command(version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Path to the allow-list policy file (overrides discovery)
    #[arg(
        short,
        long,
        global = true,
        env = "CONFLUENCE_MCP_CONFIG",
        value_name = "FILE"
    )]
    config: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, global = true, env = "CONFLUENCE_GUARD_LOG_LEVEL", default_value = "info")]
    log_level: String,

    #[command(flatten)]
    connection: ConnectionArgs,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run the MCP server on stdin/stdout
    #[command(name = "serve")]
    Serve,

    /// Policy configuration management
    #[command(name = "config")]
    Config {
        #[command(subcommand)]
        command: ConfigCommand,
    },

    #[command(flatten)]
    Page(PageCommand),
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    init_logging(&cli.log_level)?;

    match cli.command {
        Some(Commands::Serve) => commands::serve::execute(&cli.connection, cli.config).await,
        Some(Commands::Config { command }) => commands::config::handle_command(command, cli.config).await,
        Some(Commands::Page(command)) => {
            let dispatcher = build_dispatcher(&cli.connection, cli.config)?;
            commands::pages::execute(command, &dispatcher).await
        }
        None => {
            eprintln!("{}", "No command specified. Use --help for usage.".yellow());
            std::process::exit(1);
        }
    }
}

/// Initialize tracing subscriber for logging. Output goes to stderr so the
/// stdio transport stays clean.
fn init_logging(level: &str) -> Result<()> {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .or_else(|_| tracing_subscriber::EnvFilter::try_new(level))
        .context("Failed to create log filter")?;

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .compact()
        .init();

    Ok(())
}
