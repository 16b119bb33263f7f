// CLI module - command-line argument parsing and handlers
//
// Provides subcommands for configuration and credential inspection:
// - config --show: Display effective configuration
// - config --path: Show config file path
// - auth status: Report credential state

use crate::config::{Config, VERSION};
use clap::{Parser, Subcommand};

/// Codex Bridge - Anthropic Messages API gateway to ChatGPT Codex
#[derive(Parser)]
#[command(name = "codex-bridge")]
#[command(version = VERSION)]
#[command(about = "Anthropic Messages API gateway to ChatGPT Codex", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Manage configuration
    Config {
        /// Show effective configuration
        #[arg(long)]
        show: bool,

        /// Show config file path
        #[arg(long)]
        path: bool,
    },

    /// Inspect credentials
    Auth {
        #[command(subcommand)]
        command: AuthCommands,
    },
}

#[derive(Subcommand)]
pub enum AuthCommands {
    /// Report credential state
    Status,
}

/// Handle CLI commands. Returns true if a command was handled (exit after).
pub fn handle_cli() -> bool {
    let cli = Cli::parse();

    match cli.command {
        Some(Commands::Config { show, path }) => {
            if path {
                handle_config_path();
            } else if show {
                handle_config_show();
            } else {
                // No flag provided, show help
                println!("Usage: codex-bridge config [--show|--path]");
                println!();
                println!("Options:");
                println!("  --show    Display effective configuration");
                println!("  --path    Show config file path");
            }
            true
        }
        Some(Commands::Auth { command }) => {
            match command {
                AuthCommands::Status => handle_auth_status(),
            }
            true
        }
        None => false, // No subcommand, run the server
    }
}

fn handle_config_path() {
    match Config::config_path() {
        Some(path) => println!("{}", path.display()),
        None => {
            eprintln!("Error: Could not determine config path");
            std::process::exit(1);
        }
    }
}

fn handle_config_show() {
    let config = Config::from_env();

    println!("# Effective configuration (env > file > defaults)");
    println!();
    print!("{}", config.to_toml());

    // Show source info
    println!();
    if let Some(path) = Config::config_path() {
        if path.exists() {
            println!("# Source: {}", path.display());
        } else {
            println!("# Source: defaults (no config file)");
        }
    }
}

fn handle_auth_status() {
    match crate::auth::tokens_path() {
        Some(path) => println!("Token file: {}", path.display()),
        None => println!("Token file: <unresolvable home directory>"),
    }
    println!("Status: {}", crate::auth::status_line());
}
