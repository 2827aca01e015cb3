// SPDX-FileCopyrightText: 2026 Cartpulse Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Cartpulse - cart event reconciliation and order reporting.
//!
//! This is the binary entry point for the Cartpulse service.

#[cfg(not(target_env = "msvc"))]
use tikv_jemallocator::Jemalloc;

#[cfg(not(target_env = "msvc"))]
#[global_allocator]
static GLOBAL: Jemalloc = Jemalloc;

use clap::{Parser, Subcommand};

mod serve;
mod shutdown;

/// Cartpulse - cart event reconciliation and order reporting.
#[derive(Parser, Debug)]
#[command(name = "cartpulse", version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

/// Available subcommands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Start the webhook server and report scheduler.
    Serve,
    /// Print the effective configuration.
    Config,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let config = match cartpulse_config::load_and_validate() {
        Ok(config) => config,
        Err(error) => {
            eprintln!("cartpulse: configuration error: {error}");
            std::process::exit(1);
        }
    };

    match cli.command {
        Some(Commands::Serve) => {
            if let Err(error) = serve::run_serve(config).await {
                eprintln!("cartpulse serve failed: {error}");
                std::process::exit(1);
            }
        }
        Some(Commands::Config) => {
            print_config(config);
        }
        None => {
            println!("cartpulse: use --help for available commands");
        }
    }
}

/// Prints the effective configuration as TOML, with the bot token redacted.
fn print_config(mut config: cartpulse_config::CartpulseConfig) {
    if config.telegram.bot_token.is_some() {
        config.telegram.bot_token = Some("<redacted>".to_string());
    }
    match toml::to_string_pretty(&config) {
        Ok(rendered) => print!("{rendered}"),
        Err(error) => {
            eprintln!("cartpulse: failed to render config: {error}");
            std::process::exit(1);
        }
    }
}
