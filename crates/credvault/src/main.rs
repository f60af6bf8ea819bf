// SPDX-FileCopyrightText: 2026 Credvault Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Credvault - a versioned, envelope-encrypted credential store.
//!
//! Binary entry point: argument parsing, configuration, logging, and
//! dispatch to the command modules.

#[cfg(not(target_env = "msvc"))]
use tikv_jemallocator::Jemalloc;

#[cfg(not(target_env = "msvc"))]
#[global_allocator]
static GLOBAL: Jemalloc = Jemalloc;

mod app;
mod keys;
mod secrets;
mod setup;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Args, Parser, Subcommand};
use credvault_config::CredvaultConfig;
use credvault_core::CredvaultError;

/// Credvault - a versioned, envelope-encrypted credential store.
#[derive(Parser, Debug)]
#[command(name = "credvault", version, about, long_about = None)]
struct Cli {
    /// Extra configuration file, merged after the standard locations.
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Initialize the credential database and local key ring.
    Setup,
    /// Manage wrapping keys in the local key ring.
    Keys {
        #[command(subcommand)]
        command: KeysCommand,
    },
    /// Store a credential.
    Put(PutArgs),
    /// Print a credential, or a JSON document for a `*` pattern.
    Get(GetArgs),
    /// Print every credential as one JSON document.
    Getall(GetallArgs),
    /// Delete one version of a credential, or all of them.
    Delete(DeleteArgs),
    /// List stored credential names and versions.
    List,
}

#[derive(Subcommand, Debug)]
enum KeysCommand {
    /// Create a named wrapping key.
    Create { key_id: String },
    /// List wrapping keys.
    List,
}

#[derive(Args, Debug)]
struct PutArgs {
    name: String,
    /// Credential value; `-` reads it from stdin.
    value: String,
    /// Encryption context as key=value pairs.
    context: Vec<String>,
    /// Wrapping key id (default: kms.default_key_id).
    #[arg(short = 'k', long = "key")]
    key_id: Option<String>,
    /// Version to store (default: 1).
    #[arg(short, long, conflicts_with = "autoversion")]
    version: Option<String>,
    /// Store as the next version after the highest stored one.
    #[arg(short, long)]
    autoversion: bool,
}

#[derive(Args, Debug)]
struct GetArgs {
    /// Credential name; `*` matches any run of characters.
    name: String,
    /// Encryption context as key=value pairs.
    context: Vec<String>,
    #[arg(short, long)]
    version: Option<String>,
    /// Omit the trailing newline.
    #[arg(short = 'n', long, env = "CREDVAULT_GET_NO_NEWLINE", value_parser = clap::builder::BoolishValueParser::new())]
    no_newline: bool,
    /// On failure print nothing and exit successfully.
    #[arg(short = 's', long)]
    silent: bool,
    /// Append error messages to this file.
    #[arg(short = 'e', long, env = "CREDVAULT_GET_ERROUT", value_name = "PATH")]
    error_out: Option<PathBuf>,
    /// Fail a pattern lookup if any matched credential cannot be retrieved.
    #[arg(long)]
    strict: bool,
}

#[derive(Args, Debug)]
struct GetallArgs {
    /// Encryption context as key=value pairs.
    context: Vec<String>,
    #[arg(short, long)]
    version: Option<String>,
    /// Fail if any credential cannot be retrieved.
    #[arg(long)]
    strict: bool,
}

#[derive(Args, Debug)]
struct DeleteArgs {
    name: String,
    #[arg(short, long)]
    version: Option<String>,
}

fn init_tracing(log_level: &str) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("credvault={log_level},warn")));

    // stdout carries secret values and JSON documents only.
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

async fn run(command: Commands, config: &CredvaultConfig) -> Result<(), CredvaultError> {
    match command {
        Commands::Setup => setup::run(config).await,
        Commands::Keys { command } => match command {
            KeysCommand::Create { key_id } => keys::create(config, &key_id).await,
            KeysCommand::List => keys::list(config).await,
        },
        Commands::Put(args) => secrets::put(config, args).await,
        Commands::Get(args) => secrets::get(config, args).await,
        Commands::Getall(args) => secrets::getall(config, args).await,
        Commands::Delete(args) => secrets::delete(config, args).await,
        Commands::List => secrets::list(config).await,
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let config = match credvault_config::load_and_validate(cli.config.as_deref()) {
        Ok(config) => config,
        Err(errors) => {
            credvault_config::render_errors(&errors);
            return ExitCode::FAILURE;
        }
    };
    init_tracing(&config.general.log_level.to_ascii_lowercase());

    match run(cli.command, &config).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}
