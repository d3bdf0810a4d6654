#![cfg_attr(
    test,
    allow(
        clippy::panic,
        clippy::unwrap_used,
        clippy::expect_used,
        reason = "Test-only panic-based assertions are permitted."
    )
)]
// aidis-cli/src/main.rs
// ============================================================================
// Module: AIDIS CLI Entry Point
// Description: Command dispatcher for the AIDIS server.
// Purpose: Parse arguments, bootstrap logging, load config, run the server.
// Dependencies: aidis-config, aidis-mcp, clap, tokio, tracing-subscriber
// ============================================================================

//! ## Overview
//! The CLI has one real job: `aidis serve`. Logging goes to stderr through
//! an `EnvFilter` derived from `LOG_LEVEL`; `RUST_LOG` overrides it for
//! finer-grained control. `aidis tools` prints the tool catalog for quick
//! inspection without a database.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::io::Write;
use std::process::ExitCode;

use aidis_config::AidisConfig;
use clap::Parser;
use clap::Subcommand;
use tracing_subscriber::EnvFilter;

// ============================================================================
// SECTION: CLI Types
// ============================================================================

/// Top-level CLI definition.
#[derive(Parser, Debug)]
#[command(name = "aidis", version, about = "AIDIS development intelligence server")]
struct Cli {
    /// Subcommand to execute.
    #[command(subcommand)]
    command: Command,
}

/// Available subcommands.
#[derive(Subcommand, Debug)]
enum Command {
    /// Run the HTTP server.
    Serve,
    /// Print the tool catalog as JSON.
    Tools,
}

// ============================================================================
// SECTION: Entry Point
// ============================================================================

fn main() -> ExitCode {
    let cli = Cli::parse();
    let config = match AidisConfig::from_env() {
        Ok(config) => config,
        Err(error) => {
            let _ = writeln!(std::io::stderr(), "aidis: configuration error: {error}");
            return ExitCode::FAILURE;
        }
    };
    init_logging(&config);
    match cli.command {
        Command::Serve => serve(config),
        Command::Tools => print_tools(),
    }
}

/// Runs the server on a multi-threaded runtime.
fn serve(config: AidisConfig) -> ExitCode {
    let runtime = match tokio::runtime::Builder::new_multi_thread().enable_all().build() {
        Ok(runtime) => runtime,
        Err(error) => {
            let _ = writeln!(std::io::stderr(), "aidis: runtime init failed: {error}");
            return ExitCode::FAILURE;
        }
    };
    match runtime.block_on(aidis_mcp::run(config)) {
        Ok(()) => ExitCode::SUCCESS,
        Err(error) => {
            let _ = writeln!(std::io::stderr(), "aidis: {error}");
            ExitCode::FAILURE
        }
    }
}

/// Prints the tool catalog.
fn print_tools() -> ExitCode {
    let catalog = aidis_contract::tool_definitions();
    match serde_json::to_string_pretty(&catalog) {
        Ok(rendered) => {
            let _ = writeln!(std::io::stdout(), "{rendered}");
            ExitCode::SUCCESS
        }
        Err(error) => {
            let _ = writeln!(std::io::stderr(), "aidis: catalog serialization failed: {error}");
            ExitCode::FAILURE
        }
    }
}

/// Initializes stderr logging from `LOG_LEVEL`, letting `RUST_LOG` win.
fn init_logging(config: &AidisConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.log_level.as_filter()));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
