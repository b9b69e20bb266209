//! wificom-update - WiFiCom update/installer tool
//!
//! Installs or updates wificom-lib on the CIRCUITPY drive of a WiFiCom,
//! leaving the user's own configuration files untouched.

use std::io::{BufRead, IsTerminal};

use clap::Parser;
use console::Style;
use miette::Diagnostic;
use tracing_subscriber::EnvFilter;

mod bundle;
mod cli;
mod commands;
mod config;
mod device;
mod error;
mod guard;
mod hash;
mod http;
mod reconcile;
mod release;
mod temp;
mod ui;

use cli::{Cli, Commands};
use config::UpdaterConfig;
use error::UpdaterError;

/// Exit status for failures
const EXIT_FAILURE: i32 = 1;
/// Exit status when the user chose to stop
const EXIT_ABORTED: i32 = 2;

fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .without_time()
        .with_target(false)
        .init();
}

/// Print an error with its diagnostic code and help text
fn report_error(err: &UpdaterError) {
    let red = Style::new().red().bold();
    if err.is_user_abort() {
        eprintln!("{}", Style::new().yellow().apply_to(err));
        return;
    }
    eprintln!("{} {err}", red.apply_to("Error:"));
    if let UpdaterError::DeviceNotFound { searched, .. } = err {
        if !searched.is_empty() {
            eprintln!("  Searched:");
            for path in searched {
                eprintln!("    {path}");
            }
        }
    }
    let detail = match err {
        UpdaterError::ConfigParseFailed { reason, .. }
        | UpdaterError::FileReadFailed { reason, .. }
        | UpdaterError::FileWriteFailed { reason, .. } => Some(reason),
        _ => None,
    };
    if let Some(detail) = detail {
        eprintln!("  {detail}");
    }
    if let Some(code) = err.code() {
        eprintln!("  code: {code}");
    }
    if let Some(help) = err.help() {
        eprintln!("  help: {help}");
    }
}

/// Keep a console window opened by double-click visible until acknowledged
fn wait_for_enter() {
    if !std::io::stdin().is_terminal() {
        return;
    }
    println!("\nPress Enter to exit...");
    let mut line = String::new();
    let _ = std::io::stdin().lock().read_line(&mut line);
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let command = cli.subcommand();
    let result = UpdaterConfig::load(cli.config.as_deref()).and_then(|config| match command {
        Commands::Update => commands::update::run(cli.drive.clone(), &config),
        Commands::Status => commands::status::run(cli.drive.clone(), &config),
        Commands::Version => commands::version::run(&config),
    });

    let code = match result {
        Ok(()) => 0,
        Err(e) => {
            report_error(&e);
            if e.is_user_abort() {
                EXIT_ABORTED
            } else {
                EXIT_FAILURE
            }
        }
    };

    if command == Commands::Update {
        wait_for_enter();
    }
    std::process::exit(code);
}
