//! CLI definitions using clap derive API

use clap::builder::{Styles, styling::AnsiColor};
use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// WiFiCom update tool
///
/// Installs or updates wificom-lib on a WiFiCom connected in Drive mode.
#[derive(Parser, Debug)]
#[command(
    name = "wificom-update",
    author,
    version,
    styles = Styles::styled()
        .header(AnsiColor::Green.on_default().bold())
        .usage(AnsiColor::Green.on_default().bold())
        .literal(AnsiColor::Cyan.on_default().bold())
        .placeholder(AnsiColor::Cyan.on_default()),
    about = "Install and update wificom-lib on a CIRCUITPY drive",
    long_about = "Finds the CIRCUITPY drive of a WiFiCom in Drive mode, downloads the chosen \
                  wificom-lib release or commit, and updates the library files on the drive. \
                  secrets.py, config.py, board_config.py and digiroms.txt are never overwritten.",
    after_help = "\x1b[1m\x1b[32mExamples:\x1b[0m\n    \
                  wificom-update\n    \
                  wificom-update status\n    \
                  wificom-update --drive /media/me/CIRCUITPY"
)]
pub struct Cli {
    /// Path of the CIRCUITPY drive (skips automatic detection)
    #[arg(long, short = 'd', global = true, env = "WIFICOM_DRIVE")]
    pub drive: Option<PathBuf>,

    /// Configuration file (YAML)
    #[arg(long, short = 'c', global = true, env = "WIFICOM_UPDATE_CONFIG")]
    pub config: Option<PathBuf>,

    /// Enable verbose output
    #[arg(long, short = 'v', global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

impl Cli {
    /// The subcommand to run, `update` when none was given
    pub fn subcommand(&self) -> Commands {
        self.command.unwrap_or(Commands::Update)
    }
}

#[derive(Subcommand, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Commands {
    /// Install or update wificom-lib (default)
    Update,

    /// Show what is installed on the drive
    Status,

    /// Show version information
    #[command(hide = true)]
    Version,
}
