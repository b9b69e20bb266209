//! Version command: tool version and where updates come from

use crate::config::UpdaterConfig;
use crate::error::Result;

pub fn run(config: &UpdaterConfig) -> Result<()> {
    for line in version_lines(config) {
        println!("{line}");
    }
    Ok(())
}

fn version_lines(config: &UpdaterConfig) -> Vec<String> {
    let profile = if cfg!(debug_assertions) {
        "debug"
    } else {
        "release"
    };
    vec![
        format!("wificom-update {}", env!("CARGO_PKG_VERSION")),
        String::new(),
        format!("Library source: {}", config.repository),
        format!("  Releases from {} (>= {})", config.api_base, config.minimum_version),
        format!("  Commit bundles from {}", config.archive_base),
        format!("Drive label: {}", config.drive_label),
        format!(
            "Built with Rust {} ({profile}, {})",
            env!("CARGO_PKG_RUST_VERSION"),
            std::env::consts::OS
        ),
    ]
}
