//! Status command implementation

use std::path::{Path, PathBuf};

use console::Style;

use crate::config::UpdaterConfig;
use crate::device::{DriveLocator, VersionInfo, check_writable, marker, read_version_info};
use crate::error::Result;

/// Run status command
pub fn run(drive: Option<PathBuf>, config: &UpdaterConfig) -> Result<()> {
    let locator = DriveLocator::new(config.drive_label.clone()).with_override(drive);
    let drive = locator.locate()?;
    let info = read_version_info(&drive)?;
    let installed = marker::read_marker(&drive, &config.marker_file);

    for (label, value) in status_lines(&drive, &info, installed.as_deref(), check_writable(&drive)) {
        println!("{} {value}", Style::new().bold().apply_to(format!("{label:<18}")));
    }
    Ok(())
}

fn status_lines(
    drive: &Path,
    info: &VersionInfo,
    installed: Option<&str>,
    writable: bool,
) -> Vec<(&'static str, String)> {
    vec![
        ("Drive:", display_drive(drive)),
        (
            "Writable:",
            if writable { "yes" } else { "no (use Drive mode)" }.to_string(),
        ),
        (
            "Board ID:",
            format!("{} ({} bundle)", info.board_id, info.variant()),
        ),
        (
            "CircuitPython:",
            info.runtime_version
                .clone()
                .unwrap_or_else(|| "unknown".to_string()),
        ),
        (
            "wificom-lib:",
            installed.map_or_else(|| "not recorded".to_string(), ToString::to_string),
        ),
    ]
}

/// Drive path as shown to the user, without Windows verbatim prefixes
fn display_drive(drive: &Path) -> String {
    dunce::simplified(drive).display().to_string()
}
