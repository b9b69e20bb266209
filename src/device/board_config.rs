//! Detection of pin configurations left over from other projects
//!
//! A `board_config.py` that never mentions wificom was written for some
//! other firmware and will break the WiFiCom at boot. The user is offered to
//! delete it before any files are written.

use std::path::Path;

use tracing::info;

use crate::error::{Result, UpdaterError, fs as fs_error};
use crate::ui::selector::{SelectionRequest, SelectionResponse, Selector};

/// Pin configuration file owned by the user
pub const BOARD_CONFIG_FILE: &str = "board_config.py";

/// Whether the drive holds a `board_config.py` that is not for the WiFiCom
pub fn has_incompatible_board_config(drive: &Path) -> bool {
    match std::fs::read(drive.join(BOARD_CONFIG_FILE)) {
        Ok(bytes) => !String::from_utf8_lossy(&bytes).contains("wificom"),
        Err(_) => false,
    }
}

/// Ask whether to delete an incompatible `board_config.py`.
///
/// Returns `Ok(true)` if the file was deleted. Keeping it is allowed since
/// the file is protected and will not be overwritten; Exit aborts the run.
pub fn check_board_config(drive: &Path, selector: &mut dyn Selector) -> Result<bool> {
    if !has_incompatible_board_config(drive) {
        return Ok(false);
    }

    println!("It looks like you have an incompatible {BOARD_CONFIG_FILE}");
    println!("If you are using the default pins, you can safely delete it.");

    let response = selector.select(SelectionRequest::menu(
        format!("Delete {BOARD_CONFIG_FILE}?"),
        vec![
            format!("Delete {BOARD_CONFIG_FILE}"),
            format!("Keep {BOARD_CONFIG_FILE}"),
        ],
    ))?;

    match response {
        SelectionResponse::Choice(0) => {
            let path = drive.join(BOARD_CONFIG_FILE);
            std::fs::remove_file(&path).map_err(|e| fs_error::write_failed(&path, &e))?;
            info!("Deleted incompatible {}", path.display());
            Ok(true)
        }
        SelectionResponse::Choice(1) => Ok(false),
        _ => Err(UpdaterError::Aborted),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ui::selector::ScriptedSelector;
    use tempfile::TempDir;

    #[test]
    fn test_no_board_config_is_compatible() {
        let temp = TempDir::new().unwrap();
        let mut selector = ScriptedSelector::default();
        assert!(!check_board_config(temp.path(), &mut selector).unwrap());
        assert!(selector.asked.is_empty());
    }

    #[test]
    fn test_wificom_board_config_is_kept_silently() {
        let temp = TempDir::new().unwrap();
        std::fs::write(
            temp.path().join(BOARD_CONFIG_FILE),
            "import wificom.hardware.picow\n",
        )
        .unwrap();
        let mut selector = ScriptedSelector::default();
        assert!(!check_board_config(temp.path(), &mut selector).unwrap());
        assert!(selector.asked.is_empty());
    }

    #[test]
    fn test_incompatible_board_config_deleted_on_request() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join(BOARD_CONFIG_FILE);
        std::fs::write(&path, "PIN_A = board.GP1\n").unwrap();

        let mut selector = ScriptedSelector::new([SelectionResponse::Choice(0)]);
        assert!(check_board_config(temp.path(), &mut selector).unwrap());
        assert!(!path.exists());
    }

    #[test]
    fn test_incompatible_board_config_kept_on_request() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join(BOARD_CONFIG_FILE);
        std::fs::write(&path, "PIN_A = board.GP1\n").unwrap();

        let mut selector = ScriptedSelector::new([SelectionResponse::Choice(1)]);
        assert!(!check_board_config(temp.path(), &mut selector).unwrap());
        assert!(path.exists());
    }

    #[test]
    fn test_incompatible_board_config_exit_aborts() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join(BOARD_CONFIG_FILE);
        std::fs::write(&path, "PIN_A = board.GP1\n").unwrap();

        let mut selector = ScriptedSelector::new([SelectionResponse::Exit]);
        assert!(matches!(
            check_board_config(temp.path(), &mut selector),
            Err(UpdaterError::Aborted)
        ));
        assert!(path.exists());
    }
}
