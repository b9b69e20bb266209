//! Common test utilities for wificom-update integration tests

use assert_cmd::Command;
use std::path::PathBuf;
use tempfile::TempDir;

/// `boot_out.txt` as written by a Pico W running CircuitPython 8.2.6
pub const PICO_W_BOOT_OUT: &str = "Adafruit CircuitPython 8.2.6 on 2023-09-12; Raspberry Pi Pico W with rp2040\r\n\
Board ID:raspberry_pi_pico_w\r\n\
UID:E6614864D3417F2F\r\n";

/// A fake CIRCUITPY drive plus a private config file
pub struct TestDrive {
    /// Temporary directory holding the drive and the config
    #[allow(dead_code)]
    pub temp: TempDir,
    /// Path to the drive root
    pub path: PathBuf,
    /// Path to the config file passed with `--config`
    pub config: PathBuf,
}

impl TestDrive {
    /// Create an empty drive with a default (empty) config file
    pub fn new() -> Self {
        let temp = TempDir::new().expect("Failed to create temp directory");
        let path = temp.path().join("CIRCUITPY");
        std::fs::create_dir_all(&path).expect("Failed to create drive directory");
        let config = temp.path().join("config.yaml");
        std::fs::write(&config, "").expect("Failed to write config");
        Self { temp, path, config }
    }

    /// Create a drive that identifies as a Pico W
    #[allow(dead_code)]
    pub fn pico_w() -> Self {
        let drive = Self::new();
        drive.write_file("boot_out.txt", PICO_W_BOOT_OUT);
        drive
    }

    /// Write a file on the drive
    #[allow(dead_code)]
    pub fn write_file(&self, path: &str, content: &str) {
        let file_path = self.path.join(path);
        if let Some(parent) = file_path.parent() {
            std::fs::create_dir_all(parent).expect("Failed to create parent directory");
        }
        std::fs::write(&file_path, content).expect("Failed to write file");
    }

    /// Read a file from the drive
    #[allow(dead_code)]
    pub fn read_file(&self, path: &str) -> String {
        let file_path = self.path.join(path);
        std::fs::read_to_string(&file_path).expect("Failed to read file")
    }

    /// Check if a file exists on the drive
    #[allow(dead_code)]
    pub fn file_exists(&self, path: &str) -> bool {
        self.path.join(path).exists()
    }

    /// Replace the config file content
    #[allow(dead_code)]
    pub fn write_config(&self, content: &str) {
        std::fs::write(&self.config, content).expect("Failed to write config");
    }

    /// Command with this drive's config and no inherited overrides
    pub fn cmd(&self) -> Command {
        let mut cmd = wificom_update_cmd();
        cmd.arg("--config").arg(&self.config);
        cmd
    }
}

/// The binary with environment overrides cleared
#[allow(deprecated)]
pub fn wificom_update_cmd() -> Command {
    let mut cmd = Command::cargo_bin("wificom-update").expect("binary is built");
    cmd.env_remove("WIFICOM_DRIVE")
        .env_remove("WIFICOM_UPDATE_CONFIG")
        .env_remove("RUST_LOG");
    cmd
}
