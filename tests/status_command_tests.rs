//! Integration tests for the status command

mod common;

use common::TestDrive;
use predicates::prelude::*;

#[test]
fn test_status_shows_device_and_installed_version() {
    let drive = TestDrive::pico_w();
    drive.write_file("wificom_installed_version.txt", "v1.2.0\n");

    drive
        .cmd()
        .arg("status")
        .arg("--drive")
        .arg(&drive.path)
        .assert()
        .success()
        .stdout(predicate::str::contains("raspberry_pi_pico_w (picow bundle)"))
        .stdout(predicate::str::contains("8.2.6"))
        .stdout(predicate::str::contains("v1.2.0"))
        .stdout(predicate::str::contains("CIRCUITPY"));
}

#[test]
fn test_status_without_marker() {
    let drive = TestDrive::pico_w();

    drive
        .cmd()
        .arg("status")
        .arg("--drive")
        .arg(&drive.path)
        .assert()
        .success()
        .stdout(predicate::str::contains("not recorded"));
}

#[test]
fn test_status_for_nina_board_without_version() {
    let drive = TestDrive::new();
    drive.write_file("boot_out.txt", "Board ID:arduino_nano_rp2040_connect\n");

    drive
        .cmd()
        .arg("status")
        .arg("--drive")
        .arg(&drive.path)
        .assert()
        .success()
        .stdout(predicate::str::contains("arduino_nano_rp2040_connect (nina bundle)"))
        .stdout(predicate::str::contains("unknown"));
}

#[test]
fn test_status_without_board_id_fails() {
    let drive = TestDrive::new();
    drive.write_file("boot_out.txt", "Adafruit CircuitPython 8.2.6 on 2023-09-12\n");

    drive
        .cmd()
        .arg("status")
        .arg("--drive")
        .arg(&drive.path)
        .assert()
        .code(1)
        .stderr(predicate::str::contains("Board ID not found"));
}

#[test]
fn test_status_does_not_modify_drive() {
    let drive = TestDrive::pico_w();
    drive.write_file("lib/foo.py", "x");

    drive
        .cmd()
        .arg("status")
        .arg("--drive")
        .arg(&drive.path)
        .assert()
        .success();

    let mut entries: Vec<String> = walk(&drive.path);
    entries.sort();
    assert_eq!(entries, vec!["boot_out.txt", "lib", "lib/foo.py"]);
    assert_eq!(drive.read_file("lib/foo.py"), "x");
}

fn walk(root: &std::path::Path) -> Vec<String> {
    walkdir::WalkDir::new(root)
        .min_depth(1)
        .into_iter()
        .map(|entry| {
            entry
                .unwrap()
                .path()
                .strip_prefix(root)
                .unwrap()
                .to_string_lossy()
                .replace('\\', "/")
        })
        .collect()
}
