//! Update command implementation
//!
//! Runs the whole install/update flow: find the drive, ask what to install,
//! download it, check the runtime version, then reconcile the drive and
//! record the installed version.

use std::path::PathBuf;

use console::{Style, Term};
use tracing::{debug, info, warn};

use crate::bundle::{BundleFetcher, HttpBundleFetcher};
use crate::config::UpdaterConfig;
use crate::device::{DriveLocator, board_config, marker, read_version_info};
use crate::error::{Result, UpdaterError};
use crate::guard::{VersionGuard, Verdict};
use crate::http::HttpClient;
use crate::reconcile::{ReconcileReport, Reconciler};
use crate::release::api::{GitHubApi, ReleaseApi};
use crate::release::{ReleaseSource, Selection};
use crate::ui::selector::{InteractiveSelector, Selector};
use crate::ui::{InteractiveProgressReporter, ProgressReporter, SilentProgressReporter, messages};

/// Release notes longer than this are cut short on screen
const NOTES_PREVIEW_LINES: usize = 12;

/// Run update command
pub fn run(drive: Option<PathBuf>, config: &UpdaterConfig) -> Result<()> {
    messages::print_welcome();

    let http = HttpClient::new(config.timeout())?;
    let api = GitHubApi::new(&http, config);
    let fetcher = HttpBundleFetcher::new(&http);
    let locator = DriveLocator::new(config.drive_label.clone()).with_override(drive);
    let mut selector = InteractiveSelector;
    let mut progress: Box<dyn ProgressReporter> = if Term::stdout().is_term() {
        Box::new(InteractiveProgressReporter::new())
    } else {
        Box::new(SilentProgressReporter)
    };

    let updater = Updater::new(config, &api, &fetcher);
    let outcome = updater.run(&locator, &mut selector, progress.as_mut())?;

    info!(
        "Applied {} to {}",
        outcome.version_ref,
        outcome.drive.display()
    );
    messages::print_summary(&outcome.report);
    if !outcome.report.failures.is_empty() {
        return Err(UpdaterError::ReconciliationIncomplete {
            failed: outcome.report.failures.len(),
        });
    }
    messages::print_success();
    Ok(())
}

/// Result of a completed update
#[derive(Debug)]
pub struct UpdateOutcome {
    pub drive: PathBuf,
    pub version_ref: String,
    pub report: ReconcileReport,
}

/// The update flow with its network and terminal collaborators injected
pub struct Updater<'a> {
    config: &'a UpdaterConfig,
    api: &'a dyn ReleaseApi,
    fetcher: &'a dyn BundleFetcher,
    reconciler: Reconciler,
}

impl<'a> Updater<'a> {
    pub fn new(
        config: &'a UpdaterConfig,
        api: &'a dyn ReleaseApi,
        fetcher: &'a dyn BundleFetcher,
    ) -> Self {
        Self {
            config,
            api,
            fetcher,
            reconciler: Reconciler::default(),
        }
    }

    pub fn run(
        &self,
        locator: &DriveLocator,
        selector: &mut dyn Selector,
        progress: &mut dyn ProgressReporter,
    ) -> Result<UpdateOutcome> {
        let drive = locator.locate_writable()?;
        info!("Using drive {}", drive.display());
        let device = read_version_info(&drive)?;
        debug!(
            "Board {} ({} bundle), CircuitPython {:?}",
            device.board_id,
            device.variant(),
            device.runtime_version
        );

        let source = ReleaseSource::new(self.api, self.config);
        let selection = source.choose(selector)?;
        println!("Checking...");
        let resolved = source.resolve(&selection, &device.board_id)?;
        if let (Selection::LatestRelease | Selection::Release(_), Some(notes)) =
            (&selection, resolved.release_notes.as_deref())
        {
            print_notes(&resolved.version_ref, notes);
        }

        let staged = self.fetcher.fetch(&resolved.bundle_url, progress)?;

        let recommended = match resolved.recommended_runtime {
            Some(version) => Some(version),
            None => staged
                .runtime_manifest()?
                .and_then(|manifest| manifest.recommended_for(&device.board_id)),
        };

        let guard = VersionGuard::new(self.config);
        let verdict = guard.evaluate(
            device.runtime_version.as_deref(),
            recommended.as_deref(),
            &device.board_id,
            selector,
        )?;
        if verdict == Verdict::Blocked {
            return Err(match (device.runtime_version, recommended) {
                (Some(installed), Some(recommended)) => UpdaterError::VersionMismatchBlocked {
                    installed,
                    recommended,
                },
                _ => UpdaterError::Aborted,
            });
        }

        board_config::check_board_config(&drive, selector)?;

        println!("Writing...");
        let report = self.reconciler.apply(staged.root(), &drive, progress)?;
        drop(staged);

        if report.failures.is_empty() {
            marker::write_marker(&drive, &self.config.marker_file, &resolved.version_ref)?;
            info!("Recorded {} as installed", resolved.version_ref);
        } else {
            warn!(
                "Not recording {} as installed: {} file(s) failed",
                resolved.version_ref,
                report.failures.len()
            );
        }

        Ok(UpdateOutcome {
            drive,
            version_ref: resolved.version_ref,
            report,
        })
    }
}

fn print_notes(version_ref: &str, notes: &str) {
    let notes = notes.trim();
    if notes.is_empty() {
        return;
    }
    let bold = Style::new().bold();
    let dim = Style::new().dim();
    println!("\n{}", bold.apply_to(format!("Release notes for {version_ref}:")));
    let lines: Vec<&str> = notes.lines().collect();
    for line in lines.iter().take(NOTES_PREVIEW_LINES) {
        println!("  {}", dim.apply_to(line));
    }
    if lines.len() > NOTES_PREVIEW_LINES {
        println!("  {}", dim.apply_to("..."));
    }
    println!();
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bundle::{StagedBundle, stage_archive};
    use crate::release::api::{Asset, Commit, Release};
    use crate::ui::selector::{ScriptedSelector, SelectionResponse};
    use serde_json::{Value, json};
    use std::cell::RefCell;
    use std::fs::{self, File};
    use std::io::Write;
    use tempfile::TempDir;
    use zip::ZipWriter;
    use zip::write::SimpleFileOptions;

    const BOOT_OUT: &str = "Adafruit CircuitPython 8.2.6 on 2023-09-12; Raspberry Pi Pico W with rp2040\r\nBoard ID:raspberry_pi_pico_w\r\n";
    const ASSET_URL: &str = "https://dl.invalid/v1.2.0/wificom-lib_v1.2.0_picow.zip";

    struct FakeApi {
        manifest: Option<Value>,
    }

    impl ReleaseApi for FakeApi {
        fn releases(&self) -> Result<Vec<Release>> {
            Ok(vec![Release {
                tag_name: "v1.2.0".to_string(),
                name: Some("WiFiCom 1.2.0".to_string()),
                prerelease: false,
                body: Some("Bug fixes".to_string()),
                assets: vec![Asset {
                    name: "wificom-lib_v1.2.0_picow.zip".to_string(),
                    browser_download_url: ASSET_URL.to_string(),
                }],
            }])
        }

        fn latest_commit(&self) -> Result<Commit> {
            Ok(Commit {
                sha: "abc123".to_string(),
            })
        }

        fn commit(&self, reference: &str) -> Result<Commit> {
            Ok(Commit {
                sha: reference.to_string(),
            })
        }

        fn runtime_manifest(&self, _reference: &str) -> Result<Option<Value>> {
            Ok(self.manifest.clone())
        }

        fn archive_exists(&self, _url: &str) -> Result<bool> {
            Ok(false)
        }
    }

    /// Serves one prebuilt archive for any URL
    struct ArchiveFetcher {
        archive: PathBuf,
        requested: RefCell<Vec<String>>,
    }

    impl BundleFetcher for ArchiveFetcher {
        fn fetch(&self, url: &str, _progress: &mut dyn ProgressReporter) -> Result<StagedBundle> {
            self.requested.borrow_mut().push(url.to_string());
            stage_archive(&self.archive)
        }
    }

    struct Fixture {
        _scratch: TempDir,
        drive: TempDir,
        fetcher: ArchiveFetcher,
        config: UpdaterConfig,
    }

    impl Fixture {
        fn new(bundle: &[(&str, &str)]) -> Self {
            let scratch = TempDir::new().unwrap();
            let archive = scratch.path().join("bundle.zip");
            let mut zip = ZipWriter::new(File::create(&archive).unwrap());
            for (name, content) in bundle {
                zip.start_file(*name, SimpleFileOptions::default()).unwrap();
                zip.write_all(content.as_bytes()).unwrap();
            }
            zip.finish().unwrap();

            let drive = TempDir::new().unwrap();
            fs::write(drive.path().join("boot_out.txt"), BOOT_OUT).unwrap();

            Self {
                _scratch: scratch,
                drive,
                fetcher: ArchiveFetcher {
                    archive,
                    requested: RefCell::new(Vec::new()),
                },
                config: UpdaterConfig::default(),
            }
        }

        fn locator(&self) -> DriveLocator {
            DriveLocator::new("CIRCUITPY").with_override(Some(self.drive.path().to_path_buf()))
        }

        fn run(&self, api: &FakeApi, responses: Vec<SelectionResponse>) -> Result<UpdateOutcome> {
            let updater = Updater::new(&self.config, api, &self.fetcher);
            let mut selector = ScriptedSelector::new(responses);
            updater.run(&self.locator(), &mut selector, &mut SilentProgressReporter)
        }

        fn read(&self, relative: &str) -> Option<String> {
            fs::read_to_string(self.drive.path().join(relative)).ok()
        }
    }

    fn matching_api() -> FakeApi {
        FakeApi {
            manifest: Some(json!({ "circuitpython": { "picow": "8.2.6" } })),
        }
    }

    #[test]
    fn test_latest_release_installs_and_records_marker() {
        let fx = Fixture::new(&[
            ("lib/wificom/__init__.mpy", "init"),
            ("code.py", "main"),
            ("secrets.py", "template"),
        ]);
        fs::write(fx.drive.path().join("secrets.py"), "my wifi password").unwrap();

        let outcome = fx
            .run(&matching_api(), vec![SelectionResponse::Choice(0)])
            .unwrap();

        assert_eq!(outcome.version_ref, "v1.2.0");
        assert_eq!(*fx.fetcher.requested.borrow(), vec![ASSET_URL.to_string()]);
        assert_eq!(fx.read("lib/wificom/__init__.mpy").as_deref(), Some("init"));
        assert_eq!(fx.read("secrets.py").as_deref(), Some("my wifi password"));
        assert_eq!(
            fx.read("wificom_installed_version.txt").as_deref(),
            Some("v1.2.0")
        );
    }

    #[test]
    fn test_rerun_changes_nothing() {
        let fx = Fixture::new(&[("lib/foo.mpy", "foo"), ("boot.py", "boot")]);
        fx.run(&matching_api(), vec![SelectionResponse::Choice(0)])
            .unwrap();

        let second = fx
            .run(&matching_api(), vec![SelectionResponse::Choice(0)])
            .unwrap();
        assert!(second.report.is_unchanged());
    }

    #[test]
    fn test_exit_at_first_menu_leaves_drive_untouched() {
        let fx = Fixture::new(&[("lib/foo.mpy", "foo")]);

        let result = fx.run(&matching_api(), vec![SelectionResponse::Exit]);
        assert!(matches!(result, Err(UpdaterError::Aborted)));
        assert!(fx.fetcher.requested.borrow().is_empty());
        assert_eq!(fx.read("lib/foo.mpy"), None);
    }

    #[test]
    fn test_runtime_mismatch_blocks_by_default() {
        let fx = Fixture::new(&[("lib/foo.mpy", "foo")]);
        let api = FakeApi {
            manifest: Some(json!({ "circuitpython": { "picow": "9.0.0" } })),
        };

        let result = fx.run(&api, vec![SelectionResponse::Choice(0), SelectionResponse::Exit]);
        match result {
            Err(UpdaterError::VersionMismatchBlocked {
                installed,
                recommended,
            }) => {
                assert_eq!(installed, "8.2.6");
                assert_eq!(recommended, "9.0.0");
            }
            other => panic!("Expected VersionMismatchBlocked, got {other:?}"),
        }
        assert_eq!(fx.read("lib/foo.mpy"), None);
        assert_eq!(fx.read("wificom_installed_version.txt"), None);
    }

    #[test]
    fn test_runtime_mismatch_continue_anyway() {
        let fx = Fixture::new(&[("lib/foo.mpy", "foo")]);
        let api = FakeApi {
            manifest: Some(json!({ "circuitpython": { "picow": "9.0.0" } })),
        };

        let outcome = fx
            .run(
                &api,
                vec![SelectionResponse::Choice(0), SelectionResponse::Choice(1)],
            )
            .unwrap();
        assert_eq!(outcome.report.added, vec!["lib/foo.mpy"]);
    }

    #[test]
    fn test_bundle_manifest_used_when_remote_has_none() {
        let fx = Fixture::new(&[
            ("lib/foo.mpy", "foo"),
            ("sources.json", r#"{"circuitpython": {"picow": "9.0.0"}}"#),
        ]);
        let api = FakeApi { manifest: None };

        let result = fx.run(&api, vec![SelectionResponse::Choice(0), SelectionResponse::Choice(0)]);
        assert!(matches!(
            result,
            Err(UpdaterError::VersionMismatchBlocked { .. })
        ));
    }

    #[test]
    fn test_no_recommendation_can_continue() {
        let fx = Fixture::new(&[("lib/foo.mpy", "foo")]);
        let api = FakeApi { manifest: None };

        let outcome = fx
            .run(
                &api,
                vec![SelectionResponse::Choice(0), SelectionResponse::Choice(0)],
            )
            .unwrap();
        assert_eq!(outcome.report.added, vec!["lib/foo.mpy"]);

        let fx = Fixture::new(&[("lib/foo.mpy", "foo")]);
        let result = fx.run(&api, vec![SelectionResponse::Choice(0), SelectionResponse::Exit]);
        assert!(matches!(result, Err(UpdaterError::Aborted)));
    }

    #[test]
    fn test_incompatible_board_config_deleted_then_installed() {
        let fx = Fixture::new(&[
            ("lib/foo.mpy", "foo"),
            ("board_config.py", "# wificom pins"),
        ]);
        fs::write(
            fx.drive.path().join("board_config.py"),
            "# pins for another project",
        )
        .unwrap();

        fx.run(
            &matching_api(),
            vec![SelectionResponse::Choice(0), SelectionResponse::Choice(0)],
        )
        .unwrap();
        assert_eq!(fx.read("board_config.py").as_deref(), Some("# wificom pins"));
    }

    #[test]
    fn test_commit_without_archive_is_unresolved() {
        let fx = Fixture::new(&[("lib/foo.mpy", "foo")]);

        let result = fx.run(&matching_api(), vec![SelectionResponse::Choice(2)]);
        match result {
            Err(UpdaterError::BundleUrlUnresolved { board_id, .. }) => {
                assert_eq!(board_id, "raspberry_pi_pico_w");
            }
            other => panic!("Expected BundleUrlUnresolved, got {other:?}"),
        }
    }

    #[test]
    fn test_missing_status_file_fails_before_any_question() {
        let fx = Fixture::new(&[("lib/foo.mpy", "foo")]);
        fs::remove_file(fx.drive.path().join("boot_out.txt")).unwrap();

        let api = matching_api();
        let updater = Updater::new(&fx.config, &api, &fx.fetcher);
        let mut selector = ScriptedSelector::default();
        let result = updater.run(&fx.locator(), &mut selector, &mut SilentProgressReporter);
        assert!(matches!(result, Err(UpdaterError::StatusFileMissing { .. })));
        assert!(selector.asked.is_empty());
    }
}
