//! Runtime version check
//!
//! Compares the CircuitPython version on the drive with the version the
//! chosen bundle was built for. A mismatch is a decision for the user, and
//! anything other than an explicit "continue" stops the update.

use console::Style;
use tracing::{info, warn};

use crate::config::UpdaterConfig;
use crate::error::Result;
use crate::ui::selector::{SelectionRequest, SelectionResponse, Selector};

/// Outcome of comparing installed and recommended runtime versions
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Assessment {
    Match,
    /// The drive did not report a runtime version
    UnknownInstalled,
    /// The bundle does not name a runtime version for this board
    NoRecommendation,
    Mismatch {
        installed: String,
        recommended: String,
        image_url: String,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    Proceed,
    Blocked,
}

pub struct VersionGuard<'a> {
    config: &'a UpdaterConfig,
}

impl<'a> VersionGuard<'a> {
    pub fn new(config: &'a UpdaterConfig) -> Self {
        Self { config }
    }

    /// Download link for the runtime image matching `board_id`
    pub fn runtime_image_url(&self, board_id: &str, version: &str) -> String {
        format!(
            "{base}/{board_id}/en_US/adafruit-circuitpython-{board_id}-en_US-{version}.uf2",
            base = self.config.uf2_base.trim_end_matches('/')
        )
    }

    pub fn assess(
        &self,
        installed: Option<&str>,
        recommended: Option<&str>,
        board_id: &str,
    ) -> Assessment {
        match (installed, recommended) {
            (None, _) => Assessment::UnknownInstalled,
            (Some(_), None) => Assessment::NoRecommendation,
            (Some(installed), Some(recommended)) if installed == recommended => Assessment::Match,
            (Some(installed), Some(recommended)) => Assessment::Mismatch {
                installed: installed.to_string(),
                recommended: recommended.to_string(),
                image_url: self.runtime_image_url(board_id, recommended),
            },
        }
    }

    /// Decide whether the update may go ahead
    pub fn evaluate(
        &self,
        installed: Option<&str>,
        recommended: Option<&str>,
        board_id: &str,
        selector: &mut dyn Selector,
    ) -> Result<Verdict> {
        let yellow = Style::new().yellow();
        match self.assess(installed, recommended, board_id) {
            Assessment::Match => {
                info!("Runtime version matches the recommended version");
                Ok(Verdict::Proceed)
            }
            Assessment::UnknownInstalled => {
                warn!("Could not read the installed CircuitPython version; continuing");
                Ok(Verdict::Proceed)
            }
            Assessment::NoRecommendation => {
                println!(
                    "\n{}",
                    yellow.apply_to(
                        "Warning: The version you are installing does not include a recommended version of CircuitPython."
                    )
                );
                println!("Please check on Discord/GitHub for a recommended version.");
                let options = vec!["Continue anyway".to_string()];
                Ok(
                    match selector.select(SelectionRequest::menu("Continue?", options))? {
                        SelectionResponse::Choice(0) => Verdict::Proceed,
                        _ => Verdict::Blocked,
                    },
                )
            }
            Assessment::Mismatch {
                installed,
                recommended,
                image_url,
            } => {
                println!(
                    "\n{}",
                    yellow.apply_to(format!(
                        "The recommended CircuitPython version for this release is {recommended} while you have {installed} installed."
                    ))
                );
                println!("It is advised to upgrade/downgrade your CircuitPython version.");
                println!("You can download the necessary UF2 file from here:");
                println!("{image_url}");
                let options = vec![
                    "Stop here to install the UF2 file first".to_string(),
                    "Continue anyway with currently-installed CircuitPython version".to_string(),
                ];
                Ok(
                    match selector.select(SelectionRequest::menu("How to proceed?", options))? {
                        SelectionResponse::Choice(1) => Verdict::Proceed,
                        _ => Verdict::Blocked,
                    },
                )
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ui::selector::ScriptedSelector;

    const BOARD: &str = "raspberry_pi_pico_w";

    #[test]
    fn test_runtime_image_url() {
        let config = UpdaterConfig::default();
        let guard = VersionGuard::new(&config);
        assert_eq!(
            guard.runtime_image_url(BOARD, "8.2.6"),
            "https://adafruit-circuit-python.s3.amazonaws.com/bin/raspberry_pi_pico_w/en_US/adafruit-circuitpython-raspberry_pi_pico_w-en_US-8.2.6.uf2"
        );
    }

    #[test]
    fn test_assess() {
        let config = UpdaterConfig::default();
        let guard = VersionGuard::new(&config);

        assert_eq!(guard.assess(Some("8.2.6"), Some("8.2.6"), BOARD), Assessment::Match);
        assert_eq!(guard.assess(None, Some("8.2.6"), BOARD), Assessment::UnknownInstalled);
        assert_eq!(guard.assess(Some("8.2.6"), None, BOARD), Assessment::NoRecommendation);
        assert!(matches!(
            guard.assess(Some("8.0.5"), Some("8.2.6"), BOARD),
            Assessment::Mismatch { ref image_url, .. } if image_url.ends_with("-en_US-8.2.6.uf2")
        ));
    }

    #[test]
    fn test_match_and_unknown_proceed_without_asking() {
        let config = UpdaterConfig::default();
        let guard = VersionGuard::new(&config);
        let mut selector = ScriptedSelector::default();

        assert_eq!(
            guard
                .evaluate(Some("8.2.6"), Some("8.2.6"), BOARD, &mut selector)
                .unwrap(),
            Verdict::Proceed
        );
        assert_eq!(
            guard.evaluate(None, Some("8.2.6"), BOARD, &mut selector).unwrap(),
            Verdict::Proceed
        );
        assert!(selector.asked.is_empty());
    }

    #[test]
    fn test_mismatch_requires_explicit_continue() {
        let config = UpdaterConfig::default();
        let guard = VersionGuard::new(&config);

        let mut selector = ScriptedSelector::new([SelectionResponse::Choice(1)]);
        assert_eq!(
            guard
                .evaluate(Some("8.0.5"), Some("8.2.6"), BOARD, &mut selector)
                .unwrap(),
            Verdict::Proceed
        );

        for response in [
            SelectionResponse::Choice(0),
            SelectionResponse::Exit,
            SelectionResponse::Choice(7),
            SelectionResponse::Text("yes".to_string()),
        ] {
            let mut selector = ScriptedSelector::new([response]);
            assert_eq!(
                guard
                    .evaluate(Some("8.0.5"), Some("8.2.6"), BOARD, &mut selector)
                    .unwrap(),
                Verdict::Blocked
            );
        }
    }

    #[test]
    fn test_no_recommendation_offers_continue() {
        let config = UpdaterConfig::default();
        let guard = VersionGuard::new(&config);

        let mut selector = ScriptedSelector::new([SelectionResponse::Choice(0)]);
        assert_eq!(
            guard.evaluate(Some("8.2.6"), None, BOARD, &mut selector).unwrap(),
            Verdict::Proceed
        );

        let mut selector = ScriptedSelector::new([SelectionResponse::Exit]);
        assert_eq!(
            guard.evaluate(Some("8.2.6"), None, BOARD, &mut selector).unwrap(),
            Verdict::Blocked
        );
    }
}
