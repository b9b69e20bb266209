//! UI/Progress presentation layer
//!
//! This module handles:
//! - Progress reporting for the bundle download and the file writes
//! - Interactive progress bars using indicatif
//! - Menus and text prompts behind the [`selector::Selector`] seam
//! - Banners and summaries printed to stdout
//!
//! All progress reporting goes through the ProgressReporter trait, so the
//! update pipeline never talks to the terminal directly.

pub mod messages;
pub mod selector;

use indicatif::{ProgressBar, ProgressStyle};

/// Progress reporter trait for long-running operations
pub trait ProgressReporter {
    /// Start the download bar; `total_bytes` is unknown without Content-Length
    fn start_download(&mut self, total_bytes: Option<u64>);

    /// Advance the download bar by `bytes`
    fn advance_download(&mut self, bytes: u64);

    /// Finish the download bar
    fn finish_download(&mut self);

    /// Initialize file progress with total file count
    fn init_file_progress(&mut self, total_files: u64);

    /// Update file progress
    fn update_file(&mut self, file_path: &str);

    /// Finish file progress
    fn finish_files(&mut self);

    /// Abandon on error
    fn abandon(&mut self);
}

fn style_or_default(template: &str, chars: &str) -> ProgressStyle {
    ProgressStyle::default_bar()
        .template(template)
        .map(|style| style.progress_chars(chars))
        .unwrap_or_else(|_| ProgressStyle::default_bar())
}

/// Interactive progress reporter with visual progress bars
#[derive(Default)]
pub struct InteractiveProgressReporter {
    download_pb: Option<ProgressBar>,
    file_pb: Option<ProgressBar>,
}

impl InteractiveProgressReporter {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ProgressReporter for InteractiveProgressReporter {
    fn start_download(&mut self, total_bytes: Option<u64>) {
        let pb = match total_bytes {
            Some(total) => {
                let pb = ProgressBar::new(total);
                pb.set_style(style_or_default(
                    "[{bar:40.cyan/blue}] {bytes}/{total_bytes} {msg}",
                    "#>-",
                ));
                pb
            }
            None => ProgressBar::new_spinner(),
        };
        pb.set_message("downloading");
        self.download_pb = Some(pb);
    }

    fn advance_download(&mut self, bytes: u64) {
        if let Some(ref pb) = self.download_pb {
            pb.inc(bytes);
        }
    }

    fn finish_download(&mut self) {
        if let Some(pb) = self.download_pb.take() {
            pb.finish_and_clear();
        }
    }

    fn init_file_progress(&mut self, total_files: u64) {
        let file_pb = ProgressBar::new(total_files);
        file_pb.set_style(style_or_default(
            "  [{bar:40.green/yellow}] {pos}/{len} files {msg}",
            "█▉▊▋▌▍▎▏  ",
        ));
        self.file_pb = Some(file_pb);
    }

    fn update_file(&mut self, file_path: &str) {
        if let Some(ref file_pb) = self.file_pb {
            // Truncate long paths for display
            let display_path = if file_path.chars().count() > 50 {
                let tail: String = file_path
                    .chars()
                    .rev()
                    .take(47)
                    .collect::<Vec<_>>()
                    .into_iter()
                    .rev()
                    .collect();
                format!("...{tail}")
            } else {
                file_path.to_string()
            };
            file_pb.set_message(display_path);
            file_pb.inc(1);
        }
    }

    fn finish_files(&mut self) {
        if let Some(ref file_pb) = self.file_pb {
            file_pb.finish();
        }
    }

    fn abandon(&mut self) {
        if let Some(ref pb) = self.download_pb {
            pb.abandon();
        }
        if let Some(ref file_pb) = self.file_pb {
            file_pb.abandon();
        }
    }
}

/// Silent progress reporter for tests and non-interactive runs
#[derive(Default)]
pub struct SilentProgressReporter;

impl ProgressReporter for SilentProgressReporter {
    fn start_download(&mut self, _total_bytes: Option<u64>) {}

    fn advance_download(&mut self, _bytes: u64) {}

    fn finish_download(&mut self) {}

    fn init_file_progress(&mut self, _total_files: u64) {}

    fn update_file(&mut self, _file_path: &str) {}

    fn finish_files(&mut self) {}

    fn abandon(&mut self) {}
}
