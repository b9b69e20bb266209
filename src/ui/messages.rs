//! Banners and summaries printed around an update

use console::Style;

use crate::reconcile::ReconcileReport;

/// Welcome banner, with the tool version when it fits on the line
pub fn print_welcome() {
    let version = env!("CARGO_PKG_VERSION");
    let version_string = if version.len() <= 16 {
        format!(" {version}!")
    } else {
        format!("!\n    {version}")
    };
    let green = Style::new().green();
    println!(
        "{}",
        green.apply_to(format!(
            "
    Welcome to the WiFiCom Update/Installer Tool{version_string}

    This tool will help you update your WiFiCom by downloading the
    latest version of the wificom-lib and updating the files on the
    CIRCUITPY drive. Keep in mind that your own files (secrets.py,
    config.py, board_config.py and digiroms.txt) will not be affected.

    Let's get started!
"
        ))
    );
}

/// Next steps after a completed install
pub fn print_success() {
    let green = Style::new().green();
    println!(
        "{}",
        green.apply_to(
            "
    Successfully installed/updated your WiFiCom!

    If you intend to use WiFi, ensure you've updated secrets.py
    If this is your first time:
      * Create an account and a \"new WiFiCom\" on wificom.dev
      * Go to \"Credentials Download\" on the page that appears,
        and follow the instructions there.

    Please eject (safely remove) the drive from your computer, then:
    * Full units in \"Drive Mode\": choose an option from the menu
    * Screenless units / \"Dev Mode\": disconnect and reconnect power
"
        )
    );
}

/// Per-category counts and any files that could not be written
pub fn print_summary(report: &ReconcileReport) {
    let bold = Style::new().bold();
    println!("{}", bold.apply_to("Summary:"));
    println!("  {} added", report.added.len());
    println!("  {} updated", report.modified.len());
    println!("  {} unchanged", report.skipped.len());
    println!("  {} removed", report.removed.len());

    if !report.failures.is_empty() {
        let red = Style::new().red().bold();
        println!(
            "{}",
            red.apply_to(format!("  {} file(s) could not be updated:", report.failures.len()))
        );
        for failure in &report.failures {
            println!("    - {failure}");
        }
    }
}
