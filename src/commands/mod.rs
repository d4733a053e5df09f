pub mod config;
pub mod install;
pub mod list;

use indicatif::{ProgressBar, ProgressStyle};
use mrfeature::ProgressCallback;
use std::sync::Arc;
use std::time::Duration;

/// Start a steadily ticking spinner with the given message
pub fn spinner(message: &str) -> ProgressBar {
    let spinner = ProgressBar::new_spinner();
    spinner.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.blue} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏"),
    );
    spinner.set_message(message.to_string());
    spinner.enable_steady_tick(Duration::from_millis(80));
    spinner
}

/// Forward library progress reports to a spinner
pub fn spinner_callback(spinner: &ProgressBar) -> ProgressCallback {
    let spinner = spinner.clone();
    Arc::new(move |msg: &str, current: u64, total: u64| {
        if total > 0 {
            spinner.set_message(format!("[{}/{}] {}", current.min(total), total, msg));
        } else {
            spinner.set_message(msg.to_string());
        }
    })
}
