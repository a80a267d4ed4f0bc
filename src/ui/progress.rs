//! Download progress and elapsed-time formatting.

use std::time::Duration;

use chrono::{DateTime, Utc};
use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};

const BAR_TEMPLATE: &str =
    "  {spinner:.magenta} [{bar:24.magenta/dim}] {bytes}/{total_bytes} ({eta})";
const SPINNER_TEMPLATE: &str = "  {spinner:.magenta} {bytes} downloaded";

/// Progress indicator for a download of `len` bytes.
///
/// Unknown lengths get a spinner. When `visible` is false the bar is hidden
/// but still counts, so callers never branch on it.
pub fn download_bar(len: Option<u64>, visible: bool) -> ProgressBar {
    let bar = match len {
        Some(total) => {
            let bar = ProgressBar::new(total);
            bar.set_style(
                ProgressStyle::with_template(BAR_TEMPLATE)
                    .unwrap_or_else(|_| ProgressStyle::default_bar())
                    .progress_chars("█░ "),
            );
            bar
        }
        None => {
            let bar = ProgressBar::new_spinner();
            bar.set_style(
                ProgressStyle::with_template(SPINNER_TEMPLATE)
                    .unwrap_or_else(|_| ProgressStyle::default_spinner())
                    .tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏"),
            );
            bar
        }
    };

    if visible {
        bar.enable_steady_tick(Duration::from_millis(80));
    } else {
        bar.set_draw_target(ProgressDrawTarget::hidden());
    }
    bar
}

/// How long ago `timestamp` was, coarsely.
pub fn format_age(timestamp: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let seconds = now.signed_duration_since(timestamp).num_seconds();
    if seconds < 60 {
        return "just now".to_string();
    }

    let (count, unit) = match seconds {
        s if s < 3_600 => (s / 60, "minute"),
        s if s < 86_400 => (s / 3_600, "hour"),
        s => (s / 86_400, "day"),
    };
    if count == 1 {
        format!("1 {} ago", unit)
    } else {
        format!("{} {}s ago", count, unit)
    }
}
