use indicatif::{ProgressBar, ProgressStyle};

use vmask_core::logging::LogCallback;
use vmask_core::orchestrator::ProgressCallback;

pub fn step_bar_style() -> ProgressStyle {
    ProgressStyle::with_template(
        "{prefix:<8} {bar:40.cyan/blue} {percent:>3}% [{elapsed_precise}] {msg}",
    )
    .unwrap_or_else(|_| ProgressStyle::default_bar())
}

pub fn step_bar() -> ProgressBar {
    let bar = ProgressBar::new(100);
    bar.set_style(step_bar_style());
    bar
}

/// Move the bar with the orchestrator's per-step progress.
pub fn progress_callback(bar: &ProgressBar) -> ProgressCallback {
    let bar = bar.clone();
    Box::new(move |step, percent, message| {
        bar.set_prefix(step.to_string());
        bar.set_position(u64::from(percent.min(100)));
        bar.set_message(message.to_string());
    })
}

/// Print run log lines above the bar.
pub fn log_callback(bar: &ProgressBar) -> LogCallback {
    let bar = bar.clone();
    Box::new(move |line| bar.println(line))
}
