use std::future::Future;
use std::io::IsTerminal;
use std::time::{Duration, Instant};

use indicatif::{ProgressBar, ProgressStyle};

// Flashing a spinner for a few milliseconds reads as flicker; keep it up
// at least this long once shown.
const MIN_SPINNER_DURATION: Duration = Duration::from_millis(600);
const TICK_INTERVAL: Duration = Duration::from_millis(80);

/// Drive an async operation while showing a spinner with the given
/// message on stderr. Non-terminal stderr gets no spinner at all.
pub async fn with_spinner<T, F: Future<Output = T>>(message: &str, fut: F) -> T {
    if !std::io::stderr().is_terminal() {
        return fut.await;
    }

    let spinner = ProgressBar::new_spinner().with_message(message.to_string());
    spinner.set_style(spinner_style());
    spinner.enable_steady_tick(TICK_INTERVAL);

    let started = Instant::now();
    let result = fut.await;

    if let Some(remaining) = MIN_SPINNER_DURATION.checked_sub(started.elapsed()) {
        tokio::time::sleep(remaining).await;
    }

    spinner.finish_and_clear();
    result
}

fn spinner_style() -> ProgressStyle {
    ProgressStyle::default_spinner()
        .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", " "])
        .template("{spinner:.cyan} {msg}")
        .unwrap()
}
