//! Progress bar for the probe phase.

use std::sync::Arc;

use gempreload::preload::{FailureCallback, ItemProbeError, ProgressCallback};
use indicatif::{ProgressBar, ProgressStyle};

fn probe_style() -> ProgressStyle {
    ProgressStyle::with_template(
        "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} gems ({per_sec}, {eta})",
    )
    .unwrap_or_else(|_| ProgressStyle::default_bar())
    .progress_chars("#>-")
}

/// Reports probe progress and failures on the terminal.
///
/// With the bar disabled, failures still go to stderr.
#[derive(Clone)]
pub struct ProbeProgress {
    bar: Option<ProgressBar>,
}

impl ProbeProgress {
    pub fn new(enabled: bool) -> Self {
        let bar = enabled.then(|| {
            // Length is unknown until the index is decoded.
            let bar = ProgressBar::new(0);
            bar.set_style(probe_style());
            bar
        });
        Self { bar }
    }

    /// Callback advancing the bar to `done` of `total`.
    pub fn progress_callback(&self) -> Option<ProgressCallback> {
        let bar = self.bar.clone()?;
        Some(Arc::new(move |done: usize, total: usize| {
            bar.set_length(total as u64);
            bar.set_position(done as u64);
        }))
    }

    /// Callback printing one line per failed gem without tearing the bar.
    pub fn failure_callback(&self) -> FailureCallback {
        let bar = self.bar.clone();
        Arc::new(move |error: &ItemProbeError| {
            let line = format!("Error while processing gem: {}", error.identifier);
            match bar {
                Some(ref bar) => bar.println(line),
                None => eprintln!("{}", line),
            }
        })
    }

    pub fn finish(&self) {
        if let Some(ref bar) = self.bar {
            bar.finish_and_clear();
        }
    }
}
