//! Progress reporting for long-running search and render stages

use crate::io::configuration::PROGRESS_BAR_WIDTH;
use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};
use std::sync::LazyLock;

static PROGRESS_STYLE: LazyLock<ProgressStyle> = LazyLock::new(|| {
    ProgressStyle::default_bar()
        .template(&format!(
            "{{msg:>10}} [{{bar:{PROGRESS_BAR_WIDTH}.cyan/blue}}] {{pos}}/{{len}} {{elapsed}}"
        ))
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("█▉▊▋▌▍▎▏ ")
});

/// Single progress bar for one stage of a run
///
/// Library callers that want silence pass [`ProgressReporter::hidden`]; the
/// bar then still counts but never draws.
#[derive(Clone, Debug)]
pub struct ProgressReporter {
    bar: ProgressBar,
}

impl ProgressReporter {
    /// Create a visible progress bar drawing to stderr
    pub fn new(stage: &'static str, total: u64) -> Self {
        let bar = ProgressBar::with_draw_target(Some(total), ProgressDrawTarget::stderr());
        bar.set_style(PROGRESS_STYLE.clone());
        bar.set_message(stage);
        Self { bar }
    }

    /// Create a reporter that never draws
    pub fn hidden() -> Self {
        Self {
            bar: ProgressBar::hidden(),
        }
    }

    /// Restart the bar for a new stage
    pub fn reset(&self, stage: &'static str, total: u64) {
        self.bar.set_length(total);
        self.bar.set_position(0);
        self.bar.set_message(stage);
    }

    /// Record completed work
    pub fn advance(&self, amount: u64) {
        self.bar.inc(amount);
    }

    /// Work recorded so far
    pub fn position(&self) -> u64 {
        self.bar.position()
    }

    /// Clear the bar once the stage is done
    pub fn finish(&self) {
        self.bar.finish_and_clear();
    }
}

impl Default for ProgressReporter {
    fn default() -> Self {
        Self::hidden()
    }
}
