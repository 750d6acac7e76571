//! `indicatif` rendering of pipeline progress.

use indicatif::{ProgressBar, ProgressStyle};
use roster::{Progress, Stage};
use std::sync::Mutex;

fn bar_style() -> ProgressStyle {
    ProgressStyle::default_bar()
        .template("{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} {msg}")
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("█▓░")
}

/// One progress bar per stage, replaced when the next stage begins.
#[derive(Debug, Default)]
pub(crate) struct BarProgress {
    bar: Mutex<Option<ProgressBar>>,
    hidden: bool,
}

impl BarProgress {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Track positions without drawing anything.
    #[cfg(test)]
    pub(crate) fn hidden() -> Self {
        Self {
            bar: Mutex::new(None),
            hidden: true,
        }
    }

    /// Position of the current bar, if a stage is running.
    #[cfg(test)]
    pub(crate) fn position(&self) -> Option<u64> {
        self.bar
            .lock()
            .ok()
            .and_then(|slot| slot.as_ref().map(ProgressBar::position))
    }
}

impl Progress for BarProgress {
    fn begin(&self, stage: Stage, total: usize) {
        let bar = if self.hidden {
            ProgressBar::hidden()
        } else {
            ProgressBar::new(total as u64)
        };
        bar.set_length(total as u64);
        bar.set_style(bar_style());
        bar.set_message(stage.to_string());

        if let Ok(mut slot) = self.bar.lock() {
            if let Some(previous) = slot.replace(bar) {
                previous.finish_and_clear();
            }
        }
    }

    fn advance(&self, item: &str) {
        if let Ok(slot) = self.bar.lock() {
            if let Some(bar) = slot.as_ref() {
                bar.set_message(item.to_string());
                bar.inc(1);
            }
        }
    }

    fn finish(&self, stage: Stage) {
        if let Ok(slot) = self.bar.lock() {
            if let Some(bar) = slot.as_ref() {
                bar.finish_with_message(format!("{stage}: done"));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bar_follows_stages() {
        let progress = BarProgress::hidden();
        assert_eq!(progress.position(), None);

        progress.begin(Stage::Resolve, 3);
        progress.advance("Barclays");
        progress.advance("Tesco");
        assert_eq!(progress.position(), Some(2));
        progress.finish(Stage::Resolve);

        progress.begin(Stage::Fetch, 2);
        assert_eq!(progress.position(), Some(0));
        progress.advance("BARC.L");
        assert_eq!(progress.position(), Some(1));
    }

    #[test]
    fn test_advance_before_begin_is_ignored() {
        let progress = BarProgress::hidden();
        progress.advance("Barclays");
        progress.finish(Stage::Fetch);
        assert_eq!(progress.position(), None);
    }
}
