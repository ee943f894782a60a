use geobatch_lib::{ApiResult, BatchCheckpoint, CheckpointObserver, Result};
use indicatif::{ProgressBar as Bar, ProgressStyle};
use std::sync::LazyLock;

use crate::formatters::duration::Duration;

const TEMPLATE: &str = "{pos}/{len:.238} {bar:.162/238} {wide_msg}";
const PROGRESS_CHARS: &str = "━ ━";

static STYLE: LazyLock<ProgressStyle> = LazyLock::new(|| {
    ProgressStyle::with_template(TEMPLATE)
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars(PROGRESS_CHARS)
});

/// Report batch progress to the CLI.
///
/// The bar is drawn on stderr, so it never mixes with the summary on stdout.
#[derive(Clone)]
pub(crate) struct Progress {
    bar: Option<Bar>,
}

impl Progress {
    pub(crate) fn new(total: usize, hide_bar: bool) -> Self {
        let bar = (!hide_bar).then(|| {
            let bar = Bar::new(total as u64).with_style(STYLE.clone());
            bar.set_message("Resolving addresses");
            bar
        });
        Progress { bar }
    }

    pub(crate) fn finish(&self, message: &'static str) {
        self.with_bar(|b| b.finish_with_message(message));
    }

    fn with_bar<F>(&self, action: F)
    where
        F: FnOnce(&Bar),
    {
        if let Some(bar) = &self.bar {
            action(bar);
        }
    }

    /// The position and message the bar shows for `checkpoint`
    fn status(checkpoint: &BatchCheckpoint) -> (u64, String) {
        let message = match checkpoint.estimated_remaining {
            Some(remaining) if !checkpoint.is_complete() => format!(
                "batch {} done, about {} left",
                checkpoint.last_batch_index + 1,
                Duration::from(remaining)
            ),
            _ => format!("batch {} done", checkpoint.last_batch_index + 1),
        };
        (checkpoint.processed_count as u64, message)
    }
}

impl CheckpointObserver for Progress {
    fn on_checkpoint(&mut self, checkpoint: &BatchCheckpoint, _results: &[ApiResult]) -> Result<()> {
        let (position, message) = Self::status(checkpoint);
        self.with_bar(|bar| {
            bar.set_length(checkpoint.total_count as u64);
            bar.set_position(position);
            bar.set_message(message);
        });
        Ok(())
    }
}
