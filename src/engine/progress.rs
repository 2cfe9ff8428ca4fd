//! Progress bar for the consumer side of a feed

use kdam::{Animation, Bar, BarExt};

use crate::utils::config::ProgressConsts;

/// Configuration for creating a progress bar
pub struct ProgressBarConfig {
    pub total: usize,
    pub desc: &'static str,
    pub animation: Animation,
}

impl ProgressBarConfig {
    pub fn new(total: usize, desc: &'static str, animation: Animation) -> Self {
        Self {
            total,
            desc,
            animation,
        }
    }
}

/// Create a progress bar with the given configuration
pub fn create_progress_bar(config: ProgressBarConfig) -> Bar {
    kdam::tqdm!(
        total = config.total,
        desc = config.desc,
        animation = config.animation,
        unit = " items"
    )
}

/// Counts items as the consumer writes them and pushes batched updates to an optional bar.
/// Lives on the consumer thread only.
pub struct ProgressTracker {
    bar: Option<Bar>,
    seen: usize,
    pending: usize,
}

impl ProgressTracker {
    /// Bar over `total` items when `enabled`; otherwise only counts.
    pub fn new(total: usize, enabled: bool) -> Self {
        let bar = enabled.then(|| {
            create_progress_bar(ProgressBarConfig::new(
                total,
                "Feeding",
                Animation::FillUp,
            ))
        });
        ProgressTracker {
            bar,
            seen: 0,
            pending: 0,
        }
    }

    pub fn tick(&mut self) {
        self.seen += 1;
        self.pending += 1;
        if self.pending >= ProgressConsts::PROGRESS_UPDATE_BATCH_SIZE {
            self.flush();
        }
    }

    pub fn seen(&self) -> usize {
        self.seen
    }

    /// Push the remainder to the bar.
    pub fn flush(&mut self) {
        if let Some(ref mut bar) = self.bar
            && self.pending > 0
        {
            let _ = bar.update(self.pending);
        }
        self.pending = 0;
    }
}

impl Drop for ProgressTracker {
    fn drop(&mut self) {
        self.flush();
        if self.bar.is_some() {
            eprintln!();
        }
    }
}
