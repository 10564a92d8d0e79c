use indicatif::{ProgressBar, ProgressStyle};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// Progress over the files of a batch, counting skips separately. Clones
/// share the same bar.
#[derive(Clone)]
pub struct ProgressTracker {
    bar: ProgressBar,
    skipped: Arc<AtomicUsize>,
}

impl ProgressTracker {
    pub fn new(total: usize) -> Self {
        let bar = ProgressBar::new(total as u64);
        if let Ok(style) = ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{wide_bar:.cyan/blue}] {pos}/{len} {msg}")
        {
            bar.set_style(style.progress_chars("#>-"));
        }
        bar.set_message("reading uploads");
        Self::with_bar(bar)
    }

    fn with_bar(bar: ProgressBar) -> Self {
        Self {
            bar,
            skipped: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Record one finished file, extracted or skipped.
    pub fn file_done(&self, filename: &str, skipped: bool) {
        if skipped {
            self.skipped.fetch_add(1, Ordering::SeqCst);
        }
        self.bar.inc(1);
        self.bar.set_message(self.summary(filename));
    }

    pub fn finish(&self) {
        let skipped = self.skipped.load(Ordering::SeqCst);
        self.bar
            .finish_with_message(format!("done, {} skipped", skipped));
    }

    fn summary(&self, last: &str) -> String {
        match self.skipped.load(Ordering::SeqCst) {
            0 => last.to_string(),
            n => format!("{} ({} skipped)", last, n),
        }
    }
}
