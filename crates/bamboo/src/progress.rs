//! Interactive step display for scaffold runs
//!
//! One line per step, drawn on stderr:
//! `[ ]` pending, `[>]` running with a spinner, `[x]` done, `[!]` failed.
//! Log lines share the same `MultiProgress` through [`LogWriter`] so they are
//! printed above the step lines instead of through them.

use bamboo_projects::error::Error;
use bamboo_projects::sequencer::{RunObserver, StepStatus};
use console::style;
use indicatif::{MultiProgress, ProgressBar, ProgressDrawTarget, ProgressStyle};
use std::io::{self, Write};
use std::sync::Mutex;
use std::time::Duration;
use tracing_subscriber::fmt::MakeWriter;

const TICK_INTERVAL: Duration = Duration::from_millis(100);

/// Progress observer backed by an indicatif `MultiProgress`
#[derive(Debug)]
pub struct StepProgress {
    multi: MultiProgress,
    bars: Mutex<Vec<ProgressBar>>,
}

impl StepProgress {
    /// Draw through `multi`, normally the one the log writer also uses
    pub fn new(multi: MultiProgress) -> Self {
        Self {
            multi,
            bars: Mutex::new(Vec::new()),
        }
    }

    fn bar(&self, index: usize) -> Option<ProgressBar> {
        self.bars
            .lock()
            .ok()
            .and_then(|bars| bars.get(index).cloned())
    }
}

fn line_style() -> ProgressStyle {
    // The last tick string is what a finished line shows
    ProgressStyle::with_template("{prefix} {msg} {spinner:.cyan}")
        .unwrap_or_else(|_| ProgressStyle::default_spinner())
        .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", ""])
}

/// Marker shown in front of a step name
pub fn marker(status: StepStatus) -> String {
    match status {
        StepStatus::Pending => style("[ ]").dim().to_string(),
        StepStatus::Running => style("[>]").cyan().bold().to_string(),
        StepStatus::Done => style("[x]").green().bold().to_string(),
        StepStatus::Failed => style("[!]").red().bold().to_string(),
    }
}

impl RunObserver for StepProgress {
    fn on_start(&self, steps: &[String]) {
        let Ok(mut bars) = self.bars.lock() else {
            return;
        };
        let _ = self
            .multi
            .println(style("Press Ctrl+C to cancel.").dim().to_string());
        for name in steps {
            let bar = self.multi.add(ProgressBar::new_spinner());
            bar.set_style(line_style());
            bar.set_prefix(marker(StepStatus::Pending));
            bar.set_message(name.clone());
            bars.push(bar);
        }
    }

    fn on_status(&self, index: usize, status: StepStatus) {
        let Some(bar) = self.bar(index) else {
            return;
        };
        bar.set_prefix(marker(status));
        match status {
            StepStatus::Pending => {}
            StepStatus::Running => bar.enable_steady_tick(TICK_INTERVAL),
            StepStatus::Done | StepStatus::Failed => bar.finish(),
        }
    }

    fn on_finished(&self, _error: Option<&Error>) {
        if let Ok(bars) = self.bars.lock() {
            for bar in bars.iter().filter(|bar| !bar.is_finished()) {
                bar.finish();
            }
        }
    }
}

/// `MakeWriter` for tracing that suspends the step display per event
#[derive(Debug, Clone)]
pub struct LogWriter {
    multi: MultiProgress,
}

impl LogWriter {
    pub fn new(multi: MultiProgress) -> Self {
        Self { multi }
    }
}

impl<'a> MakeWriter<'a> for LogWriter {
    type Writer = LogLine;

    fn make_writer(&'a self) -> Self::Writer {
        LogLine {
            multi: self.multi.clone(),
            buf: Vec::new(),
        }
    }
}

/// One formatted event, flushed to stderr when dropped
pub struct LogLine {
    multi: MultiProgress,
    buf: Vec<u8>,
}

impl Write for LogLine {
    fn write(&mut self, bytes: &[u8]) -> io::Result<usize> {
        self.buf.extend_from_slice(bytes);
        Ok(bytes.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl Drop for LogLine {
    fn drop(&mut self) {
        if self.buf.is_empty() {
            return;
        }
        let buf = std::mem::take(&mut self.buf);
        self.multi.suspend(|| {
            let _ = io::stderr().write_all(&buf);
        });
    }
}
