//! Shared fixtures for bamboo-projects integration tests

#![allow(dead_code)]

use async_trait::async_trait;
use bamboo_core::TemplateConfig;
use bamboo_projects::error::{Error, Result};
use bamboo_projects::process::{format_command, CommandRunner};
use bamboo_projects::sequencer::{RunObserver, StepStatus};
use camino::{Utf8Path, Utf8PathBuf};
use std::collections::HashSet;
use std::sync::Mutex;
use tempfile::TempDir;
use tokio::sync::Notify;

/// One recorded invocation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Call {
    pub dir: Option<Utf8PathBuf>,
    pub line: String,
}

/// Fake runner that records every command instead of executing it
///
/// `git clone` materializes a small template tree at the destination so the
/// later steps have something to work on.
#[derive(Default)]
pub struct RecordingRunner {
    calls: Mutex<Vec<Call>>,
    failing: HashSet<String>,
    hanging: HashSet<String>,
    pub hang_started: Notify,
}

impl RecordingRunner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make the command with this exact line fail with exit code 1
    pub fn failing(mut self, line: &str) -> Self {
        self.failing.insert(line.to_string());
        self
    }

    /// Make the command with this exact line never finish
    pub fn hanging(mut self, line: &str) -> Self {
        self.hanging.insert(line.to_string());
        self
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn lines(&self) -> Vec<String> {
        self.calls().into_iter().map(|c| c.line).collect()
    }
}

#[async_trait]
impl CommandRunner for RecordingRunner {
    async fn run(
        &self,
        working_dir: Option<&Utf8Path>,
        program: &str,
        args: &[&str],
    ) -> Result<()> {
        let line = format_command(program, args);
        self.calls.lock().unwrap().push(Call {
            dir: working_dir.map(Utf8Path::to_path_buf),
            line: line.clone(),
        });

        if self.hanging.contains(&line) {
            self.hang_started.notify_one();
            std::future::pending::<()>().await;
        }
        if self.failing.contains(&line) {
            return Err(Error::command_failed(line, Some(1), "boom"));
        }

        if program == "git" && args.first() == Some(&"clone") {
            if let Some(dest) = args.last() {
                write_template_tree(Utf8Path::new(dest));
            }
        }
        Ok(())
    }
}

/// Template token of the default configuration
pub fn template_token() -> String {
    TemplateConfig::default().module
}

/// The tree a clone of the template produces
pub fn write_template_tree(dest: &Utf8Path) {
    let token = template_token();
    std::fs::create_dir_all(dest.join(".git/refs")).unwrap();
    std::fs::write(dest.join(".git/HEAD"), "ref: refs/heads/main\n").unwrap();
    std::fs::write(dest.join(".git/config"), format!("# {}\n", token)).unwrap();
    std::fs::write(dest.join("go.mod"), format!("module {}\n\ngo 1.22\n", token)).unwrap();
    std::fs::create_dir_all(dest.join("cmd/server")).unwrap();
    std::fs::write(
        dest.join("cmd/server/main.go"),
        format!("package main\n\nimport _ \"{}/internal\"\n", token),
    )
    .unwrap();
    std::fs::write(dest.join("README.md"), format!("# {}\n", token)).unwrap();
    std::fs::write(dest.join("logo.png"), token.as_bytes()).unwrap();
}

/// Observer that keeps every callback for later assertions
#[derive(Default)]
pub struct RecordingObserver {
    pub started: Mutex<Option<Vec<String>>>,
    pub events: Mutex<Vec<(usize, StepStatus)>>,
    pub finished: Mutex<Option<Option<String>>>,
}

impl RecordingObserver {
    pub fn events(&self) -> Vec<(usize, StepStatus)> {
        self.events.lock().unwrap().clone()
    }

    /// Last status reported for each of `count` steps
    pub fn final_statuses(&self, count: usize) -> Vec<StepStatus> {
        let mut statuses = vec![StepStatus::Pending; count];
        for (index, status) in self.events() {
            statuses[index] = status;
        }
        statuses
    }
}

impl RunObserver for RecordingObserver {
    fn on_start(&self, steps: &[String]) {
        *self.started.lock().unwrap() = Some(steps.to_vec());
    }

    fn on_status(&self, index: usize, status: StepStatus) {
        self.events.lock().unwrap().push((index, status));
    }

    fn on_finished(&self, error: Option<&Error>) {
        *self.finished.lock().unwrap() = Some(error.map(ToString::to_string));
    }
}

/// Temporary working directory with a UTF-8 path
pub fn work_dir() -> (TempDir, Utf8PathBuf) {
    let temp = TempDir::new().unwrap();
    let path = Utf8PathBuf::from_path_buf(temp.path().to_path_buf()).unwrap();
    (temp, path)
}
