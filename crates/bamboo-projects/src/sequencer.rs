//! Sequential step engine
//!
//! A run owns an ordered list of named steps and executes them one at a time.
//! [`RunState`] is the pure state machine; [`Sequencer`] drives it on a tokio
//! runtime, reports every status change to a [`RunObserver`] and listens for a
//! cancellation signal.
//!
//! # Example
//!
//! ```no_run
//! use bamboo_projects::sequencer::{NoOpObserver, Sequencer, Step};
//! use std::sync::Arc;
//!
//! # async fn example() {
//! let steps = vec![
//!     Step::from_fn("First", |_ctx: Arc<()>| async { Ok(()) }),
//!     Step::from_fn("Second", |_ctx: Arc<()>| async { Ok(()) }),
//! ];
//! let summary = Sequencer::new(steps, Arc::new(()))
//!     .run(&NoOpObserver, std::future::pending())
//!     .await;
//! assert!(summary.is_success());
//! # }
//! ```

use crate::error::{Error, Result};
use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, OnceLock};
use tracing::{debug, error, info, warn};

/// Status of a single step
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepStatus {
    Pending,
    Running,
    Done,
    Failed,
}

impl fmt::Display for StepStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StepStatus::Pending => write!(f, "pending"),
            StepStatus::Running => write!(f, "running"),
            StepStatus::Done => write!(f, "done"),
            StepStatus::Failed => write!(f, "failed"),
        }
    }
}

/// Where a run is in its lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunPhase {
    /// Not started yet
    Idle,
    /// Step at this index is executing
    Running(usize),
    /// Every step finished successfully
    Completed,
    /// Step at this index failed
    Failed(usize),
    /// Cancelled; carries the step that was running, if any
    Cancelled(Option<usize>),
}

impl RunPhase {
    /// Whether no further step will execute
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            RunPhase::Completed | RunPhase::Failed(_) | RunPhase::Cancelled(_)
        )
    }
}

/// Boxed future returned by a [`StepAction`]
pub type StepFuture = Pin<Box<dyn Future<Output = Result<()>> + Send + 'static>>;

/// Work performed by one step
///
/// The context is shared read-only by every step of a run. The returned
/// future owns everything it needs so it can run as its own task.
pub trait StepAction<C>: Send + Sync {
    fn run(&self, ctx: Arc<C>) -> StepFuture;
}

/// Adapts an async closure into a [`StepAction`]
pub struct FnAction<F>(F);

impl<C, F, Fut> StepAction<C> for FnAction<F>
where
    F: Fn(Arc<C>) -> Fut + Send + Sync,
    Fut: Future<Output = Result<()>> + Send + 'static,
{
    fn run(&self, ctx: Arc<C>) -> StepFuture {
        Box::pin((self.0)(ctx))
    }
}

/// A named, ordered unit of work
pub struct Step<C> {
    name: String,
    action: Arc<dyn StepAction<C>>,
}

impl<C: Send + Sync + 'static> Step<C> {
    /// Create a step from an action
    pub fn new(name: impl Into<String>, action: impl StepAction<C> + 'static) -> Self {
        Self {
            name: name.into(),
            action: Arc::new(action),
        }
    }

    /// Create a step from an async closure
    pub fn from_fn<F, Fut>(name: impl Into<String>, f: F) -> Self
    where
        F: Fn(Arc<C>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<()>> + Send + 'static,
    {
        Self::new(name, FnAction(f))
    }
}

impl<C> Step<C> {
    /// Display name of the step
    pub fn name(&self) -> &str {
        &self.name
    }
}

impl<C> fmt::Debug for Step<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Step").field("name", &self.name).finish()
    }
}

/// Status changes produced by one state machine event
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    /// First step is now running
    Started { index: usize },
    /// `done` finished and `next` is now running
    Advanced { done: usize, next: usize },
    /// Run completed; `done` is the last step, absent for an empty run
    Completed { done: Option<usize> },
    /// Step failed and the run stopped
    Failed { index: usize },
    /// Run cancelled; `index` is the step that was marked failed
    Cancelled { index: Option<usize> },
    /// Event did not apply to the current phase
    Ignored,
}

/// State of one run over its step list
#[derive(Debug)]
pub struct RunState<C> {
    steps: Vec<Step<C>>,
    statuses: Vec<StepStatus>,
    phase: RunPhase,
    error: Option<Error>,
}

impl<C> RunState<C> {
    /// Fresh state with every step pending
    pub fn new(steps: Vec<Step<C>>) -> Self {
        let statuses = vec![StepStatus::Pending; steps.len()];
        Self {
            steps,
            statuses,
            phase: RunPhase::Idle,
            error: None,
        }
    }

    /// Begin the run
    pub fn start(&mut self) -> Transition {
        if self.phase != RunPhase::Idle {
            return Transition::Ignored;
        }

        if self.steps.is_empty() {
            self.phase = RunPhase::Completed;
            return Transition::Completed { done: None };
        }

        self.statuses[0] = StepStatus::Running;
        self.phase = RunPhase::Running(0);
        Transition::Started { index: 0 }
    }

    /// Record the result of the step at `index`
    ///
    /// Results for anything but the running step are ignored.
    pub fn complete(&mut self, index: usize, result: Result<()>) -> Transition {
        if self.phase != RunPhase::Running(index) {
            return Transition::Ignored;
        }

        if let Err(err) = result {
            self.statuses[index] = StepStatus::Failed;
            self.error = Some(err);
            self.phase = RunPhase::Failed(index);
            return Transition::Failed { index };
        }

        self.statuses[index] = StepStatus::Done;
        let next = index + 1;
        if next == self.steps.len() {
            self.phase = RunPhase::Completed;
            return Transition::Completed { done: Some(index) };
        }

        self.statuses[next] = StepStatus::Running;
        self.phase = RunPhase::Running(next);
        Transition::Advanced { done: index, next }
    }

    /// Stop the run at the user's request
    pub fn cancel(&mut self) -> Transition {
        match self.phase {
            RunPhase::Idle => {
                self.error = Some(Error::Cancelled);
                self.phase = RunPhase::Cancelled(None);
                Transition::Cancelled { index: None }
            }
            RunPhase::Running(index) => {
                self.statuses[index] = StepStatus::Failed;
                self.error = Some(Error::Cancelled);
                self.phase = RunPhase::Cancelled(Some(index));
                Transition::Cancelled { index: Some(index) }
            }
            _ => Transition::Ignored,
        }
    }

    /// Index of the running step
    pub fn current(&self) -> Option<usize> {
        match self.phase {
            RunPhase::Running(index) => Some(index),
            _ => None,
        }
    }

    pub fn phase(&self) -> RunPhase {
        self.phase
    }

    pub fn statuses(&self) -> &[StepStatus] {
        &self.statuses
    }

    pub fn steps(&self) -> &[Step<C>] {
        &self.steps
    }

    /// Terminal error, if the run failed or was cancelled
    pub fn error(&self) -> Option<&Error> {
        self.error.as_ref()
    }

    pub fn is_finished(&self) -> bool {
        self.phase.is_terminal()
    }

    /// Consume the state into its final report
    pub fn into_summary(self) -> RunSummary {
        RunSummary {
            statuses: self.statuses,
            phase: self.phase,
            error: self.error,
        }
    }
}

/// Final report of a run
#[derive(Debug)]
pub struct RunSummary {
    pub statuses: Vec<StepStatus>,
    pub phase: RunPhase,
    pub error: Option<Error>,
}

impl RunSummary {
    pub fn is_success(&self) -> bool {
        self.phase == RunPhase::Completed
    }

    /// The terminal error as a Result
    pub fn into_result(self) -> Result<()> {
        match self.error {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}

/// Receives run progress
///
/// Callbacks arrive in the order transitions happen.
pub trait RunObserver: Send + Sync {
    /// Called once with the step names, before any status change
    fn on_start(&self, steps: &[String]);

    /// Called for every status change
    fn on_status(&self, index: usize, status: StepStatus);

    /// Called once when the run reaches a terminal phase
    fn on_finished(&self, error: Option<&Error>);
}

/// Observer that ignores every event
#[derive(Debug, Clone, Copy, Default)]
pub struct NoOpObserver;

impl RunObserver for NoOpObserver {
    fn on_start(&self, _steps: &[String]) {}

    fn on_status(&self, _index: usize, _status: StepStatus) {}

    fn on_finished(&self, _error: Option<&Error>) {}
}

/// Observer that logs run events through `tracing`
///
/// - step running/done: INFO
/// - step failed: WARN
/// - run failed: DEBUG
#[derive(Debug, Default)]
pub struct TracingObserver {
    names: OnceLock<Vec<String>>,
}

impl TracingObserver {
    pub fn new() -> Self {
        Self::default()
    }

    fn name(&self, index: usize) -> &str {
        self.names
            .get()
            .and_then(|names| names.get(index))
            .map(String::as_str)
            .unwrap_or("<unknown>")
    }

    fn total(&self) -> usize {
        self.names.get().map_or(0, Vec::len)
    }
}

impl RunObserver for TracingObserver {
    fn on_start(&self, steps: &[String]) {
        let _ = self.names.set(steps.to_vec());
        info!(steps = steps.len(), "Starting run");
    }

    fn on_status(&self, index: usize, status: StepStatus) {
        let position = index + 1;
        let total = self.total();
        match status {
            StepStatus::Failed => warn!("[{}/{}] {}: {}", position, total, self.name(index), status),
            _ => info!("[{}/{}] {}: {}", position, total, self.name(index), status),
        }
    }

    fn on_finished(&self, error: Option<&Error>) {
        match error {
            // The caller reports the terminal error itself
            Some(err) => debug!("Run failed: {}", err),
            None => info!("Run completed"),
        }
    }
}

/// Drives a [`RunState`] to a terminal phase
pub struct Sequencer<C> {
    state: RunState<C>,
    context: Arc<C>,
}

impl<C: Send + Sync + 'static> Sequencer<C> {
    pub fn new(steps: Vec<Step<C>>, context: Arc<C>) -> Self {
        Self {
            state: RunState::new(steps),
            context,
        }
    }

    /// Names of the steps, in order
    pub fn step_names(&self) -> Vec<String> {
        self.state.steps().iter().map(|s| s.name().to_string()).collect()
    }

    /// Execute every step in order until one fails or `cancel` resolves
    ///
    /// Each action runs as its own task. On cancellation the running task is
    /// detached rather than aborted, so an external command it started keeps
    /// going until it exits or hits its own timeout.
    pub async fn run<F>(mut self, observer: &dyn RunObserver, cancel: F) -> RunSummary
    where
        F: Future<Output = ()>,
    {
        observer.on_start(&self.step_names());

        let transition = self.state.start();
        emit(observer, transition);

        tokio::pin!(cancel);

        while let Some(index) = self.state.current() {
            let step = &self.state.steps()[index];
            let name = step.name().to_string();
            let action = Arc::clone(&step.action);
            let context = Arc::clone(&self.context);

            info!(step = %name, index, "Running step");
            let mut task = tokio::spawn(action.run(context));

            let transition = tokio::select! {
                joined = &mut task => {
                    let result = joined.unwrap_or_else(|e| {
                        error!(step = %name, "Step task ended abnormally: {}", e);
                        Err(Error::step_panicked(name.as_str()))
                    });
                    self.state.complete(index, result)
                }
                () = &mut cancel => {
                    info!(step = %name, "Run cancelled; in-flight step left to finish on its own");
                    self.state.cancel()
                }
            };
            emit(observer, transition);
        }

        observer.on_finished(self.state.error());
        self.state.into_summary()
    }
}

fn emit(observer: &dyn RunObserver, transition: Transition) {
    match transition {
        Transition::Started { index } => observer.on_status(index, StepStatus::Running),
        Transition::Advanced { done, next } => {
            observer.on_status(done, StepStatus::Done);
            observer.on_status(next, StepStatus::Running);
        }
        Transition::Completed { done: Some(index) } => observer.on_status(index, StepStatus::Done),
        Transition::Failed { index } | Transition::Cancelled { index: Some(index) } => {
            observer.on_status(index, StepStatus::Failed)
        }
        Transition::Completed { done: None }
        | Transition::Cancelled { index: None }
        | Transition::Ignored => {}
    }
}
