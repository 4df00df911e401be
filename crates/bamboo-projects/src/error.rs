//! Error types for bamboo-projects

use std::borrow::Cow;
use std::time::Duration;
use thiserror::Error;

/// Result type alias using bamboo-projects's Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Project scaffolding error types
#[derive(Error, Debug)]
pub enum Error {
    /// Module path is empty
    #[error("package name is required")]
    ModulePathRequired,

    /// Module path contains whitespace
    #[error("package name must not include spaces: {path:?}")]
    ModulePathWhitespace { path: String },

    /// Module path starts or ends with a slash
    #[error("package name must not start or end with '/': {path:?}")]
    ModulePathSlash { path: String },

    /// Module path has fewer than two segments
    #[error("package name must look like host/path, got: {path:?}")]
    ModulePathTooShort { path: String },

    /// First segment is not a host
    #[error("package name must include a host in the first segment, got: {path:?}")]
    ModulePathHost { path: String },

    /// Module path contains `//`
    #[error("package name contains an empty path segment: {path:?}")]
    ModulePathEmptySegment { path: String },

    /// No usable directory name could be derived
    #[error("invalid package name: {path:?}")]
    InvalidProjectName { path: String },

    /// Target directory already exists
    #[error("target directory already exists: {path}")]
    ProjectExists { path: String },

    /// Program could not be resolved on PATH
    #[error("{program} not found in PATH")]
    CommandNotFound { program: String },

    /// Program could not be started
    #[error("{command} failed: {source}")]
    CommandLaunch {
        command: String,
        #[source]
        source: std::io::Error,
    },

    /// Program exited unsuccessfully
    #[error("{command} failed{}{}", exit_code_suffix(.exit_code), output_suffix(.output))]
    CommandFailed {
        command: String,
        exit_code: Option<i32>,
        output: String,
    },

    /// Program exceeded its timeout and was killed
    #[error("{command} timed out after {}s", .timeout.as_secs())]
    CommandTimeout { command: String, timeout: Duration },

    /// Filesystem error while working on a path
    #[error("{operation} {path} failed: {source}")]
    FileIo {
        operation: &'static str,
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// Token to search for is empty
    #[error("rewrite token must not be empty")]
    EmptyRewriteToken,

    /// A scaffold step failed
    #[error("{context}: {source}")]
    StepFailed {
        context: Cow<'static, str>,
        source: Box<Error>,
    },

    /// A step action panicked
    #[error("step '{step}' aborted unexpectedly")]
    StepPanicked { step: String },

    /// The run was cancelled by the user
    #[error("initialization cancelled")]
    Cancelled,

    /// Configuration error
    #[error(transparent)]
    Config(#[from] bamboo_core::Error),
}

fn exit_code_suffix(code: &Option<i32>) -> String {
    match code {
        Some(code) => format!(" with exit code {}", code),
        None => String::new(),
    }
}

fn output_suffix(output: &str) -> String {
    if output.is_empty() {
        String::new()
    } else {
        format!(": {}", output)
    }
}

impl Error {
    /// Create a project exists error
    pub fn project_exists(path: impl Into<String>) -> Self {
        Self::ProjectExists { path: path.into() }
    }

    /// Create a command not found error
    pub fn command_not_found(program: impl Into<String>) -> Self {
        Self::CommandNotFound {
            program: program.into(),
        }
    }

    /// Create a command failed error
    pub fn command_failed(
        command: impl Into<String>,
        exit_code: Option<i32>,
        output: impl Into<String>,
    ) -> Self {
        Self::CommandFailed {
            command: command.into(),
            exit_code,
            output: output.into(),
        }
    }

    /// Create a command timeout error
    pub fn command_timeout(command: impl Into<String>, timeout: Duration) -> Self {
        Self::CommandTimeout {
            command: command.into(),
            timeout,
        }
    }

    /// Create a file IO error
    pub fn file_io(
        operation: &'static str,
        path: impl Into<String>,
        source: std::io::Error,
    ) -> Self {
        Self::FileIo {
            operation,
            path: path.into(),
            source,
        }
    }

    /// Wrap an error with the context of the step it happened in
    pub fn step_failed(context: impl Into<Cow<'static, str>>, source: Error) -> Self {
        Self::StepFailed {
            context: context.into(),
            source: Box::new(source),
        }
    }

    /// Create a step panicked error
    pub fn step_panicked(step: impl Into<String>) -> Self {
        Self::StepPanicked { step: step.into() }
    }

    /// Whether the error came from a command hitting its timeout
    pub fn is_timeout(&self) -> bool {
        match self {
            Self::CommandTimeout { .. } => true,
            Self::StepFailed { source, .. } => source.is_timeout(),
            _ => false,
        }
    }

    /// Whether the error is a module path or target directory problem
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            Self::ModulePathRequired
                | Self::ModulePathWhitespace { .. }
                | Self::ModulePathSlash { .. }
                | Self::ModulePathTooShort { .. }
                | Self::ModulePathHost { .. }
                | Self::ModulePathEmptySegment { .. }
                | Self::InvalidProjectName { .. }
                | Self::ProjectExists { .. }
        )
    }
}
