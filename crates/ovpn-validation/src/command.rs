//! Safe command execution with command injection prevention.
//!
//! This module provides a `SafeCommand` builder that validates all arguments
//! before execution and a [`CommandExecutor`] seam so callers can swap the
//! real process runner for a recording fake in tests.
//!
//! # Security Features
//!
//! - **No shell invocation**: programs are spawned directly, never via `sh -c`
//! - **Allowlist enforcement**: only the programs in [`AllowedProgram`] run
//! - **Argument validation**: NUL, CR and LF are rejected before spawning
//! - **Deterministic lookup**: `PATH` is replaced by an explicit search path
//! - **Bounded runtime**: every invocation carries a timeout
//!
//! # Example
//!
//! ```rust,no_run
//! # async fn example() -> Result<(), ovpn_validation::command::CommandError> {
//! use ovpn_validation::command::{AllowedProgram, SafeCommand, SystemExecutor};
//!
//! let executor = SystemExecutor::new();
//! let output = SafeCommand::new(AllowedProgram::EasyRsa)
//!     .args(["--batch", "gen-crl"])
//!     .current_dir("/etc/openvpn/easy-rsa")
//!     .execute_with(&executor)
//!     .await?;
//!
//! println!("stdout: {}", output.stdout_lossy());
//! # Ok(())
//! # }
//! ```

use std::collections::VecDeque;
use std::fmt;
use std::path::{Component, Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;

use parking_lot::Mutex;
use thiserror::Error;
use tokio::process::Command as TokioCommand;
use tracing::{debug, warn};

use crate::error::ValidationError;

/// Search path handed to every child process instead of the ambient `PATH`.
pub const DEFAULT_SEARCH_PATH: &str = "/usr/local/sbin:/usr/local/bin:/usr/sbin:/usr/bin:/sbin:/bin";

/// Default upper bound for a single external command.
pub const DEFAULT_COMMAND_TIMEOUT: Duration = Duration::from_secs(120);

/// Programs that are explicitly allowed to be executed.
///
/// Adding new programs requires explicit code changes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum AllowedProgram {
    /// The `easyrsa` script, run from inside the easy-rsa directory.
    EasyRsa,
    /// `cp`, used to publish the regenerated CRL.
    Copy,
    /// `chown`, used to hand the published CRL to the server user.
    Chown,
}

impl AllowedProgram {
    /// Get the program name/path to execute.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::EasyRsa => "./easyrsa",
            Self::Copy => "cp",
            Self::Chown => "chown",
        }
    }

    /// Whether the program is addressed relative to the working directory.
    #[must_use]
    pub fn is_relative_to_working_dir(&self) -> bool {
        self.as_str().starts_with("./")
    }
}

impl fmt::Display for AllowedProgram {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Errors that can occur during safe command execution.
#[derive(Debug, Error)]
pub enum CommandError {
    /// Validation of a command argument failed.
    #[error("argument validation failed: {0}")]
    ValidationFailed(#[from] ValidationError),

    /// The command could not be started.
    #[error("command '{command}' could not be started: {message}")]
    ExecutionFailed {
        /// The command that was attempted.
        command: String,
        /// Description of the failure.
        message: String,
    },

    /// The command returned a non-zero exit code.
    #[error("command '{command}' exited with code {exit_code}: {stderr}")]
    NonZeroExit {
        /// The command that was executed.
        command: String,
        /// The exit code (-1 when terminated by a signal).
        exit_code: i32,
        /// Standard error output.
        stderr: String,
    },

    /// The command did not finish before its deadline and was killed.
    #[error("command '{command}' timed out after {timeout_secs}s")]
    TimedOut {
        /// The command that was executed.
        command: String,
        /// The timeout that expired, in seconds.
        timeout_secs: u64,
    },
}

impl CommandError {
    /// Create an execution failed error.
    #[must_use]
    pub fn execution_failed(command: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ExecutionFailed {
            command: command.into(),
            message: message.into(),
        }
    }

    /// Create a non-zero exit error.
    #[must_use]
    pub fn non_zero_exit(
        command: impl Into<String>,
        exit_code: i32,
        stderr: impl Into<String>,
    ) -> Self {
        Self::NonZeroExit {
            command: command.into(),
            exit_code,
            stderr: stderr.into(),
        }
    }

    /// Check if this is a validation error.
    #[must_use]
    pub fn is_validation_error(&self) -> bool {
        matches!(self, Self::ValidationFailed(_))
    }

    /// Check if the command was killed by its timeout.
    #[must_use]
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::TimedOut { .. })
    }

    /// The exit code, when the process actually exited.
    #[must_use]
    pub fn exit_code(&self) -> Option<i32> {
        match self {
            Self::NonZeroExit { exit_code, .. } => Some(*exit_code),
            _ => None,
        }
    }
}

/// Characters that are never allowed in command arguments.
const FORBIDDEN_CHARS: &[char] = &[
    '\0', // Null byte
    '\n', // Newline (can break argument parsing)
    '\r', // Carriage return
];

/// Validate a command argument.
///
/// # Errors
///
/// Returns an error if the argument contains forbidden characters.
pub fn validate_argument(arg: &str, field_name: &str) -> Result<(), ValidationError> {
    for c in arg.chars() {
        if FORBIDDEN_CHARS.contains(&c) {
            return Err(ValidationError::shell_injection(field_name, c));
        }
    }

    Ok(())
}

/// Output from a command execution.
#[derive(Debug, Clone, Default)]
pub struct CommandOutput {
    /// Standard output.
    pub stdout: Vec<u8>,
    /// Standard error.
    pub stderr: Vec<u8>,
    /// Exit status code (0 for success).
    pub exit_code: i32,
}

impl CommandOutput {
    /// Get stdout as a UTF-8 string, replacing invalid characters.
    #[must_use]
    pub fn stdout_lossy(&self) -> String {
        String::from_utf8_lossy(&self.stdout).into_owned()
    }

    /// Get stderr as a UTF-8 string, replacing invalid characters.
    #[must_use]
    pub fn stderr_lossy(&self) -> String {
        String::from_utf8_lossy(&self.stderr).into_owned()
    }

    /// Check if the command succeeded (exit code 0).
    #[must_use]
    pub fn success(&self) -> bool {
        self.exit_code == 0
    }
}

/// A fully validated invocation, ready to hand to a [`CommandExecutor`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandSpec {
    program: AllowedProgram,
    args: Vec<String>,
    current_dir: Option<PathBuf>,
}

impl CommandSpec {
    /// The program to run.
    #[must_use]
    pub fn program(&self) -> AllowedProgram {
        self.program
    }

    /// The argument vector, excluding the program itself.
    #[must_use]
    pub fn args(&self) -> &[String] {
        &self.args
    }

    /// The working directory, if one was set.
    #[must_use]
    pub fn current_dir(&self) -> Option<&Path> {
        self.current_dir.as_deref()
    }

    /// The path actually passed to the OS.
    ///
    /// Programs addressed as `./name` are resolved against the working
    /// directory up front instead of leaving it to the platform.
    #[must_use]
    pub fn resolved_program(&self) -> PathBuf {
        let program = self.program.as_str();
        match (&self.current_dir, self.program.is_relative_to_working_dir()) {
            (Some(dir), true) => dir.join(program.trim_start_matches("./")),
            _ => PathBuf::from(program),
        }
    }

    /// Human-readable command line for logs and error messages.
    #[must_use]
    pub fn description(&self) -> String {
        if self.args.is_empty() {
            self.program.as_str().to_string()
        } else {
            format!("{} {}", self.program.as_str(), self.args.join(" "))
        }
    }
}

impl fmt::Display for CommandSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.description())
    }
}

/// A safe command builder that validates all inputs.
///
/// This builder ensures:
/// - Only allowlisted programs can be executed
/// - All arguments are validated before execution
/// - No shell is invoked (arguments are passed directly)
#[derive(Debug)]
pub struct SafeCommand {
    program: AllowedProgram,
    args: Vec<String>,
    validation_errors: Vec<ValidationError>,
    current_dir: Option<PathBuf>,
}

impl SafeCommand {
    /// Create a new safe command for the given program.
    #[must_use]
    pub fn new(program: AllowedProgram) -> Self {
        Self {
            program,
            args: Vec::new(),
            validation_errors: Vec::new(),
            current_dir: None,
        }
    }

    /// Add a single argument to the command.
    #[must_use]
    pub fn arg(mut self, arg: impl AsRef<str>) -> Self {
        let arg = arg.as_ref();
        match validate_argument(arg, "argument") {
            Ok(()) => self.args.push(arg.to_string()),
            Err(e) => self.validation_errors.push(e),
        }
        self
    }

    /// Add multiple arguments to the command.
    #[must_use]
    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        for arg in args {
            self = self.arg(arg);
        }
        self
    }

    /// Add a filesystem path as an argument.
    #[must_use]
    pub fn path_arg(self, path: impl AsRef<Path>) -> Self {
        let path = path.as_ref().to_string_lossy().into_owned();
        self.arg(path)
    }

    /// Set the working directory for the command.
    ///
    /// Paths containing `..` components are rejected.
    #[must_use]
    pub fn current_dir(mut self, dir: impl AsRef<Path>) -> Self {
        let dir = dir.as_ref();

        if dir.components().any(|c| matches!(c, Component::ParentDir)) {
            self.validation_errors
                .push(ValidationError::path_traversal("current_dir", ".."));
            return self;
        }

        if let Err(e) = validate_argument(&dir.to_string_lossy(), "current_dir") {
            self.validation_errors.push(e);
            return self;
        }

        self.current_dir = Some(dir.to_path_buf());
        self
    }

    /// Check if there are any validation errors.
    #[must_use]
    pub fn has_errors(&self) -> bool {
        !self.validation_errors.is_empty()
    }

    /// Get any validation errors that occurred.
    #[must_use]
    pub fn errors(&self) -> &[ValidationError] {
        &self.validation_errors
    }

    /// Finish building, surfacing the first validation error.
    ///
    /// # Errors
    ///
    /// Returns [`CommandError::ValidationFailed`] if any input was rejected.
    pub fn build(self) -> Result<CommandSpec, CommandError> {
        if let Some(error) = self.validation_errors.into_iter().next() {
            return Err(CommandError::ValidationFailed(error));
        }

        Ok(CommandSpec {
            program: self.program,
            args: self.args,
            current_dir: self.current_dir,
        })
    }

    /// Build the command and run it through `executor`.
    ///
    /// # Errors
    ///
    /// Returns an error if validation failed or the executor reports a failure.
    pub async fn execute_with<E: CommandExecutor>(
        self,
        executor: &E,
    ) -> Result<CommandOutput, CommandError> {
        let spec = self.build()?;
        executor.execute(&spec).await
    }
}

/// Runs validated commands.
///
/// A non-zero exit is always reported as [`CommandError::NonZeroExit`];
/// implementations never retry.
#[allow(async_fn_in_trait)]
pub trait CommandExecutor {
    /// Run `spec` to completion.
    async fn execute(&self, spec: &CommandSpec) -> Result<CommandOutput, CommandError>;
}

/// Executor that spawns real processes with tokio.
#[derive(Debug, Clone)]
pub struct SystemExecutor {
    search_path: String,
    timeout: Duration,
}

impl SystemExecutor {
    /// Create an executor with the default search path and timeout.
    #[must_use]
    pub fn new() -> Self {
        Self {
            search_path: DEFAULT_SEARCH_PATH.to_string(),
            timeout: DEFAULT_COMMAND_TIMEOUT,
        }
    }

    /// Replace the `PATH` handed to child processes.
    #[must_use]
    pub fn with_search_path(mut self, search_path: impl Into<String>) -> Self {
        self.search_path = search_path.into();
        self
    }

    /// Set the per-command timeout.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// The configured per-command timeout.
    #[must_use]
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// The `PATH` handed to child processes.
    #[must_use]
    pub fn search_path(&self) -> &str {
        &self.search_path
    }
}

impl Default for SystemExecutor {
    fn default() -> Self {
        Self::new()
    }
}

impl CommandExecutor for SystemExecutor {
    async fn execute(&self, spec: &CommandSpec) -> Result<CommandOutput, CommandError> {
        let description = spec.description();
        debug!(command = %description, "executing command");

        let mut cmd = TokioCommand::new(spec.resolved_program());
        cmd.args(spec.args());
        cmd.env("PATH", &self.search_path);
        cmd.stdin(Stdio::null());
        cmd.stdout(Stdio::piped());
        cmd.stderr(Stdio::piped());
        cmd.kill_on_drop(true);

        if let Some(dir) = spec.current_dir() {
            cmd.current_dir(dir);
        }

        let output = match tokio::time::timeout(self.timeout, cmd.output()).await {
            Ok(Ok(output)) => output,
            Ok(Err(e)) => {
                return Err(CommandError::execution_failed(description, e.to_string()));
            }
            Err(_) => {
                warn!(command = %description, timeout_secs = self.timeout.as_secs(), "command timed out");
                return Err(CommandError::TimedOut {
                    command: description,
                    timeout_secs: self.timeout.as_secs(),
                });
            }
        };

        let exit_code = output.status.code().unwrap_or(-1);

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
            warn!(command = %description, exit_code, %stderr, "command failed");
            return Err(CommandError::non_zero_exit(description, exit_code, stderr));
        }

        Ok(CommandOutput {
            stdout: output.stdout,
            stderr: output.stderr,
            exit_code,
        })
    }
}

/// A fake executor for testing.
///
/// Records every invocation and answers from a queue of scripted results;
/// once the queue is empty every command succeeds with empty output.
#[derive(Debug, Default)]
pub struct FakeExecutor {
    invocations: Mutex<Vec<CommandSpec>>,
    responses: Mutex<VecDeque<Result<CommandOutput, CommandError>>>,
}

impl FakeExecutor {
    /// Create a fake executor where every command succeeds.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a scripted result for the next unanswered invocation.
    pub fn push_response(&self, response: Result<CommandOutput, CommandError>) {
        self.responses.lock().push_back(response);
    }

    /// Queue a successful result.
    pub fn push_success(&self) {
        self.push_response(Ok(CommandOutput::default()));
    }

    /// Queue a non-zero exit for the next unanswered invocation.
    pub fn push_failure(&self, exit_code: i32, stderr: &str) {
        self.push_response(Err(CommandError::non_zero_exit("scripted", exit_code, stderr)));
    }

    /// Every invocation seen so far, in order.
    #[must_use]
    pub fn invocations(&self) -> Vec<CommandSpec> {
        self.invocations.lock().clone()
    }

    /// Command lines of every invocation seen so far, in order.
    #[must_use]
    pub fn command_lines(&self) -> Vec<String> {
        self.invocations()
            .iter()
            .map(CommandSpec::description)
            .collect()
    }
}

impl CommandExecutor for FakeExecutor {
    async fn execute(&self, spec: &CommandSpec) -> Result<CommandOutput, CommandError> {
        self.invocations.lock().push(spec.clone());

        let scripted = self.responses.lock().pop_front();

        match scripted {
            Some(Err(CommandError::NonZeroExit {
                exit_code, stderr, ..
            })) => Err(CommandError::non_zero_exit(
                spec.description(),
                exit_code,
                stderr,
            )),
            Some(other) => other,
            None => Ok(CommandOutput::default()),
        }
    }
}
