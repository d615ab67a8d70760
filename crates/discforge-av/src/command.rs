//! Builder for executing external tool commands.
//!
//! Two execution modes are offered. [`ToolCommand::run_logged`] is the
//! pipeline's process runner: the child's stdout and stderr share one
//! append-mode handle on the session log and only the exit code comes back.
//! [`ToolCommand::execute`] captures output in memory for tools whose report
//! has to be parsed.

use discforge_common::SessionLog;
use std::path::PathBuf;
use std::process::{ExitStatus, Stdio};
use std::time::Duration;

use tokio::process::{Child, Command};

use crate::{Error, Result};

/// Exit code reported when a process could not be spawned or ended without
/// an exit code of its own.
pub const FAILED_TO_RUN: i32 = -1;

/// Nice value applied to lowered-priority children on unix.
#[cfg(unix)]
const LOWERED_NICE: libc::c_int = 10;

/// `BELOW_NORMAL_PRIORITY_CLASS` process creation flag.
#[cfg(windows)]
const BELOW_NORMAL_PRIORITY_CLASS: u32 = 0x0000_4000;

/// OS scheduling class requested for a child process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Priority {
    #[default]
    Normal,
    /// Below-normal scheduling; applied best-effort.
    Lowered,
}

/// Output captured from a tool execution.
#[derive(Debug, Clone)]
pub struct ToolOutput {
    /// Process exit status.
    pub status: ExitStatus,
    /// Captured standard output (lossy UTF-8).
    pub stdout: String,
    /// Captured standard error (lossy UTF-8).
    pub stderr: String,
}

impl ToolOutput {
    /// Exit code, or [`FAILED_TO_RUN`] if the process was killed by a signal.
    pub fn code(&self) -> i32 {
        self.status.code().unwrap_or(FAILED_TO_RUN)
    }
}

/// A builder for constructing and executing external tool invocations.
///
/// # Example
///
/// ```no_run
/// use discforge_av::{Priority, ToolCommand};
/// use discforge_common::SessionLog;
/// use std::path::PathBuf;
///
/// # async fn example() {
/// let log = SessionLog::new("/raw/DISC/log.txt");
/// let code = ToolCommand::new(PathBuf::from("HandBrakeCLI"))
///     .arg("-i").arg("/raw/DISC/title_t01.mkv")
///     .arg("-o").arg("/encoded/DISC/title_t01.mp4")
///     .priority(Priority::Lowered)
///     .run_logged(&log)
///     .await;
/// println!("exit code {code}");
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct ToolCommand {
    program: PathBuf,
    args: Vec<String>,
    priority: Priority,
    timeout: Option<Duration>,
}

impl ToolCommand {
    /// Create a new command for the given program path.
    pub fn new(program: PathBuf) -> Self {
        Self {
            program,
            args: Vec::new(),
            priority: Priority::Normal,
            timeout: None,
        }
    }

    /// Append a single argument.
    pub fn arg(&mut self, s: impl Into<String>) -> &mut Self {
        self.args.push(s.into());
        self
    }

    /// Append multiple arguments.
    pub fn args(&mut self, iter: impl IntoIterator<Item = impl Into<String>>) -> &mut Self {
        self.args.extend(iter.into_iter().map(Into::into));
        self
    }

    /// Request a scheduling class for the child.
    pub fn priority(&mut self, priority: Priority) -> &mut Self {
        self.priority = priority;
        self
    }

    /// Set the maximum execution time. Only honored by [`Self::execute`].
    pub fn timeout(&mut self, d: Duration) -> &mut Self {
        self.timeout = Some(d);
        self
    }

    /// The argument vector, without the program.
    pub fn get_args(&self) -> &[String] {
        &self.args
    }

    fn program_name(&self) -> String {
        self.program
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| self.program.to_string_lossy().to_string())
    }

    fn command(&self) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.args(&self.args);
        cmd.stdin(Stdio::null());

        #[cfg(windows)]
        {
            if self.priority == Priority::Lowered {
                cmd.creation_flags(BELOW_NORMAL_PRIORITY_CLASS);
            }
        }

        cmd
    }

    #[cfg(unix)]
    fn apply_priority(&self, child: &Child) {
        if self.priority != Priority::Lowered {
            return;
        }
        let Some(pid) = child.id() else {
            return;
        };
        // SAFETY: setpriority only reads its scalar arguments.
        let rc = unsafe { libc::setpriority(libc::PRIO_PROCESS, pid as libc::id_t, LOWERED_NICE) };
        if rc != 0 {
            tracing::debug!(
                pid,
                "Could not lower priority: {}",
                std::io::Error::last_os_error()
            );
        }
    }

    #[cfg(not(unix))]
    fn apply_priority(&self, _child: &Child) {}

    /// Run the command with stdout and stderr appended to `log`, returning
    /// the exit code.
    ///
    /// Never fails: if the process cannot be spawned a diagnostic line is
    /// appended to the log and [`FAILED_TO_RUN`] is returned.
    pub async fn run_logged(&self, log: &SessionLog) -> i32 {
        let program = self.program_name();

        let stdout = match log.open_append() {
            Ok(file) => file,
            Err(e) => {
                tracing::error!("Cannot open log {}: {e}", log.path().display());
                return FAILED_TO_RUN;
            }
        };
        let stderr = match stdout.try_clone() {
            Ok(file) => file,
            Err(e) => {
                log.append_line(format!("CRITICAL SUBPROCESS ERROR: {program}: {e}"));
                return FAILED_TO_RUN;
            }
        };

        let mut cmd = self.command();
        cmd.stdout(Stdio::from(stdout)).stderr(Stdio::from(stderr));

        tracing::debug!("Running {} {:?}", program, self.args);

        let mut child = match cmd.spawn() {
            Ok(child) => child,
            Err(e) => {
                log.append_line(format!("CRITICAL SUBPROCESS ERROR: {program}: {e}"));
                return FAILED_TO_RUN;
            }
        };
        self.apply_priority(&child);

        match child.wait().await {
            Ok(status) => match status.code() {
                Some(code) => code,
                None => {
                    log.append_line(format!("{program} terminated without exit code ({status})"));
                    FAILED_TO_RUN
                }
            },
            Err(e) => {
                log.append_line(format!("CRITICAL SUBPROCESS ERROR: {program}: {e}"));
                FAILED_TO_RUN
            }
        }
    }

    /// Execute the command, capturing stdout and stderr.
    ///
    /// A nonzero exit status is not an error here; callers inspect
    /// [`ToolOutput::status`].
    ///
    /// # Errors
    ///
    /// - [`Error::ToolNotFound`] if the executable does not exist.
    /// - [`Error::ToolFailed`] if spawning fails, waiting fails, or the
    ///   timeout expires (the child is killed).
    pub async fn execute(&self) -> Result<ToolOutput> {
        let program = self.program_name();

        let mut cmd = self.command();
        cmd.stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        let child = cmd.spawn().map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                Error::tool_not_found(program.clone())
            } else {
                Error::tool_failed(program.clone(), format!("failed to spawn: {e}"))
            }
        })?;
        self.apply_priority(&child);

        let output = match self.timeout {
            Some(limit) => tokio::time::timeout(limit, child.wait_with_output())
                .await
                .map_err(|_| Error::tool_failed(program.clone(), format!("timed out after {limit:?}")))?,
            None => child.wait_with_output().await,
        }
        .map_err(|e| Error::tool_failed(program.clone(), format!("I/O error waiting for process: {e}")))?;

        Ok(ToolOutput {
            status: output.status,
            stdout: String::from_utf8_lossy(&output.stdout).to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).to_string(),
        })
    }
}
