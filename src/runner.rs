//! Command execution
//!
//! The installer never spawns a process or touches a file directly. It hands
//! `CommandLine`s and `FsAction`s to a `CommandRunner`:
//!
//! | Runner            | Commands                          | File actions |
//! |-------------------|-----------------------------------|--------------|
//! | `SystemRunner`    | spawned, process-group isolated   | applied      |
//! | `DryRunRunner`    | queries run, the rest logged      | logged       |
//! | `RecordingRunner` | recorded, scripted responses      | recorded     |

use std::fmt;
use std::process::Stdio;

use anyhow::{Context, Result};
use tracing::{debug, info, warn};

use crate::command::{CommandLine, FsAction};
use crate::process_guard::{ChildRegistry, CommandProcessGroup};

/// Output from one command.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CommandOutput {
    pub stdout: String,
    pub stderr: String,
    /// Exit code (None if terminated by a signal or never started)
    pub exit_code: Option<i32>,
    pub success: bool,
}

impl CommandOutput {
    pub fn success(stdout: impl Into<String>) -> Self {
        Self {
            stdout: stdout.into(),
            stderr: String::new(),
            exit_code: Some(0),
            success: true,
        }
    }

    pub fn failure(exit_code: i32, stderr: impl Into<String>) -> Self {
        Self {
            stdout: String::new(),
            stderr: stderr.into(),
            exit_code: Some(exit_code),
            success: false,
        }
    }
}

/// The single capability through which the installer affects the system.
pub trait CommandRunner {
    /// Run a command to completion.
    ///
    /// A non-zero exit is a normal `Ok` with `success == false`; `Err` means
    /// the command could not be run at all.
    fn run(&mut self, command: &CommandLine) -> Result<CommandOutput>;

    /// Apply a filesystem action under the staging root.
    fn apply(&mut self, action: &FsAction) -> Result<()>;
}

// ============================================================================
// System runner
// ============================================================================

/// Runs commands for real.
///
/// stdin is closed: every tool is invoked non-interactively.
#[derive(Debug, Default)]
pub struct SystemRunner;

impl SystemRunner {
    pub fn new() -> Self {
        Self
    }
}

impl CommandRunner for SystemRunner {
    fn run(&mut self, command: &CommandLine) -> Result<CommandOutput> {
        info!(command = %command, "running");

        let mut cmd = command.to_command();
        cmd.stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .in_new_process_group();

        let child = cmd
            .spawn()
            .with_context(|| format!("Failed to spawn `{}`", command.program))?;
        let pid = child.id();

        let registry = ChildRegistry::global();
        if let Ok(mut guard) = registry.lock() {
            guard.register(pid);
        }

        let output = child.wait_with_output();

        if let Ok(mut guard) = registry.lock() {
            guard.unregister(pid);
        }

        let output = output.with_context(|| format!("Failed waiting for `{}`", command.program))?;

        let result = CommandOutput {
            stdout: String::from_utf8_lossy(&output.stdout).to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).to_string(),
            exit_code: output.status.code(),
            success: output.status.success(),
        };
        debug!(
            program = %command.program,
            exit_code = ?result.exit_code,
            "finished"
        );
        Ok(result)
    }

    fn apply(&mut self, action: &FsAction) -> Result<()> {
        info!(action = %action, "applying");
        action
            .apply()
            .with_context(|| format!("Failed to {action}"))
    }
}

// ============================================================================
// Dry-run runner
// ============================================================================

/// Preview mode: queries go through `inner`, everything else is logged.
///
/// `lsblk` and `genfstab` still execute so sizes and output are real.
#[derive(Debug, Default)]
pub struct DryRunRunner<R = SystemRunner> {
    inner: R,
    skipped: usize,
}

impl<R: CommandRunner> DryRunRunner<R> {
    pub fn new(inner: R) -> Self {
        Self { inner, skipped: 0 }
    }

    /// Commands and file actions that were not executed
    pub fn skipped(&self) -> usize {
        self.skipped
    }

    pub fn into_inner(self) -> R {
        self.inner
    }
}

impl<R: CommandRunner> CommandRunner for DryRunRunner<R> {
    fn run(&mut self, command: &CommandLine) -> Result<CommandOutput> {
        if command.destructive {
            info!("[dry-run] would run: {}", command);
            self.skipped += 1;
            Ok(CommandOutput::success(""))
        } else {
            self.inner.run(command)
        }
    }

    fn apply(&mut self, action: &FsAction) -> Result<()> {
        info!("[dry-run] would {}", action);
        self.skipped += 1;
        Ok(())
    }
}

// ============================================================================
// Recording runner
// ============================================================================

/// One operation seen by a `RecordingRunner`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Recorded {
    Command(CommandLine),
    Fs(FsAction),
}

impl fmt::Display for Recorded {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Command(command) => write!(f, "{command}"),
            Self::Fs(action) => write!(f, "# {action}"),
        }
    }
}

#[derive(Debug, Clone)]
enum Rule {
    Command { pattern: String, output: CommandOutput },
    FsError { pattern: String, message: String },
}

/// Records every operation and answers from scripted rules.
///
/// Rules match when the rendered command (or file action) contains the
/// pattern; the first matching rule wins. Unmatched commands succeed with
/// empty output. `hyprstrap plan` uses this runner to print what an install
/// would do; tests use it to simulate tool failures.
///
/// ```
/// use hyprstrap::command::CommandLine;
/// use hyprstrap::runner::{CommandOutput, CommandRunner, RecordingRunner};
///
/// let mut runner = RecordingRunner::new()
///     .fail("mkfs.ext4", 1, "mkfs.ext4: Device size reported to be zero");
/// let out = runner.run(&CommandLine::new("mkfs.ext4").arg("/dev/sda3")).unwrap();
/// assert!(!out.success);
/// assert_eq!(runner.commands().len(), 1);
/// ```
#[derive(Debug, Clone, Default)]
pub struct RecordingRunner {
    rules: Vec<Rule>,
    log: Vec<Recorded>,
}

impl RecordingRunner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Answer commands containing `pattern` with `output`.
    pub fn respond(mut self, pattern: impl Into<String>, output: CommandOutput) -> Self {
        self.rules.push(Rule::Command {
            pattern: pattern.into(),
            output,
        });
        self
    }

    /// Make commands containing `pattern` exit with `exit_code`.
    pub fn fail(
        self,
        pattern: impl Into<String>,
        exit_code: i32,
        stderr: impl Into<String>,
    ) -> Self {
        self.respond(pattern, CommandOutput::failure(exit_code, stderr))
    }

    /// Make file actions whose description contains `pattern` fail.
    pub fn fail_fs(mut self, pattern: impl Into<String>, message: impl Into<String>) -> Self {
        self.rules.push(Rule::FsError {
            pattern: pattern.into(),
            message: message.into(),
        });
        self
    }

    /// Every operation, in order.
    pub fn log(&self) -> &[Recorded] {
        &self.log
    }

    /// Only the commands, in order.
    pub fn commands(&self) -> Vec<&CommandLine> {
        self.log
            .iter()
            .filter_map(|r| match r {
                Recorded::Command(c) => Some(c),
                Recorded::Fs(_) => None,
            })
            .collect()
    }

    /// Only the file actions, in order.
    pub fn fs_actions(&self) -> Vec<&FsAction> {
        self.log
            .iter()
            .filter_map(|r| match r {
                Recorded::Fs(a) => Some(a),
                Recorded::Command(_) => None,
            })
            .collect()
    }

    /// Rendered commands, convenient for assertions.
    pub fn command_strings(&self) -> Vec<String> {
        self.commands().iter().map(|c| c.to_string()).collect()
    }
}

impl CommandRunner for RecordingRunner {
    fn run(&mut self, command: &CommandLine) -> Result<CommandOutput> {
        self.log.push(Recorded::Command(command.clone()));
        let rendered = command.to_string();
        let output = self
            .rules
            .iter()
            .find_map(|rule| match rule {
                Rule::Command { pattern, output } if rendered.contains(pattern.as_str()) => {
                    Some(output.clone())
                }
                _ => None,
            })
            .unwrap_or_else(|| CommandOutput::success(""));
        Ok(output)
    }

    fn apply(&mut self, action: &FsAction) -> Result<()> {
        self.log.push(Recorded::Fs(action.clone()));
        let rendered = action.to_string();
        for rule in &self.rules {
            if let Rule::FsError { pattern, message } = rule {
                if rendered.contains(pattern.as_str()) {
                    warn!(action = %action, "scripted file action failure");
                    anyhow::bail!("{message}");
                }
            }
        }
        Ok(())
    }
}
