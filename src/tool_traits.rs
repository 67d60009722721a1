//! Type-safe external tool argument contracts.
//!
//! Each external tool the installer drives gets a struct implementing
//! `ToolArgs`. The struct definition is the contract: a flag can only be
//! spelled one way, in one place, and tests pin it down.

use crate::command::CommandLine;

/// Trait for typed tool arguments.
///
/// # Contract
///
/// - `program()`: the binary to run, resolved through `PATH`.
/// - `to_cli_args()`: arguments exactly as the tool expects them.
/// - `get_env_vars()`: extra environment for the process.
/// - `is_destructive()`: false only for pure queries; dry runs execute those.
///
/// # Example
///
/// ```
/// use std::path::PathBuf;
/// use hyprstrap::tool_traits::ToolArgs;
/// use hyprstrap::tools::disk::SwaponArgs;
///
/// let args = SwaponArgs { partition: PathBuf::from("/dev/sda2") };
/// assert_eq!(args.command_line().to_string(), "swapon /dev/sda2");
/// ```
pub trait ToolArgs {
    fn program(&self) -> &'static str;

    fn to_cli_args(&self) -> Vec<String>;

    fn get_env_vars(&self) -> Vec<(String, String)> {
        Vec::new()
    }

    fn is_destructive(&self) -> bool {
        true
    }

    /// Assemble the `CommandLine` the runner executes.
    fn command_line(&self) -> CommandLine {
        let mut line = CommandLine::new(self.program()).args(self.to_cli_args());
        line.env = self.get_env_vars();
        line.destructive = self.is_destructive();
        line
    }
}
