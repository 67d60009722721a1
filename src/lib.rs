//! hyprstrap library
//!
//! Core of the Arch Linux + Hyprland installer: stage tracking, partition
//! layout, typed tool invocations and the runners that execute them.

pub mod cli;
pub mod command;
pub mod config_file;
pub mod device;
pub mod error;
pub mod installer;
pub mod layout;
pub mod process_guard;
pub mod runner;
pub mod sanity;
pub mod stage;
pub mod tool_traits;
pub mod tools;
pub mod types;

// Re-export main types for convenience
pub use command::{CommandLine, FsAction, WriteMode};
pub use config_file::{AurHelperConfig, BootloaderConfig, InstallConfig, ThemeConfig};
pub use error::InstallError;
pub use installer::{COMPLETION_MESSAGE, CommandFailure, InstallReport, Installer, plan};
pub use layout::{Boundary, PartitionLayout, PartitionSpec};
pub use process_guard::{ChildRegistry, CommandProcessGroup, ProcessGuard};
pub use runner::{
    CommandOutput, CommandRunner, DryRunRunner, Recorded, RecordingRunner, SystemRunner,
};
pub use stage::{InstallStage, StageTracker, StageTransitionError};
pub use tool_traits::ToolArgs;
pub use types::{FailurePolicy, Filesystem, PartitionRole};
