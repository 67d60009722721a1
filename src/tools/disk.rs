//! Type-safe arguments for disk tools.
//!
//! - `LsblkListArgs`, `LsblkSizeArgs` for `lsblk` (queries)
//! - `PartedMklabelArgs`, `PartedMkpartArgs` for `parted`
//! - `MkfsArgs` for `mkfs.fat` / `mkswap` / `mkfs.ext4`
//! - `SwaponArgs`, `MountArgs`

use std::path::PathBuf;

use crate::layout::Boundary;
use crate::tool_traits::ToolArgs;
use crate::types::Filesystem;

/// `lsblk -d -o NAME,SIZE,MODEL`: whole disks, shown to the operator.
#[derive(Debug, Clone, Default)]
pub struct LsblkListArgs;

impl ToolArgs for LsblkListArgs {
    fn program(&self) -> &'static str {
        "lsblk"
    }

    fn to_cli_args(&self) -> Vec<String> {
        vec!["-d".to_string(), "-o".to_string(), "NAME,SIZE,MODEL".to_string()]
    }

    fn is_destructive(&self) -> bool {
        false
    }
}

/// `lsblk -b -dn -o SIZE <device>`: device size in bytes, no header.
#[derive(Debug, Clone)]
pub struct LsblkSizeArgs {
    pub device: PathBuf,
}

impl ToolArgs for LsblkSizeArgs {
    fn program(&self) -> &'static str {
        "lsblk"
    }

    fn to_cli_args(&self) -> Vec<String> {
        vec![
            "-b".to_string(),
            "-dn".to_string(),
            "-o".to_string(),
            "SIZE".to_string(),
            self.device.display().to_string(),
        ]
    }

    fn is_destructive(&self) -> bool {
        false
    }
}

/// `parted -s <device> mklabel gpt`
#[derive(Debug, Clone)]
pub struct PartedMklabelArgs {
    pub device: PathBuf,
}

impl ToolArgs for PartedMklabelArgs {
    fn program(&self) -> &'static str {
        "parted"
    }

    fn to_cli_args(&self) -> Vec<String> {
        vec![
            "-s".to_string(),
            self.device.display().to_string(),
            "mklabel".to_string(),
            "gpt".to_string(),
        ]
    }
}

/// `parted -s <device> mkpart primary <start> <end>`
#[derive(Debug, Clone)]
pub struct PartedMkpartArgs {
    pub device: PathBuf,
    pub start: Boundary,
    pub end: Boundary,
}

impl ToolArgs for PartedMkpartArgs {
    fn program(&self) -> &'static str {
        "parted"
    }

    fn to_cli_args(&self) -> Vec<String> {
        vec![
            "-s".to_string(),
            self.device.display().to_string(),
            "mkpart".to_string(),
            "primary".to_string(),
            self.start.to_string(),
            self.end.to_string(),
        ]
    }
}

/// Filesystem creation; the program depends on the filesystem.
#[derive(Debug, Clone)]
pub struct MkfsArgs {
    pub partition: PathBuf,
    pub filesystem: Filesystem,
}

impl ToolArgs for MkfsArgs {
    fn program(&self) -> &'static str {
        self.filesystem.mkfs_program()
    }

    fn to_cli_args(&self) -> Vec<String> {
        let mut args: Vec<String> = self
            .filesystem
            .mkfs_args()
            .iter()
            .map(|a| a.to_string())
            .collect();
        args.push(self.partition.display().to_string());
        args
    }
}

#[derive(Debug, Clone)]
pub struct SwaponArgs {
    pub partition: PathBuf,
}

impl ToolArgs for SwaponArgs {
    fn program(&self) -> &'static str {
        "swapon"
    }

    fn to_cli_args(&self) -> Vec<String> {
        vec![self.partition.display().to_string()]
    }
}

/// `mount <device> <target>`
#[derive(Debug, Clone)]
pub struct MountArgs {
    pub device: PathBuf,
    pub target: PathBuf,
}

impl ToolArgs for MountArgs {
    fn program(&self) -> &'static str {
        "mount"
    }

    fn to_cli_args(&self) -> Vec<String> {
        vec![
            self.device.display().to_string(),
            self.target.display().to_string(),
        ]
    }
}
