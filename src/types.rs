//! Type-safe configuration types for hyprstrap
//!
//! Small closed sets of values that would otherwise travel through the
//! installer as strings.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString};

/// Filesystem applied to a partition during formatting
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[derive(Display, EnumString, EnumIter)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum Filesystem {
    /// FAT32 for the EFI System Partition
    Fat32,
    Swap,
    Ext4,
}

impl Filesystem {
    /// Formatter binary for this filesystem
    pub fn mkfs_program(&self) -> &'static str {
        match self {
            Self::Fat32 => "mkfs.fat",
            Self::Swap => "mkswap",
            Self::Ext4 => "mkfs.ext4",
        }
    }

    /// Extra formatter arguments placed before the device path
    pub fn mkfs_args(&self) -> &'static [&'static str] {
        match self {
            Self::Fat32 => &["-F32"],
            Self::Swap | Self::Ext4 => &[],
        }
    }
}

/// Role of each partition in the fixed three-partition layout
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString, EnumIter)]
#[strum(serialize_all = "lowercase")]
pub enum PartitionRole {
    Efi,
    Swap,
    Root,
}

impl PartitionRole {
    /// 1-based partition number on the target disk
    pub const fn index(self) -> u8 {
        match self {
            Self::Efi => 1,
            Self::Swap => 2,
            Self::Root => 3,
        }
    }

    pub const fn filesystem(self) -> Filesystem {
        match self {
            Self::Efi => Filesystem::Fat32,
            Self::Swap => Filesystem::Swap,
            Self::Root => Filesystem::Ext4,
        }
    }
}

/// What the installer does after an external command fails
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[derive(Display, EnumString, EnumIter)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum FailurePolicy {
    /// Report the failure and move on to the next command
    #[default]
    Continue,
    /// Stop the installation at the first failed command
    Halt,
}
