//! Partition layout planning
//!
//! Turns a device size into the fixed three-partition GPT layout:
//!
//! | # | Role | Start          | End            | Filesystem |
//! |---|------|----------------|----------------|------------|
//! | 1 | EFI  | 1MiB           | 1GiB           | FAT32      |
//! | 2 | Swap | 1GiB           | (1+swap)GiB    | swap       |
//! | 3 | Root | (1+swap)GiB    | 100%           | ext4       |
//!
//! Swap is 4 GB on devices smaller than 30 GB and 8 GB otherwise. Nothing here
//! touches the system; the installer turns the layout into parted calls.

use std::fmt;
use std::num::ParseIntError;
use std::path::{Path, PathBuf};

use crate::types::PartitionRole;

/// Bytes in one gigabyte as reported to the operator (GiB).
pub const BYTES_PER_GB: u64 = 1024 * 1024 * 1024;

/// Devices below this size (in GB) get the small swap partition.
pub const SWAP_THRESHOLD_GB: f64 = 30.0;

pub const SMALL_DEVICE_SWAP_GB: u64 = 4;
pub const LARGE_DEVICE_SWAP_GB: u64 = 8;

/// End of the EFI partition and start of swap, in GiB.
const EFI_END_GIB: u64 = 1;

pub fn bytes_to_gb(bytes: u64) -> f64 {
    bytes as f64 / BYTES_PER_GB as f64
}

/// Swap partition size for a device of `size_gb` gigabytes.
pub fn swap_size_gb(size_gb: f64) -> u64 {
    if size_gb < SWAP_THRESHOLD_GB {
        SMALL_DEVICE_SWAP_GB
    } else {
        LARGE_DEVICE_SWAP_GB
    }
}

/// Parse the byte count printed by `lsblk -b -dn -o SIZE`.
pub fn parse_size_bytes(output: &str) -> Result<u64, ParseIntError> {
    output.trim().parse::<u64>()
}

/// Path of partition `index` on `device`.
///
/// Kernel naming inserts a `p` when the disk name ends in a digit:
/// `/dev/sda` → `/dev/sda1`, `/dev/nvme0n1` → `/dev/nvme0n1p1`.
pub fn partition_path(device: &Path, index: u8) -> PathBuf {
    let base = device.as_os_str().to_string_lossy();
    let separator = if base.ends_with(|c: char| c.is_ascii_digit()) {
        "p"
    } else {
        ""
    };
    PathBuf::from(format!("{base}{separator}{index}"))
}

/// A parted partition boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Boundary {
    MiB(u64),
    GiB(u64),
    Percent(u8),
}

impl fmt::Display for Boundary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MiB(n) => write!(f, "{n}MiB"),
            Self::GiB(n) => write!(f, "{n}GiB"),
            Self::Percent(n) => write!(f, "{n}%"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PartitionSpec {
    pub role: PartitionRole,
    pub start: Boundary,
    pub end: Boundary,
}

impl PartitionSpec {
    pub fn index(&self) -> u8 {
        self.role.index()
    }
}

impl fmt::Display for PartitionSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {}: [{}, {}] {}",
            self.index(),
            self.role,
            self.start,
            self.end,
            self.role.filesystem()
        )
    }
}

/// The three-partition layout for one device.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PartitionLayout {
    swap_gb: u64,
    partitions: [PartitionSpec; 3],
}

impl PartitionLayout {
    /// Layout for a device of `size_gb` gigabytes.
    pub fn for_size(size_gb: f64) -> Self {
        Self::with_swap(swap_size_gb(size_gb))
    }

    /// Layout with an explicit swap size in GiB.
    pub fn with_swap(swap_gb: u64) -> Self {
        let root_start = EFI_END_GIB + swap_gb;
        Self {
            swap_gb,
            partitions: [
                PartitionSpec {
                    role: PartitionRole::Efi,
                    start: Boundary::MiB(1),
                    end: Boundary::GiB(EFI_END_GIB),
                },
                PartitionSpec {
                    role: PartitionRole::Swap,
                    start: Boundary::GiB(EFI_END_GIB),
                    end: Boundary::GiB(root_start),
                },
                PartitionSpec {
                    role: PartitionRole::Root,
                    start: Boundary::GiB(root_start),
                    end: Boundary::Percent(100),
                },
            ],
        }
    }

    pub fn swap_gb(&self) -> u64 {
        self.swap_gb
    }

    pub fn partitions(&self) -> &[PartitionSpec] {
        &self.partitions
    }

    pub fn partition(&self, role: PartitionRole) -> &PartitionSpec {
        // Array order matches PartitionRole::index()
        &self.partitions[usize::from(role.index() - 1)]
    }

    /// Multi-line summary for logs.
    pub fn summary(&self) -> String {
        let mut lines = vec![format!("Partition layout (swap {} GB):", self.swap_gb)];
        lines.extend(self.partitions.iter().map(|p| format!("  {p}")));
        lines.join("\n")
    }
}
