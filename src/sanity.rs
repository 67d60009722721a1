//! Pre-flight sanity checks for the runtime environment
//!
//! Verifies before step 1:
//! - the tools the installer shells out to are on PATH
//! - the process runs with root privileges (EUID 0)
//!
//! Nothing here stops the run. A missing tool surfaces later as a failed
//! command and is handled by the failure policy like any other; the checks
//! only warn early so the operator can abort.

use std::process::Command;

use tracing::{debug, info, warn};

use crate::process_guard::CommandProcessGroup;

/// Result of environment verification
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SanityCheckResult {
    pub missing_binaries: Vec<String>,
    pub is_root: bool,
}

impl SanityCheckResult {
    /// Returns true if all checks passed
    pub fn is_ok(&self) -> bool {
        self.missing_binaries.is_empty() && self.is_root
    }

    /// One line per problem, as shown to the operator
    pub fn warnings(&self) -> Vec<String> {
        let mut warnings = Vec::new();
        if !self.is_root {
            warnings.push(
                "not running as root: partitioning and pacstrap will fail".to_string(),
            );
        }
        for binary in &self.missing_binaries {
            warnings.push(format!(
                "{} not found (install: pacman -S {})",
                binary,
                package_for_binary(binary)
            ));
        }
        warnings
    }
}

/// Tools invoked on the live system. Everything else runs inside the chroot.
const REQUIRED_BINARIES: &[&str] = &[
    "lsblk",
    "parted",
    "mkfs.fat",
    "mkswap",
    "mkfs.ext4",
    "swapon",
    "mount",
    "pacstrap",
    "genfstab",
    "arch-chroot",
];

/// Check if a binary is available in PATH
fn binary_exists(name: &str) -> bool {
    Command::new("which")
        .arg(name)
        .in_new_process_group()
        .output()
        .map(|output| output.status.success())
        .unwrap_or(false)
}

fn is_running_as_root() -> bool {
    nix::unistd::geteuid().is_root()
}

/// Map binary names to their Arch Linux package names
fn package_for_binary(binary: &str) -> &'static str {
    match binary {
        "parted" => "parted",
        "mkfs.fat" => "dosfstools",
        "mkfs.ext4" => "e2fsprogs",
        "pacstrap" | "genfstab" | "arch-chroot" => "arch-install-scripts",
        _ => "util-linux",
    }
}

/// Run all checks and return the result
pub fn verify_environment() -> SanityCheckResult {
    let missing_binaries = REQUIRED_BINARIES
        .iter()
        .filter(|binary| !binary_exists(binary))
        .map(|binary| binary.to_string())
        .collect();

    SanityCheckResult {
        missing_binaries,
        is_root: is_running_as_root(),
    }
}

/// Verify the environment and log a warning for each problem found.
pub fn run_preflight_checks() -> SanityCheckResult {
    debug!("running pre-flight checks");
    let result = verify_environment();

    if result.is_ok() {
        info!("pre-flight checks passed");
    } else {
        for warning in result.warnings() {
            warn!("pre-flight: {warning}");
        }
    }
    result
}
