use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// hyprstrap - unattended Arch Linux + Hyprland installer
#[derive(Parser)]
#[command(name = "hyprstrap")]
#[command(about = "Install Arch Linux with a Hyprland desktop onto a single disk")]
#[command(version)]
pub struct Cli {
    /// Dry-run mode: show what would be executed without making changes.
    ///
    /// Destructive commands (parted, mkfs, pacstrap, everything in the
    /// chroot) and all file writes are logged instead of executed.
    /// Queries (lsblk, genfstab) still run so the preview is realistic.
    #[arg(long, global = true)]
    pub dry_run: bool,

    /// JSON configuration file; defaults apply to anything it leaves out
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Stop at the first failed command instead of carrying on
    #[arg(long, global = true)]
    pub halt_on_error: bool,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run the installation (default)
    Install {
        /// Target disk (e.g. /dev/sda); prompted for when omitted
        #[arg(short, long)]
        device: Option<PathBuf>,
    },
    /// Print every command and file action an install would issue
    Plan {
        /// Target disk the plan is written for
        #[arg(short, long)]
        device: PathBuf,
        /// Disk size to plan for, in GB
        #[arg(long)]
        size_gb: f64,
    },
    /// Validate a configuration file
    Validate {
        /// Path to configuration file to validate
        #[arg(value_name = "CONFIG")]
        file: PathBuf,
    },
    /// Write the default configuration as JSON
    InitConfig {
        /// Where to write the configuration
        output: PathBuf,
    },
}

impl Cli {
    pub fn parse_args() -> Self {
        <Self as clap::Parser>::parse()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[test]
    fn test_cli_no_args() {
        // Running with no args defaults to an interactive install
        let cli = Cli::try_parse_from(["hyprstrap"]).unwrap();
        assert!(cli.command.is_none());
        assert!(!cli.dry_run);
        assert!(!cli.halt_on_error);
    }

    #[test]
    fn test_cli_install_with_device() {
        let cli = Cli::try_parse_from(["hyprstrap", "install", "--device", "/dev/sda"]).unwrap();
        match cli.command {
            Some(Commands::Install { device }) => {
                assert_eq!(device, Some(PathBuf::from("/dev/sda")));
            }
            _ => panic!("Expected Install command"),
        }
    }

    #[test]
    fn test_cli_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from([
            "hyprstrap",
            "install",
            "--dry-run",
            "--halt-on-error",
            "--config",
            "/root/install.json",
        ])
        .unwrap();
        assert!(cli.dry_run);
        assert!(cli.halt_on_error);
        assert_eq!(cli.config, Some(PathBuf::from("/root/install.json")));
    }

    #[test]
    fn test_cli_plan_requires_size() {
        assert!(Cli::try_parse_from(["hyprstrap", "plan", "--device", "/dev/sda"]).is_err());

        let cli = Cli::try_parse_from([
            "hyprstrap",
            "plan",
            "--device",
            "/dev/nvme0n1",
            "--size-gb",
            "512",
        ])
        .unwrap();
        match cli.command {
            Some(Commands::Plan { device, size_gb }) => {
                assert_eq!(device, PathBuf::from("/dev/nvme0n1"));
                assert_eq!(size_gb, 512.0);
            }
            _ => panic!("Expected Plan command"),
        }
    }

    #[test]
    fn test_cli_validate_command() {
        let cli = Cli::try_parse_from(["hyprstrap", "validate", "/path/to/config.json"]).unwrap();
        match cli.command {
            Some(Commands::Validate { file }) => {
                assert_eq!(file, PathBuf::from("/path/to/config.json"));
            }
            _ => panic!("Expected Validate command"),
        }
    }

    #[test]
    fn test_cli_init_config_command() {
        let cli = Cli::try_parse_from(["hyprstrap", "init-config", "out.json"]).unwrap();
        assert!(matches!(cli.command, Some(Commands::InitConfig { .. })));
    }
}
